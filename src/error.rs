//! Crate-wide error type covering the pad protocol taxonomy.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PadError {
    /// Operation attempted without an open device session.
    #[error("device is not connected")]
    NotConnected,

    /// Out-of-range parameter, rejected before any I/O.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Response shorter than the expected layout, or an unexpected report id.
    #[error("protocol mismatch: {0}")]
    ProtocolMismatch(String),

    /// Image upload slot still occupied after the bounded wait.
    #[error("image upload already in progress")]
    Busy,

    /// Invalid key material or algorithm at export time.
    #[error("signing failed: {0}")]
    SigningError(String),
}

pub type Result<T> = std::result::Result<T, PadError>;
