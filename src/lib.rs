//! Driver for a pen-input signature pad connected as a USB HID device.
//!
//! The crate covers the device protocol layer and the stroke engine:
//! fixed-layout feature-report encoding/decoding, capability negotiation,
//! bit-level pen-sample decoding, the chunked image-upload protocol with a
//! single-flight guard, stroke reconstruction into a vector scene, and
//! signed SVG export. The physical HID transport is an external
//! collaborator behind the [`Transport`] trait; feed its input-report
//! events into [`PadDriver::handle_input_report`] in arrival order.

pub mod config;
pub mod device;
pub mod driver;
pub mod error;
pub mod event;
pub mod export;
pub mod negotiate;
pub mod protocol;
pub mod stroke;
pub mod transport;
pub mod upload;

pub use config::Config;
pub use device::{DeviceProfile, Rgb, WritingArea};
pub use driver::PadDriver;
pub use error::{PadError, Result};
pub use event::{PadEvent, Subscription};
pub use export::{SignatureAlgorithm, SigningOptions};
pub use protocol::pen::{PenSample, StatusLayout};
pub use stroke::{Point, StrokeReconstructor, StrokeSegment};
pub use transport::Transport;
