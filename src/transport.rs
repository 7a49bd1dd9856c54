//! Abstract HID transport seam.
//!
//! The physical exchange of feature/input reports (hidraw, platform HID
//! API, …) lives outside this crate. The driver only needs synchronous
//! feature-report round-trips plus input-report events pushed into
//! [`crate::driver::PadDriver::handle_input_report`] in arrival order.

use crate::error::Result;

pub trait Transport: Send {
    /// True while the device session is open.
    fn is_connected(&self) -> bool;

    /// Synchronous feature-report write. Fails with `NotConnected` if the
    /// session is closed.
    fn send_feature_report(&mut self, report_id: u8, payload: &[u8]) -> Result<()>;

    /// Synchronous feature-report read. Returns the payload without the
    /// report id byte.
    fn recv_feature_report(&mut self, report_id: u8) -> Result<Vec<u8>>;
}
