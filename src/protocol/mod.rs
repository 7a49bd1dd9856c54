//! Fixed command table for the pad's feature/input report protocol.

pub mod codec;
pub mod pen;

// Input reports (unsolicited pen samples)
pub const REPORT_PEN_DATA: u8 = 0x01;
pub const REPORT_PEN_DATA_TIMING: u8 = 0x34;

// Feature reports (request/response configuration and status)
pub const REPORT_INFORMATION: u8 = 0x08; // name (7 ASCII) + firmware (4 bytes)
pub const REPORT_CAPABILITY: u8 = 0x09; // tablet max, pressure, display, rate
pub const REPORT_WRITING_MODE: u8 = 0x0e; // 0 or 1
pub const REPORT_SERIAL: u8 = 0x0f; // NUL-terminated ASCII
pub const REPORT_CLEAR_SCREEN: u8 = 0x20;
pub const REPORT_INK_MODE: u8 = 0x21; // 0/1
pub const REPORT_IMAGE_START: u8 = 0x25;
pub const REPORT_IMAGE_DATA: u8 = 0x26;
pub const REPORT_IMAGE_END: u8 = 0x27;
pub const REPORT_WRITING_AREA: u8 = 0x2a; // x1,y1,x2,y2 (u16 LE each)
pub const REPORT_BRIGHTNESS: u8 = 0x2b;
pub const REPORT_PEN_COLOR_WIDTH: u8 = 0x2d; // R,G,B,width
pub const REPORT_BACKGROUND_COLOR: u8 = 0x2e; // R,G,B

/// The one image format the device accepts: packed BGR, 24 bpp.
pub const IMAGE_FORMAT_BGR24: u8 = 0x04;
