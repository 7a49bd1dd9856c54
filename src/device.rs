//! Device-side value types: negotiated profile, colors, writing area.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::protocol::pen::StatusLayout;

/// An RGB triple as the pad reports it (one byte per channel).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb { r: 0, g: 0, b: 0 };
    pub const WHITE: Rgb = Rgb { r: 0xff, g: 0xff, b: 0xff };

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl FromStr for Rgb {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.strip_prefix('#').unwrap_or(s);
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(format!("Invalid color '{}'. Expected #rrggbb", s));
        }
        let parse = |i| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|e| e.to_string());
        Ok(Rgb {
            r: parse(0)?,
            g: parse(2)?,
            b: parse(4)?,
        })
    }
}

/// Rectangle outside which pen input is not inked.
///
/// The bounds are matched against the display-pixel coordinates of each
/// sample, inclusive on both ends. `None` at the call sites means
/// unrestricted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WritingArea {
    pub x1: u16,
    pub y1: u16,
    pub x2: u16,
    pub y2: u16,
}

impl WritingArea {
    pub fn admits(&self, px: i32, py: i32) -> bool {
        px >= self.x1 as i32 && px <= self.x2 as i32 && py >= self.y1 as i32 && py <= self.y2 as i32
    }
}

/// Everything negotiated from the device on connect.
///
/// Immutable after negotiation except through successful setter
/// round-trips; dropped on disconnect. No field in here is ever guessed —
/// negotiation is all-or-nothing, so a profile either exists complete or
/// not at all.
#[derive(Debug, Clone, Serialize)]
pub struct DeviceProfile {
    pub name: String,
    pub firmware: String,
    pub serial: String,

    // Digitizer ranges (tablet units) and display resolution (pixels)
    pub tablet_max_x: u16,
    pub tablet_max_y: u16,
    pub max_pressure: u16,
    pub display_width: u16,
    pub display_height: u16,
    pub max_report_rate: u8,

    /// Tablet units per display pixel, computed independently per axis.
    pub scale_x: f64,
    pub scale_y: f64,

    /// Status-word bit layout, selected once at negotiation.
    pub status_layout: StatusLayout,
    /// Image transfer chunk size in bytes (payload, excluding framing).
    pub image_chunk_size: usize,

    // Last-read device state, updated by successful setter round-trips
    pub pen_color: Rgb,
    pub pen_width: u8,
    pub background: Rgb,
    pub backlight: u8,
    pub ink_enabled: bool,
    pub writing_mode: u8,
    pub writing_area: WritingArea,
}

impl DeviceProfile {
    /// True when the writing area covers the whole display (nothing clipped).
    pub fn area_unrestricted(&self) -> bool {
        self.writing_area.x1 == 0
            && self.writing_area.y1 == 0
            && self.writing_area.x2 >= self.display_width.saturating_sub(1)
            && self.writing_area.y2 >= self.display_height.saturating_sub(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgb_hex_round_trip() {
        for s in ["#000000", "#ffffff", "#aa10ff", "#123456"] {
            let color: Rgb = s.parse().unwrap();
            assert_eq!(color.to_string(), s);
        }
    }

    #[test]
    fn test_rgb_rejects_malformed() {
        assert!("".parse::<Rgb>().is_err());
        assert!("#fff".parse::<Rgb>().is_err());
        assert!("#gg0000".parse::<Rgb>().is_err());
        assert!("#12345678".parse::<Rgb>().is_err());
    }

    #[test]
    fn test_writing_area_inclusive_bounds() {
        let area = WritingArea { x1: 100, y1: 100, x2: 200, y2: 200 };
        assert!(area.admits(100, 100));
        assert!(area.admits(200, 200));
        assert!(area.admits(150, 150));
        assert!(!area.admits(99, 150));
        assert!(!area.admits(150, 201));
    }
}
