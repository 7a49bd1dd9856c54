//! Pen-sample input report decoding.
//!
//! Samples arrive as unsolicited input reports under one of two ids:
//! plain pen data (0x01) or pen data with timing (0x34, adds a timestamp
//! and a monotonically increasing sequence number). Two status-word bit
//! layouts exist across protocol revisions; the active one is selected at
//! negotiation time and recorded in the profile.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{REPORT_PEN_DATA, REPORT_PEN_DATA_TIMING};
use crate::device::DeviceProfile;
use crate::error::{PadError, Result};

/// Status-word bit layout, selected once at negotiation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StatusLayout {
    /// Flags in the low byte of the status word (rdy bit 0, sw bit 1);
    /// pressure as a separate trailing word masked to 10 bits.
    Legacy,
    /// rdy at bit 15, sw at bit 10, 10-bit pressure in bits 0..9 of the
    /// one status word.
    Timing,
}

// Legacy: flags in the low status byte
const LEGACY_RDY: u16 = 0x0001;
const LEGACY_SW: u16 = 0x0002;

// Timing: everything packed into the one status word
const TIMING_RDY: u16 = 0x8000;
const TIMING_SW: u16 = 0x0400;

const PRESSURE_MASK: u16 = 0x03ff;

/// One decoded input report. Immutable; appended to the driver's sample
/// log for the lifetime of the current signature.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PenSample {
    /// Pen in proximity of the surface (rdy).
    pub proximity: bool,
    /// Pen in contact with the surface (sw).
    pub contact: bool,
    /// Raw pressure in device units.
    pub pressure_raw: u16,
    /// Pressure normalized to 0..1 against the profile's maximum.
    pub pressure: f64,
    /// Position in tablet units.
    pub x: u16,
    pub y: u16,
    /// Position in display pixels (tablet units over the per-axis scale,
    /// rounded to nearest).
    pub px: i32,
    pub py: i32,
    /// Present only under the timing report id.
    pub timestamp: Option<u16>,
    pub seq: Option<u16>,
}

fn u16_be(buf: &[u8], offset: usize) -> u16 {
    u16::from_be_bytes([buf[offset], buf[offset + 1]])
}

/// Decode one input-report event against the negotiated profile.
///
/// Returns `Ok(None)` for report ids that are not pen data (ignored, not
/// an error). Fails with `ProtocolMismatch` when a pen report is shorter
/// than its layout.
pub fn decode_sample(profile: &DeviceProfile, report_id: u8, buf: &[u8]) -> Result<Option<PenSample>> {
    if report_id != REPORT_PEN_DATA && report_id != REPORT_PEN_DATA_TIMING {
        return Ok(None);
    }

    // Base body: status word + X + Y, with Legacy carrying pressure as a
    // fourth trailing word.
    let base_len = match profile.status_layout {
        StatusLayout::Legacy => 8,
        StatusLayout::Timing => 6,
    };
    let timing = report_id == REPORT_PEN_DATA_TIMING;
    let expect = if timing { base_len + 4 } else { base_len };
    if buf.len() < expect {
        return Err(PadError::ProtocolMismatch(format!(
            "pen report 0x{:02x} too short: {} bytes, expected {}",
            report_id,
            buf.len(),
            expect
        )));
    }

    let status = u16_be(buf, 0);
    let (proximity, contact, pressure_raw) = match profile.status_layout {
        StatusLayout::Legacy => (
            status & LEGACY_RDY != 0,
            status & LEGACY_SW != 0,
            u16_be(buf, 6) & PRESSURE_MASK,
        ),
        StatusLayout::Timing => (
            status & TIMING_RDY != 0,
            status & TIMING_SW != 0,
            status & PRESSURE_MASK,
        ),
    };

    let x = u16_be(buf, 2);
    let y = u16_be(buf, 4);

    let max_pressure = profile.max_pressure.max(1) as f64;
    let pressure = (pressure_raw as f64 / max_pressure).clamp(0.0, 1.0);

    let px = (x as f64 / profile.scale_x).round() as i32;
    let py = (y as f64 / profile.scale_y).round() as i32;

    let (timestamp, seq) = if timing {
        (Some(u16_be(buf, base_len)), Some(u16_be(buf, base_len + 2)))
    } else {
        (None, None)
    };

    Ok(Some(PenSample {
        proximity,
        contact,
        pressure_raw,
        pressure,
        x,
        y,
        px,
        py,
        timestamp,
        seq,
    }))
}

impl fmt::Display for StatusLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusLayout::Legacy => write!(f, "legacy"),
            StatusLayout::Timing => write!(f, "timing"),
        }
    }
}

impl FromStr for StatusLayout {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "legacy" => Ok(StatusLayout::Legacy),
            "timing" => Ok(StatusLayout::Timing),
            _ => Err(format!("Invalid status layout '{}'. Valid values: legacy, timing", s)),
        }
    }
}
