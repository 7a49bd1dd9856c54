//! Feature-report encoding and decoding.
//!
//! Pure functions keyed by the command table in [`super`]. Every command has
//! a fixed layout with the byte order documented per field; capability and
//! writing-area words are little-endian, pen-sample positions (decoded in
//! [`super::pen`]) are big-endian, colors are single bytes. Decoding a
//! response shorter than its layout fails with `ProtocolMismatch`; encoding
//! an out-of-range parameter fails with `InvalidParameter` before any I/O.

use crate::device::{Rgb, WritingArea};
use crate::error::{PadError, Result};

/// Decoded capability report (0x09).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capability {
    pub tablet_max_x: u16,
    pub tablet_max_y: u16,
    pub max_pressure: u16,
    pub display_width: u16,
    pub display_height: u16,
    pub max_report_rate: u8,
}

/// Decoded information report (0x08).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Information {
    pub name: String,
    pub firmware: String,
}

fn need(buf: &[u8], len: usize, what: &str) -> Result<()> {
    if buf.len() < len {
        return Err(PadError::ProtocolMismatch(format!(
            "{} report too short: {} bytes, expected {}",
            what,
            buf.len(),
            len
        )));
    }
    Ok(())
}

fn u16_le(buf: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([buf[offset], buf[offset + 1]])
}

/// Decode capability (0x09).
/// Format: tabletMaxX(u16 LE) + tabletMaxY(u16 LE) + maxPressure(u16 LE)
/// + width(u16 LE) + height(u16 LE) + maxReportRate(u8)
pub fn decode_capability(buf: &[u8]) -> Result<Capability> {
    need(buf, 11, "capability")?;
    Ok(Capability {
        tablet_max_x: u16_le(buf, 0),
        tablet_max_y: u16_le(buf, 2),
        max_pressure: u16_le(buf, 4),
        display_width: u16_le(buf, 6),
        display_height: u16_le(buf, 8),
        max_report_rate: buf[10],
    })
}

/// Decode information (0x08).
/// Format: name (7 bytes ASCII, NUL-padded) + firmware (4 bytes, rendered
/// as dot-separated decimal).
pub fn decode_information(buf: &[u8]) -> Result<Information> {
    need(buf, 11, "information")?;
    let name = ascii_field(&buf[..7]);
    let firmware = format!("{}.{}.{}.{}", buf[7], buf[8], buf[9], buf[10]);
    Ok(Information { name, firmware })
}

/// Decode serial (0x0F): ASCII, NUL-terminated.
pub fn decode_serial(buf: &[u8]) -> Result<String> {
    need(buf, 1, "serial")?;
    Ok(ascii_field(buf))
}

fn ascii_field(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    bytes[..end].iter().map(|&b| b as char).collect::<String>().trim().to_string()
}

/// Decode a single-byte status report (writing mode, ink mode, brightness).
pub fn decode_u8(buf: &[u8], what: &str) -> Result<u8> {
    need(buf, 1, what)?;
    Ok(buf[0])
}

/// Encode writing mode (0x0E): 1 byte, 0 or 1.
pub fn encode_writing_mode(mode: u8) -> Result<[u8; 1]> {
    if mode > 1 {
        return Err(PadError::InvalidParameter(format!(
            "writing mode must be 0 or 1, got {}",
            mode
        )));
    }
    Ok([mode])
}

/// Encode ink mode (0x21): 1 byte, 0 or 1.
pub fn encode_ink_mode(enabled: bool) -> [u8; 1] {
    [enabled as u8]
}

/// Encode brightness (0x2B): intensity byte in 0..=3, plus a pad byte.
pub fn encode_brightness(intensity: u8) -> Result<[u8; 2]> {
    if intensity > 3 {
        return Err(PadError::InvalidParameter(format!(
            "backlight intensity must be 0..=3, got {}",
            intensity
        )));
    }
    Ok([intensity, 0])
}

/// Encode pen color and width class (0x2D): R,G,B,width with width in 0..=3.
pub fn encode_pen_color_width(color: Rgb, width: u8) -> Result<[u8; 4]> {
    if width > 3 {
        return Err(PadError::InvalidParameter(format!(
            "pen width class must be 0..=3, got {}",
            width
        )));
    }
    Ok([color.r, color.g, color.b, width])
}

/// Decode pen color and width class (0x2D).
pub fn decode_pen_color_width(buf: &[u8]) -> Result<(Rgb, u8)> {
    need(buf, 4, "pen color/width")?;
    Ok((Rgb::new(buf[0], buf[1], buf[2]), buf[3]))
}

/// Encode background color (0x2E): R,G,B.
pub fn encode_background_color(color: Rgb) -> [u8; 3] {
    [color.r, color.g, color.b]
}

/// Decode background color (0x2E).
pub fn decode_background_color(buf: &[u8]) -> Result<Rgb> {
    need(buf, 3, "background color")?;
    Ok(Rgb::new(buf[0], buf[1], buf[2]))
}

/// Encode writing area (0x2A): x1,y1,x2,y2 as u16 LE each.
pub fn encode_writing_area(area: &WritingArea) -> Result<[u8; 8]> {
    if area.x2 < area.x1 || area.y2 < area.y1 {
        return Err(PadError::InvalidParameter(format!(
            "writing area corners out of order: ({},{})-({},{})",
            area.x1, area.y1, area.x2, area.y2
        )));
    }
    let mut buf = [0u8; 8];
    buf[0..2].copy_from_slice(&area.x1.to_le_bytes());
    buf[2..4].copy_from_slice(&area.y1.to_le_bytes());
    buf[4..6].copy_from_slice(&area.x2.to_le_bytes());
    buf[6..8].copy_from_slice(&area.y2.to_le_bytes());
    Ok(buf)
}

/// Decode writing area (0x2A).
pub fn decode_writing_area(buf: &[u8]) -> Result<WritingArea> {
    need(buf, 8, "writing area")?;
    Ok(WritingArea {
        x1: u16_le(buf, 0),
        y1: u16_le(buf, 2),
        x2: u16_le(buf, 4),
        y2: u16_le(buf, 6),
    })
}

/// Encode clear screen (0x20): 1 byte, value 0.
pub fn encode_clear_screen() -> [u8; 1] {
    [0]
}

/// Encode image start (0x25): format byte.
pub fn encode_image_start(format: u8) -> [u8; 1] {
    [format]
}

/// Frame one image chunk for 0x26: declared length byte, pad byte, chunk
/// bytes. The declared length makes short final chunks explicit.
pub fn encode_image_chunk(chunk: &[u8]) -> Result<Vec<u8>> {
    if chunk.is_empty() || chunk.len() > 0xff {
        return Err(PadError::InvalidParameter(format!(
            "image chunk must be 1..=255 bytes, got {}",
            chunk.len()
        )));
    }
    let mut frame = Vec::with_capacity(2 + chunk.len());
    frame.push(chunk.len() as u8);
    frame.push(0);
    frame.extend_from_slice(chunk);
    Ok(frame)
}

/// Encode image end (0x27): 1 byte, value 0.
pub fn encode_image_end() -> [u8; 1] {
    [0]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_little_endian_fields() {
        // tabletMax=(20000,12000), maxPressure=1023, display=(800,480), rate=150
        let buf = [
            0x20, 0x4e, // 20000 LE
            0xe0, 0x2e, // 12000 LE
            0xff, 0x03, // 1023 LE
            0x20, 0x03, // 800 LE
            0xe0, 0x01, // 480 LE
            0x96,
        ];
        let cap = decode_capability(&buf).unwrap();
        assert_eq!(cap.tablet_max_x, 20000);
        assert_eq!(cap.tablet_max_y, 12000);
        assert_eq!(cap.max_pressure, 1023);
        assert_eq!(cap.display_width, 800);
        assert_eq!(cap.display_height, 480);
        assert_eq!(cap.max_report_rate, 150);
    }

    #[test]
    fn test_capability_short_buffer() {
        assert!(matches!(
            decode_capability(&[0x20, 0x4e, 0xe0]),
            Err(PadError::ProtocolMismatch(_))
        ));
    }

    #[test]
    fn test_information_name_and_firmware() {
        let buf = [b'S', b'P', b'-', b'5', b'5', 0, 0, 2, 1, 0, 7];
        let info = decode_information(&buf).unwrap();
        assert_eq!(info.name, "SP-55");
        assert_eq!(info.firmware, "2.1.0.7");
    }

    #[test]
    fn test_serial_nul_terminated() {
        let buf = [b'A', b'0', b'0', b'4', 0, 0xff, 0xff];
        assert_eq!(decode_serial(&buf).unwrap(), "A004");
    }

    #[test]
    fn test_pen_color_width_round_trip() {
        let color = Rgb::new(0x12, 0xab, 0xff);
        let buf = encode_pen_color_width(color, 2).unwrap();
        assert_eq!(decode_pen_color_width(&buf).unwrap(), (color, 2));
    }

    #[test]
    fn test_pen_width_range() {
        for width in 0..=3 {
            assert!(encode_pen_color_width(Rgb::BLACK, width).is_ok());
        }
        for width in [4u8, 10, 0xff] {
            assert!(matches!(
                encode_pen_color_width(Rgb::BLACK, width),
                Err(PadError::InvalidParameter(_))
            ));
        }
    }

    #[test]
    fn test_background_round_trip() {
        let color = Rgb::new(0xee, 0xee, 0xdd);
        let buf = encode_background_color(color);
        assert_eq!(decode_background_color(&buf).unwrap(), color);
    }

    #[test]
    fn test_writing_mode_range() {
        assert_eq!(encode_writing_mode(0).unwrap(), [0]);
        assert_eq!(encode_writing_mode(1).unwrap(), [1]);
        assert!(matches!(encode_writing_mode(2), Err(PadError::InvalidParameter(_))));
    }

    #[test]
    fn test_brightness_range() {
        assert_eq!(encode_brightness(3).unwrap(), [3, 0]);
        assert!(matches!(encode_brightness(4), Err(PadError::InvalidParameter(_))));
    }

    #[test]
    fn test_writing_area_round_trip_le() {
        let area = WritingArea { x1: 0x0102, y1: 0x0304, x2: 0x0506, y2: 0x0708 };
        let buf = encode_writing_area(&area).unwrap();
        // Little-endian per field
        assert_eq!(&buf[..2], &[0x02, 0x01]);
        assert_eq!(decode_writing_area(&buf).unwrap(), area);
    }

    #[test]
    fn test_writing_area_corner_order() {
        let area = WritingArea { x1: 200, y1: 0, x2: 100, y2: 10 };
        assert!(matches!(encode_writing_area(&area), Err(PadError::InvalidParameter(_))));
    }

    #[test]
    fn test_image_chunk_framing() {
        let frame = encode_image_chunk(&[1, 2, 3]).unwrap();
        assert_eq!(frame, vec![3, 0, 1, 2, 3]);
        assert!(encode_image_chunk(&[]).is_err());
        assert!(encode_image_chunk(&[0u8; 256]).is_err());
    }
}
