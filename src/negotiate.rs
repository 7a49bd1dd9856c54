//! Capability negotiation: the fixed read sequence that assembles a
//! [`DeviceProfile`] on connect.
//!
//! All-or-nothing: any failed read aborts and no partial profile is ever
//! exposed. Fields come straight from the device — nothing is guessed.

use crate::config::Config;
use crate::device::DeviceProfile;
use crate::error::{PadError, Result};
use crate::protocol::codec;
use crate::protocol::pen::StatusLayout;
use crate::protocol::{
    REPORT_BACKGROUND_COLOR, REPORT_BRIGHTNESS, REPORT_CAPABILITY, REPORT_INFORMATION,
    REPORT_INK_MODE, REPORT_PEN_COLOR_WIDTH, REPORT_SERIAL, REPORT_WRITING_AREA,
    REPORT_WRITING_MODE,
};
use crate::transport::Transport;

/// Run the fixed negotiation sequence against an open transport.
pub fn negotiate<T: Transport>(transport: &mut T, config: &Config) -> Result<DeviceProfile> {
    if !transport.is_connected() {
        return Err(PadError::NotConnected);
    }

    let capability = codec::decode_capability(&transport.recv_feature_report(REPORT_CAPABILITY)?)?;
    if capability.display_width == 0 || capability.display_height == 0 {
        return Err(PadError::ProtocolMismatch(
            "capability report declares a zero-sized display".into(),
        ));
    }

    let info = codec::decode_information(&transport.recv_feature_report(REPORT_INFORMATION)?)?;
    let serial = codec::decode_serial(&transport.recv_feature_report(REPORT_SERIAL)?)?;
    let background =
        codec::decode_background_color(&transport.recv_feature_report(REPORT_BACKGROUND_COLOR)?)?;
    let (pen_color, pen_width) =
        codec::decode_pen_color_width(&transport.recv_feature_report(REPORT_PEN_COLOR_WIDTH)?)?;
    let backlight =
        codec::decode_u8(&transport.recv_feature_report(REPORT_BRIGHTNESS)?, "brightness")?;
    let ink_enabled =
        codec::decode_u8(&transport.recv_feature_report(REPORT_INK_MODE)?, "ink mode")? != 0;
    let writing_mode =
        codec::decode_u8(&transport.recv_feature_report(REPORT_WRITING_MODE)?, "writing mode")?;
    if writing_mode > 1 {
        return Err(PadError::ProtocolMismatch(format!(
            "device reports writing mode {}",
            writing_mode
        )));
    }
    let writing_area =
        codec::decode_writing_area(&transport.recv_feature_report(REPORT_WRITING_AREA)?)?;

    // The two axes are not assumed equal.
    let scale_x = capability.tablet_max_x as f64 / capability.display_width as f64;
    let scale_y = capability.tablet_max_y as f64 / capability.display_height as f64;

    let status_layout = config
        .status_layout
        .unwrap_or_else(|| layout_for_firmware(&info.firmware));

    log::info!(
        "Negotiated {} fw {} serial {} ({}x{} tablet units, {}x{} px, layout {})",
        info.name,
        info.firmware,
        serial,
        capability.tablet_max_x,
        capability.tablet_max_y,
        capability.display_width,
        capability.display_height,
        status_layout
    );

    Ok(DeviceProfile {
        name: info.name,
        firmware: info.firmware,
        serial,
        tablet_max_x: capability.tablet_max_x,
        tablet_max_y: capability.tablet_max_y,
        max_pressure: capability.max_pressure,
        display_width: capability.display_width,
        display_height: capability.display_height,
        max_report_rate: capability.max_report_rate,
        scale_x,
        scale_y,
        status_layout,
        image_chunk_size: config.image_chunk_size,
        pen_color,
        pen_width,
        background,
        backlight,
        ink_enabled,
        writing_mode,
        writing_area,
    })
}

/// Firmware major version 2 introduced the packed status word along with
/// the timing report id; older revisions use the legacy flag byte.
fn layout_for_firmware(firmware: &str) -> StatusLayout {
    let major: u8 = firmware.split('.').next().and_then(|v| v.parse().ok()).unwrap_or(0);
    if major >= 2 {
        StatusLayout::Timing
    } else {
        StatusLayout::Legacy
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::transport::mock::MockTransport;

    pub(crate) fn script_negotiation(mock: &mut MockTransport) {
        let mut capability = Vec::new();
        for value in [20000u16, 12000, 1023, 800, 480] {
            capability.extend_from_slice(&value.to_le_bytes());
        }
        capability.push(150);
        mock.respond(REPORT_CAPABILITY, capability);
        mock.respond(REPORT_INFORMATION, vec![b'S', b'P', b'-', b'5', b'5', 0, 0, 2, 1, 0, 7]);
        mock.respond(REPORT_SERIAL, vec![b'A', b'0', b'0', b'4', 0]);
        mock.respond(REPORT_BACKGROUND_COLOR, vec![0xff, 0xff, 0xff]);
        mock.respond(REPORT_PEN_COLOR_WIDTH, vec![0, 0, 0, 1]);
        mock.respond(REPORT_BRIGHTNESS, vec![2]);
        mock.respond(REPORT_INK_MODE, vec![1]);
        mock.respond(REPORT_WRITING_MODE, vec![0]);
        let mut area = Vec::new();
        for value in [0u16, 0, 799, 479] {
            area.extend_from_slice(&value.to_le_bytes());
        }
        mock.respond(REPORT_WRITING_AREA, area);
    }

    #[test]
    fn test_full_negotiation() {
        let mut mock = MockTransport::connected();
        script_negotiation(&mut mock);
        let profile = negotiate(&mut mock, &Config::default()).unwrap();
        assert_eq!(profile.name, "SP-55");
        assert_eq!(profile.firmware, "2.1.0.7");
        assert_eq!(profile.serial, "A004");
        assert_eq!((profile.scale_x, profile.scale_y), (25.0, 25.0));
        assert_eq!(profile.status_layout, StatusLayout::Timing);
        assert_eq!(profile.pen_width, 1);
        assert!(profile.ink_enabled);
        assert!(profile.area_unrestricted());
    }

    #[test]
    fn test_axes_scaled_independently() {
        let mut mock = MockTransport::connected();
        script_negotiation(&mut mock);
        // Replace capability: tablet 16000x12000 on an 800x480 display.
        let mut capability = Vec::new();
        for value in [16000u16, 12000, 1023, 800, 480] {
            capability.extend_from_slice(&value.to_le_bytes());
        }
        capability.push(150);
        mock.responses.get_mut(&REPORT_CAPABILITY).unwrap()[0] = capability;

        let profile = negotiate(&mut mock, &Config::default()).unwrap();
        assert_eq!(profile.scale_x, 20.0);
        assert_eq!(profile.scale_y, 25.0);
    }

    #[test]
    fn test_missing_read_aborts() {
        let mut mock = MockTransport::connected();
        script_negotiation(&mut mock);
        mock.responses.remove(&REPORT_SERIAL);
        assert!(matches!(
            negotiate(&mut mock, &Config::default()),
            Err(PadError::ProtocolMismatch(_))
        ));
    }

    #[test]
    fn test_not_connected() {
        let mut mock = MockTransport::default();
        assert!(matches!(
            negotiate(&mut mock, &Config::default()),
            Err(PadError::NotConnected)
        ));
    }

    #[test]
    fn test_layout_for_firmware() {
        assert_eq!(layout_for_firmware("1.9.0.0"), StatusLayout::Legacy);
        assert_eq!(layout_for_firmware("2.0.0.0"), StatusLayout::Timing);
        assert_eq!(layout_for_firmware("garbage"), StatusLayout::Legacy);
    }

    #[test]
    fn test_layout_override() {
        let mut mock = MockTransport::connected();
        script_negotiation(&mut mock);
        let config = Config {
            status_layout: Some(StatusLayout::Legacy),
            ..Config::default()
        };
        let profile = negotiate(&mut mock, &config).unwrap();
        assert_eq!(profile.status_layout, StatusLayout::Legacy);
    }
}
