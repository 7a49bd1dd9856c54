//! Replay a raw input-report dump through the decoder and stroke engine.
//!
//! Dump format: one report per line, `<report-id-hex> <payload-hex…>`,
//! e.g. `01 8612 1388 09c4`. Blank lines and `#` comments are skipped.
//! Useful for debugging captures without a device attached.

use std::path::PathBuf;

use clap::Parser;

use sigpad::export::SigningOptions;
use sigpad::protocol::pen::decode_sample;
use sigpad::{Config, DeviceProfile, Rgb, StatusLayout, StrokeReconstructor, WritingArea};

#[derive(Parser)]
#[command(name = "sigpad-replay")]
#[command(about = "Replay a signature pad report dump and export the strokes as SVG")]
#[command(version)]
struct Cli {
    /// Dump file with one hex-encoded input report per line
    dump: PathBuf,

    /// Write the SVG here instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Status-word layout (legacy, timing)
    #[arg(long, value_parser = clap::value_parser!(StatusLayout))]
    layout: Option<StatusLayout>,

    /// Tablet resolution in tablet units
    #[arg(long, default_value_t = 20000)]
    tablet_max_x: u16,
    #[arg(long, default_value_t = 12000)]
    tablet_max_y: u16,

    /// Display resolution in pixels
    #[arg(long, default_value_t = 800)]
    display_width: u16,
    #[arg(long, default_value_t = 480)]
    display_height: u16,

    /// Maximum pressure in device units
    #[arg(long, default_value_t = 1023)]
    max_pressure: u16,

    /// Writing mode (0 = class widths, 1 = pressure widths)
    #[arg(long, default_value_t = 1)]
    writing_mode: u8,

    /// Ed25519 signing key as 64 hex chars; sign the export with it
    #[arg(long, env = "SIGPAD_SIGN_KEY")]
    sign_key: Option<String>,

    /// Path to config file
    #[arg(long, env = "SIGPAD_CONFIG")]
    config: Option<PathBuf>,
}

fn synthetic_profile(cli: &Cli, config: &Config) -> DeviceProfile {
    DeviceProfile {
        name: "replay".into(),
        firmware: "0.0.0.0".into(),
        serial: String::new(),
        tablet_max_x: cli.tablet_max_x,
        tablet_max_y: cli.tablet_max_y,
        max_pressure: cli.max_pressure,
        display_width: cli.display_width,
        display_height: cli.display_height,
        max_report_rate: 0,
        scale_x: cli.tablet_max_x as f64 / cli.display_width as f64,
        scale_y: cli.tablet_max_y as f64 / cli.display_height as f64,
        status_layout: cli.layout.or(config.status_layout).unwrap_or(StatusLayout::Timing),
        image_chunk_size: config.image_chunk_size,
        pen_color: Rgb::BLACK,
        pen_width: 1,
        background: Rgb::WHITE,
        backlight: 2,
        ink_enabled: true,
        writing_mode: cli.writing_mode,
        writing_area: WritingArea {
            x1: 0,
            y1: 0,
            x2: cli.display_width.saturating_sub(1),
            y2: cli.display_height.saturating_sub(1),
        },
    }
}

fn parse_line(line: &str) -> Option<(u8, Vec<u8>)> {
    let cleaned: String = line.chars().filter(|c| !c.is_whitespace()).collect();
    if cleaned.is_empty() || line.trim_start().starts_with('#') {
        return None;
    }
    let bytes = hex::decode(&cleaned).ok()?;
    let (&id, payload) = bytes.split_first()?;
    Some((id, payload.to_vec()))
}

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_deref());
    let profile = synthetic_profile(&cli, &config);
    log::info!(
        "Replaying {} ({} layout, {}x{} px)",
        cli.dump.display(),
        profile.status_layout,
        profile.display_width,
        profile.display_height
    );

    let content = std::fs::read_to_string(&cli.dump)?;
    let mut samples = Vec::new();
    let mut strokes = StrokeReconstructor::with_threshold(config.pressure_split_threshold);
    let mut skipped = 0u64;

    for (number, line) in content.lines().enumerate() {
        let Some((report_id, payload)) = parse_line(line) else {
            continue;
        };
        match decode_sample(&profile, report_id, &payload) {
            Ok(Some(sample)) => {
                strokes.feed(&sample, &profile);
                samples.push(sample);
            }
            Ok(None) => skipped += 1,
            Err(e) => {
                log::warn!("Line {}: {}", number + 1, e);
                skipped += 1;
            }
        }
    }

    let scene = strokes.snapshot();
    log::info!(
        "Decoded {} samples into {} stroke segments ({} reports skipped)",
        samples.len(),
        scene.len(),
        skipped
    );

    let signing = match &cli.sign_key {
        Some(key) => Some(SigningOptions {
            signing_key: Some(hex::decode(key)?),
            ..Default::default()
        }),
        None => None,
    };
    let doc = sigpad::export::export(&profile, &samples, &scene, signing.as_ref())?;

    match &cli.output {
        Some(path) => {
            std::fs::write(path, &doc)?;
            log::info!("Wrote {}", path.display());
        }
        None => print!("{}", doc),
    }

    Ok(())
}
