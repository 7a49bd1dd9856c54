mod file;

pub use file::FileConfig;

use std::path::Path;

use crate::protocol::pen::StatusLayout;
use crate::upload::DEFAULT_CHUNK_SIZE;

/// Merged driver configuration from a TOML file and programmatic overrides.
#[derive(Debug, Clone)]
pub struct Config {
    /// Force a status-word layout; `None` derives it from the firmware
    /// version at negotiation.
    pub status_layout: Option<StatusLayout>,
    /// Image transfer chunk size in bytes.
    pub image_chunk_size: usize,
    /// Stroke split threshold on the normalized 0..1 pressure scale.
    pub pressure_split_threshold: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_file(FileConfig::default())
    }
}

impl Config {
    /// Load configuration from an explicit path, falling back to the
    /// default paths, falling back to defaults.
    pub fn load(path: Option<&Path>) -> Self {
        let file_config = path
            .and_then(file::load_from_path)
            .or_else(file::load_from_default_paths)
            .unwrap_or_default();
        Self::from_file(file_config)
    }

    fn from_file(file: FileConfig) -> Self {
        Self {
            status_layout: file.status_layout,
            image_chunk_size: file.image_chunk_size.unwrap_or(DEFAULT_CHUNK_SIZE),
            pressure_split_threshold: file.pressure_split_threshold,
        }
    }

    pub fn validate(&self) -> Result<(), &'static str> {
        if self.image_chunk_size == 0 || self.image_chunk_size > 0xff {
            return Err("image_chunk_size must be in 1..=255");
        }
        if !(self.pressure_split_threshold > 0.0 && self.pressure_split_threshold < 1.0) {
            return Err("pressure_split_threshold must be in (0, 1)");
        }
        Ok(())
    }
}
