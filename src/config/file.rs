use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::protocol::pen::StatusLayout;
use crate::stroke::PRESSURE_SPLIT_THRESHOLD;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    /// Force a status-word layout instead of deriving it from the
    /// firmware version at negotiation.
    pub status_layout: Option<StatusLayout>,
    /// Image transfer chunk size override (1..=255 bytes).
    pub image_chunk_size: Option<usize>,
    #[serde(default = "default_split_threshold")]
    pub pressure_split_threshold: f64,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            status_layout: None,
            image_chunk_size: None,
            pressure_split_threshold: PRESSURE_SPLIT_THRESHOLD,
        }
    }
}

fn default_split_threshold() -> f64 {
    PRESSURE_SPLIT_THRESHOLD
}

pub fn load_from_path(path: &Path) -> Option<FileConfig> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str(&content) {
        Ok(config) => {
            log::debug!("Loaded config from {}", path.display());
            Some(config)
        }
        Err(e) => {
            log::warn!("Failed to parse {}: {}", path.display(), e);
            None
        }
    }
}

pub fn load_from_default_paths() -> Option<FileConfig> {
    for path in default_config_paths() {
        if path.exists() {
            if let Some(config) = load_from_path(&path) {
                return Some(config);
            }
        }
    }
    None
}

fn default_config_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    paths.push(PathBuf::from("sigpad.toml"));

    if let Ok(home) = std::env::var("HOME") {
        paths.push(PathBuf::from(home).join(".config").join("sigpad.toml"));
    }

    paths
}
