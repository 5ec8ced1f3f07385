// Config module for shared configuration and directory layout

use crate::constants;
use crate::verify::HashAlgorithm;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root data directory for aim.
///
/// `AIM_DIR` overrides the default (used by the test suite); otherwise
/// everything lives under the platform data dir, e.g. ~/.local/share/aim.
pub fn data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("AIM_DIR") {
        return PathBuf::from(dir);
    }
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("aim")
}

pub fn apps_dir() -> PathBuf {
    data_dir().join(constants::APPS_DIR)
}

pub fn cache_dir() -> PathBuf {
    data_dir().join(constants::CACHE_DIR)
}

pub fn downloads_dir() -> PathBuf {
    data_dir().join(constants::DOWNLOADS_DIR)
}

pub fn config_path() -> PathBuf {
    data_dir().join(constants::CONFIG_FILE)
}

/// App state file for an installed app.
pub fn app_state_path(name: &str) -> PathBuf {
    apps_dir().join(format!("{}.json", name))
}

/// Tool configuration loaded from config.toml.
///
/// Missing file or missing keys fall back to defaults; aim never writes
/// this file on its own.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Cache entry time-to-live in hours.
    pub ttl_hours: u64,
    /// Algorithm assumed when a checksum file does not name one.
    pub default_algorithm: HashAlgorithm,
    /// When true, per-file checksum suffixes only count if the base name
    /// itself looks like an AppImage file.
    pub strict_checksum_detection: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ttl_hours: constants::DEFAULT_TTL_HOURS,
            default_algorithm: HashAlgorithm::Sha256,
            strict_checksum_detection: false,
        }
    }
}

impl Config {
    pub fn load() -> Self {
        let path = config_path();
        match std::fs::read_to_string(&path) {
            Ok(text) => match toml::from_str(&text) {
                Ok(config) => config,
                Err(e) => {
                    log::warn!("Ignoring malformed {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.ttl_hours, constants::DEFAULT_TTL_HOURS);
        assert_eq!(config.default_algorithm, HashAlgorithm::Sha256);
        assert!(!config.strict_checksum_detection);
    }

    #[test]
    fn test_partial_config_parses() {
        let config: Config = toml::from_str("ttl_hours = 48").unwrap();
        assert_eq!(config.ttl_hours, 48);
        assert_eq!(config.default_algorithm, HashAlgorithm::Sha256);
    }
}
