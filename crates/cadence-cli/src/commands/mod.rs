use std::path::{Path, PathBuf};

use cadence_core::{ConfigError, EngineConfig};

pub mod config;
pub mod energy;
pub mod optimize;

pub type CommandResult = Result<(), Box<dyn std::error::Error>>;

/// The `--config` path, or the default location.
pub fn config_path(explicit: Option<&Path>) -> Result<PathBuf, ConfigError> {
    match explicit {
        Some(path) => Ok(path.to_path_buf()),
        None => EngineConfig::default_path(),
    }
}

pub fn load_config(explicit: Option<&Path>) -> Result<EngineConfig, ConfigError> {
    EngineConfig::load_from(&config_path(explicit)?)
}

pub fn read_input(path: &Path) -> Result<String, Box<dyn std::error::Error>> {
    std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read {}: {e}", path.display()).into())
}
