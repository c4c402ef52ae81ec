//! Loading game configuration from disk.

use std::path::Path;

use thiserror::Error;

use hex_core::config::GameConfig;
use hex_core::error::GameError;

/// Error type for config file operations.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// File not found.
    #[error("Config file not found: {0}")]
    FileNotFound(String),
    /// Failed to read file.
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),
    /// The file parsed but was rejected.
    #[error(transparent)]
    Invalid(#[from] GameError),
}

/// Load and validate a RON `GameConfig` from `path`.
pub fn load_game_config<P: AsRef<Path>>(path: P) -> Result<GameConfig, ConfigError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }
    let contents = std::fs::read_to_string(path)?;
    let config = GameConfig::from_ron_str(&path.display().to_string(), &contents)?;
    tracing::debug!(path = %path.display(), "Loaded game config");
    Ok(config)
}
