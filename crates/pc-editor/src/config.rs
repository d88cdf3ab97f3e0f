//! Engine configuration, read from a TOML file.
//!
//! Every field has a default, so an empty or partial file is valid and a
//! missing file simply yields `EngineConfig::default()`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("cannot write configuration: {0}")]
    Serialize(#[from] toml::ser::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum number of snapshots kept in history, the initial state
    /// included. `None` keeps everything.
    pub history_limit: Option<usize>,
    /// `env_logger` filter used by the replay binary when `RUST_LOG` is unset.
    pub log_filter: String,
    /// Send the full read model when a session starts.
    pub emit_initial_state: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            history_limit: None,
            log_filter: "info".to_owned(),
            emit_initial_state: true,
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Load from `path`. A missing file yields the defaults; an unreadable
    /// or malformed one is an error.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let config = Self::from_toml_str(&content)?;
                log::info!("configuration loaded from {}", path.display());
                Ok(config)
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                log::info!("no configuration at {}, using defaults", path.display());
                Ok(Self::default())
            }
            Err(source) => Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// The configuration as a TOML file, as printed by `pc-replay --print-config`.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}
