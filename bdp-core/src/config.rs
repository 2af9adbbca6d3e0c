//! Configuration management.

use crate::error::{BdpError, Result};
use crate::paths;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Persistent configuration for bdp.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub framework_dir: String,
    pub conf_dir: String,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            framework_dir: paths::frameworks_dir().to_string_lossy().to_string(),
            conf_dir: paths::conf_dir().to_string_lossy().to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        paths::config_path()
    }

    /// Load configuration from disk, falling back to defaults.
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&path).map_err(|e| BdpError::InvalidConfig {
            reason: format!("Failed to read config: {}", e),
        })?;
        serde_json::from_str(&content).map_err(|e| BdpError::InvalidConfig {
            reason: format!("Failed to parse config: {}", e),
        })
    }

    /// Save configuration to disk.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| BdpError::io(parent, e))?;
        }
        let content = serde_json::to_string_pretty(self).map_err(|e| BdpError::InvalidConfig {
            reason: format!("Failed to serialize config: {}", e),
        })?;
        std::fs::write(&path, content).map_err(|e| BdpError::io(path, e))
    }
}
