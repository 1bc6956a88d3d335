//! Configuration management for the Zenith world server.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::info;

/// Default backup interval for serde deserialization
fn default_backup_interval_secs() -> u64 {
    300
}

/// Default announce flag for serde deserialization
fn default_announce_on_start() -> bool {
    true
}

/// World hosting settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldSettings {
    /// Directory holding one TOML descriptor file per region
    pub regions_directory: String,
    /// Seconds between automatic backups across tracked regions (0 disables)
    #[serde(default = "default_backup_interval_secs")]
    pub backup_interval_secs: u64,
    /// Whether regions announce themselves to their neighbors at startup
    #[serde(default = "default_announce_on_start")]
    pub announce_on_start: bool,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Whether to use JSON formatting
    pub json_format: bool,
}

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub world: WorldSettings,
    pub logging: LoggingSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            world: WorldSettings {
                regions_directory: "regions".to_string(),
                backup_interval_secs: default_backup_interval_secs(),
                announce_on_start: default_announce_on_start(),
            },
            logging: LoggingSettings {
                level: "info".to_string(),
                json_format: false,
            },
        }
    }
}

impl AppConfig {
    /// Loads configuration from a TOML file, creating a default file if it
    /// doesn't exist.
    pub async fn load_from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        if path.exists() {
            let content = tokio::fs::read_to_string(path).await?;
            let config: AppConfig = toml::from_str(&content)?;
            Ok(config)
        } else {
            let default_config = AppConfig::default();
            let toml_content = toml::to_string_pretty(&default_config)?;
            tokio::fs::write(path, toml_content).await?;
            info!("Created default configuration file: {}", path.display());
            Ok(default_config)
        }
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.world.regions_directory.trim().is_empty() {
            return Err("Regions directory cannot be empty".to_string());
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(format!(
                "Invalid log level: {}. Must be one of: {:?}",
                self.logging.level, valid_levels
            ));
        }

        Ok(())
    }
}
