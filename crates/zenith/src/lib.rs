//! # Zenith World Server - Main Entry Point
//!
//! Virtual world server that loads region descriptors, brings hosted regions
//! online in a shared registry, and supervises their lifecycle. This entry
//! point handles CLI parsing, configuration loading, and application
//! lifecycle management.
//!
//! ## Quick Start
//!
//! ```bash
//! # Run with default configuration
//! zenith
//!
//! # Specify custom configuration
//! zenith --config production.toml
//!
//! # Override specific settings
//! zenith --regions /srv/zenith/regions --log-level debug
//!
//! # JSON logging for production
//! zenith --json-logs
//! ```
//!
//! ## Configuration
//!
//! The server loads configuration from a TOML file (default: `zenith.toml`).
//! If the file doesn't exist, a default configuration will be created. Each
//! region is described by its own TOML file in the regions directory; an
//! empty directory is seeded with a default region.
//!
//! ## Signal Handling
//!
//! The server handles graceful shutdown on:
//! - SIGINT (Ctrl+C)
//! - SIGTERM (Unix systems)
//!
//! ## Architecture
//!
//! * **Modular Design**: Separated concerns across focused modules
//! * **Registry-Driven**: Every region is tracked and commanded through one registry
//! * **Self-Healing**: Regions that request a restart are relaunched automatically

use tracing::error;

mod app;
mod cli;
mod config;
mod hosted;
mod logging;
mod regions;
mod signals;

use app::Application;
use cli::CliArgs;
use config::AppConfig;

/// Main entry point for the Zenith World Server.
///
/// Handles the complete application lifecycle including:
/// 1. Command-line argument parsing
/// 2. Configuration loading and validation
/// 3. Logging system initialization
/// 4. Application creation and execution
/// 5. Error handling and cleanup
///
/// # Exit Codes
///
/// * **0**: Successful execution and shutdown
/// * **1**: Error during startup, configuration, or runtime
///
/// Note: This function is called from an async context (main with #[tokio::main]),
/// so it should NOT have #[tokio::main] itself.
pub async fn init() -> Result<(), Box<dyn std::error::Error>> {

    // Parse CLI arguments first
    let args = CliArgs::parse();

    // Load configuration to get logging settings
    let config = AppConfig::load_from_file(&args.config_path)
        .await
        .unwrap_or_default();

    // Setup logging before anything else
    if let Err(e) = logging::setup_logging(&config.logging, args.json_logs) {
        eprintln!("❌ Failed to setup logging: {e}");
        std::process::exit(1);
    }

    // Create and run application
    match Application::new(args).await {
        Ok(app) => {
            if let Err(e) = app.run().await {
                error!("❌ Application error: {:?}", e);
                std::process::exit(1);
            }
        }
        Err(e) => {
            error!("❌ Failed to start application: {e:?}");
            std::process::exit(1);
        }
    }

    Ok(())
}

// Re-export main types for potential library usage
pub use config::{LoggingSettings, WorldSettings};
pub use hosted::HostedRegion;
pub use regions::{load_region_descriptors, PromptSource, TomlOptionSource};

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[tokio::test]
    async fn test_default_config() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());

        assert_eq!(config.world.regions_directory, "regions");
        assert_eq!(config.world.backup_interval_secs, 300);
        assert!(config.world.announce_on_start);
    }

    #[tokio::test]
    async fn test_config_validation() {
        let mut config = AppConfig::default();

        // Test invalid log level
        config.logging.level = "invalid".to_string();
        assert!(config.validate().is_err());

        // Test empty regions directory
        config.logging.level = "info".to_string();
        config.world.regions_directory = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_cli_parsing() {
        // Test CLI argument structure
        let args = CliArgs {
            config_path: PathBuf::from("test.toml"),
            regions_dir: Some(PathBuf::from("test_regions")),
            log_level: Some("debug".to_string()),
            json_logs: true,
            non_interactive: true,
        };

        assert_eq!(args.config_path, PathBuf::from("test.toml"));
        assert_eq!(args.regions_dir, Some(PathBuf::from("test_regions")));
        assert_eq!(args.log_level, Some("debug".to_string()));
        assert!(args.json_logs);
        assert!(args.non_interactive);
    }

    #[tokio::test]
    async fn test_application_creation() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let config_path = dir.path().join("test_config.toml");

        // Create a test config file
        let test_config = AppConfig::default();
        let toml_content = toml::to_string_pretty(&test_config)
            .expect("Failed to serialize default config to TOML");
        tokio::fs::write(&config_path, toml_content)
            .await
            .expect("Failed to write test config file");

        let args = CliArgs {
            config_path,
            regions_dir: Some(dir.path().join("regions")),
            log_level: Some("debug".to_string()),
            json_logs: false,
            non_interactive: true,
        };

        let app = Application::new(args).await;
        assert!(app.is_ok());
    }
}
