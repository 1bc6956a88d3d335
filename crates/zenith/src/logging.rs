//! Logging setup and banner display for the Zenith world server.

use crate::config::LoggingSettings;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Sets up the logging system based on configuration
pub fn setup_logging(
    settings: &LoggingSettings,
    json_override: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let log_level = &settings.level;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let use_json = settings.json_format || json_override;
    if use_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_ansi(true))
            .init();
    }

    info!("🔧 Logging initialized with level: {}", log_level);
    Ok(())
}

/// Displays the startup banner
pub fn display_banner() {
    info!("╔════════════════════════════════════════════════════════════╗");
    info!("║                 🌍 ZENITH WORLD SERVER 🌍                  ║");
    info!("║              Region Registry & Coordination                ║");
    info!("║                                                            ║");
    info!("║  Version: {:<48} ║", env!("CARGO_PKG_VERSION"));
    info!("║  Build:   {:<48} ║", "Community Edition");
    info!("╚════════════════════════════════════════════════════════════╝");
}
