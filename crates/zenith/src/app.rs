//! Main application logic and lifecycle management.
//!
//! This module contains the core `Application` struct that orchestrates
//! region loading, registry startup, background maintenance tasks, and
//! graceful shutdown.

use crate::{
    cli::CliArgs,
    config::AppConfig,
    hosted::HostedRegion,
    logging::display_banner,
    regions::load_region_descriptors,
    signals::{setup_signal_handlers, setup_signal_handlers_silent},
};
use region_registry::{create_registry, RegionRegistry};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tracing::{error, info, warn};

/// Main application struct for the world server.
///
/// The `Application` manages the complete lifecycle of the Zenith server:
/// configuration loading, region descriptor loading, registry population,
/// maintenance tasks, and graceful shutdown handling.
///
/// # Architecture
///
/// * **Configuration Management**: Loads and validates configuration from files and CLI
/// * **Region Orchestration**: Loads descriptors and brings hosted regions online
/// * **Supervision**: Relaunches regions that request a restart
/// * **Graceful Shutdown**: Handles termination signals and cleanup procedures
pub struct Application {
    /// Loaded application configuration
    config: AppConfig,
    /// Registry tracking every hosted region
    registry: Arc<RegionRegistry>,
    /// Directory the region descriptors load from
    regions_dir: PathBuf,
    /// Whether descriptor loading may prompt on stdin
    non_interactive: bool,
}

impl Application {
    /// Creates a new application instance.
    ///
    /// Loads configuration, applies CLI overrides, validates settings, and
    /// creates the region registry.
    ///
    /// # Process
    ///
    /// 1. Load configuration from file (creating default if missing)
    /// 2. Apply command-line argument overrides
    /// 3. Validate merged configuration
    /// 4. Display startup banner
    /// 5. Create the region registry
    pub async fn new(args: CliArgs) -> Result<Self, Box<dyn std::error::Error>> {
        info!("🔧 Loading configuration from: {}", args.config_path.display());
        let mut config = AppConfig::load_from_file(&args.config_path).await?;

        info!(
            "✅ Configuration loaded successfully from {}",
            args.config_path.display()
        );

        // Apply CLI overrides
        if let Some(regions_dir) = args.regions_dir {
            config.world.regions_directory = regions_dir.to_string_lossy().to_string();
        }

        if let Some(log_level) = args.log_level {
            config.logging.level = log_level;
        }

        if args.json_logs {
            config.logging.json_format = true;
        }

        // Validate configuration
        if let Err(e) = config.validate() {
            return Err(format!("Configuration validation failed: {e}").into());
        } else {
            info!("✅ Configuration loaded and validated successfully");
        }

        // Display banner after logging is setup
        display_banner();

        let registry = create_registry();
        let regions_dir = PathBuf::from(&config.world.regions_directory);

        // Log startup information
        info!("🚀 Zenith World Server v1.0.0 - Community Edition");
        info!("🏗️ Architecture: Region Registry + Hosted Regions");
        info!(
            "📂 Config: {} | Regions: {}",
            args.config_path.display(),
            regions_dir.display()
        );

        Ok(Self {
            config,
            registry,
            regions_dir,
            non_interactive: args.non_interactive,
        })
    }

    /// Runs the application until a shutdown signal arrives.
    ///
    /// Loads every region descriptor, brings the regions online in the
    /// registry, starts the supervision and maintenance tasks, waits for
    /// shutdown signals, and performs graceful cleanup.
    ///
    /// # Background Tasks
    ///
    /// * **Supervisor**: Relaunches regions that raised a restart request
    /// * **Backup**: Periodic world backups across tracked regions
    /// * **Monitoring**: Real-time registry statistics every 60 seconds
    pub async fn run(self) -> Result<(), Box<dyn std::error::Error>> {
        info!("🌟 Starting Zenith World Server Application");

        // Display configuration summary
        self.log_configuration_summary();

        let registry = self.registry;

        // Subscribe before any region comes online so no restart request
        // raised during startup is missed.
        let mut restart_events = registry.subscribe_restarts();

        // Load descriptors and bring the regions online
        let descriptors = load_region_descriptors(&self.regions_dir, self.non_interactive).await?;

        let mut online_handles = Vec::new();
        for descriptor in descriptors {
            let region_name = descriptor.region_name.clone();
            let handle = descriptor.region_handle();
            let region = HostedRegion::new(descriptor);
            match registry.add(region).await {
                Ok(()) => {
                    if let Ok(handle) = handle {
                        online_handles.push(handle);
                    }
                }
                Err(e) => error!("❌ Skipping region '{}': {}", region_name, e),
            }
        }

        if registry.region_count().await == 0 {
            return Err("No regions came online; nothing to serve".into());
        }

        if self.config.world.announce_on_start {
            for handle in online_handles {
                registry.announce_online(handle).await;
            }
        }

        // Supervisor: relaunch regions that requested a restart
        let supervisor_handle = {
            let registry = registry.clone();
            tokio::spawn(async move {
                loop {
                    match restart_events.recv().await {
                        Ok(event) => {
                            info!(
                                "🔄 Relaunching region '{}' after restart request",
                                event.descriptor.region_name
                            );
                            let region = HostedRegion::new(event.descriptor);
                            if let Err(e) = registry.add(region).await {
                                error!("❌ Failed to relaunch region: {}", e);
                            }
                        }
                        Err(RecvError::Lagged(skipped)) => {
                            warn!("⚠️ Restart supervisor lagged, {} requests dropped", skipped);
                        }
                        Err(RecvError::Closed) => break,
                    }
                }
            })
        };

        // Periodic backups across every tracked region
        let backup_handle = if self.config.world.backup_interval_secs > 0 {
            let registry = registry.clone();
            let interval_secs = self.config.world.backup_interval_secs;
            Some(tokio::spawn(async move {
                let mut interval =
                    tokio::time::interval(tokio::time::Duration::from_secs(interval_secs));
                // The first tick completes immediately
                interval.tick().await;
                loop {
                    interval.tick().await;
                    info!("💾 Periodic backup starting");
                    registry.backup_targets().await;
                }
            }))
        } else {
            None
        };

        // Start monitoring task for real-time statistics
        let monitoring_handle = {
            let registry = registry.clone();
            tokio::spawn(async move {
                let mut interval = tokio::time::interval(tokio::time::Duration::from_secs(60));
                loop {
                    interval.tick().await;

                    let names = registry.region_names().await;
                    info!(
                        "📊 System Health - {} regions online | {}",
                        names.len(),
                        names.join(", ")
                    );
                }
            })
        };

        // Display ready message
        info!("✅ Zenith World Server is now running!");
        info!("🌍 Tracking {} regions", registry.region_count().await);
        info!("🔍 Health monitoring active - stats every 60 seconds");
        info!("🛑 Press Ctrl+C to gracefully shutdown");

        // Wait for shutdown signal
        setup_signal_handlers().await?;

        // merciless shutdown
        tokio::spawn(async move {
            if let Err(e) = setup_signal_handlers_silent().await {
                error!("Failed to set up merciless shutdown signal handler: {e}");
                return;
            }

            warn!("Shutdown handler received again! I'll make this quick.");
            std::process::exit(1);
        });

        info!("🛑 Shutdown signal received, beginning graceful shutdown...");

        // Phase 1: Stop background tasks so nothing relaunches or backs up
        // mid-teardown
        info!("📡 Phase 1: Stopping supervisor and maintenance tasks...");
        supervisor_handle.abort();
        monitoring_handle.abort();
        if let Some(handle) = backup_handle {
            handle.abort();
        }

        // Phase 2: Final backup while every region is still online
        info!("💾 Phase 2: Final backup across tracked regions...");
        registry.backup_targets().await;

        // Display final statistics
        log_final_statistics(&registry).await;

        // Phase 3: Drain the registry, shutting every region down
        info!("🧹 Phase 3: Closing all tracked regions...");
        registry.close_all().await;

        info!("✅ Zenith World Server shutdown complete");
        info!("👋 Thank you for using Zenith World Server!");

        Ok(())
    }

    /// Logs the configuration summary at startup.
    fn log_configuration_summary(&self) {
        info!("📋 Configuration Summary:");
        info!("  📂 Regions directory: {}", self.regions_dir.display());
        info!(
            "  💾 Backup interval: {}s",
            self.config.world.backup_interval_secs
        );
        info!(
            "  🌐 Announce on start: {}",
            self.config.world.announce_on_start
        );
        info!("  🔍 Interactive prompts: {}", !self.non_interactive);
    }
}

/// Logs final statistics during shutdown.
async fn log_final_statistics(registry: &Arc<RegionRegistry>) {
    info!("📊 Final Statistics:");
    info!("  - Regions tracked: {}", registry.region_count().await);
    info!("  - Root avatars present: {}", registry.avatars().await.len());
}
