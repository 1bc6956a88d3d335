//! Command-line interface for the Zenith world server.

use clap::{Arg, ArgAction, Command};
use std::path::PathBuf;

/// Parsed command-line arguments
#[derive(Debug, Clone)]
pub struct CliArgs {
    /// Path to the configuration file
    pub config_path: PathBuf,
    /// Override for the region descriptor directory
    pub regions_dir: Option<PathBuf>,
    /// Override for the log level
    pub log_level: Option<String>,
    /// Force JSON log output
    pub json_logs: bool,
    /// Skip interactive prompts while loading region descriptors
    pub non_interactive: bool,
}

impl CliArgs {
    /// Parses command-line arguments
    pub fn parse() -> Self {
        let matches = Command::new("Zenith World Server")
            .version("1.0.0")
            .author("Zenith Team <team@zenith.dev>")
            .about("Region registry and lifecycle coordinator for virtual worlds")
            .arg(
                Arg::new("config")
                    .short('c')
                    .long("config")
                    .value_name("FILE")
                    .help("Configuration file path")
                    .default_value("zenith.toml"),
            )
            .arg(
                Arg::new("regions")
                    .short('r')
                    .long("regions")
                    .value_name("DIR")
                    .help("Directory holding region descriptor files"),
            )
            .arg(
                Arg::new("log-level")
                    .short('l')
                    .long("log-level")
                    .value_name("LEVEL")
                    .help("Log level (trace, debug, info, warn, error)"),
            )
            .arg(
                Arg::new("json-logs")
                    .long("json-logs")
                    .help("Output logs in JSON format")
                    .action(ArgAction::SetTrue),
            )
            .arg(
                Arg::new("non-interactive")
                    .long("non-interactive")
                    .help("Never prompt for missing region options; use defaults")
                    .action(ArgAction::SetTrue),
            )
            .get_matches();

        let config_path = PathBuf::from(
            matches
                .get_one::<String>("config")
                .map(String::as_str)
                .unwrap_or("zenith.toml"),
        );
        let regions_dir = matches.get_one::<String>("regions").map(PathBuf::from);
        let log_level = matches.get_one::<String>("log-level").cloned();
        let json_logs = matches.get_flag("json-logs");
        let non_interactive = matches.get_flag("non-interactive");

        Self {
            config_path,
            regions_dir,
            log_level,
            json_logs,
            non_interactive,
        }
    }
}
