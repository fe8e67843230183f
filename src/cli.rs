//! Command-line interface definitions using clap
//!
//! Flags mirror the configuration keys and win over both the config file
//! and `FOXESS__*` environment overrides.

use clap::{Parser, Subcommand};

use crate::config::StaticConfig;
use crate::config::validators::parse_inverters;

/// FoxESS Cloud exporter - Prometheus metrics for FoxESS inverters
#[derive(Parser, Debug)]
#[command(name = "foxesscloud_exporter")]
#[command(version)]
#[command(about = "Prometheus exporter for FoxESS Cloud inverters", long_about = None)]
pub struct Cli {
    /// Path to the TOML config file (default: config.toml if present)
    #[arg(long, short = 'c', global = true, env = "CONFIG_PATH")]
    pub config: Option<String>,

    /// Address on which to expose metrics and web interface
    #[arg(long = "web.listen-address", global = true, env = "WEB_LISTEN_ADDRESS")]
    pub listen_address: Option<String>,

    /// Path under which to expose metrics
    #[arg(long = "web.telemetry-path", global = true, env = "WEB_TELEMETRY_PATH")]
    pub telemetry_path: Option<String>,

    /// Comma separated list of inverter serial numbers
    #[arg(long, global = true, env = "INVERTERS")]
    pub inverters: Option<String>,

    /// FoxESS Cloud API token
    #[arg(long = "api-token", global = true, env = "API_TOKEN", hide_env_values = true)]
    pub api_token: Option<String>,

    /// How often to fetch the API, e.g. "10s"
    #[arg(long = "api-fetch-interval", global = true, env = "API_FETCH_INTERVAL")]
    pub fetch_interval: Option<String>,

    /// How long to wait for one API fetch, e.g. "5s"
    #[arg(long = "api-fetch-timeout", global = true, env = "API_FETCH_TIMEOUT")]
    pub fetch_timeout: Option<String>,

    /// Log level (trace, debug, info, warn, error) or an EnvFilter directive
    #[arg(long = "log-level", global = true, env = "LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Static labels applied to every metric: "label1=value1 label2=value2"
    #[arg(long = "default-labels", global = true, env = "DEFAULT_LABELS")]
    pub default_labels: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the exporter (default)
    Server,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

/// Configuration management commands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Generate example configuration file
    Generate {
        /// Output path (default: config.example.toml)
        output_path: Option<String>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

impl Cli {
    /// Apply command-line overrides on top of a loaded config.
    pub fn apply_overrides(&self, config: &mut StaticConfig) {
        if let Some(ref addr) = self.listen_address {
            config.server.listen_address = addr.clone();
        }
        if let Some(ref path) = self.telemetry_path {
            config.server.telemetry_path = path.clone();
        }
        if let Some(ref inverters) = self.inverters {
            config.api.inverters = parse_inverters(inverters);
        }
        if let Some(ref token) = self.api_token {
            config.api.token = token.clone();
        }
        if let Some(ref interval) = self.fetch_interval {
            config.api.fetch_interval = interval.clone();
        }
        if let Some(ref timeout) = self.fetch_timeout {
            config.api.fetch_timeout = timeout.clone();
        }
        if let Some(ref level) = self.log_level {
            config.logging.level = level.clone();
        }
        if let Some(ref labels) = self.default_labels {
            config.api.default_labels = labels.clone();
        }
    }
}
