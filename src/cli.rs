//! CLI arguments and subcommands for container-state-exporter.
//!
//! This module defines the command-line interface structure using the clap library,
//! including all flags, options, and subcommands.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Log level options for CLI parsing
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Off => "off",
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Configuration format options for output
#[derive(Debug, Clone, ValueEnum)]
pub enum ConfigFormat {
    Yaml,
    Json,
    Toml,
}

/// Main CLI arguments structure
#[derive(Parser, Debug)]
#[command(
    name = "container-state-exporter",
    about = "Prometheus exporter for container lifecycle state",
    long_about = "Prometheus exporter for container lifecycle state.\n\n\
                  Exposes status, health, OOM-kill flag, restart count and start/finish \
                  times of every container on the host. Runtime queries are cached for a \
                  short window so frequent scrapes do not flood the container runtime.",
    version,
    propagate_version = true
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// The address to listen on for HTTP requests (e.g. ":8080" or "127.0.0.1:9417")
    #[arg(long)]
    pub listen_address: Option<String>,

    /// Log level (overrides log_level from the config file; default: info)
    #[arg(long, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Config file (YAML/JSON/TOML)
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Disable all config file loading
    #[arg(long)]
    pub no_config: bool,

    /// Print effective merged config and exit
    #[arg(long)]
    pub show_config: bool,

    /// Output format for --show-config
    #[arg(long, value_enum, default_value = "yaml")]
    pub config_format: ConfigFormat,

    /// Validate config and exit (return code 1 on error)
    #[arg(long)]
    pub check_config: bool,

    /// Docker daemon address (unix:///var/run/docker.sock, tcp://host:2375)
    #[arg(long)]
    pub docker_host: Option<String>,

    /// Reuse container snapshots for N milliseconds
    #[arg(long)]
    pub cache_ttl_ms: Option<u64>,

    /// Deadline in seconds for one list-and-inspect pass against the runtime
    #[arg(long)]
    pub runtime_timeout: Option<u64>,

    /// Only report running containers
    #[arg(long)]
    pub running_only: bool,

    /// Serve the last good snapshot when the runtime cannot be queried
    #[arg(long)]
    pub serve_stale: bool,

    /// Disable /health endpoint
    #[arg(long)]
    pub disable_health: bool,

    /// Disable internal container_state_exporter_* metrics
    #[arg(long)]
    pub disable_telemetry: bool,

    /// Enable TLS/SSL for HTTPS
    #[arg(long)]
    pub enable_tls: bool,

    /// Path to TLS certificate file (PEM format)
    #[arg(long)]
    pub tls_cert: Option<PathBuf>,

    /// Path to TLS private key file (PEM format)
    #[arg(long)]
    pub tls_key: Option<PathBuf>,
}

/// Subcommands for additional functionality
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check connectivity and permissions against the container runtime
    Check,

    /// Generate configuration files
    Config {
        /// Output file path ("-" for stdout)
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value = "yaml")]
        format: ConfigFormat,

        /// Include comments
        #[arg(long)]
        commented: bool,
    },

    /// Run collections against the runtime and print a summary
    Test {
        /// Number of test iterations
        #[arg(short = 'n', long, default_value_t = 1)]
        iterations: usize,

        /// Show per-container details
        #[arg(long)]
        verbose: bool,

        /// Print the rendered metrics of the last iteration
        #[arg(long)]
        print_metrics: bool,
    },
}
