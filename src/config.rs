//! Configuration management for container-state-exporter.
//!
//! This module handles loading, merging, and validating configuration from files
//! and CLI arguments. It supports YAML, JSON, and TOML formats.

use crate::cli::{Args, ConfigFormat, LogLevel};
use clap::ValueEnum;
use container_state_exporter::CollectorOptions;
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

// Default configuration constants
pub const DEFAULT_LISTEN_ADDRESS: &str = ":8080";
pub const DEFAULT_CACHE_TTL_MS: u64 = 1000;
pub const DEFAULT_RUNTIME_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_LOG_LEVEL: LogLevel = LogLevel::Info;

/// Exporter configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // Server configuration
    #[serde(alias = "listen-address")]
    pub listen_address: Option<String>,

    // Container runtime
    #[serde(alias = "docker-host")]
    pub docker_host: Option<String>,
    #[serde(alias = "all-containers")]
    pub all_containers: Option<bool>,
    #[serde(alias = "runtime-timeout-secs")]
    pub runtime_timeout_secs: Option<u64>,

    // Snapshot cache
    #[serde(alias = "cache-ttl-ms")]
    pub cache_ttl_ms: Option<u64>,
    #[serde(alias = "serve-stale-on-error")]
    pub serve_stale_on_error: Option<bool>,

    // Feature flags
    #[serde(alias = "enable-health")]
    pub enable_health: Option<bool>,
    #[serde(alias = "enable-telemetry")]
    pub enable_telemetry: Option<bool>,

    // Logging
    pub log_level: Option<String>,

    // TLS/SSL Configuration
    #[serde(alias = "enable-tls")]
    pub enable_tls: Option<bool>,
    #[serde(alias = "tls-cert-path")]
    pub tls_cert_path: Option<String>,
    #[serde(alias = "tls-key-path")]
    pub tls_key_path: Option<String>,

    /// File this configuration was read from, if any.
    #[serde(skip)]
    pub loaded_from: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_address: Some(DEFAULT_LISTEN_ADDRESS.to_string()),
            docker_host: None,
            all_containers: Some(true),
            runtime_timeout_secs: Some(DEFAULT_RUNTIME_TIMEOUT_SECS),
            cache_ttl_ms: Some(DEFAULT_CACHE_TTL_MS),
            serve_stale_on_error: Some(false),
            enable_health: Some(true),
            enable_telemetry: Some(true),
            log_level: Some(DEFAULT_LOG_LEVEL.as_str().into()),
            enable_tls: Some(false),
            tls_cert_path: None,
            tls_key_path: None,
            loaded_from: None,
        }
    }
}

impl Config {
    /// Collector settings derived from this configuration.
    pub fn collector_options(&self) -> CollectorOptions {
        CollectorOptions {
            ttl: Duration::from_millis(self.cache_ttl_ms.unwrap_or(DEFAULT_CACHE_TTL_MS)),
            fetch_timeout: self.runtime_timeout(),
            serve_stale_on_error: self.serve_stale_on_error.unwrap_or(false),
        }
    }

    pub fn runtime_timeout(&self) -> Duration {
        Duration::from_secs(
            self.runtime_timeout_secs
                .unwrap_or(DEFAULT_RUNTIME_TIMEOUT_SECS),
        )
    }

    /// Effective log level.
    pub fn log_level(&self) -> Result<LogLevel, String> {
        match self.log_level.as_deref() {
            None => Ok(DEFAULT_LOG_LEVEL),
            Some(level) => LogLevel::from_str(level, true).map_err(|_| {
                format!(
                    "Invalid log_level '{}', expected off, error, warn, info, debug or trace",
                    level
                )
            }),
        }
    }

    /// Effective listen address, resolved to a socket address.
    pub fn listen_addr(&self) -> Result<SocketAddr, String> {
        parse_listen_address(
            self.listen_address
                .as_deref()
                .unwrap_or(DEFAULT_LISTEN_ADDRESS),
        )
    }
}

/// Parses a listen address. A bare `:port` binds all interfaces.
pub fn parse_listen_address(addr: &str) -> Result<SocketAddr, String> {
    let full = if addr.starts_with(':') {
        format!("0.0.0.0{}", addr)
    } else {
        addr.to_string()
    };
    full.parse()
        .map_err(|e| format!("Invalid listen address '{}': {}", addr, e))
}

/// Validate effective config (used by --check-config and at startup)
pub fn validate_effective_config(cfg: &Config) -> Result<(), Box<dyn std::error::Error>> {
    cfg.listen_addr()?;
    cfg.log_level()?;

    if cfg.cache_ttl_ms == Some(0) {
        return Err("cache_ttl_ms must be greater than 0".into());
    }
    if cfg.runtime_timeout_secs == Some(0) {
        return Err("runtime_timeout_secs must be greater than 0".into());
    }

    if let Some(host) = cfg.docker_host.as_deref() {
        let supported = ["unix://", "tcp://", "http://"];
        if !supported.iter().any(|scheme| host.starts_with(scheme)) {
            return Err(format!(
                "Invalid docker_host '{}', expected unix://, tcp:// or http://",
                host
            )
            .into());
        }
    }

    // TLS validation
    if cfg.enable_tls.unwrap_or(false) {
        let cert_path = cfg.tls_cert_path.as_deref();
        let key_path = cfg.tls_key_path.as_deref();

        match (cert_path, key_path) {
            (None, None) => {
                return Err(
                    "TLS is enabled but neither tls_cert_path nor tls_key_path are set".into(),
                );
            }
            (Some(_), None) => {
                return Err("TLS is enabled but tls_key_path is not set".into());
            }
            (None, Some(_)) => {
                return Err("TLS is enabled but tls_cert_path is not set".into());
            }
            (Some(cert), Some(key)) => {
                check_pem_file(cert, "certificate")?;
                check_pem_file(key, "private key")?;
            }
        }
    }

    Ok(())
}

fn check_pem_file(path: &str, what: &str) -> Result<(), Box<dyn std::error::Error>> {
    match fs::metadata(Path::new(path)) {
        Ok(meta) if meta.len() == 0 => Err(format!("TLS {} file is empty: {}", what, path).into()),
        Ok(_) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(format!("TLS {} file not found: {}", what, path).into())
        }
        Err(e) => Err(format!("TLS {} file is not readable: {} ({})", what, path, e).into()),
    }
}

/// Resolves configuration from CLI args, config file, and defaults.
/// This enforces precedence: CLI (if provided) > config file > default.
pub fn resolve_config(args: &Args) -> Result<Config, Box<dyn std::error::Error>> {
    let mut config = if args.no_config {
        Config::default()
    } else {
        load_config(args.config.as_deref())?
    };

    if let Some(level) = args.log_level {
        config.log_level = Some(level.as_str().to_string());
    }
    if let Some(addr) = &args.listen_address {
        config.listen_address = Some(addr.clone());
    }
    if let Some(host) = &args.docker_host {
        config.docker_host = Some(host.clone());
    }
    if let Some(ttl) = args.cache_ttl_ms {
        config.cache_ttl_ms = Some(ttl);
    }
    if let Some(timeout) = args.runtime_timeout {
        config.runtime_timeout_secs = Some(timeout);
    }
    if args.running_only {
        config.all_containers = Some(false);
    }
    if args.serve_stale {
        config.serve_stale_on_error = Some(true);
    }

    // Feature flags
    if args.disable_health {
        config.enable_health = Some(false);
    }
    if args.disable_telemetry {
        config.enable_telemetry = Some(false);
    }

    // TLS configuration: CLI wins if provided
    if args.enable_tls {
        config.enable_tls = Some(true);
    }
    if let Some(cert_path) = &args.tls_cert {
        config.tls_cert_path = Some(cert_path.to_string_lossy().to_string());
    }
    if let Some(key_path) = &args.tls_key {
        config.tls_key_path = Some(key_path.to_string_lossy().to_string());
    }

    Ok(config)
}

/// Loads a config file, falling back to default locations and then defaults.
pub fn load_config(path: Option<&Path>) -> Result<Config, Box<dyn std::error::Error>> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => {
            let defaults = [
                "/etc/container-state-exporter/config.yaml",
                "/etc/container-state-exporter/config.yml",
                "/etc/container-state-exporter/config.json",
                "./container-state-exporter.yaml",
                "./container-state-exporter.yml",
                "./container-state-exporter.json",
            ];

            match defaults.iter().find(|p| Path::new(p).exists()) {
                Some(p) => PathBuf::from(p),
                None => return Ok(Config::default()),
            }
        }
    };

    if !path.exists() {
        return Err(format!("Config file not found: {}", path.display()).into());
    }

    let content = fs::read_to_string(&path)?;

    let mut config: Config = match path.extension().and_then(|s| s.to_str()) {
        Some("json") => serde_json::from_str(&content)?,
        Some("toml") => toml::from_str(&content)?,
        // Default to YAML
        _ => serde_yaml::from_str(&content)?,
    };
    config.loaded_from = Some(path);
    Ok(config)
}

/// Renders configuration in the requested format.
pub fn render_config(config: &Config, format: &ConfigFormat) -> Result<String, Box<dyn std::error::Error>> {
    Ok(match format {
        ConfigFormat::Json => serde_json::to_string_pretty(config)?,
        ConfigFormat::Toml => toml::to_string_pretty(config)?,
        ConfigFormat::Yaml => serde_yaml::to_string(config)?,
    })
}

/// Shows configuration in requested format
pub fn show_config(config: &Config, format: ConfigFormat) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", render_config(config, &format)?);
    Ok(())
}
