//! Config command implementation.
//!
//! Generates configuration files in various formats.

use std::fs;
use std::path::PathBuf;

use crate::cli::ConfigFormat;
use crate::config::{render_config, Config};

/// Generates configuration files.
pub fn command_config(
    output: Option<PathBuf>,
    format: ConfigFormat,
    commented: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::default();
    let output = output.unwrap_or_else(|| PathBuf::from("container-state-exporter.yaml"));

    let mut content = render_config(&config, &format)?;
    if commented && matches!(format, ConfigFormat::Yaml) {
        content = add_config_comments(content);
    }

    if output.to_string_lossy() == "-" {
        print!("{}", content);
    } else {
        fs::write(&output, content)?;
        println!("✅ Configuration written to: {}", output.display());
    }

    Ok(())
}

/// Adds comments to YAML configuration.
fn add_config_comments(yaml: String) -> String {
    let comments = r#"# Container State Exporter Configuration
# ======================================
#
# Server Configuration
# --------------------
# listen_address: ":8080"      # Address for HTTP requests (":port" = all interfaces)
#
# Container Runtime
# -----------------
# docker_host: null            # unix:///var/run/docker.sock, tcp://host:2375 (null = DOCKER_HOST or local socket)
# all_containers: true         # Report stopped containers too
# runtime_timeout_secs: 10     # Deadline for one list-and-inspect pass
#
# Snapshot Cache
# --------------
# cache_ttl_ms: 1000           # Reuse a snapshot for this long across scrapes
# serve_stale_on_error: false  # Serve the last good snapshot when the runtime fails
#
# Feature Flags
# -------------
# enable_health: true          # Enable /health endpoint
# enable_telemetry: true       # Enable container_state_exporter_* metrics
#
# Logging
# -------
# log_level: "info"            # off, error, warn, info, debug, trace
#
# TLS/SSL Configuration
# ---------------------
# enable_tls: false            # Enable HTTPS (default: false)
# tls_cert_path: null          # Path to TLS certificate (PEM format)
# tls_key_path: null           # Path to TLS private key (PEM format)
"#;

    format!("{comments}\n{yaml}")
}
