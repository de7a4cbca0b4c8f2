//! Startup requirement validation for container-state-exporter.
//!
//! This module checks that the Docker socket is present and accessible
//! before the exporter tries to talk to the daemon.

use nix::unistd::{access, geteuid, AccessFlags};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// Socket used when neither config nor `DOCKER_HOST` name a daemon.
pub const DEFAULT_DOCKER_SOCKET: &str = "/var/run/docker.sock";

/// Validate all runtime requirements
pub fn validate_requirements(docker_host: Option<&str>) -> Result<(), ValidationError> {
    info!("🔍 Validating runtime requirements...");

    let host = docker_host
        .map(str::to_string)
        .or_else(|| std::env::var("DOCKER_HOST").ok());

    match socket_path(host.as_deref()) {
        Some(path) => check_socket_access(&path)?,
        None => debug!("Docker host {:?} is not a unix socket, skipping socket checks", host),
    }

    info!("✅ All runtime requirements validated");
    Ok(())
}

/// Unix socket path for a docker host string, `None` for network hosts.
pub fn socket_path(host: Option<&str>) -> Option<PathBuf> {
    match host {
        None => Some(PathBuf::from(DEFAULT_DOCKER_SOCKET)),
        Some(h) => h.strip_prefix("unix://").map(PathBuf::from),
    }
}

/// Check the docker socket exists and is readable and writable by us
fn check_socket_access(path: &Path) -> Result<(), ValidationError> {
    if !path.exists() {
        error!("❌ Docker socket {} not found", path.display());
        error!("   Is the Docker daemon running? Set --docker-host to override.");
        return Err(ValidationError::SocketNotFound(path.to_path_buf()));
    }

    match access(path, AccessFlags::R_OK | AccessFlags::W_OK) {
        Ok(()) => {
            info!("✅ Docker socket {} is accessible", path.display());
            Ok(())
        }
        Err(e) => {
            error!("❌ Cannot access {}: {}", path.display(), e);
            if !geteuid().is_root() {
                warn!("   Not running as root - add the exporter user to the 'docker' group");
            }
            Err(ValidationError::InsufficientPermissions(format!(
                "{}: {}",
                path.display(),
                e
            )))
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Docker socket not found: {}", .0.display())]
    SocketNotFound(PathBuf),

    #[error("Insufficient permissions: {0}")]
    InsufficientPermissions(String),
}
