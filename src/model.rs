//! Container state data model.
//!
//! A [`Snapshot`] is the unit of caching: it is captured in one go by a
//! snapshot source, wrapped in an `Arc`, and replaced wholesale on refresh.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};

/// Lifecycle status reported by the container runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerStatus {
    Created,
    Running,
    Paused,
    Restarting,
    Removing,
    Exited,
    Dead,
}

impl ContainerStatus {
    /// Candidate values in indicator emission order.
    pub const ALL: [ContainerStatus; 7] = [
        ContainerStatus::Paused,
        ContainerStatus::Restarting,
        ContainerStatus::Running,
        ContainerStatus::Removing,
        ContainerStatus::Dead,
        ContainerStatus::Created,
        ContainerStatus::Exited,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContainerStatus::Created => "created",
            ContainerStatus::Running => "running",
            ContainerStatus::Paused => "paused",
            ContainerStatus::Restarting => "restarting",
            ContainerStatus::Removing => "removing",
            ContainerStatus::Exited => "exited",
            ContainerStatus::Dead => "dead",
        }
    }
}

impl fmt::Display for ContainerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContainerStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ContainerStatus::ALL
            .iter()
            .copied()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("unknown container status {:?}", s))
    }
}

/// Health check state. `None` means the container defines no health check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HealthStatus {
    #[default]
    None,
    Starting,
    Healthy,
    Unhealthy,
}

impl HealthStatus {
    /// Candidate values in indicator emission order.
    pub const ALL: [HealthStatus; 4] = [
        HealthStatus::None,
        HealthStatus::Starting,
        HealthStatus::Healthy,
        HealthStatus::Unhealthy,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::None => "none",
            HealthStatus::Starting => "starting",
            HealthStatus::Healthy => "healthy",
            HealthStatus::Unhealthy => "unhealthy",
        }
    }

    /// Maps the runtime's health string, treating an absent or empty value as `None`.
    pub fn from_runtime(value: Option<&str>) -> Result<Self, String> {
        match value {
            None | Some("") => Ok(HealthStatus::None),
            Some(s) => s.parse(),
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HealthStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HealthStatus::ALL
            .iter()
            .copied()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("unknown health status {:?}", s))
    }
}

/// Timestamp the runtime reports for "never happened".
pub const ZERO_TIMESTAMP: &str = "0001-01-01T00:00:00Z";

/// Normalized state of one container.
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerRecord {
    pub id: String,
    /// Display name without the leading `/`.
    pub name: String,
    pub image: String,
    pub labels: BTreeMap<String, String>,
    pub status: ContainerStatus,
    pub health_status: HealthStatus,
    pub oom_killed: bool,
    /// RFC3339 string as stored by the runtime.
    pub started_at: String,
    /// RFC3339 string as stored by the runtime.
    pub finished_at: String,
    pub restart_count: u64,
}

/// All containers visible at one point in time.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub containers: Vec<ContainerRecord>,
    pub captured_at: DateTime<Utc>,
}

impl Snapshot {
    pub fn new(containers: Vec<ContainerRecord>) -> Self {
        Self {
            containers,
            captured_at: Utc::now(),
        }
    }

    /// The state before the first successful refresh.
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn len(&self) -> usize {
        self.containers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.containers.is_empty()
    }
}
