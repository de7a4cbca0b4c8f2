//! Container runtime abstraction.
//!
//! The snapshot source only needs two read-only calls from the runtime:
//! enumerate container ids and inspect one container. Keeping them behind a
//! trait lets the Docker client be swapped for an in-memory runtime in tests.

use std::collections::HashMap;
use std::future::Future;

use crate::error::CollectError;

/// Raw inspect result. Every field the runtime may omit is optional here and
/// normalized by the snapshot source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InspectedContainer {
    pub id: String,
    pub name: Option<String>,
    pub image: Option<String>,
    pub labels: Option<HashMap<String, String>>,
    /// `None` when the runtime returned no state block at all.
    pub state: Option<InspectedState>,
    pub restart_count: Option<i64>,
}

/// Raw `State` block of an inspect result.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InspectedState {
    pub status: Option<String>,
    /// `None` when the container defines no health check.
    pub health_status: Option<String>,
    pub oom_killed: Option<bool>,
    pub started_at: Option<String>,
    pub finished_at: Option<String>,
}

/// Read-only access to a container runtime.
pub trait ContainerRuntime: Send + Sync {
    /// Checks that the runtime answers at all.
    fn ping(&self) -> impl Future<Output = Result<(), CollectError>> + Send;

    /// Ids of all visible containers.
    fn list_container_ids(&self) -> impl Future<Output = Result<Vec<String>, CollectError>> + Send;

    /// Full state of one container, `Ok(None)` if it no longer exists.
    fn inspect_container(
        &self,
        id: &str,
    ) -> impl Future<Output = Result<Option<InspectedContainer>, CollectError>> + Send;
}
