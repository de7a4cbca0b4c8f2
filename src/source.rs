//! Snapshot source: list-then-inspect over a [`ContainerRuntime`].

use std::collections::BTreeMap;
use std::future::Future;

use tracing::{debug, instrument};

use crate::error::CollectError;
use crate::model::{ContainerRecord, ContainerStatus, HealthStatus, Snapshot, ZERO_TIMESTAMP};
use crate::runtime::{ContainerRuntime, InspectedContainer};

/// Produces a fresh [`Snapshot`] on every call. No caching happens here.
pub trait SnapshotSource: Send + Sync {
    fn fetch(&self) -> impl Future<Output = Result<Snapshot, CollectError>> + Send;
}

/// Snapshot source backed by a container runtime client.
pub struct RuntimeSnapshotSource<R> {
    runtime: R,
}

impl<R: ContainerRuntime> RuntimeSnapshotSource<R> {
    pub fn new(runtime: R) -> Self {
        Self { runtime }
    }

    pub fn runtime(&self) -> &R {
        &self.runtime
    }
}

impl<R: ContainerRuntime> SnapshotSource for RuntimeSnapshotSource<R> {
    #[instrument(skip(self))]
    async fn fetch(&self) -> Result<Snapshot, CollectError> {
        let ids = self.runtime.list_container_ids().await?;
        let mut containers = Vec::with_capacity(ids.len());

        for id in &ids {
            match self.runtime.inspect_container(id).await? {
                Some(inspected) => containers.push(normalize(inspected)?),
                None => debug!("Container {} disappeared before inspect, skipping", id),
            }
        }

        debug!(
            "Fetched {} containers ({} listed)",
            containers.len(),
            ids.len()
        );
        Ok(Snapshot::new(containers))
    }
}

/// Turns a raw inspect result into a [`ContainerRecord`].
///
/// Absent health, labels and timestamps are filled with their neutral values.
/// A missing state block, an unknown status or a negative restart count is
/// reported as malformed runtime data.
pub fn normalize(inspected: InspectedContainer) -> Result<ContainerRecord, CollectError> {
    let id = inspected.id;
    let state = inspected
        .state
        .ok_or_else(|| CollectError::malformed(&id, "missing state"))?;

    let status = state
        .status
        .as_deref()
        .ok_or_else(|| CollectError::malformed(&id, "missing status"))?
        .parse::<ContainerStatus>()
        .map_err(|e| CollectError::malformed(&id, e))?;

    let health_status = HealthStatus::from_runtime(state.health_status.as_deref())
        .map_err(|e| CollectError::malformed(&id, e))?;

    let restart_count = u64::try_from(inspected.restart_count.unwrap_or(0))
        .map_err(|_| CollectError::malformed(&id, "negative restart count"))?;

    let name = inspected
        .name
        .map(|n| n.strip_prefix('/').map(str::to_string).unwrap_or(n))
        .unwrap_or_default();

    let labels: BTreeMap<String, String> = inspected
        .labels
        .map(|labels| labels.into_iter().collect())
        .unwrap_or_default();

    Ok(ContainerRecord {
        id,
        name,
        image: inspected.image.unwrap_or_default(),
        labels,
        status,
        health_status,
        oom_killed: state.oom_killed.unwrap_or(false),
        started_at: state
            .started_at
            .unwrap_or_else(|| ZERO_TIMESTAMP.to_string()),
        finished_at: state
            .finished_at
            .unwrap_or_else(|| ZERO_TIMESTAMP.to_string()),
        restart_count,
    })
}
