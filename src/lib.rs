//! Container State Exporter Library
//!
//! Samples the state of every container known to the local container runtime
//! and turns it into Prometheus metrics. The library is transport-agnostic:
//! the binary wires it to an HTTP endpoint, tests wire it to in-memory runtimes.
//!
//! # Pipeline
//!
//! - [`runtime::ContainerRuntime`]: list and inspect containers ([`docker::DockerRuntime`])
//! - [`source::SnapshotSource`]: one list-then-inspect pass producing a [`model::Snapshot`]
//! - [`collector::CachedCollector`]: reuses a snapshot for the TTL window and
//!   expands it into [`collector::MetricSample`]s
//! - [`exposition`]: encodes samples in the Prometheus text format
//!
//! # Usage
//!
//! ```rust,no_run
//! use container_state_exporter::{
//!     CachedCollector, CollectorOptions, DockerRuntime, RuntimeSnapshotSource,
//! };
//! use std::time::Duration;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let runtime = DockerRuntime::connect(None, Duration::from_secs(10), true)?;
//! let collector = CachedCollector::new(
//!     RuntimeSnapshotSource::new(runtime),
//!     CollectorOptions::default(),
//! );
//!
//! let samples = collector.collect().await?;
//! let body = container_state_exporter::exposition::render(&samples, Vec::new())?;
//! println!("{body}");
//! # Ok(())
//! # }
//! ```

pub mod collector;
pub mod docker;
pub mod error;
pub mod exposition;
pub mod labels;
pub mod model;
pub mod runtime;
pub mod schema;
pub mod source;

// Re-export main types for convenience
pub use collector::{CachedCollector, CollectorOptions, CollectorStats, MetricSample};
pub use docker::DockerRuntime;
pub use error::CollectError;
pub use model::{ContainerRecord, ContainerStatus, HealthStatus, Snapshot};
pub use runtime::{ContainerRuntime, InspectedContainer, InspectedState};
pub use source::{RuntimeSnapshotSource, SnapshotSource};

/// Collector type used against a live Docker daemon.
pub type DockerCollector = CachedCollector<RuntimeSnapshotSource<DockerRuntime>>;
