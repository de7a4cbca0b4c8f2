//! Application state management for the exporter.
//!
//! This module defines the shared application state that is passed
//! to HTTP handlers. The collector is built once at startup; there are no
//! global singletons.

use container_state_exporter::{CachedCollector, SnapshotSource};
use prometheus::Registry;
use std::sync::Arc;
use std::time::Instant;

use crate::config::Config;
use crate::health_stats::HealthStats;
use crate::metrics::ExporterMetrics;

/// Type alias for shared application state.
pub type SharedState<S> = Arc<AppState<S>>;

/// Application state shared across requests.
pub struct AppState<S> {
    /// Process registry holding exporter telemetry.
    pub registry: Registry,
    pub metrics: ExporterMetrics,
    pub collector: CachedCollector<S>,
    pub config: Arc<Config>,
    pub health_stats: Arc<HealthStats>,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}

impl<S: SnapshotSource> AppState<S> {
    pub fn new(
        collector: CachedCollector<S>,
        config: Config,
    ) -> Result<Self, prometheus::Error> {
        let registry = Registry::new();
        let metrics = ExporterMetrics::new(&registry)?;
        Ok(Self {
            registry,
            metrics,
            collector,
            config: Arc::new(config),
            health_stats: Arc::new(HealthStats::new()),
            start_time: Instant::now(),
        })
    }
}
