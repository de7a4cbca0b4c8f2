//! Exporter self-telemetry.
//!
//! These metrics live in the process registry and are appended after the
//! container families on every scrape.

use std::sync::{Mutex, PoisonError};

use container_state_exporter::CollectorStats;
use prometheus::{Counter, CounterVec, Gauge, GaugeVec, Opts, Registry};

/// Collector counter values already folded into the registry.
#[derive(Debug, Default)]
struct ObservedCounts {
    refreshes: u64,
    refresh_failures: u64,
}

/// Telemetry about scrapes and the snapshot cache.
pub struct ExporterMetrics {
    pub scrape_duration_seconds: Gauge,
    pub scrapes_total: CounterVec, // labels: result
    pub snapshot_refreshes_total: Counter,
    pub snapshot_refresh_failures_total: Counter,
    pub snapshot_containers: Gauge,
    pub snapshot_timestamp_seconds: Gauge,
    observed: Mutex<ObservedCounts>,
}

impl ExporterMetrics {
    /// Creates and registers all exporter metrics with the registry.
    pub fn new(registry: &Registry) -> Result<Self, prometheus::Error> {
        let build_info = GaugeVec::new(
            Opts::new(
                "container_state_exporter_build_info",
                "Build information of container-state-exporter (always 1)",
            ),
            &["version", "git_sha"],
        )?;
        let scrape_duration_seconds = Gauge::new(
            "container_state_exporter_scrape_duration_seconds",
            "Time spent collecting and encoding the last /metrics response",
        )?;
        let scrapes_total = CounterVec::new(
            Opts::new(
                "container_state_exporter_scrapes_total",
                "Number of /metrics requests by result",
            ),
            &["result"],
        )?;
        let snapshot_refreshes_total = Counter::new(
            "container_state_exporter_snapshot_refreshes_total",
            "Number of successful container snapshot refreshes",
        )?;
        let snapshot_refresh_failures_total = Counter::new(
            "container_state_exporter_snapshot_refresh_failures_total",
            "Number of failed container snapshot refreshes",
        )?;
        let snapshot_containers = Gauge::new(
            "container_state_exporter_snapshot_containers",
            "Number of containers in the cached snapshot",
        )?;
        let snapshot_timestamp_seconds = Gauge::new(
            "container_state_exporter_snapshot_timestamp_seconds",
            "Unix time the cached snapshot was captured",
        )?;

        registry.register(Box::new(build_info.clone()))?;
        registry.register(Box::new(scrape_duration_seconds.clone()))?;
        registry.register(Box::new(scrapes_total.clone()))?;
        registry.register(Box::new(snapshot_refreshes_total.clone()))?;
        registry.register(Box::new(snapshot_refresh_failures_total.clone()))?;
        registry.register(Box::new(snapshot_containers.clone()))?;
        registry.register(Box::new(snapshot_timestamp_seconds.clone()))?;

        build_info
            .with_label_values(&[env!("CARGO_PKG_VERSION"), git_sha()])
            .set(1.0);

        Ok(Self {
            scrape_duration_seconds,
            scrapes_total,
            snapshot_refreshes_total,
            snapshot_refresh_failures_total,
            snapshot_containers,
            snapshot_timestamp_seconds,
            observed: Mutex::new(ObservedCounts::default()),
        })
    }

    /// Mirrors the collector counters into the registry.
    ///
    /// Only the increase since the last observation is added, so counters never
    /// go backwards. Stats older than the last observation are ignored.
    pub fn observe_collector(&self, stats: &CollectorStats) {
        let mut observed = self.observed.lock().unwrap_or_else(PoisonError::into_inner);
        if stats.refreshes < observed.refreshes
            || stats.refresh_failures < observed.refresh_failures
        {
            return;
        }

        self.snapshot_refreshes_total
            .inc_by((stats.refreshes - observed.refreshes) as f64);
        self.snapshot_refresh_failures_total
            .inc_by((stats.refresh_failures - observed.refresh_failures) as f64);
        observed.refreshes = stats.refreshes;
        observed.refresh_failures = stats.refresh_failures;

        self.snapshot_containers.set(stats.containers as f64);
        if let Some(ts) = stats.last_refresh_unix {
            self.snapshot_timestamp_seconds.set(ts as f64);
        }
    }
}

/// Git revision the binary was built from.
pub fn git_sha() -> &'static str {
    option_env!("VERGEN_GIT_SHA").unwrap_or("unknown")
}
