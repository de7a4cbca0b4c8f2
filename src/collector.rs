//! Cached collector: refresh-or-reuse the container snapshot, then expand it
//! into metric samples.
//!
//! One lock guards the refresh decision, the fetch and the expansion. Scrapes
//! that arrive while a refresh is in flight wait for it and then reuse its
//! result, so there is at most one runtime fetch per TTL window no matter how
//! many scrapes run concurrently.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::DateTime;
use tokio::sync::Mutex;
use tokio::time::{timeout, Instant};
use tracing::{debug, info, instrument, warn};

use crate::error::CollectError;
use crate::labels::container_base_labels;
use crate::model::{ContainerRecord, ContainerStatus, HealthStatus, Snapshot};
use crate::schema::{self, MetricDesc, STATUS_LABEL};
use crate::source::SnapshotSource;

/// Maximum age of a cached snapshot.
pub const DEFAULT_TTL: Duration = Duration::from_secs(1);

/// Deadline for one complete list-and-inspect pass.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Samples produced per container.
pub const SAMPLES_PER_CONTAINER: usize =
    HealthStatus::ALL.len() + ContainerStatus::ALL.len() + 4;

/// One `(name, labels, value)` tuple handed to the metric sink.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSample {
    pub name: &'static str,
    pub labels: BTreeMap<String, String>,
    pub value: f64,
}

/// Tuning knobs for [`CachedCollector`].
#[derive(Debug, Clone)]
pub struct CollectorOptions {
    pub ttl: Duration,
    pub fetch_timeout: Duration,
    /// Serve the last good snapshot when a refresh fails instead of failing
    /// the scrape. Only applies once a refresh has succeeded.
    pub serve_stale_on_error: bool,
}

impl Default for CollectorOptions {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_TTL,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            serve_stale_on_error: false,
        }
    }
}

/// Point-in-time counters describing the cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollectorStats {
    pub refreshes: u64,
    pub refresh_failures: u64,
    pub stale_served: u64,
    pub containers: usize,
    /// Wall-clock capture time of the cached snapshot, if any.
    pub last_refresh_unix: Option<i64>,
}

struct CacheState {
    snapshot: Arc<Snapshot>,
    last_refresh: Option<Instant>,
}

impl CacheState {
    fn is_expired(&self, now: Instant, ttl: Duration) -> bool {
        match self.last_refresh {
            Some(at) => now.saturating_duration_since(at) >= ttl,
            None => true,
        }
    }
}

/// Snapshot cache shared by every scrape.
pub struct CachedCollector<S> {
    source: S,
    options: CollectorOptions,
    cache: Mutex<CacheState>,
    refreshes: AtomicU64,
    refresh_failures: AtomicU64,
    stale_served: AtomicU64,
    containers: AtomicUsize,
    last_refresh_unix: AtomicI64,
}

impl<S: SnapshotSource> CachedCollector<S> {
    pub fn new(source: S, options: CollectorOptions) -> Self {
        Self {
            source,
            options,
            cache: Mutex::new(CacheState {
                snapshot: Arc::new(Snapshot::empty()),
                last_refresh: None,
            }),
            refreshes: AtomicU64::new(0),
            refresh_failures: AtomicU64::new(0),
            stale_served: AtomicU64::new(0),
            containers: AtomicUsize::new(0),
            last_refresh_unix: AtomicI64::new(i64::MIN),
        }
    }

    /// Returns the samples for one scrape, refreshing the snapshot first if it
    /// is older than the TTL.
    #[instrument(skip(self))]
    pub async fn collect(&self) -> Result<Vec<MetricSample>, CollectError> {
        let mut cache = self.cache.lock().await;
        self.refresh_if_expired(&mut cache).await?;
        let samples = expand_snapshot(&cache.snapshot)?;
        debug!(
            "Expanded {} containers into {} samples",
            cache.snapshot.len(),
            samples.len()
        );
        Ok(samples)
    }

    /// Returns the snapshot a scrape issued now would be derived from.
    pub async fn snapshot(&self) -> Result<Arc<Snapshot>, CollectError> {
        let mut cache = self.cache.lock().await;
        self.refresh_if_expired(&mut cache).await?;
        Ok(Arc::clone(&cache.snapshot))
    }

    pub fn stats(&self) -> CollectorStats {
        let last = self.last_refresh_unix.load(Ordering::Relaxed);
        CollectorStats {
            refreshes: self.refreshes.load(Ordering::Relaxed),
            refresh_failures: self.refresh_failures.load(Ordering::Relaxed),
            stale_served: self.stale_served.load(Ordering::Relaxed),
            containers: self.containers.load(Ordering::Relaxed),
            last_refresh_unix: (last != i64::MIN).then_some(last),
        }
    }

    async fn refresh_if_expired(&self, cache: &mut CacheState) -> Result<(), CollectError> {
        let now = Instant::now();
        if !cache.is_expired(now, self.options.ttl) {
            debug!("Reusing cached snapshot");
            return Ok(());
        }

        let started = Instant::now();
        match self.fetch_with_deadline().await {
            Ok(snapshot) => {
                self.refreshes.fetch_add(1, Ordering::Relaxed);
                self.containers.store(snapshot.len(), Ordering::Relaxed);
                self.last_refresh_unix
                    .store(snapshot.captured_at.timestamp(), Ordering::Relaxed);
                debug!(
                    "Snapshot refreshed: {} containers in {:.3}ms",
                    snapshot.len(),
                    started.elapsed().as_secs_f64() * 1000.0
                );
                if cache.last_refresh.is_none() {
                    info!("First container snapshot captured ({} containers)", snapshot.len());
                }
                cache.snapshot = Arc::new(snapshot);
                cache.last_refresh = Some(now);
                Ok(())
            }
            Err(err) => {
                self.refresh_failures.fetch_add(1, Ordering::Relaxed);
                if self.options.serve_stale_on_error && cache.last_refresh.is_some() {
                    self.stale_served.fetch_add(1, Ordering::Relaxed);
                    warn!("Snapshot refresh failed, serving previous snapshot: {}", err);
                    Ok(())
                } else {
                    Err(err)
                }
            }
        }
    }

    async fn fetch_with_deadline(&self) -> Result<Snapshot, CollectError> {
        match timeout(self.options.fetch_timeout, self.source.fetch()).await {
            Ok(result) => result,
            Err(_) => Err(CollectError::timed_out(self.options.fetch_timeout)),
        }
    }
}

/// Expands every record of a snapshot. Fails as a whole if any record fails.
pub fn expand_snapshot(snapshot: &Snapshot) -> Result<Vec<MetricSample>, CollectError> {
    let mut samples = Vec::with_capacity(snapshot.len() * SAMPLES_PER_CONTAINER);
    for record in &snapshot.containers {
        expand_record(record, &mut samples)?;
    }
    Ok(samples)
}

fn expand_record(record: &ContainerRecord, out: &mut Vec<MetricSample>) -> Result<(), CollectError> {
    let started_at = parse_timestamp(record, "startedAt", &record.started_at)?;
    let finished_at = parse_timestamp(record, "finishedAt", &record.finished_at)?;
    let base = container_base_labels(record);

    for candidate in HealthStatus::ALL {
        out.push(indicator(
            &schema::HEALTH_STATUS,
            &base,
            candidate.as_str(),
            candidate == record.health_status,
        ));
    }
    for candidate in ContainerStatus::ALL {
        out.push(indicator(
            &schema::STATUS,
            &base,
            candidate.as_str(),
            candidate == record.status,
        ));
    }

    out.push(gauge(&schema::OOM_KILLED, &base, bool_value(record.oom_killed)));
    out.push(gauge(&schema::STARTED_AT, &base, started_at));
    out.push(gauge(&schema::FINISHED_AT, &base, finished_at));
    out.push(gauge(
        &schema::RESTART_COUNT,
        &base,
        record.restart_count as f64,
    ));
    Ok(())
}

fn indicator(
    desc: &MetricDesc,
    base: &BTreeMap<String, String>,
    candidate: &str,
    matches: bool,
) -> MetricSample {
    let mut labels = base.clone();
    let label = desc.extra_label.unwrap_or(STATUS_LABEL);
    labels.insert(label.to_string(), candidate.to_string());
    MetricSample {
        name: desc.name,
        labels,
        value: bool_value(matches),
    }
}

fn gauge(desc: &MetricDesc, base: &BTreeMap<String, String>, value: f64) -> MetricSample {
    MetricSample {
        name: desc.name,
        labels: base.clone(),
        value,
    }
}

fn bool_value(b: bool) -> f64 {
    if b {
        1.0
    } else {
        0.0
    }
}

/// Parses an RFC3339 timestamp into Unix epoch seconds.
fn parse_timestamp(
    record: &ContainerRecord,
    field: &'static str,
    value: &str,
) -> Result<f64, CollectError> {
    DateTime::parse_from_rfc3339(value)
        .map(|ts| ts.timestamp() as f64)
        .map_err(|source| CollectError::TimestampParse {
            container: record.id.clone(),
            field,
            value: value.to_string(),
            source,
        })
}
