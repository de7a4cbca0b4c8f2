//! Integration tests for the cached collector.
//!
//! These tests drive `CachedCollector` with an in-memory snapshot source and
//! tokio's paused clock, so cache windows are exact and nothing sleeps for real.

use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use container_state_exporter::{
    CachedCollector, CollectError, CollectorOptions, ContainerRecord, ContainerStatus,
    HealthStatus, MetricSample, Snapshot, SnapshotSource,
};

/// Snapshot source that counts fetches and replays scripted results.
#[derive(Default)]
struct ScriptedSource {
    fetches: Arc<AtomicUsize>,
    script: Mutex<VecDeque<Result<Vec<ContainerRecord>, CollectError>>>,
    fallback: Vec<ContainerRecord>,
    latency: Duration,
}

impl ScriptedSource {
    fn returning(containers: Vec<ContainerRecord>) -> Self {
        Self {
            fallback: containers,
            ..Default::default()
        }
    }

    fn then(self, result: Result<Vec<ContainerRecord>, CollectError>) -> Self {
        self.script.lock().unwrap().push_back(result);
        self
    }

    fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    fn counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.fetches)
    }
}

impl SnapshotSource for ScriptedSource {
    async fn fetch(&self) -> Result<Snapshot, CollectError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(result) => result.map(Snapshot::new),
            None => Ok(Snapshot::new(self.fallback.clone())),
        }
    }
}

fn container(id: &str, status: ContainerStatus) -> ContainerRecord {
    ContainerRecord {
        id: id.to_string(),
        name: format!("svc-{id}"),
        image: "example/svc:1".to_string(),
        labels: BTreeMap::from([("com.example.team".to_string(), "infra".to_string())]),
        status,
        health_status: HealthStatus::Healthy,
        oom_killed: false,
        started_at: "2023-01-01T00:00:00.000000000Z".to_string(),
        finished_at: "0001-01-01T00:00:00Z".to_string(),
        restart_count: 1,
    }
}

fn collector(source: ScriptedSource) -> CachedCollector<ScriptedSource> {
    CachedCollector::new(source, CollectorOptions::default())
}

fn value(samples: &[MetricSample], name: &str, id: &str) -> Option<f64> {
    let id_label = format!("/docker/{id}");
    samples
        .iter()
        .find(|s| s.name == name && s.labels.get("id") == Some(&id_label))
        .map(|s| s.value)
}

#[tokio::test(start_paused = true)]
async fn test_calls_within_ttl_share_one_fetch() {
    let source = ScriptedSource::returning(vec![container("a", ContainerStatus::Running)]);
    let fetches = source.counter();
    let collector = collector(source);

    collector.collect().await.unwrap();
    tokio::time::advance(Duration::from_millis(999)).await;
    collector.collect().await.unwrap();

    assert_eq!(fetches.load(Ordering::SeqCst), 1);
    assert_eq!(collector.stats().refreshes, 1);
}

#[tokio::test(start_paused = true)]
async fn test_calls_spanning_ttl_fetch_twice() {
    let source = ScriptedSource::returning(vec![container("a", ContainerStatus::Running)]);
    let fetches = source.counter();
    let collector = collector(source);

    collector.collect().await.unwrap();
    tokio::time::advance(Duration::from_secs(1)).await;
    collector.collect().await.unwrap();

    assert_eq!(fetches.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn test_refresh_replaces_snapshot_wholesale() {
    let source = ScriptedSource::returning(vec![container("b", ContainerStatus::Exited)])
        .then(Ok(vec![
            container("a", ContainerStatus::Running),
            container("b", ContainerStatus::Running),
        ]));
    let collector = collector(source);

    let first = collector.collect().await.unwrap();
    assert_eq!(value(&first, "container_restartcount", "a"), Some(1.0));

    tokio::time::advance(Duration::from_secs(2)).await;
    let second = collector.collect().await.unwrap();

    // "a" is gone, "b" changed state; nothing is merged from the old snapshot
    assert_eq!(value(&second, "container_restartcount", "a"), None);
    let exited = second
        .iter()
        .find(|s| {
            s.name == "container_state_status"
                && s.labels["id"] == "/docker/b"
                && s.labels["status"] == "exited"
        })
        .unwrap();
    assert_eq!(exited.value, 1.0);
    assert_eq!(collector.stats().containers, 1);
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_scrapes_trigger_single_fetch() {
    let source = ScriptedSource::returning(vec![container("a", ContainerStatus::Running)])
        .with_latency(Duration::from_millis(200));
    let fetches = source.counter();
    let collector = Arc::new(collector(source));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let collector = Arc::clone(&collector);
            tokio::spawn(async move { collector.collect().await })
        })
        .collect();

    let mut results = Vec::new();
    for handle in handles {
        results.push(handle.await.unwrap().unwrap());
    }

    assert_eq!(fetches.load(Ordering::SeqCst), 1);
    assert!(results.windows(2).all(|pair| pair[0] == pair[1]));
}

#[tokio::test(start_paused = true)]
async fn test_expansion_is_idempotent_without_refresh() {
    let source = ScriptedSource::returning(vec![
        container("a", ContainerStatus::Running),
        container("b", ContainerStatus::Paused),
    ]);
    let collector = collector(source);

    let first = collector.collect().await.unwrap();
    let second = collector.collect().await.unwrap();
    assert_eq!(first, second);
    assert_eq!(format!("{first:?}"), format!("{second:?}"));
}

#[tokio::test(start_paused = true)]
async fn test_fetch_failure_aborts_scrape() {
    let source = ScriptedSource::returning(vec![container("a", ContainerStatus::Running)])
        .then(Ok(vec![container("a", ContainerStatus::Running)]))
        .then(Err(CollectError::RuntimeUnavailable("daemon gone".into())));
    let fetches = source.counter();
    let collector = collector(source);

    collector.collect().await.unwrap();
    tokio::time::advance(Duration::from_secs(1)).await;

    // Stale data is not served by default
    let err = collector.collect().await.unwrap_err();
    assert!(err.is_runtime_unavailable());

    // The failed refresh did not reset the window, so the next scrape retries
    collector.collect().await.unwrap();
    assert_eq!(fetches.load(Ordering::SeqCst), 3);

    let stats = collector.stats();
    assert_eq!(stats.refreshes, 2);
    assert_eq!(stats.refresh_failures, 1);
}

#[tokio::test(start_paused = true)]
async fn test_serve_stale_on_error_reuses_last_snapshot() {
    let source = ScriptedSource::returning(vec![container("a", ContainerStatus::Running)])
        .then(Ok(vec![container("a", ContainerStatus::Running)]))
        .then(Err(CollectError::RuntimeUnavailable("daemon gone".into())));
    let collector = CachedCollector::new(
        source,
        CollectorOptions {
            serve_stale_on_error: true,
            ..CollectorOptions::default()
        },
    );

    let fresh = collector.collect().await.unwrap();
    tokio::time::advance(Duration::from_secs(1)).await;
    let stale = collector.collect().await.unwrap();

    assert_eq!(fresh, stale);
    assert_eq!(collector.stats().stale_served, 1);
}

#[tokio::test(start_paused = true)]
async fn test_serve_stale_still_fails_without_any_snapshot() {
    let source = ScriptedSource::default()
        .then(Err(CollectError::RuntimeUnavailable("daemon gone".into())));
    let collector = CachedCollector::new(
        source,
        CollectorOptions {
            serve_stale_on_error: true,
            ..CollectorOptions::default()
        },
    );

    assert!(collector.collect().await.is_err());
}

#[tokio::test(start_paused = true)]
async fn test_slow_runtime_hits_deadline() {
    let source = ScriptedSource::returning(vec![container("a", ContainerStatus::Running)])
        .with_latency(Duration::from_secs(60));
    let collector = CachedCollector::new(
        source,
        CollectorOptions {
            fetch_timeout: Duration::from_secs(5),
            ..CollectorOptions::default()
        },
    );

    let err = collector.collect().await.unwrap_err();
    match err {
        CollectError::RuntimeUnavailable(msg) => assert!(msg.contains("5s"), "{msg}"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_bad_timestamp_fails_scrape_with_no_samples() {
    let mut broken = container("b", ContainerStatus::Exited);
    broken.finished_at = "not-a-time".to_string();
    let source =
        ScriptedSource::returning(vec![container("a", ContainerStatus::Running), broken]);
    let collector = collector(source);

    let err = collector.collect().await.unwrap_err();
    assert!(matches!(err, CollectError::TimestampParse { .. }));
    assert!(!err.is_runtime_unavailable());
}

#[tokio::test(start_paused = true)]
async fn test_timestamp_values() {
    let collector = collector(ScriptedSource::returning(vec![container(
        "a",
        ContainerStatus::Running,
    )]));
    let samples = collector.collect().await.unwrap();

    assert_eq!(
        value(&samples, "container_state_startedat", "a"),
        Some(1672531200.0)
    );
    assert_eq!(
        value(&samples, "container_state_finishedat", "a"),
        Some(-62135596800.0)
    );
}
