//! HTTP endpoint handlers for the exporter.
//!
//! This module provides handlers for all HTTP endpoints:
//! - `/`: Landing page
//! - `/metrics`: Prometheus metrics endpoint
//! - `/-/healthy`: Liveness probe
//! - `/health`: Exporter statistics

pub mod health;
pub mod metrics;
pub mod root;

// Re-export handlers
pub use health::{health_handler, liveness_handler};
pub use metrics::metrics_handler;
pub use root::root_handler;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use axum::extract::State;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use container_state_exporter::{
        CachedCollector, CollectError, CollectorOptions, ContainerRecord, ContainerStatus,
        HealthStatus, Snapshot, SnapshotSource,
    };
    use std::collections::BTreeMap;
    use std::sync::Arc;

    use crate::config::Config;
    use crate::state::{AppState, SharedState};

    struct FixedSource {
        fail: bool,
    }

    impl SnapshotSource for FixedSource {
        async fn fetch(&self) -> Result<Snapshot, CollectError> {
            if self.fail {
                return Err(CollectError::RuntimeUnavailable("connection refused".into()));
            }
            Ok(Snapshot::new(vec![ContainerRecord {
                id: "f00d".to_string(),
                name: "cache".to_string(),
                image: "redis:7".to_string(),
                labels: BTreeMap::from([("tier".to_string(), "backend".to_string())]),
                status: ContainerStatus::Running,
                health_status: HealthStatus::Healthy,
                oom_killed: false,
                started_at: "2023-01-01T00:00:00Z".to_string(),
                finished_at: "0001-01-01T00:00:00Z".to_string(),
                restart_count: 0,
            }]))
        }
    }

    fn state(fail: bool) -> SharedState<FixedSource> {
        let collector = CachedCollector::new(FixedSource { fail }, CollectorOptions::default());
        Arc::new(AppState::new(collector, Config::default()).unwrap())
    }

    async fn body_text(response: axum::response::Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_metrics_handler_success() {
        let state = state(false);
        let response = metrics_handler(State(state.clone())).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_text(response).await;
        assert!(body.contains("# TYPE container_state_status gauge"));
        assert!(body.contains("container_label_tier=\"backend\""));
        assert!(body.contains("id=\"/docker/f00d\""));
        assert!(body.contains("container_state_exporter_build_info"));
        assert!(body.contains("container_state_exporter_scrapes_total{result=\"success\"} 1"));
    }

    #[tokio::test]
    async fn test_metrics_handler_failure_is_server_error() {
        let state = state(true);
        let response = metrics_handler(State(state.clone())).await.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_text(response).await;
        assert!(body.contains("connection refused"));
        assert!(!body.contains("container_state_status"));
        assert_eq!(state.health_stats.get_scrape_success_rate(), 0.0);
    }

    #[tokio::test]
    async fn test_liveness_handler() {
        assert_eq!(liveness_handler().await, "up");
    }

    #[tokio::test]
    async fn test_health_handler_reports_cache() {
        let state = state(false);
        metrics_handler(State(state.clone())).await.unwrap();

        let response = health_handler(State(state)).await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_text(response).await;
        assert!(body.starts_with("OK"));
        assert!(body.contains("containers in snapshot     : 1"));
    }

    #[tokio::test]
    async fn test_root_handler_lists_endpoints() {
        let response = root_handler(State(state(false))).await.into_response();
        let body = body_text(response).await;
        assert!(body.contains("/metrics"));
        assert!(body.contains("/-/healthy"));
    }
}
