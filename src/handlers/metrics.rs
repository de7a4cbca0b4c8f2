//! Metrics endpoint handler for Prometheus scraping.
//!
//! This module provides the `/metrics` endpoint handler. Every request goes
//! through the cached collector, so the container runtime is queried at most
//! once per cache window regardless of scrape frequency.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use container_state_exporter::{exposition, CollectError, SnapshotSource};
use std::time::Instant;
use tracing::{debug, error, instrument};

use crate::state::SharedState;

/// Error type for metrics endpoint failures.
#[derive(Debug)]
pub enum MetricsError {
    Collection(CollectError),
    EncodingFailed,
}

impl IntoResponse for MetricsError {
    fn into_response(self) -> Response {
        let message = match self {
            MetricsError::Collection(e) => format!("Failed to collect container state: {}", e),
            MetricsError::EncodingFailed => "Failed to encode metrics".to_string(),
        };
        (StatusCode::INTERNAL_SERVER_ERROR, message).into_response()
    }
}

/// Handler for the /metrics endpoint.
#[instrument(skip(state))]
pub async fn metrics_handler<S>(State(state): State<SharedState<S>>) -> Result<Response, MetricsError>
where
    S: SnapshotSource + 'static,
{
    let start = Instant::now();
    debug!("Processing /metrics request");
    state.health_stats.record_http_request();

    let telemetry = state.config.enable_telemetry.unwrap_or(true);

    let samples = match state.collector.collect().await {
        Ok(samples) => samples,
        Err(e) => {
            error!("Scrape failed: {}", e);
            state.health_stats.record_scrape_failure();
            if telemetry {
                state.metrics.observe_collector(&state.collector.stats());
                state.metrics.scrapes_total.with_label_values(&["error"]).inc();
            }
            return Err(MetricsError::Collection(e));
        }
    };

    let extra = if telemetry {
        state.metrics.observe_collector(&state.collector.stats());
        state
            .metrics
            .scrapes_total
            .with_label_values(&["success"])
            .inc();
        state.registry.gather()
    } else {
        Vec::new()
    };

    let body = exposition::render(&samples, extra).map_err(|e| {
        error!("Failed to encode Prometheus metrics: {}", e);
        state.health_stats.record_scrape_failure();
        MetricsError::EncodingFailed
    })?;

    let elapsed = start.elapsed();
    state.metrics.scrape_duration_seconds.set(elapsed.as_secs_f64());
    state.health_stats.record_scrape_success(
        elapsed.as_secs_f64() * 1000.0,
        samples.len(),
        body.len(),
    );

    debug!(
        "Metrics request completed: {} samples, {} bytes, {:.3}ms",
        samples.len(),
        body.len(),
        elapsed.as_secs_f64() * 1000.0
    );

    Ok((
        [(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)],
        body,
    )
        .into_response())
}
