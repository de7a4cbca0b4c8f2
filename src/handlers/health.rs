//! Health check endpoint handlers.
//!
//! `/-/healthy` is a static liveness probe. `/health` renders the exporter's
//! scrape statistics and snapshot cache state as plain text.

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use container_state_exporter::SnapshotSource;
use tracing::{debug, instrument};

use crate::state::SharedState;

// Time conversion constants
const SECONDS_PER_HOUR: f64 = 3600.0;
const MINUTES_PER_HOUR: f64 = 60.0;
const HOURS_PER_DAY: f64 = 24.0;

/// Handler for the /-/healthy liveness endpoint.
pub async fn liveness_handler() -> &'static str {
    "up"
}

/// Handler for the /health endpoint.
#[instrument(skip(state))]
pub async fn health_handler<S>(State(state): State<SharedState<S>>) -> impl IntoResponse
where
    S: SnapshotSource + 'static,
{
    debug!("Processing /health request");
    state.health_stats.record_http_request();

    let stats = state.collector.stats();

    // A failing runtime is reported but the process itself stays healthy
    let message = if stats.refreshes == 0 && stats.refresh_failures == 0 {
        "OK - No scrape yet"
    } else if stats.refreshes == 0 {
        "DEGRADED - Container runtime never answered"
    } else {
        "OK"
    };

    let uptime_hours = state.health_stats.get_uptime_seconds() as f64 / SECONDS_PER_HOUR;
    let uptime_str = if uptime_hours < 1.0 {
        format!("{:.1} minutes", uptime_hours * MINUTES_PER_HOUR)
    } else if uptime_hours < HOURS_PER_DAY {
        format!("{:.1} hours", uptime_hours)
    } else {
        format!("{:.1} days", uptime_hours / HOURS_PER_DAY)
    };

    let table = state.health_stats.render_table(&stats);

    debug!("Health check: {}", message);
    (
        StatusCode::OK,
        [("Content-Type", "text/plain; charset=utf-8")],
        format!("{message}\n\nUptime: {uptime_str}\n\n{table}"),
    )
}
