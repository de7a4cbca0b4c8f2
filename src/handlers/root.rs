//! Root endpoint handler for the landing page.

use axum::{
    extract::State,
    response::{Html, IntoResponse},
};
use container_state_exporter::SnapshotSource;
use tracing::{debug, instrument};

use crate::metrics::git_sha;
use crate::state::SharedState;

/// Handler for the root `/` endpoint.
#[instrument(skip(state))]
pub async fn root_handler<S>(State(state): State<SharedState<S>>) -> impl IntoResponse
where
    S: SnapshotSource + 'static,
{
    debug!("Processing / request");
    state.health_stats.record_http_request();

    let uptime_secs = state.start_time.elapsed().as_secs();
    let uptime = format!(
        "{}h {}m {}s",
        uptime_secs / 3600,
        (uptime_secs % 3600) / 60,
        uptime_secs % 60
    );

    let health_link = if state.config.enable_health.unwrap_or(true) {
        r#"<li><a href="/health">/health</a> - exporter scrape and cache statistics</li>"#
    } else {
        ""
    };

    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>Container State Exporter</title>
</head>
<body>
<h1>docker state exporter</h1>
<p>Version {version} ({sha}), up {uptime}</p>
<ul>
    <li><a href="/metrics">/metrics</a> - Prometheus metrics</li>
    <li><a href="/-/healthy">/-/healthy</a> - liveness probe</li>
    {health_link}
</ul>
</body>
</html>"#,
        version = env!("CARGO_PKG_VERSION"),
        sha = git_sha(),
        uptime = uptime,
        health_link = health_link,
    ))
}
