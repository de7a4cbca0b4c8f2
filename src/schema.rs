//! Container metric families exposed on every scrape.

/// Name, help text and per-sample label of one metric family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricDesc {
    pub name: &'static str,
    pub help: &'static str,
    /// Extra label carried on top of the per-container base set, if any.
    pub extra_label: Option<&'static str>,
}

/// Label naming the enum value an indicator sample tests for.
pub const STATUS_LABEL: &str = "status";

pub const HEALTH_STATUS: MetricDesc = MetricDesc {
    name: "container_state_health_status",
    help: "Container health status.",
    extra_label: Some(STATUS_LABEL),
};

pub const STATUS: MetricDesc = MetricDesc {
    name: "container_state_status",
    help: "Container status.",
    extra_label: Some(STATUS_LABEL),
};

pub const OOM_KILLED: MetricDesc = MetricDesc {
    name: "container_state_oomkilled",
    help: "Container was killed by OOMKiller.",
    extra_label: None,
};

pub const STARTED_AT: MetricDesc = MetricDesc {
    name: "container_state_startedat",
    help: "Time when the Container started.",
    extra_label: None,
};

pub const FINISHED_AT: MetricDesc = MetricDesc {
    name: "container_state_finishedat",
    help: "Time when the Container finished.",
    extra_label: None,
};

pub const RESTART_COUNT: MetricDesc = MetricDesc {
    name: "container_restartcount",
    help: "Number of times the container has been restarted",
    extra_label: None,
};

/// All families, in the order samples are emitted per container.
pub const CONTAINER_METRICS: [MetricDesc; 6] = [
    HEALTH_STATUS,
    STATUS,
    OOM_KILLED,
    STARTED_AT,
    FINISHED_AT,
    RESTART_COUNT,
];
