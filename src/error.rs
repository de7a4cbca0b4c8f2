//! Error types for snapshot collection.

use std::time::Duration;

/// Errors that abort a scrape.
///
/// A scrape either succeeds with a complete tuple set or fails with one of these;
/// no partial metric set is ever emitted.
#[derive(Debug, thiserror::Error)]
pub enum CollectError {
    #[error("container runtime unavailable: {0}")]
    RuntimeUnavailable(String),

    #[error("container {container}: invalid {field} timestamp {value:?}: {source}")]
    TimestampParse {
        container: String,
        field: &'static str,
        value: String,
        #[source]
        source: chrono::ParseError,
    },
}

impl CollectError {
    /// True for every failure that originates at the container runtime,
    /// including deadline expiry and malformed records.
    pub fn is_runtime_unavailable(&self) -> bool {
        matches!(self, CollectError::RuntimeUnavailable(_))
    }

    pub(crate) fn timed_out(deadline: Duration) -> Self {
        CollectError::RuntimeUnavailable(format!("no answer within {:?}", deadline))
    }

    pub(crate) fn malformed(container: &str, what: impl std::fmt::Display) -> Self {
        CollectError::RuntimeUnavailable(format!(
            "malformed record for container {}: {}",
            container, what
        ))
    }
}
