//! Label construction for container metrics.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;

use crate::model::ContainerRecord;

/// Prefix applied to every runtime/user label key.
pub const CONTAINER_LABEL_PREFIX: &str = "container_label_";

/// Prefix applied to the runtime id in the `id` label.
pub const ID_PREFIX: &str = "/docker/";

static INVALID_LABEL_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new("[^a-zA-Z0-9_]").expect("static regex"));

/// Rewrites a runtime label key into a valid metric label name.
///
/// `"com.Example/Tag 1"` becomes `container_label_com_example_tag_1`.
///
/// Lowercasing is one char to one char: a char whose full lowercase form is
/// longer (`'İ'` gives `"i\u{307}"`) keeps only the leading char.
pub fn sanitize_label_name(key: &str) -> String {
    let lowered: String = CONTAINER_LABEL_PREFIX
        .chars()
        .chain(key.chars())
        .map(|c| c.to_lowercase().next().unwrap_or(c))
        .collect();
    INVALID_LABEL_CHARS.replace_all(&lowered, "_").into_owned()
}

/// Builds the label set shared by every sample of one container.
///
/// Keys that collide after sanitization keep the value of the last key in
/// sort order. The fixed `id`, `image` and `name` labels are applied last.
pub fn container_base_labels(record: &ContainerRecord) -> BTreeMap<String, String> {
    let mut labels: BTreeMap<String, String> = record
        .labels
        .iter()
        .map(|(key, value)| (sanitize_label_name(key), value.clone()))
        .collect();

    labels.insert("id".to_string(), format!("{}{}", ID_PREFIX, record.id));
    labels.insert("image".to_string(), record.image.clone());
    labels.insert("name".to_string(), record.name.clone());
    labels
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ContainerStatus, HealthStatus, ZERO_TIMESTAMP};

    fn record_with_labels(labels: &[(&str, &str)]) -> ContainerRecord {
        ContainerRecord {
            id: "abc123".to_string(),
            name: "web".to_string(),
            image: "nginx:1.25".to_string(),
            labels: labels
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            status: ContainerStatus::Running,
            health_status: HealthStatus::None,
            oom_killed: false,
            started_at: ZERO_TIMESTAMP.to_string(),
            finished_at: ZERO_TIMESTAMP.to_string(),
            restart_count: 0,
        }
    }

    #[test]
    fn test_sanitize_label_name() {
        assert_eq!(
            sanitize_label_name("com.Example/Tag 1"),
            "container_label_com_example_tag_1"
        );
        assert_eq!(
            sanitize_label_name("maintainer"),
            "container_label_maintainer"
        );
        assert_eq!(
            sanitize_label_name("com.docker.compose.project"),
            "container_label_com_docker_compose_project"
        );
    }

    #[test]
    fn test_sanitize_non_ascii() {
        // Each non-ASCII char becomes exactly one underscore
        assert_eq!(sanitize_label_name("größe"), "container_label_gr__e");
    }

    #[test]
    fn test_sanitize_multi_char_lowercase() {
        assert_eq!(sanitize_label_name("İd"), "container_label_id");
        assert_eq!(sanitize_label_name("Aİ.b"), "container_label_ai_b");
    }

    #[test]
    fn test_base_labels_fixed_fields() {
        let labels = container_base_labels(&record_with_labels(&[]));
        assert_eq!(labels.len(), 3);
        assert_eq!(labels["id"], "/docker/abc123");
        assert_eq!(labels["image"], "nginx:1.25");
        assert_eq!(labels["name"], "web");
    }

    #[test]
    fn test_base_labels_values_untouched() {
        let labels = container_base_labels(&record_with_labels(&[(
            "com.Example/Tag 1",
            "Some Value/With.Punctuation",
        )]));
        assert_eq!(
            labels["container_label_com_example_tag_1"],
            "Some Value/With.Punctuation"
        );
    }

    #[test]
    fn test_base_labels_collision_is_deterministic() {
        // "a-b" sorts before "a.b", so "a.b" wins
        let labels = container_base_labels(&record_with_labels(&[("a.b", "dot"), ("a-b", "dash")]));
        assert_eq!(labels["container_label_a_b"], "dot");
    }
}
