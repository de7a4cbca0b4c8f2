//! Text exposition tests over expanded snapshots.

use std::collections::BTreeMap;

use container_state_exporter::collector::expand_snapshot;
use container_state_exporter::exposition::{gather_samples, render};
use container_state_exporter::{ContainerRecord, ContainerStatus, HealthStatus, Snapshot};

fn record(id: &str, labels: &[(&str, &str)]) -> ContainerRecord {
    ContainerRecord {
        id: id.to_string(),
        name: format!("{id}-svc"),
        image: "busybox:1.36".to_string(),
        labels: labels
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<BTreeMap<_, _>>(),
        status: ContainerStatus::Running,
        health_status: HealthStatus::Starting,
        oom_killed: false,
        started_at: "2023-01-01T00:00:00Z".to_string(),
        finished_at: "0001-01-01T00:00:00Z".to_string(),
        restart_count: 2,
    }
}

fn rendered(containers: Vec<ContainerRecord>) -> String {
    let samples = expand_snapshot(&Snapshot::new(containers)).unwrap();
    render(&samples, Vec::new()).unwrap()
}

#[test]
fn test_each_family_declared_once() {
    let body = rendered(vec![record("c1", &[]), record("c2", &[])]);

    for name in [
        "container_state_health_status",
        "container_state_status",
        "container_state_oomkilled",
        "container_state_startedat",
        "container_state_finishedat",
        "container_restartcount",
    ] {
        let type_line = format!("# TYPE {name} gauge");
        assert_eq!(body.matches(&type_line).count(), 1, "{name}");
        assert!(body.contains(&format!("# HELP {name} ")), "{name}");
    }
}

#[test]
fn test_fixed_labels_rendered() {
    let body = rendered(vec![record("c1", &[])]);
    assert!(body.contains(r#"id="/docker/c1""#));
    assert!(body.contains(r#"name="c1-svc""#));
    assert!(body.contains(r#"image="busybox:1.36""#));
}

#[test]
fn test_startedat_value() {
    let body = rendered(vec![record("c1", &[])]);
    let line = body
        .lines()
        .find(|l| l.starts_with("container_state_startedat{"))
        .unwrap();
    assert!(line.ends_with(" 1672531200"), "{line}");
}

fn series<'a>(body: &'a str, name: &str) -> Vec<&'a str> {
    let prefix = format!("{name}{{");
    body.lines().filter(|l| l.starts_with(&prefix)).collect()
}

#[test]
fn test_label_union_across_containers() {
    let samples = expand_snapshot(&Snapshot::new(vec![
        record("c1", &[("tier", "web")]),
        record("c2", &[("owner", "ops")]),
    ]))
    .unwrap();
    assert_eq!(gather_samples(&samples).unwrap().len(), 6);
    let body = render(&samples, Vec::new()).unwrap();

    let restarts = series(&body, "container_restartcount");
    assert_eq!(restarts.len(), 2);
    let c1 = restarts.iter().find(|l| l.contains("/docker/c1")).unwrap();
    assert!(c1.contains(r#"container_label_tier="web""#), "{c1}");
    let c2 = restarts.iter().find(|l| l.contains("/docker/c2")).unwrap();
    assert!(c2.contains(r#"container_label_owner="ops""#), "{c2}");
}

#[test]
fn test_status_family_has_seven_series_per_container() {
    let body = rendered(vec![record("c1", &[])]);

    let status = series(&body, "container_state_status");
    assert_eq!(status.len(), 7);
    let hot: Vec<_> = status.iter().filter(|l| l.ends_with(" 1")).collect();
    assert_eq!(hot.len(), 1);
    assert!(hot[0].contains(r#"status="running""#));
}

#[test]
fn test_empty_scrape_renders_empty_body() {
    assert!(rendered(Vec::new()).is_empty());
}
