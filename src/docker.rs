//! Docker Engine implementation of [`ContainerRuntime`].

use std::time::Duration;

use bollard::container::{InspectContainerOptions, ListContainersOptions};
use bollard::errors::Error as BollardError;
use bollard::models::ContainerInspectResponse;
use bollard::{Docker, API_DEFAULT_VERSION};
use tracing::{debug, instrument};

use crate::error::CollectError;
use crate::runtime::{ContainerRuntime, InspectedContainer, InspectedState};

/// Docker client shared read-only by all scrapes.
#[derive(Clone)]
pub struct DockerRuntime {
    docker: Docker,
    all_containers: bool,
}

impl DockerRuntime {
    /// Connects to the daemon at `host` (`unix://`, `tcp://` or `http://`),
    /// or to the local defaults (`DOCKER_HOST`, then the default socket).
    ///
    /// This does not talk to the daemon yet; call [`ContainerRuntime::ping`].
    pub fn connect(
        host: Option<&str>,
        timeout: Duration,
        all_containers: bool,
    ) -> Result<Self, CollectError> {
        let timeout_secs = timeout.as_secs().max(1);
        let docker = match host {
            None => Docker::connect_with_local_defaults(),
            #[cfg(unix)]
            Some(addr) if addr.starts_with("unix://") => {
                Docker::connect_with_unix(addr, timeout_secs, API_DEFAULT_VERSION)
            }
            Some(addr) if addr.starts_with("tcp://") || addr.starts_with("http://") => {
                Docker::connect_with_http(addr, timeout_secs, API_DEFAULT_VERSION)
            }
            Some(addr) => {
                return Err(CollectError::RuntimeUnavailable(format!(
                    "unsupported docker host {:?}",
                    addr
                )))
            }
        }
        .map_err(unavailable)?;

        debug!("Docker client configured (host: {:?})", host);
        Ok(Self {
            docker: docker.with_timeout(timeout),
            all_containers,
        })
    }
}

fn unavailable(err: BollardError) -> CollectError {
    CollectError::RuntimeUnavailable(err.to_string())
}

fn convert(requested_id: &str, resp: ContainerInspectResponse) -> InspectedContainer {
    let config = resp.config;
    InspectedContainer {
        id: resp.id.unwrap_or_else(|| requested_id.to_string()),
        name: resp.name,
        image: config.as_ref().and_then(|c| c.image.clone()),
        labels: config.and_then(|c| c.labels),
        state: resp.state.map(|state| InspectedState {
            status: state.status.map(|s| s.to_string()),
            health_status: state
                .health
                .and_then(|health| health.status)
                .map(|s| s.to_string()),
            oom_killed: state.oom_killed,
            started_at: state.started_at,
            finished_at: state.finished_at,
        }),
        restart_count: resp.restart_count,
    }
}

impl ContainerRuntime for DockerRuntime {
    async fn ping(&self) -> Result<(), CollectError> {
        self.docker.ping().await.map(|_| ()).map_err(unavailable)
    }

    #[instrument(skip(self))]
    async fn list_container_ids(&self) -> Result<Vec<String>, CollectError> {
        let options = ListContainersOptions::<String> {
            all: self.all_containers,
            ..Default::default()
        };
        let containers = self
            .docker
            .list_containers(Some(options))
            .await
            .map_err(unavailable)?;

        Ok(containers.into_iter().filter_map(|c| c.id).collect())
    }

    #[instrument(skip(self))]
    async fn inspect_container(&self, id: &str) -> Result<Option<InspectedContainer>, CollectError> {
        match self
            .docker
            .inspect_container(id, None::<InspectContainerOptions>)
            .await
        {
            Ok(resp) => Ok(Some(convert(id, resp))),
            Err(BollardError::DockerResponseServerError {
                status_code: 404, ..
            }) => Ok(None),
            Err(e) => Err(unavailable(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bollard::models::{
        ContainerConfig, ContainerState, ContainerStateStatusEnum, Health, HealthStatusEnum,
    };
    use std::collections::HashMap;

    #[test]
    fn test_convert_full_response() {
        let resp = ContainerInspectResponse {
            id: Some("abc".to_string()),
            name: Some("/web".to_string()),
            restart_count: Some(2),
            config: Some(ContainerConfig {
                image: Some("nginx".to_string()),
                labels: Some(HashMap::from([("tier".to_string(), "front".to_string())])),
                ..Default::default()
            }),
            state: Some(ContainerState {
                status: Some(ContainerStateStatusEnum::RUNNING),
                oom_killed: Some(false),
                started_at: Some("2023-01-01T00:00:00Z".to_string()),
                finished_at: Some("0001-01-01T00:00:00Z".to_string()),
                health: Some(Health {
                    status: Some(HealthStatusEnum::HEALTHY),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            ..Default::default()
        };

        let inspected = convert("abc", resp);
        assert_eq!(inspected.id, "abc");
        assert_eq!(inspected.name.as_deref(), Some("/web"));
        assert_eq!(inspected.image.as_deref(), Some("nginx"));
        assert_eq!(inspected.restart_count, Some(2));
        let state = inspected.state.expect("state block");
        assert_eq!(state.status.as_deref(), Some("running"));
        assert_eq!(state.health_status.as_deref(), Some("healthy"));
    }

    #[test]
    fn test_convert_missing_blocks() {
        let inspected = convert("xyz", ContainerInspectResponse::default());
        assert_eq!(inspected.id, "xyz");
        assert!(inspected.labels.is_none());
        assert!(inspected.state.is_none());
    }

    #[test]
    fn test_connect_rejects_unknown_scheme() {
        let result = DockerRuntime::connect(Some("ssh://host"), Duration::from_secs(5), true);
        assert!(matches!(result, Err(CollectError::RuntimeUnavailable(_))));
    }
}
