// ABOUTME: Best-effort removal of tracked resources.
// ABOUTME: Containers go first, newest first, then networks; errors become report entries.

use crate::provision::Tracked;
use crate::runtime::{ContainerError, ContainerOps, NetworkError, NetworkOps};
use serde::Serialize;
use std::future::Future;
use std::time::Duration;

/// Slack on top of the stop timeout before a single runtime call is abandoned.
pub const CALL_GRACE: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CleanupFailure {
    pub resource: String,
    pub reason: String,
}

/// What a teardown removed and what it could not.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TeardownReport {
    pub removed: Vec<String>,
    pub failures: Vec<CleanupFailure>,
}

impl TeardownReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Await a runtime call for at most `limit`.
async fn bounded<T, E: ToString>(
    limit: Duration,
    call: impl Future<Output = Result<T, E>>,
) -> Result<T, String> {
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result.map_err(|e| e.to_string()),
        Err(_) => Err(format!("timed out after {}s", limit.as_secs())),
    }
}

/// Remove every entry. Never fails; a resource already gone counts as removed.
///
/// Each runtime call is bounded by `stop_timeout + CALL_GRACE`, so one hung
/// call cannot hold up the removal of the rest.
pub async fn teardown<G>(gateway: &G, entries: Vec<Tracked>, stop_timeout: Duration) -> TeardownReport
where
    G: ContainerOps + NetworkOps + ?Sized,
{
    let mut report = TeardownReport::default();
    let limit = stop_timeout + CALL_GRACE;
    let (containers, networks): (Vec<_>, Vec<_>) = entries
        .into_iter()
        .partition(|e| matches!(e, Tracked::Container { .. }));

    for entry in containers.into_iter().rev() {
        let Tracked::Container { id, name } = entry else {
            continue;
        };
        match tokio::time::timeout(limit, gateway.stop_container(&id, stop_timeout)).await {
            Ok(Ok(()))
            | Ok(Err(ContainerError::NotRunning(_)))
            | Ok(Err(ContainerError::NotFound(_))) => {}
            Ok(Err(e)) => {
                tracing::debug!(container = %name, error = %e, "stop failed; forcing removal")
            }
            Err(_) => tracing::debug!(container = %name, "stop timed out; forcing removal"),
        }
        let removed = bounded(limit, async {
            match gateway.remove_container(&id, true).await {
                Err(ContainerError::NotFound(_)) => Ok(()),
                other => other,
            }
        })
        .await;
        match removed {
            Ok(()) => {
                tracing::debug!(container = %name, "container removed");
                report.removed.push(name);
            }
            Err(reason) => report.failures.push(CleanupFailure {
                resource: name,
                reason,
            }),
        }
    }

    for entry in networks.into_iter().rev() {
        let Tracked::Network { id, name } = entry else {
            continue;
        };
        let removed = bounded(limit, async {
            match gateway.remove_network(&id).await {
                Err(NetworkError::NotFound(_)) => Ok(()),
                other => other,
            }
        })
        .await;
        match removed {
            Ok(()) => {
                tracing::debug!(network = %name, "network removed");
                report.removed.push(name);
            }
            Err(reason) => report.failures.push(CleanupFailure {
                resource: name,
                reason,
            }),
        }
    }

    report
}
