// ABOUTME: Orphan detection and removal for resources left by crashed runs.
// ABOUTME: Matches managed labels and an age threshold on the creation timestamp.

use super::error::SweepError;
use super::teardown::{TeardownReport, teardown};
use crate::diagnostics::{Diagnostics, Warning};
use crate::provision::{Tracked, labels};
use crate::runtime::{ContainerFilters, ContainerOps, NetworkOps};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::time::Duration;

/// True when the `testbed.created` label is at least `older_than` in the past.
/// `None` when the label is missing or unreadable.
fn is_stale(
    resource_labels: &HashMap<String, String>,
    now: DateTime<Utc>,
    older_than: Duration,
) -> Option<bool> {
    let created = DateTime::parse_from_rfc3339(resource_labels.get(labels::CREATED)?).ok()?;
    let age = now.signed_duration_since(created.with_timezone(&Utc));
    // A timestamp in the future is never stale.
    Some(age.to_std().map(|age| age >= older_than).unwrap_or(false))
}

/// Find managed resources older than `older_than`.
///
/// An orphan is a container or network that:
/// - carries `testbed.managed=true`
/// - belongs to `environment`, when one is given
/// - was created at least `older_than` ago
///
/// Resources without a readable creation time are reported and left alone.
pub async fn detect_orphans<G>(
    gateway: &G,
    environment: Option<&str>,
    older_than: Duration,
    diag: &mut Diagnostics,
) -> Result<Vec<Tracked>, SweepError>
where
    G: ContainerOps + NetworkOps + ?Sized,
{
    let filter = labels::managed_filter(environment);
    let now = Utc::now();
    let mut orphans = Vec::new();

    let containers = gateway
        .list_containers(&ContainerFilters {
            labels: filter.clone(),
            all: true,
        })
        .await?;
    for container in containers {
        match is_stale(&container.labels, now, older_than) {
            Some(true) => orphans.push(Tracked::Container {
                id: container.id,
                name: container.name,
            }),
            Some(false) => {}
            None => diag.warn(Warning::orphan_skipped(
                container.name,
                format!("no readable {} label", labels::CREATED),
            )),
        }
    }

    let networks = gateway.list_networks(&filter).await?;
    for network in networks {
        match is_stale(&network.labels, now, older_than) {
            Some(true) => orphans.push(Tracked::Network {
                id: network.id,
                name: network.name,
            }),
            Some(false) => {}
            None => diag.warn(Warning::orphan_skipped(
                network.name,
                format!("no readable {} label", labels::CREATED),
            )),
        }
    }

    Ok(orphans)
}

/// Detect orphans and remove them, containers before networks.
pub async fn sweep_orphans<G>(
    gateway: &G,
    environment: Option<&str>,
    older_than: Duration,
    stop_timeout: Duration,
    diag: &mut Diagnostics,
) -> Result<TeardownReport, SweepError>
where
    G: ContainerOps + NetworkOps + ?Sized,
{
    let orphans = detect_orphans(gateway, environment, older_than, diag).await?;
    if !orphans.is_empty() {
        tracing::info!(count = orphans.len(), "removing orphaned resources");
    }
    let report = teardown(gateway, orphans, stop_timeout).await;
    for failure in &report.failures {
        diag.warn(Warning::teardown_failed(
            failure.resource.clone(),
            failure.reason.clone(),
        ));
    }
    Ok(report)
}
