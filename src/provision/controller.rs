// ABOUTME: Lifecycle controller: build or pull, create, start and wait for health.
// ABOUTME: Every wait races the shared deadline and a cancellation token.

use super::access;
use super::error::{ProvisionError, Result};
use super::handle::{ContainerHandle, NetworkHandle};
use super::labels;
use super::ledger::{Ledger, Tracked};
use super::status::HealthStatus;
use crate::config::ProvisionSettings;
use crate::plan::{ContainerSpec, ImageSource, NetworkSpec};
use crate::runtime::{
    BuildRequest, ContainerConfig, ContainerError, ContainerInfo, NetworkConfig, PortMapping,
    RuntimeGateway, collect_tail,
};
use crate::types::{ContainerId, ImageRef, InstanceId, SlotName};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Log lines surfaced when a container misses its deadline.
const LOG_TAIL_LINES: u64 = 20;

enum Interrupt {
    Cancelled,
    TimedOut,
}

/// Run `fut` unless cancellation or the deadline comes first.
async fn race<F: Future>(
    fut: F,
    deadline: Instant,
    cancel: &CancellationToken,
) -> std::result::Result<F::Output, Interrupt> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Interrupt::Cancelled),
        _ = tokio::time::sleep_until(deadline) => Err(Interrupt::TimedOut),
        out = fut => Ok(out),
    }
}

/// Provisions the resources of one environment.
///
/// Every created resource is recorded in the shared ledger before anything
/// else can fail, so an owner draining the ledger always sees it.
pub struct Provisioner<G: ?Sized> {
    gateway: Arc<G>,
    environment: String,
    settings: ProvisionSettings,
    ledger: Arc<Ledger>,
    network: Option<NetworkHandle>,
}

impl<G: ?Sized> Clone for Provisioner<G> {
    fn clone(&self) -> Self {
        Self {
            gateway: Arc::clone(&self.gateway),
            environment: self.environment.clone(),
            settings: self.settings.clone(),
            ledger: Arc::clone(&self.ledger),
            network: self.network.clone(),
        }
    }
}

impl<G: RuntimeGateway + ?Sized> Provisioner<G> {
    pub fn new(
        gateway: Arc<G>,
        environment: impl Into<String>,
        settings: ProvisionSettings,
        ledger: Arc<Ledger>,
    ) -> Self {
        Self {
            gateway,
            environment: environment.into(),
            settings,
            ledger,
            network: None,
        }
    }

    /// Containers provisioned from now on join `network`.
    pub fn on_network(mut self, network: NetworkHandle) -> Self {
        self.network = Some(network);
        self
    }

    pub fn ledger(&self) -> &Arc<Ledger> {
        &self.ledger
    }

    pub fn settings(&self) -> &ProvisionSettings {
        &self.settings
    }

    /// Create the environment network.
    pub async fn provision_network(
        &self,
        spec: &NetworkSpec,
        deadline: Instant,
        cancel: &CancellationToken,
    ) -> Result<NetworkHandle> {
        let slot = &spec.slot;
        if cancel.is_cancelled() {
            return Err(ProvisionError::Cancelled { slot: slot.clone() });
        }
        if Instant::now() >= deadline {
            return Err(ProvisionError::StartupTimeout {
                slot: slot.clone(),
                waited: Duration::ZERO,
                last_status: HealthStatus::Unknown,
            });
        }

        let instance = InstanceId::generate();
        let name = format!("{}-{}", spec.identity, instance.short());
        tracing::info!(slot = %slot, network = %name, "creating network");

        let config = NetworkConfig {
            name: name.clone(),
            labels: labels::resource_labels(&self.environment, slot, instance),
            options: spec.options.clone(),
        };
        let id = self
            .gateway
            .create_network(&config)
            .await
            .map_err(|e| ProvisionError::CreationFailed {
                slot: slot.clone(),
                reason: e.to_string(),
            })?;
        self.ledger.track(Tracked::Network {
            id: id.clone(),
            name: name.clone(),
        });

        Ok(NetworkHandle::new(slot.clone(), instance, name, id))
    }

    /// Provision a container with its own time budget.
    pub async fn provision(
        &self,
        spec: &ContainerSpec,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<ContainerHandle> {
        self.provision_until(spec, Instant::now() + timeout, cancel)
            .await
    }

    /// Provision a container against a deadline shared with other slots.
    pub async fn provision_until(
        &self,
        spec: &ContainerSpec,
        deadline: Instant,
        cancel: &CancellationToken,
    ) -> Result<ContainerHandle> {
        let started = Instant::now();
        let slot = &spec.slot;
        let instance = InstanceId::generate();
        let name = format!("{}-{}", spec.identity, instance.short());
        let interrupted = |interrupt: Interrupt, last_status: HealthStatus| match interrupt {
            Interrupt::Cancelled => ProvisionError::Cancelled { slot: slot.clone() },
            Interrupt::TimedOut => ProvisionError::StartupTimeout {
                slot: slot.clone(),
                waited: deadline.saturating_duration_since(started),
                last_status,
            },
        };

        let image = race(self.prepare_image(spec, instance), deadline, cancel)
            .await
            .map_err(|i| interrupted(i, HealthStatus::Unknown))??;

        // Creation is not raced: an abandoned create could leave a container
        // the ledger never hears about.
        if cancel.is_cancelled() {
            return Err(interrupted(Interrupt::Cancelled, HealthStatus::Unknown));
        }
        let config = self.container_config(spec, &name, &image, instance)?;
        tracing::info!(slot = %slot, container = %name, image = %image, "creating container");
        let id = self
            .gateway
            .create_container(&config)
            .await
            .map_err(|e| ProvisionError::CreationFailed {
                slot: slot.clone(),
                reason: e.to_string(),
            })?;
        self.ledger.track(Tracked::Container {
            id: id.clone(),
            name: name.clone(),
        });

        tracing::info!(slot = %slot, container = %name, "starting container");
        match race(self.gateway.start_container(&id), deadline, cancel).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                self.discard(slot, &id).await;
                return Err(ProvisionError::StartFailed {
                    slot: slot.clone(),
                    reason: e.to_string(),
                });
            }
            Err(interrupt) => {
                self.discard(slot, &id).await;
                return Err(interrupted(interrupt, HealthStatus::Unknown));
            }
        }

        let (info, status) = match self.wait_healthy(slot, &id, deadline, cancel).await {
            Ok(observed) => observed,
            Err((interrupt, last_status)) => {
                if matches!(interrupt, Interrupt::TimedOut) {
                    self.log_tail(slot, &id).await;
                }
                self.discard(slot, &id).await;
                return Err(interrupted(interrupt, last_status));
            }
        };

        let access_points = match access::resolve(
            slot,
            &info,
            &spec.ports,
            self.network.as_ref().map(NetworkHandle::name),
            &self.settings.public_host,
        ) {
            Ok(points) => points,
            Err(e) => {
                self.discard(slot, &id).await;
                return Err(e);
            }
        };

        tracing::info!(
            slot = %slot,
            container = %name,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "container healthy"
        );

        Ok(ContainerHandle::new(
            slot.clone(),
            instance,
            name,
            id,
            image,
            status,
            access_points,
            spec.accounts.clone(),
        ))
    }

    async fn prepare_image(&self, spec: &ContainerSpec, instance: InstanceId) -> Result<ImageRef> {
        let slot = &spec.slot;
        match &spec.source {
            ImageSource::Build {
                context,
                dockerfile,
                tag,
            } => {
                tracing::info!(slot = %slot, context = %context.display(), "building image");
                let request = BuildRequest {
                    context: context.clone(),
                    dockerfile: dockerfile.clone(),
                    tag: tag.clone(),
                    labels: labels::resource_labels(&self.environment, slot, instance),
                };
                self.gateway
                    .build_image(&request)
                    .await
                    .map_err(|e| ProvisionError::BuildFailed {
                        slot: slot.clone(),
                        reason: e.to_string(),
                    })
            }
            ImageSource::Image(image) => {
                let present = match self.gateway.image_exists(image).await {
                    Ok(present) => present,
                    Err(e) => {
                        tracing::debug!(slot = %slot, error = %e, "image lookup failed; pulling");
                        false
                    }
                };
                if !present {
                    tracing::info!(slot = %slot, image = %image, "pulling image");
                    self.gateway.pull_image(image).await.map_err(|e| {
                        ProvisionError::CreationFailed {
                            slot: slot.clone(),
                            reason: e.to_string(),
                        }
                    })?;
                }
                Ok(image.clone())
            }
        }
    }

    fn container_config(
        &self,
        spec: &ContainerSpec,
        name: &str,
        image: &ImageRef,
        instance: InstanceId,
    ) -> Result<ContainerConfig> {
        let network = match (&spec.network, &self.network) {
            (None, _) => None,
            (Some(wanted), Some(network)) if wanted == network.slot() => {
                Some(network.name().to_string())
            }
            (Some(wanted), _) => {
                return Err(ProvisionError::CreationFailed {
                    slot: spec.slot.clone(),
                    reason: format!("network '{wanted}' has not been provisioned"),
                });
            }
        };

        Ok(ContainerConfig {
            name: name.to_string(),
            image: image.clone(),
            env: spec.env.clone(),
            labels: labels::resource_labels(&self.environment, &spec.slot, instance),
            ports: spec
                .ports
                .iter()
                .map(|p| PortMapping {
                    container_port: p.container_port,
                    host_port: p.host_port,
                    protocol: p.protocol,
                })
                .collect(),
            command: spec.command.clone(),
            healthcheck: spec.healthcheck.as_ref().map(|hc| hc.to_runtime()),
            network_aliases: if network.is_some() {
                vec![spec.slot.as_alias()]
            } else {
                Vec::new()
            },
            network,
            options: spec.options.clone(),
        })
    }

    /// Poll until healthy. Inspection errors are logged and polled again.
    async fn wait_healthy(
        &self,
        slot: &SlotName,
        id: &ContainerId,
        deadline: Instant,
        cancel: &CancellationToken,
    ) -> std::result::Result<(ContainerInfo, HealthStatus), (Interrupt, HealthStatus)> {
        let mut last_status = HealthStatus::Unknown;
        loop {
            match race(self.gateway.inspect_container(id), deadline, cancel).await {
                Ok(Ok(info)) => {
                    let status = HealthStatus::observe(&info);
                    tracing::debug!(slot = %slot, status = %status, "polled container");
                    last_status = status;
                    if status == HealthStatus::Healthy {
                        return Ok((info, status));
                    }
                }
                Ok(Err(e)) => {
                    tracing::debug!(slot = %slot, error = %e, "inspect failed; polling again");
                }
                Err(interrupt) => return Err((interrupt, last_status)),
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err((Interrupt::Cancelled, last_status)),
                _ = tokio::time::sleep_until(deadline) => {
                    return Err((Interrupt::TimedOut, last_status));
                }
                _ = tokio::time::sleep(self.settings.poll_interval) => {}
            }
        }
    }

    async fn log_tail(&self, slot: &SlotName, id: &ContainerId) {
        match collect_tail(&*self.gateway, id, LOG_TAIL_LINES).await {
            Ok(lines) => {
                for line in lines {
                    tracing::warn!(slot = %slot, "{}", line.content);
                }
            }
            Err(e) => tracing::debug!(slot = %slot, error = %e, "could not read container logs"),
        }
    }

    /// Best-effort stop and remove; failures stay in the ledger for teardown.
    async fn discard(&self, slot: &SlotName, id: &ContainerId) {
        if let Err(e) = self
            .gateway
            .stop_container(id, self.settings.stop_timeout)
            .await
        {
            tracing::debug!(slot = %slot, error = %e, "stop during cleanup failed");
        }
        match self.gateway.remove_container(id, true).await {
            Ok(()) | Err(ContainerError::NotFound(_)) => self.ledger.forget_container(id),
            Err(e) => {
                tracing::warn!(slot = %slot, container = %id.short(), error = %e, "cleanup failed")
            }
        }
    }
}
