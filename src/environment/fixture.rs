// ABOUTME: Environment fixture: brings a whole plan up and guarantees teardown.
// ABOUTME: Network first, containers concurrently under one deadline, then dispose once.

use super::error::{
    AggregateProvisioningError, AlreadyInitializedSnafu, ArchiveSnafu, ExecSnafu, FixtureError,
    LogsSnafu, NotInitializedSnafu, SlotFailure, UnknownSlotSnafu, UploadSnafu,
};
use super::teardown::{TeardownReport, teardown};
use crate::config::ProvisionSettings;
use crate::diagnostics::{Diagnostics, Warning};
use crate::plan::{Descriptor, EnvSnapshot, Plan, ResolveError, resolve};
use crate::provision::{ContainerHandle, Ledger, NetworkHandle, Provisioner, Tracked};
use crate::runtime::{ExecConfig, ExecResult, LogLine, RuntimeGateway, collect_tail};
use crate::types::SlotName;
use futures::future::join_all;
use serde::Serialize;
use snafu::{ResultExt, ensure};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::RuntimeFlavor;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// A provisioned environment as seen by the test body.
#[derive(Debug, Clone, Serialize)]
pub struct Environment {
    name: String,
    network: NetworkHandle,
    containers: BTreeMap<SlotName, ContainerHandle>,
}

impl Environment {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn network(&self) -> &NetworkHandle {
        &self.network
    }

    pub fn container(&self, slot: &str) -> Option<&ContainerHandle> {
        self.containers.get(slot)
    }

    /// Containers ordered by slot name.
    pub fn containers(&self) -> impl Iterator<Item = &ContainerHandle> {
        self.containers.values()
    }
}

/// Owns every resource of one environment from `initialize` to `dispose`.
///
/// `dispose` is the teardown guarantee; await it at the end of every test.
/// Dropping a fixture that still owns resources is a last resort: on a
/// multi-thread runtime the drop blocks until teardown finishes, on a
/// current-thread runtime teardown is spawned and is lost if the runtime
/// shuts down first.
pub struct EnvironmentFixture<G: RuntimeGateway + 'static> {
    gateway: Arc<G>,
    plan: Plan,
    settings: ProvisionSettings,
    ledger: Arc<Ledger>,
    environment: Option<Environment>,
    initialized: bool,
    diagnostics: Diagnostics,
}

impl<G: RuntimeGateway + 'static> EnvironmentFixture<G> {
    pub fn new(gateway: Arc<G>, plan: Plan, settings: ProvisionSettings) -> Self {
        Self {
            gateway,
            plan,
            settings,
            ledger: Arc::new(Ledger::new()),
            environment: None,
            initialized: false,
            diagnostics: Diagnostics::default(),
        }
    }

    /// Resolve `descriptor` and wrap the plan. No runtime call is made.
    pub fn from_descriptor(
        gateway: Arc<G>,
        descriptor: &Descriptor,
        env: &EnvSnapshot,
        settings: ProvisionSettings,
    ) -> Result<Self, ResolveError> {
        let plan = resolve(descriptor, env)?;
        Ok(Self::new(gateway, plan, settings))
    }

    pub fn plan(&self) -> &Plan {
        &self.plan
    }

    /// The environment, once initialized and until disposed.
    pub fn environment(&self) -> Option<&Environment> {
        self.environment.as_ref()
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Number of resources still owned.
    pub fn tracked(&self) -> usize {
        self.ledger.len()
    }

    /// Bring the environment up.
    ///
    /// Every provisioning attempt settles before this returns. On any
    /// failure whatever did come up is torn down and all failed slots are
    /// reported together.
    pub async fn initialize(
        &mut self,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<&Environment, FixtureError> {
        ensure!(
            !self.initialized,
            AlreadyInitializedSnafu {
                environment: self.plan.environment(),
            }
        );
        self.initialized = true;

        let deadline = Instant::now() + timeout;
        let environment = self.plan.environment().to_string();
        tracing::info!(
            environment = %environment,
            containers = self.plan.containers().len(),
            "initializing environment"
        );

        let provisioner = Provisioner::new(
            Arc::clone(&self.gateway),
            environment.clone(),
            self.settings.clone(),
            Arc::clone(&self.ledger),
        );

        let network = match provisioner
            .provision_network(self.plan.network(), deadline, cancel)
            .await
        {
            Ok(network) => network,
            Err(e) => {
                self.dispose().await;
                return Err(AggregateProvisioningError::new(vec![SlotFailure::from(e)]).into());
            }
        };

        let provisioner = provisioner.on_network(network.clone());
        let attempts = self
            .plan
            .containers()
            .iter()
            .map(|spec| provisioner.provision_until(spec, deadline, cancel));
        let results = join_all(attempts).await;

        let mut containers = BTreeMap::new();
        let mut failures = Vec::new();
        for result in results {
            match result {
                Ok(handle) => {
                    containers.insert(handle.slot().clone(), handle);
                }
                Err(e) => failures.push(SlotFailure::from(e)),
            }
        }

        if !failures.is_empty() {
            tracing::warn!(
                environment = %environment,
                failed = failures.len(),
                "provisioning failed; tearing down"
            );
            self.dispose().await;
            return Err(AggregateProvisioningError::new(failures).into());
        }

        tracing::info!(environment = %environment, "environment ready");
        Ok(&*self.environment.insert(Environment {
            name: environment,
            network,
            containers,
        }))
    }

    /// Remove every owned resource. Safe to call more than once.
    pub async fn dispose(&mut self) -> TeardownReport {
        self.environment = None;
        let entries = self.ledger.drain();
        if entries.is_empty() {
            return TeardownReport::default();
        }

        tracing::info!(
            environment = %self.plan.environment(),
            resources = entries.len(),
            "tearing down environment"
        );
        let report = teardown(&*self.gateway, entries, self.settings.stop_timeout).await;
        for failure in &report.failures {
            self.diagnostics.warn(Warning::teardown_failed(
                failure.resource.clone(),
                failure.reason.clone(),
            ));
        }
        report
    }

    fn handle(&self, slot: &str) -> Result<&ContainerHandle, FixtureError> {
        let environment = self.environment.as_ref().ok_or_else(|| {
            NotInitializedSnafu {
                environment: self.plan.environment(),
            }
            .build()
        })?;
        environment
            .container(slot)
            .ok_or_else(|| UnknownSlotSnafu { slot }.build())
    }

    /// Run a command inside a container and collect its output.
    pub async fn exec<I, S>(&self, slot: &str, cmd: I) -> Result<ExecResult, FixtureError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let handle = self.handle(slot)?;
        self.gateway
            .exec(handle.id(), &ExecConfig::command(cmd))
            .await
            .context(ExecSnafu { slot })
    }

    /// Run a command that must succeed and return its stdout.
    pub async fn exec_ok<I, S>(&self, slot: &str, cmd: I) -> Result<String, FixtureError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let handle = self.handle(slot)?;
        self.gateway
            .exec_ok(handle.id(), &ExecConfig::command(cmd))
            .await
            .context(ExecSnafu { slot })
    }

    /// Write one file into `dest_dir` inside a container.
    pub async fn copy_into(
        &self,
        slot: &str,
        dest_dir: &str,
        file_name: &str,
        contents: &[u8],
    ) -> Result<(), FixtureError> {
        let handle = self.handle(slot)?;
        let archive = single_file_archive(file_name, contents).context(ArchiveSnafu { slot })?;
        self.gateway
            .upload_archive(handle.id(), dest_dir, archive)
            .await
            .context(UploadSnafu { slot })
    }

    /// The last `tail` log lines of a container.
    pub async fn logs(&self, slot: &str, tail: u64) -> Result<Vec<LogLine>, FixtureError> {
        let handle = self.handle(slot)?;
        collect_tail(&*self.gateway, handle.id(), tail)
            .await
            .context(LogsSnafu { slot })
    }
}

impl<G: RuntimeGateway + 'static> Drop for EnvironmentFixture<G> {
    fn drop(&mut self) {
        let entries = self.ledger.drain();
        if entries.is_empty() {
            return;
        }

        let environment = self.plan.environment().to_string();
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            let names: Vec<&str> = entries.iter().map(|e| e.name()).collect();
            tracing::warn!(
                environment = %environment,
                "fixture dropped outside a runtime; leaking {}",
                names.join(", ")
            );
            return;
        };

        let cleanup = teardown_logged(
            Arc::clone(&self.gateway),
            entries,
            self.settings.stop_timeout,
            environment.clone(),
        );
        if runtime.runtime_flavor() == RuntimeFlavor::MultiThread {
            tracing::warn!(
                environment = %environment,
                "fixture dropped without dispose; tearing down"
            );
            tokio::task::block_in_place(|| runtime.block_on(cleanup));
        } else {
            tracing::warn!(
                environment = %environment,
                "fixture dropped without dispose; teardown runs in the background \
                 and may not finish before the runtime shuts down"
            );
            runtime.spawn(cleanup);
        }
    }
}

async fn teardown_logged<G: RuntimeGateway + 'static>(
    gateway: Arc<G>,
    entries: Vec<Tracked>,
    stop_timeout: Duration,
    environment: String,
) {
    let report = teardown(&*gateway, entries, stop_timeout).await;
    for failure in report.failures {
        tracing::warn!(
            environment = %environment,
            resource = %failure.resource,
            "could not remove: {}",
            failure.reason
        );
    }
}

fn single_file_archive(file_name: &str, contents: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut header = tar::Header::new_gnu();
    header.set_size(contents.len() as u64);
    header.set_mode(0o644);
    header.set_cksum();

    let mut builder = tar::Builder::new(Vec::new());
    builder.append_data(&mut header, file_name, contents)?;
    builder.into_inner()
}
