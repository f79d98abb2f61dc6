// ABOUTME: Environment-level errors with SNAFU pattern.
// ABOUTME: Aggregates per-slot provisioning failures and fixture misuse.

use crate::provision::{ProvisionError, ProvisionErrorKind};
use crate::runtime::{ContainerError, ExecError, LogError, NetworkError};
use crate::types::SlotName;
use snafu::Snafu;

/// One slot that failed to provision.
#[derive(Debug)]
pub struct SlotFailure {
    pub slot: SlotName,
    pub kind: ProvisionErrorKind,
    pub error: ProvisionError,
}

impl From<ProvisionError> for SlotFailure {
    fn from(error: ProvisionError) -> Self {
        Self {
            slot: error.slot().clone(),
            kind: error.kind(),
            error,
        }
    }
}

fn describe(failures: &[SlotFailure]) -> String {
    failures
        .iter()
        .map(|f| f.error.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Every provisioning attempt that failed during one initialization.
#[derive(Debug, Snafu)]
#[snafu(display(
    "{} slot(s) failed to provision: {}",
    failures.len(),
    describe(failures)
))]
pub struct AggregateProvisioningError {
    failures: Vec<SlotFailure>,
}

impl AggregateProvisioningError {
    pub(crate) fn new(failures: Vec<SlotFailure>) -> Self {
        Self { failures }
    }

    pub fn failures(&self) -> &[SlotFailure] {
        &self.failures
    }

    pub fn failed_slots(&self) -> impl Iterator<Item = &SlotName> {
        self.failures.iter().map(|f| &f.slot)
    }

    pub fn failure(&self, slot: &str) -> Option<&SlotFailure> {
        self.failures.iter().find(|f| f.slot.as_str() == slot)
    }
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum FixtureError {
    #[snafu(display("{source}"))]
    Provisioning { source: AggregateProvisioningError },

    #[snafu(display("environment '{environment}' was already initialized"))]
    AlreadyInitialized { environment: String },

    #[snafu(display("environment '{environment}' is not initialized"))]
    NotInitialized { environment: String },

    #[snafu(display("no container slot named '{slot}'"))]
    UnknownSlot { slot: String },

    #[snafu(display("exec in '{slot}' failed: {source}"))]
    Exec { slot: String, source: ExecError },

    #[snafu(display("copy into '{slot}' failed: {source}"))]
    Upload { slot: String, source: ContainerError },

    #[snafu(display("could not build archive for '{slot}': {source}"))]
    Archive {
        slot: String,
        source: std::io::Error,
    },

    #[snafu(display("reading logs of '{slot}' failed: {source}"))]
    Logs { slot: String, source: LogError },
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixtureErrorKind {
    Provisioning,
    AlreadyInitialized,
    NotInitialized,
    UnknownSlot,
    Exec,
    Upload,
    Logs,
}

impl FixtureError {
    pub fn kind(&self) -> FixtureErrorKind {
        match self {
            FixtureError::Provisioning { .. } => FixtureErrorKind::Provisioning,
            FixtureError::AlreadyInitialized { .. } => FixtureErrorKind::AlreadyInitialized,
            FixtureError::NotInitialized { .. } => FixtureErrorKind::NotInitialized,
            FixtureError::UnknownSlot { .. } => FixtureErrorKind::UnknownSlot,
            FixtureError::Exec { .. } => FixtureErrorKind::Exec,
            FixtureError::Upload { .. } | FixtureError::Archive { .. } => FixtureErrorKind::Upload,
            FixtureError::Logs { .. } => FixtureErrorKind::Logs,
        }
    }

    /// The aggregate failure, when initialization failed.
    pub fn provisioning(&self) -> Option<&AggregateProvisioningError> {
        match self {
            FixtureError::Provisioning { source } => Some(source),
            _ => None,
        }
    }
}

impl From<AggregateProvisioningError> for FixtureError {
    fn from(source: AggregateProvisioningError) -> Self {
        FixtureError::Provisioning { source }
    }
}

/// Listing leftovers failed; nothing was removed.
#[derive(Debug, thiserror::Error)]
pub enum SweepError {
    #[error("listing containers failed: {0}")]
    Containers(#[from] ContainerError),

    #[error("listing networks failed: {0}")]
    Networks(#[from] NetworkError),
}
