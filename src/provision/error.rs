// ABOUTME: Errors raised while provisioning a single resource.
// ABOUTME: Each variant names the slot; kind() supports programmatic handling.

use super::status::HealthStatus;
use crate::runtime::Protocol;
use crate::types::SlotName;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("image build for '{slot}' failed: {reason}")]
    BuildFailed { slot: SlotName, reason: String },

    #[error("could not create '{slot}': {reason}")]
    CreationFailed { slot: SlotName, reason: String },

    #[error("could not start '{slot}': {reason}")]
    StartFailed { slot: SlotName, reason: String },

    #[error("'{slot}' was not healthy after {waited:?} (last status: {last_status})")]
    StartupTimeout {
        slot: SlotName,
        waited: Duration,
        last_status: HealthStatus,
    },

    #[error("provisioning of '{slot}' was cancelled")]
    Cancelled { slot: SlotName },

    #[error("no access point for {container_port}/{protocol} on '{slot}': {reason}")]
    AccessPointUnavailable {
        slot: SlotName,
        container_port: u16,
        protocol: Protocol,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProvisionErrorKind {
    BuildFailed,
    CreationFailed,
    StartFailed,
    StartupTimeout,
    Cancelled,
    AccessPointUnavailable,
}

impl ProvisionError {
    pub fn kind(&self) -> ProvisionErrorKind {
        match self {
            ProvisionError::BuildFailed { .. } => ProvisionErrorKind::BuildFailed,
            ProvisionError::CreationFailed { .. } => ProvisionErrorKind::CreationFailed,
            ProvisionError::StartFailed { .. } => ProvisionErrorKind::StartFailed,
            ProvisionError::StartupTimeout { .. } => ProvisionErrorKind::StartupTimeout,
            ProvisionError::Cancelled { .. } => ProvisionErrorKind::Cancelled,
            ProvisionError::AccessPointUnavailable { .. } => {
                ProvisionErrorKind::AccessPointUnavailable
            }
        }
    }

    pub fn slot(&self) -> &SlotName {
        match self {
            ProvisionError::BuildFailed { slot, .. }
            | ProvisionError::CreationFailed { slot, .. }
            | ProvisionError::StartFailed { slot, .. }
            | ProvisionError::StartupTimeout { slot, .. }
            | ProvisionError::Cancelled { slot }
            | ProvisionError::AccessPointUnavailable { slot, .. } => slot,
        }
    }
}

pub type Result<T> = std::result::Result<T, ProvisionError>;
