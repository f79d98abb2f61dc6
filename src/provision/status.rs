// ABOUTME: Health status derived from a container inspection.
// ABOUTME: Unknown -> Running -> Healthy | Unhealthy; only Healthy ends the wait.

use crate::runtime::{ContainerInfo, ContainerState, HealthState};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    #[default]
    Unknown,
    Running,
    Healthy,
    Unhealthy,
}

impl HealthStatus {
    /// Interpret one inspection.
    ///
    /// A running container without a health check counts as healthy. A
    /// container that stopped running is unhealthy; the caller keeps polling
    /// until its deadline either way.
    pub fn observe(info: &ContainerInfo) -> Self {
        match info.state {
            ContainerState::Created => HealthStatus::Unknown,
            ContainerState::Restarting => HealthStatus::Running,
            ContainerState::Running => match info.health {
                None | Some(HealthState::None) | Some(HealthState::Healthy) => {
                    HealthStatus::Healthy
                }
                Some(HealthState::Starting) => HealthStatus::Running,
                Some(HealthState::Unhealthy) => HealthStatus::Unhealthy,
            },
            ContainerState::Paused
            | ContainerState::Exited
            | ContainerState::Dead
            | ContainerState::Removing => HealthStatus::Unhealthy,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Unknown => "unknown",
            HealthStatus::Running => "running",
            HealthStatus::Healthy => "healthy",
            HealthStatus::Unhealthy => "unhealthy",
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
