// ABOUTME: Shared types used across runtime trait definitions.
// ABOUTME: ContainerConfig, ContainerInfo, NetworkConfig, BuildRequest, exec types.

use crate::types::{ContainerId, ImageRef, NetworkAlias};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for creating a container.
#[derive(Debug, Clone)]
pub struct ContainerConfig {
    pub name: String,
    pub image: ImageRef,
    pub env: BTreeMap<String, String>,
    pub labels: HashMap<String, String>,
    /// Ports to publish; a missing host port lets the runtime pick one.
    pub ports: Vec<PortMapping>,
    /// Overrides the image CMD.
    pub command: Option<Vec<String>>,
    pub healthcheck: Option<HealthcheckConfig>,
    /// Network to attach at creation time.
    pub network: Option<String>,
    pub network_aliases: Vec<NetworkAlias>,
    /// Runtime-specific settings, passed through uninterpreted.
    pub options: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortMapping {
    pub container_port: u16,
    pub host_port: Option<u16>,
    pub protocol: Protocol,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    #[default]
    Tcp,
    Udp,
}

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Tcp => "tcp",
            Protocol::Udp => "udp",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Runtime-level health check, in the runtime's own terms.
#[derive(Debug, Clone)]
pub struct HealthcheckConfig {
    /// Test command, e.g. `["CMD-SHELL", "curl -f http://localhost/"]`.
    pub test: Vec<String>,
    pub interval: Duration,
    pub timeout: Duration,
    pub retries: u32,
    pub start_period: Duration,
}

/// A snapshot of one container as reported by the runtime.
#[derive(Debug, Clone)]
pub struct ContainerInfo {
    pub id: ContainerId,
    pub name: String,
    pub image: String,
    pub state: ContainerState,
    /// `None` when the container has no health check at all.
    pub health: Option<HealthState>,
    pub labels: HashMap<String, String>,
    pub network_settings: NetworkSettings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerState {
    Created,
    Running,
    Paused,
    Restarting,
    Removing,
    Exited,
    Dead,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthState {
    Starting,
    Healthy,
    Unhealthy,
    None,
}

#[derive(Debug, Clone, Default)]
pub struct NetworkSettings {
    /// Attachments keyed by network name.
    pub networks: HashMap<String, NetworkInfo>,
    /// Published ports, one entry per host binding.
    pub ports: Vec<PublishedPort>,
}

#[derive(Debug, Clone)]
pub struct NetworkInfo {
    pub network_id: String,
    pub ip_address: String,
    pub aliases: Vec<String>,
}

/// A container port and, once published, where the host exposes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedPort {
    pub container_port: u16,
    pub protocol: Protocol,
    pub host_ip: Option<String>,
    pub host_port: Option<u16>,
}

/// Configuration for creating a network.
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    pub name: String,
    pub labels: HashMap<String, String>,
    /// Runtime-specific settings, passed through uninterpreted.
    pub options: BTreeMap<String, String>,
}

/// Build an image from a directory on the local filesystem.
#[derive(Debug, Clone)]
pub struct BuildRequest {
    pub context: PathBuf,
    /// Dockerfile path relative to the context.
    pub dockerfile: PathBuf,
    pub tag: ImageRef,
    pub labels: HashMap<String, String>,
}

#[derive(Debug, Clone)]
pub struct RuntimeMetadata {
    pub name: String,
    pub version: String,
    pub api_version: String,
    pub os: String,
    pub arch: String,
}

/// Exec configuration for running commands in containers.
#[derive(Debug, Clone)]
pub struct ExecConfig {
    pub cmd: Vec<String>,
    pub env: Vec<String>,
    pub working_dir: Option<String>,
    pub user: Option<String>,
    pub attach_stdout: bool,
    pub attach_stderr: bool,
}

impl ExecConfig {
    pub fn command<I, S>(cmd: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            cmd: cmd.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }
}

impl Default for ExecConfig {
    fn default() -> Self {
        Self {
            cmd: Vec::new(),
            env: Vec::new(),
            working_dir: None,
            user: None,
            attach_stdout: true,
            attach_stderr: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExecResult {
    pub exit_code: i64,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl ExecResult {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    pub fn stdout_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }
}
