// ABOUTME: In-memory runtime gateway for provisioning tests.
// ABOUTME: Scripted per-slot behavior, recorded calls, and realistic port and IP assignment.

use async_trait::async_trait;
use futures::stream;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use testbed::provision::labels;
use testbed::runtime::{
    BuildRequest, ContainerConfig, ContainerError, ContainerFilters, ContainerInfo, ContainerOps,
    ContainerState, ContainerSummary, ExecConfig, ExecError, ExecOps, ExecResult, HealthState,
    ImageError, ImageOps, LogError, LogLine, LogLineStream, LogOps, LogOptions, LogStream,
    NetworkConfig, NetworkError, NetworkInfo, NetworkOps, NetworkSettings, NetworkSummary,
    PublishedPort,
};
use testbed::types::{ContainerId, ImageRef, NetworkId};

/// First host port handed out, like Docker's ephemeral range.
pub const FIRST_HOST_PORT: u16 = 32768;

/// How the fake runtime treats containers of one slot.
#[derive(Debug, Clone, Default)]
pub struct Behavior {
    pub start_delay: Duration,
    pub create_error: Option<String>,
    pub start_error: Option<String>,
    pub build_error: Option<String>,
    /// Health reported by successive inspections; the last entry repeats.
    /// Empty means the container has no health check.
    pub health: Vec<HealthState>,
    pub logs: Vec<String>,
    /// Removal of the container blocks for this long before it happens.
    pub remove_delay: Duration,
}

impl Behavior {
    pub fn healthy_after(polls: usize) -> Self {
        let mut health = vec![HealthState::Starting; polls];
        health.push(HealthState::Healthy);
        Self {
            health,
            ..Self::default()
        }
    }

    pub fn unhealthy() -> Self {
        Self {
            health: vec![HealthState::Unhealthy],
            ..Self::default()
        }
    }

    pub fn slow_start(delay: Duration) -> Self {
        Self {
            start_delay: delay,
            ..Self::default()
        }
    }
}

/// Every gateway call, in the order it was made.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    ImageExists(String),
    Pull(String),
    Build(String),
    Create(String),
    Start(String),
    Stop(String),
    Remove(String),
    Inspect(String),
    CreateNetwork(String),
    RemoveNetwork(String),
    ListContainers,
    ListNetworks,
    Exec(String, Vec<String>),
    Upload(String, String),
    Logs(String),
}

#[derive(Debug, Clone)]
struct FakeContainer {
    name: String,
    image: String,
    labels: HashMap<String, String>,
    state: ContainerState,
    network: Option<(String, String)>,
    aliases: Vec<String>,
    ports: Vec<PublishedPort>,
    inspections: usize,
    behavior: Behavior,
}

#[derive(Debug, Clone)]
struct FakeNetwork {
    name: String,
    labels: HashMap<String, String>,
    hosts: u8,
}

#[derive(Debug, Default)]
struct State {
    next_id: u64,
    next_host_port: u16,
    images: HashSet<String>,
    containers: HashMap<String, FakeContainer>,
    networks: HashMap<String, FakeNetwork>,
    behaviors: HashMap<String, Behavior>,
    network_error: Option<String>,
    uploads: Vec<(String, String, Vec<u8>)>,
    calls: Vec<Call>,
}

impl State {
    fn id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}{:060x}", self.next_id)
    }

    fn container(&mut self, id: &ContainerId) -> Result<&mut FakeContainer, ContainerError> {
        self.containers
            .get_mut(id.as_str())
            .ok_or_else(|| ContainerError::NotFound(id.to_string()))
    }
}

#[derive(Debug)]
pub struct FakeGateway {
    state: Mutex<State>,
}

impl Default for FakeGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeGateway {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                next_host_port: FIRST_HOST_PORT,
                ..State::default()
            }),
        }
    }

    /// Script how containers of `slot` behave.
    pub fn behave(&self, slot: &str, behavior: Behavior) {
        self.state
            .lock()
            .behaviors
            .insert(slot.to_string(), behavior);
    }

    /// Make every network creation fail with `reason`.
    pub fn fail_network_creation(&self, reason: &str) {
        self.state.lock().network_error = Some(reason.to_string());
    }

    /// Mark an image as already present locally.
    pub fn with_image(self, reference: &str) -> Self {
        self.state.lock().images.insert(reference.to_string());
        self
    }

    /// Add a container that no fixture owns, as a crashed run would leave.
    pub fn seed_container(&self, name: &str, resource_labels: HashMap<String, String>) -> ContainerId {
        let mut state = self.state.lock();
        let id = state.id("c");
        state.containers.insert(
            id.clone(),
            FakeContainer {
                name: name.to_string(),
                image: "busybox:latest".to_string(),
                labels: resource_labels,
                state: ContainerState::Running,
                network: None,
                aliases: Vec::new(),
                ports: Vec::new(),
                inspections: 0,
                behavior: Behavior::default(),
            },
        );
        ContainerId::new(id)
    }

    /// Add a network that no fixture owns.
    pub fn seed_network(&self, name: &str, resource_labels: HashMap<String, String>) -> NetworkId {
        let mut state = self.state.lock();
        let id = state.id("n");
        state.networks.insert(
            id.clone(),
            FakeNetwork {
                name: name.to_string(),
                labels: resource_labels,
                hosts: 1,
            },
        );
        NetworkId::new(id)
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().calls.clone()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.state.lock().calls.iter().filter(|c| pred(c)).count()
    }

    pub fn live_containers(&self) -> usize {
        self.state.lock().containers.len()
    }

    pub fn live_networks(&self) -> usize {
        self.state.lock().networks.len()
    }

    pub fn container_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self
            .state
            .lock()
            .containers
            .values()
            .map(|c| c.name.clone())
            .collect();
        names.sort();
        names
    }

    /// Archives uploaded so far: container id, destination, tar bytes.
    pub fn uploads(&self) -> Vec<(String, String, Vec<u8>)> {
        self.state.lock().uploads.clone()
    }

    fn record(&self, call: Call) {
        self.state.lock().calls.push(call);
    }

    fn behavior_for(&self, resource_labels: &HashMap<String, String>) -> Behavior {
        let state = self.state.lock();
        resource_labels
            .get(labels::SLOT)
            .and_then(|slot| state.behaviors.get(slot))
            .cloned()
            .unwrap_or_default()
    }
}

fn matches_labels(have: &HashMap<String, String>, want: &HashMap<String, String>) -> bool {
    want.iter().all(|(k, v)| have.get(k) == Some(v))
}

#[async_trait]
impl ImageOps for FakeGateway {
    async fn pull_image(&self, reference: &ImageRef) -> Result<(), ImageError> {
        let mut state = self.state.lock();
        state.calls.push(Call::Pull(reference.to_string()));
        state.images.insert(reference.to_string());
        Ok(())
    }

    async fn image_exists(&self, reference: &ImageRef) -> Result<bool, ImageError> {
        let mut state = self.state.lock();
        state.calls.push(Call::ImageExists(reference.to_string()));
        Ok(state.images.contains(&reference.to_string()))
    }

    async fn build_image(&self, request: &BuildRequest) -> Result<ImageRef, ImageError> {
        self.record(Call::Build(request.tag.to_string()));
        if let Some(reason) = self.behavior_for(&request.labels).build_error {
            return Err(ImageError::BuildFailed(reason));
        }
        self.state.lock().images.insert(request.tag.to_string());
        Ok(request.tag.clone())
    }
}

#[async_trait]
impl ContainerOps for FakeGateway {
    async fn create_container(
        &self,
        config: &ContainerConfig,
    ) -> Result<ContainerId, ContainerError> {
        self.record(Call::Create(config.name.clone()));
        let behavior = self.behavior_for(&config.labels);
        if let Some(reason) = &behavior.create_error {
            return Err(ContainerError::Runtime(reason.clone()));
        }

        let mut state = self.state.lock();
        if state.containers.values().any(|c| c.name == config.name) {
            return Err(ContainerError::AlreadyExists(config.name.clone()));
        }

        let network = match &config.network {
            Some(name) => {
                let network = state
                    .networks
                    .iter_mut()
                    .find(|(_, n)| &n.name == name)
                    .map(|(id, n)| (id.clone(), n))
                    .ok_or_else(|| ContainerError::InvalidConfig(format!("no network {name}")))?;
                let (network_id, network) = network;
                network.hosts += 1;
                Some((network_id, format!("172.18.0.{}", network.hosts)))
            }
            None => None,
        };

        let mut ports = Vec::new();
        for mapping in &config.ports {
            let host_port = match mapping.host_port {
                Some(port) => port,
                None => {
                    let port = state.next_host_port;
                    state.next_host_port += 1;
                    port
                }
            };
            ports.push(PublishedPort {
                container_port: mapping.container_port,
                protocol: mapping.protocol,
                host_ip: Some("0.0.0.0".to_string()),
                host_port: Some(host_port),
            });
        }

        let id = state.id("c");
        state.containers.insert(
            id.clone(),
            FakeContainer {
                name: config.name.clone(),
                image: config.image.to_string(),
                labels: config.labels.clone(),
                state: ContainerState::Created,
                network,
                aliases: config
                    .network_aliases
                    .iter()
                    .map(|a| a.as_str().to_string())
                    .collect(),
                ports,
                inspections: 0,
                behavior,
            },
        );
        Ok(ContainerId::new(id))
    }

    async fn start_container(&self, id: &ContainerId) -> Result<(), ContainerError> {
        let behavior = {
            let mut state = self.state.lock();
            state.calls.push(Call::Start(id.to_string()));
            state.container(id)?.behavior.clone()
        };
        if !behavior.start_delay.is_zero() {
            tokio::time::sleep(behavior.start_delay).await;
        }
        if let Some(reason) = behavior.start_error {
            return Err(ContainerError::Runtime(reason));
        }

        let mut state = self.state.lock();
        let container = state.container(id)?;
        if container.state == ContainerState::Running {
            return Err(ContainerError::AlreadyRunning(id.to_string()));
        }
        container.state = ContainerState::Running;
        Ok(())
    }

    async fn stop_container(
        &self,
        id: &ContainerId,
        _timeout: Duration,
    ) -> Result<(), ContainerError> {
        let mut state = self.state.lock();
        state.calls.push(Call::Stop(id.to_string()));
        let container = state.container(id)?;
        if container.state != ContainerState::Running {
            return Err(ContainerError::NotRunning(id.to_string()));
        }
        container.state = ContainerState::Exited;
        Ok(())
    }

    async fn remove_container(&self, id: &ContainerId, force: bool) -> Result<(), ContainerError> {
        let delay = {
            let mut state = self.state.lock();
            state.calls.push(Call::Remove(id.to_string()));
            state.container(id)?.behavior.remove_delay
        };
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state.lock();
        let container = state.container(id)?;
        if container.state == ContainerState::Running && !force {
            return Err(ContainerError::AlreadyRunning(id.to_string()));
        }
        state.containers.remove(id.as_str());
        Ok(())
    }

    async fn inspect_container(&self, id: &ContainerId) -> Result<ContainerInfo, ContainerError> {
        let mut state = self.state.lock();
        state.calls.push(Call::Inspect(id.to_string()));
        let networks: HashMap<String, String> = state
            .networks
            .iter()
            .map(|(id, n)| (id.clone(), n.name.clone()))
            .collect();
        let container = state.container(id)?;

        let health = if container.state != ContainerState::Running
            || container.behavior.health.is_empty()
        {
            None
        } else {
            let health = &container.behavior.health;
            let index = container.inspections.min(health.len() - 1);
            container.inspections += 1;
            Some(health[index])
        };

        let mut attached = HashMap::new();
        if let Some((network_id, ip)) = &container.network {
            let name = networks.get(network_id).cloned().unwrap_or_default();
            attached.insert(
                name,
                NetworkInfo {
                    network_id: network_id.clone(),
                    ip_address: ip.clone(),
                    aliases: container.aliases.clone(),
                },
            );
        }

        Ok(ContainerInfo {
            id: id.clone(),
            name: container.name.clone(),
            image: container.image.clone(),
            state: container.state,
            health,
            labels: container.labels.clone(),
            network_settings: NetworkSettings {
                networks: attached,
                ports: container.ports.clone(),
            },
        })
    }

    async fn list_containers(
        &self,
        filters: &ContainerFilters,
    ) -> Result<Vec<ContainerSummary>, ContainerError> {
        let mut state = self.state.lock();
        state.calls.push(Call::ListContainers);
        Ok(state
            .containers
            .iter()
            .filter(|(_, c)| filters.all || c.state == ContainerState::Running)
            .filter(|(_, c)| matches_labels(&c.labels, &filters.labels))
            .map(|(id, c)| ContainerSummary {
                id: ContainerId::new(id.clone()),
                name: c.name.clone(),
                state: format!("{:?}", c.state).to_lowercase(),
                labels: c.labels.clone(),
            })
            .collect())
    }

    async fn upload_archive(
        &self,
        id: &ContainerId,
        dest_dir: &str,
        archive: Vec<u8>,
    ) -> Result<(), ContainerError> {
        let mut state = self.state.lock();
        state
            .calls
            .push(Call::Upload(id.to_string(), dest_dir.to_string()));
        state.container(id)?;
        state
            .uploads
            .push((id.to_string(), dest_dir.to_string(), archive));
        Ok(())
    }
}

#[async_trait]
impl NetworkOps for FakeGateway {
    async fn create_network(&self, config: &NetworkConfig) -> Result<NetworkId, NetworkError> {
        let mut state = self.state.lock();
        state.calls.push(Call::CreateNetwork(config.name.clone()));
        if let Some(reason) = &state.network_error {
            return Err(NetworkError::Runtime(reason.clone()));
        }
        if state.networks.values().any(|n| n.name == config.name) {
            return Err(NetworkError::AlreadyExists(config.name.clone()));
        }
        let id = state.id("n");
        state.networks.insert(
            id.clone(),
            FakeNetwork {
                name: config.name.clone(),
                labels: config.labels.clone(),
                hosts: 1,
            },
        );
        Ok(NetworkId::new(id))
    }

    async fn remove_network(&self, id: &NetworkId) -> Result<(), NetworkError> {
        let mut state = self.state.lock();
        state.calls.push(Call::RemoveNetwork(id.to_string()));
        if !state.networks.contains_key(id.as_str()) {
            return Err(NetworkError::NotFound(id.to_string()));
        }
        let in_use = state
            .containers
            .values()
            .any(|c| matches!(&c.network, Some((network_id, _)) if network_id == id.as_str()));
        if in_use {
            return Err(NetworkError::InUse(id.to_string()));
        }
        state.networks.remove(id.as_str());
        Ok(())
    }

    async fn list_networks(
        &self,
        filter: &HashMap<String, String>,
    ) -> Result<Vec<NetworkSummary>, NetworkError> {
        let mut state = self.state.lock();
        state.calls.push(Call::ListNetworks);
        Ok(state
            .networks
            .iter()
            .filter(|(_, n)| matches_labels(&n.labels, filter))
            .map(|(id, n)| NetworkSummary {
                id: NetworkId::new(id.clone()),
                name: n.name.clone(),
                labels: n.labels.clone(),
            })
            .collect())
    }
}

#[async_trait]
impl ExecOps for FakeGateway {
    /// Echoes the command line back on stdout.
    async fn exec(
        &self,
        container: &ContainerId,
        config: &ExecConfig,
    ) -> Result<ExecResult, ExecError> {
        let mut state = self.state.lock();
        state
            .calls
            .push(Call::Exec(container.to_string(), config.cmd.clone()));
        let running = state
            .containers
            .get(container.as_str())
            .map(|c| c.state == ContainerState::Running)
            .ok_or_else(|| ExecError::ContainerNotFound(container.to_string()))?;
        if !running {
            return Err(ExecError::ContainerNotRunning(container.to_string()));
        }
        Ok(ExecResult {
            exit_code: 0,
            stdout: format!("{}\n", config.cmd.join(" ")).into_bytes(),
            stderr: Vec::new(),
        })
    }
}

#[async_trait]
impl LogOps for FakeGateway {
    async fn container_logs(
        &self,
        id: &ContainerId,
        opts: &LogOptions,
    ) -> Result<LogLineStream, LogError> {
        let mut state = self.state.lock();
        state.calls.push(Call::Logs(id.to_string()));
        let lines = state
            .containers
            .get(id.as_str())
            .map(|c| c.behavior.logs.clone())
            .ok_or_else(|| LogError::ContainerNotFound(id.to_string()))?;
        let skip = match opts.tail {
            Some(n) => lines.len().saturating_sub(n as usize),
            None => 0,
        };
        let lines: Vec<_> = lines
            .into_iter()
            .skip(skip)
            .map(|content| {
                Ok(LogLine {
                    content,
                    stream: LogStream::Stdout,
                })
            })
            .collect();
        Ok(Box::pin(stream::iter(lines)))
    }
}
