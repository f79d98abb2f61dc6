// ABOUTME: Bollard-based runtime gateway implementation.
// ABOUTME: Supports both Docker and Podman via the Docker-compatible API.

use crate::runtime::error::{ConnectionSnafu, RuntimeError};
use crate::runtime::traits::{
    BuildRequest, ContainerConfig, ContainerError, ContainerFilters, ContainerInfo, ContainerOps,
    ContainerState, ContainerSummary, ExecConfig, ExecError, ExecOps, ExecResult, HealthState,
    ImageError, ImageOps, LogError, LogLine, LogLineStream, LogOps, LogOptions, LogStream,
    NetworkConfig, NetworkError, NetworkInfo, NetworkOps, NetworkSettings, NetworkSummary,
    Protocol, PublishedPort, RuntimeInfo, RuntimeInfoError, RuntimeMetadata,
};
use crate::runtime::types::{DetectedRuntime, RuntimeConfig, RuntimeType};
use crate::types::{ContainerId, ImageRef, NetworkId};
use async_trait::async_trait;
use bollard::Docker;
use bollard::exec::StartExecOptions;
use bollard::models::{
    ContainerCreateBody, EndpointSettings, HealthConfig, HostConfig, PortBinding, RestartPolicy,
    RestartPolicyNameEnum,
};
use bollard::query_parameters::{
    BuildImageOptions, CreateContainerOptions, CreateImageOptions, InspectContainerOptions,
    ListContainersOptions, ListNetworksOptions, LogsOptions, RemoveContainerOptions,
    StopContainerOptions, UploadToContainerOptions,
};
use bytes::Bytes;
use futures::StreamExt;
use http_body_util::{Either, Full};
use snafu::ResultExt;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

// =============================================================================
// Error Mapping Helpers
// =============================================================================

fn status_of(e: &bollard::errors::Error) -> Option<(u16, String)> {
    match e {
        bollard::errors::Error::DockerResponseServerError {
            status_code,
            message,
        } => Some((*status_code, message.clone())),
        _ => None,
    }
}

fn map_container_create_error(e: bollard::errors::Error) -> ContainerError {
    match status_of(&e) {
        Some((404, message)) => ContainerError::ImageNotFound(message),
        Some((409, message)) => ContainerError::AlreadyExists(message),
        Some((400, message)) => ContainerError::InvalidConfig(message),
        _ => ContainerError::Runtime(e.to_string()),
    }
}

fn map_container_start_error(e: bollard::errors::Error) -> ContainerError {
    match status_of(&e) {
        Some((404, message)) => ContainerError::NotFound(message),
        Some((304, message)) => ContainerError::AlreadyRunning(message),
        _ => ContainerError::Runtime(e.to_string()),
    }
}

fn map_container_stop_error(e: bollard::errors::Error) -> ContainerError {
    match status_of(&e) {
        Some((404, message)) => ContainerError::NotFound(message),
        Some((304, message)) => ContainerError::NotRunning(message),
        _ => ContainerError::Runtime(e.to_string()),
    }
}

fn map_container_not_found_error(e: bollard::errors::Error) -> ContainerError {
    match status_of(&e) {
        Some((404, message)) => ContainerError::NotFound(message),
        _ => ContainerError::Runtime(e.to_string()),
    }
}

fn map_network_create_error(e: bollard::errors::Error) -> NetworkError {
    match status_of(&e) {
        Some((409, message)) => NetworkError::AlreadyExists(message),
        _ => NetworkError::Runtime(e.to_string()),
    }
}

fn map_network_remove_error(e: bollard::errors::Error) -> NetworkError {
    match status_of(&e) {
        Some((404, message)) => NetworkError::NotFound(message),
        Some((403, message)) | Some((409, message)) => NetworkError::InUse(message),
        _ => NetworkError::Runtime(e.to_string()),
    }
}

fn map_exec_error(e: bollard::errors::Error) -> ExecError {
    match status_of(&e) {
        Some((404, message)) => ExecError::ContainerNotFound(message),
        Some((409, message)) => ExecError::ContainerNotRunning(message),
        _ => ExecError::Runtime(e.to_string()),
    }
}

// =============================================================================
// BollardRuntime
// =============================================================================

/// Runtime gateway backed by bollard.
///
/// Holds only the client; every call is independent, so one instance can be
/// shared by all provisioning tasks.
pub struct BollardRuntime {
    client: Docker,
    runtime_type: RuntimeType,
}

impl BollardRuntime {
    pub fn new(client: Docker, runtime_type: RuntimeType) -> Self {
        Self {
            client,
            runtime_type,
        }
    }

    /// Connect to a detected runtime socket.
    pub fn connect(detected: &DetectedRuntime) -> Result<Self, RuntimeInfoError> {
        let client =
            Docker::connect_with_unix(&detected.socket_path, 120, bollard::API_DEFAULT_VERSION)
                .map_err(|e| RuntimeInfoError::ConnectionFailed(e.to_string()))?;
        Ok(Self::new(client, detected.runtime_type))
    }

    pub fn runtime_type(&self) -> RuntimeType {
        self.runtime_type
    }

    /// Podman leaves attached exec streams open, so run detached and poll.
    async fn exec_detached(&self, exec_id: &str) -> Result<ExecResult, ExecError> {
        let opts = StartExecOptions {
            detach: true,
            ..Default::default()
        };
        self.client
            .start_exec(exec_id, Some(opts))
            .await
            .map_err(map_exec_error)?;

        let poll_interval = Duration::from_millis(100);
        let max_wait = Duration::from_secs(300);
        let start = tokio::time::Instant::now();
        loop {
            let details = self
                .client
                .inspect_exec(exec_id)
                .await
                .map_err(map_exec_error)?;
            if !details.running.unwrap_or(false) {
                return Ok(ExecResult {
                    exit_code: details.exit_code.unwrap_or(0),
                    stdout: Vec::new(),
                    stderr: Vec::new(),
                });
            }
            if start.elapsed() > max_wait {
                return Err(ExecError::Failed("exec timed out".to_string()));
            }
            tokio::time::sleep(poll_interval).await;
        }
    }
}

/// Detect the local runtime, connect, and ping it.
pub async fn connect_local(config: Option<&RuntimeConfig>) -> Result<BollardRuntime, RuntimeError> {
    let detected = super::detection::detect_local(config)?;
    tracing::debug!(
        runtime = %detected.runtime_type,
        socket = %detected.socket_path,
        "connecting to container runtime"
    );
    let runtime = BollardRuntime::connect(&detected).context(ConnectionSnafu {
        socket: detected.socket_path.clone(),
    })?;
    runtime.ping().await.context(ConnectionSnafu {
        socket: detected.socket_path.clone(),
    })?;
    Ok(runtime)
}

/// Tar a build context directory in memory.
fn archive_context(context: &Path) -> Result<Vec<u8>, ImageError> {
    let mut ar = tar::Builder::new(Vec::new());
    ar.follow_symlinks(false);
    ar.append_dir_all(".", context)
        .map_err(|e| ImageError::Context(format!("{}: {}", context.display(), e)))?;
    ar.into_inner()
        .map_err(|e| ImageError::Context(format!("{}: {}", context.display(), e)))
}

/// Parse a memory string like "512m" or "1g" into bytes.
fn parse_memory_string(spec: &str) -> Option<i64> {
    let spec = spec.trim().to_lowercase();
    let (digits, multiplier) = match spec.chars().last()? {
        'g' => (&spec[..spec.len() - 1], 1024 * 1024 * 1024),
        'm' => (&spec[..spec.len() - 1], 1024 * 1024),
        'k' => (&spec[..spec.len() - 1], 1024),
        _ => (spec.as_str(), 1),
    };
    digits.parse::<i64>().ok().map(|n| n * multiplier)
}

/// Split a runtime port key such as "80/tcp".
fn parse_port_key(key: &str) -> Option<(u16, Protocol)> {
    let (port, proto) = key.split_once('/').unwrap_or((key, "tcp"));
    let protocol = match proto {
        "udp" => Protocol::Udp,
        _ => Protocol::Tcp,
    };
    Some((port.parse().ok()?, protocol))
}

fn label_filters(labels: &HashMap<String, String>) -> HashMap<String, Vec<String>> {
    let mut filters: HashMap<String, Vec<String>> = HashMap::new();
    for (key, value) in labels {
        filters
            .entry("label".to_string())
            .or_default()
            .push(format!("{key}={value}"));
    }
    filters
}

#[async_trait]
impl RuntimeInfo for BollardRuntime {
    async fn info(&self) -> Result<RuntimeMetadata, RuntimeInfoError> {
        let info = self
            .client
            .info()
            .await
            .map_err(|e| RuntimeInfoError::ConnectionFailed(e.to_string()))?;

        let name = match self.runtime_type {
            RuntimeType::Docker => "Docker",
            RuntimeType::Podman => "Podman",
        };

        Ok(RuntimeMetadata {
            name: name.to_string(),
            version: info.server_version.unwrap_or_default(),
            api_version: bollard::API_DEFAULT_VERSION.to_string(),
            os: info.operating_system.unwrap_or_default(),
            arch: info.architecture.unwrap_or_default(),
        })
    }

    async fn ping(&self) -> Result<(), RuntimeInfoError> {
        self.client
            .ping()
            .await
            .map_err(|e| RuntimeInfoError::ConnectionFailed(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl ImageOps for BollardRuntime {
    async fn pull_image(&self, reference: &ImageRef) -> Result<(), ImageError> {
        let image_name = reference.to_string();
        let opts = CreateImageOptions {
            from_image: Some(image_name.clone()),
            ..Default::default()
        };

        // Progress updates arrive as a stream; drain it.
        let mut stream = self.client.create_image(Some(opts), None, None);
        while let Some(result) = stream.next().await {
            result.map_err(|e| ImageError::PullFailed(format!("{image_name}: {e}")))?;
        }
        Ok(())
    }

    async fn image_exists(&self, reference: &ImageRef) -> Result<bool, ImageError> {
        let image_name = reference.to_string();
        match self.client.inspect_image(&image_name).await {
            Ok(_) => Ok(true),
            Err(bollard::errors::Error::DockerResponseServerError {
                status_code: 404, ..
            }) => Ok(false),
            Err(e) => Err(ImageError::Runtime(format!(
                "failed to inspect {image_name}: {e}"
            ))),
        }
    }

    async fn build_image(&self, request: &BuildRequest) -> Result<ImageRef, ImageError> {
        let context = request.context.clone();
        let archive = tokio::task::spawn_blocking(move || archive_context(&context))
            .await
            .map_err(|e| ImageError::Context(e.to_string()))??;

        let options = BuildImageOptions {
            dockerfile: request.dockerfile.to_string_lossy().into_owned(),
            t: Some(request.tag.to_string()),
            ..Default::default()
        };
        let body = Either::Left(Full::new(Bytes::from(archive)));
        let mut build_stream = self.client.build_image(options, None, Some(body));

        while let Some(result) = build_stream.next().await {
            let output = result.map_err(|e| ImageError::BuildFailed(e.to_string()))?;
            if let Some(error_detail) = output.error_detail {
                return Err(ImageError::BuildFailed(format!("{error_detail:?}")));
            }
            if let Some(line) = output.stream {
                let line = line.trim_end();
                if !line.is_empty() {
                    tracing::trace!(image = %request.tag, "{line}");
                }
            }
        }

        Ok(request.tag.clone())
    }
}

#[async_trait]
impl ContainerOps for BollardRuntime {
    async fn create_container(
        &self,
        config: &ContainerConfig,
    ) -> Result<ContainerId, ContainerError> {
        let env: Vec<String> = config
            .env
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect();

        // Test resources must never come back on their own after teardown.
        let mut host_config = HostConfig {
            restart_policy: Some(RestartPolicy {
                name: Some(RestartPolicyNameEnum::NO),
                maximum_retry_count: None,
            }),
            ..Default::default()
        };

        let mut port_bindings: HashMap<String, Option<Vec<PortBinding>>> = HashMap::new();
        let mut exposed_ports: Vec<String> = Vec::new();
        for port in &config.ports {
            let port_key = format!("{}/{}", port.container_port, port.protocol);
            exposed_ports.push(port_key.clone());
            // An absent host port asks the runtime for an ephemeral one.
            port_bindings.insert(
                port_key,
                Some(vec![PortBinding {
                    host_ip: None,
                    host_port: port.host_port.map(|p| p.to_string()),
                }]),
            );
        }
        if !port_bindings.is_empty() {
            host_config.port_bindings = Some(port_bindings);
        }

        if let Some(network) = &config.network {
            host_config.network_mode = Some(network.clone());
        }

        let mut user = None;
        let mut working_dir = None;
        let mut hostname = None;
        for (key, value) in &config.options {
            match key.as_str() {
                "user" => user = Some(value.clone()),
                "working_dir" => working_dir = Some(value.clone()),
                "hostname" => hostname = Some(value.clone()),
                "privileged" => host_config.privileged = Some(value == "true"),
                "memory" => host_config.memory = parse_memory_string(value),
                "cpus" => {
                    host_config.nano_cpus = value
                        .parse::<f64>()
                        .ok()
                        .map(|cpus| (cpus * 1_000_000_000.0) as i64)
                }
                other => tracing::debug!(option = other, "ignoring unknown container option"),
            }
        }

        let healthcheck = config.healthcheck.as_ref().map(|hc| HealthConfig {
            test: Some(hc.test.clone()),
            interval: Some(hc.interval.as_nanos() as i64),
            timeout: Some(hc.timeout.as_nanos() as i64),
            retries: Some(hc.retries as i64),
            start_period: Some(hc.start_period.as_nanos() as i64),
            start_interval: None,
        });

        let networking_config = match &config.network {
            Some(network) if !config.network_aliases.is_empty() => {
                let aliases = config
                    .network_aliases
                    .iter()
                    .map(|a| a.to_string())
                    .collect();
                let mut endpoints = HashMap::new();
                endpoints.insert(
                    network.clone(),
                    EndpointSettings {
                        aliases: Some(aliases),
                        ..Default::default()
                    },
                );
                Some(bollard::models::NetworkingConfig {
                    endpoints_config: Some(endpoints),
                })
            }
            _ => None,
        };

        let body = ContainerCreateBody {
            image: Some(config.image.to_string()),
            env: (!env.is_empty()).then_some(env),
            labels: (!config.labels.is_empty()).then(|| config.labels.clone()),
            cmd: config.command.clone(),
            user,
            working_dir,
            hostname,
            host_config: Some(host_config),
            healthcheck,
            exposed_ports: (!exposed_ports.is_empty()).then_some(exposed_ports),
            networking_config,
            ..Default::default()
        };

        let opts = CreateContainerOptions {
            name: Some(config.name.clone()),
            ..Default::default()
        };

        let response = self
            .client
            .create_container(Some(opts), body)
            .await
            .map_err(map_container_create_error)?;

        Ok(ContainerId::new(response.id))
    }

    async fn start_container(&self, id: &ContainerId) -> Result<(), ContainerError> {
        self.client
            .start_container(
                id.as_str(),
                None::<bollard::query_parameters::StartContainerOptions>,
            )
            .await
            .map_err(map_container_start_error)
    }

    async fn stop_container(
        &self,
        id: &ContainerId,
        timeout: Duration,
    ) -> Result<(), ContainerError> {
        let opts = StopContainerOptions {
            t: Some(timeout.as_secs() as i32),
            signal: None,
        };
        self.client
            .stop_container(id.as_str(), Some(opts))
            .await
            .map_err(map_container_stop_error)
    }

    async fn remove_container(&self, id: &ContainerId, force: bool) -> Result<(), ContainerError> {
        let opts = RemoveContainerOptions {
            force,
            ..Default::default()
        };
        self.client
            .remove_container(id.as_str(), Some(opts))
            .await
            .map_err(map_container_not_found_error)
    }

    async fn inspect_container(&self, id: &ContainerId) -> Result<ContainerInfo, ContainerError> {
        let details = self
            .client
            .inspect_container(id.as_str(), None::<InspectContainerOptions>)
            .await
            .map_err(map_container_not_found_error)?;

        let state = details
            .state
            .as_ref()
            .and_then(|s| s.status)
            .map(|s| match s {
                bollard::models::ContainerStateStatusEnum::CREATED => ContainerState::Created,
                bollard::models::ContainerStateStatusEnum::RUNNING => ContainerState::Running,
                bollard::models::ContainerStateStatusEnum::PAUSED => ContainerState::Paused,
                bollard::models::ContainerStateStatusEnum::RESTARTING => ContainerState::Restarting,
                bollard::models::ContainerStateStatusEnum::REMOVING => ContainerState::Removing,
                bollard::models::ContainerStateStatusEnum::DEAD => ContainerState::Dead,
                _ => ContainerState::Exited,
            })
            .unwrap_or(ContainerState::Created);

        let health = details
            .state
            .as_ref()
            .and_then(|s| s.health.as_ref())
            .and_then(|h| h.status)
            .map(|s| match s {
                bollard::models::HealthStatusEnum::STARTING => HealthState::Starting,
                bollard::models::HealthStatusEnum::HEALTHY => HealthState::Healthy,
                bollard::models::HealthStatusEnum::UNHEALTHY => HealthState::Unhealthy,
                _ => HealthState::None,
            });

        let mut settings = NetworkSettings::default();
        if let Some(network_settings) = &details.network_settings {
            if let Some(nets) = &network_settings.networks {
                for (name, endpoint) in nets {
                    settings.networks.insert(
                        name.clone(),
                        NetworkInfo {
                            network_id: endpoint.network_id.clone().unwrap_or_default(),
                            ip_address: endpoint.ip_address.clone().unwrap_or_default(),
                            aliases: endpoint.aliases.clone().unwrap_or_default(),
                        },
                    );
                }
            }
            if let Some(ports) = &network_settings.ports {
                for (key, bindings) in ports {
                    let Some((container_port, protocol)) = parse_port_key(key) else {
                        continue;
                    };
                    let bindings = bindings.as_deref().unwrap_or_default();
                    if bindings.is_empty() {
                        settings.ports.push(PublishedPort {
                            container_port,
                            protocol,
                            host_ip: None,
                            host_port: None,
                        });
                    }
                    for binding in bindings {
                        settings.ports.push(PublishedPort {
                            container_port,
                            protocol,
                            host_ip: binding.host_ip.clone().filter(|ip| !ip.is_empty()),
                            host_port: binding.host_port.as_deref().and_then(|p| p.parse().ok()),
                        });
                    }
                }
            }
        }

        Ok(ContainerInfo {
            id: id.clone(),
            name: details
                .name
                .unwrap_or_default()
                .trim_start_matches('/')
                .to_string(),
            image: details
                .config
                .as_ref()
                .and_then(|c| c.image.clone())
                .unwrap_or_default(),
            state,
            health,
            labels: details.config.and_then(|c| c.labels).unwrap_or_default(),
            network_settings: settings,
        })
    }

    async fn list_containers(
        &self,
        filters: &ContainerFilters,
    ) -> Result<Vec<ContainerSummary>, ContainerError> {
        let opts = ListContainersOptions {
            all: filters.all,
            filters: Some(label_filters(&filters.labels)),
            ..Default::default()
        };

        // Podman reports transient "stopping"/"stopped" states that bollard
        // cannot deserialize; retry briefly.
        let mut last_error = None;
        for attempt in 0..3 {
            match self.client.list_containers(Some(opts.clone())).await {
                Ok(containers) => {
                    return Ok(containers
                        .into_iter()
                        .map(|c| ContainerSummary {
                            id: ContainerId::new(c.id.unwrap_or_default()),
                            name: c
                                .names
                                .unwrap_or_default()
                                .first()
                                .map(|n| n.trim_start_matches('/').to_string())
                                .unwrap_or_default(),
                            state: c
                                .state
                                .map(|s| format!("{s:?}").to_lowercase())
                                .unwrap_or_default(),
                            labels: c.labels.unwrap_or_default(),
                        })
                        .collect());
                }
                Err(e) => {
                    let err_str = e.to_string();
                    if (err_str.contains("unknown variant `stopping`")
                        || err_str.contains("unknown variant `stopped`"))
                        && attempt < 2
                    {
                        tokio::time::sleep(Duration::from_millis(500)).await;
                        last_error = Some(err_str);
                        continue;
                    }
                    return Err(ContainerError::Runtime(err_str));
                }
            }
        }

        Err(ContainerError::Runtime(
            last_error.unwrap_or_else(|| "list_containers failed".to_string()),
        ))
    }

    async fn upload_archive(
        &self,
        id: &ContainerId,
        dest_dir: &str,
        archive: Vec<u8>,
    ) -> Result<(), ContainerError> {
        let opts = UploadToContainerOptions {
            path: dest_dir.to_string(),
            ..Default::default()
        };
        let body = Either::Left(Full::new(Bytes::from(archive)));
        self.client
            .upload_to_container(id.as_str(), Some(opts), body)
            .await
            .map_err(map_container_not_found_error)
    }
}

#[async_trait]
impl NetworkOps for BollardRuntime {
    async fn create_network(&self, config: &NetworkConfig) -> Result<NetworkId, NetworkError> {
        let request = network_create_request(config);
        let response = self
            .client
            .create_network(request)
            .await
            .map_err(map_network_create_error)?;

        Ok(NetworkId::new(response.id))
    }

    async fn remove_network(&self, id: &NetworkId) -> Result<(), NetworkError> {
        self.client
            .remove_network(id.as_str())
            .await
            .map_err(map_network_remove_error)
    }

    async fn list_networks(
        &self,
        labels: &HashMap<String, String>,
    ) -> Result<Vec<NetworkSummary>, NetworkError> {
        let opts = ListNetworksOptions {
            filters: Some(label_filters(labels)),
        };
        let networks = self
            .client
            .list_networks(Some(opts))
            .await
            .map_err(|e| NetworkError::Runtime(e.to_string()))?;

        Ok(networks
            .into_iter()
            .map(|n| NetworkSummary {
                id: NetworkId::new(n.id.unwrap_or_default()),
                name: n.name.unwrap_or_default(),
                labels: n.labels.unwrap_or_default(),
            })
            .collect())
    }
}

#[async_trait]
impl ExecOps for BollardRuntime {
    async fn exec(
        &self,
        container: &ContainerId,
        config: &ExecConfig,
    ) -> Result<ExecResult, ExecError> {
        let opts = bollard::models::ExecConfig {
            cmd: Some(config.cmd.clone()),
            env: (!config.env.is_empty()).then(|| config.env.clone()),
            working_dir: config.working_dir.clone(),
            user: config.user.clone(),
            attach_stdout: Some(config.attach_stdout),
            attach_stderr: Some(config.attach_stderr),
            ..Default::default()
        };
        let exec_id = self
            .client
            .create_exec(container.as_str(), opts)
            .await
            .map_err(map_exec_error)?
            .id;

        if self.runtime_type == RuntimeType::Podman {
            return self.exec_detached(&exec_id).await;
        }

        let started = self
            .client
            .start_exec(
                &exec_id,
                Some(StartExecOptions {
                    detach: false,
                    ..Default::default()
                }),
            )
            .await
            .map_err(map_exec_error)?;

        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        if let bollard::exec::StartExecResults::Attached { mut output, .. } = started {
            while let Some(item) = output.next().await {
                match item {
                    Ok(bollard::container::LogOutput::StdOut { message }) => stdout.extend(message),
                    Ok(bollard::container::LogOutput::StdErr { message }) => stderr.extend(message),
                    Ok(_) => {}
                    Err(e) => return Err(ExecError::Failed(e.to_string())),
                }
            }
        }

        let details = self
            .client
            .inspect_exec(&exec_id)
            .await
            .map_err(map_exec_error)?;

        Ok(ExecResult {
            exit_code: details.exit_code.unwrap_or(0),
            stdout,
            stderr,
        })
    }
}

#[async_trait]
impl LogOps for BollardRuntime {
    async fn container_logs(
        &self,
        id: &ContainerId,
        opts: &LogOptions,
    ) -> Result<LogLineStream, LogError> {
        let log_opts = LogsOptions {
            stdout: opts.stdout,
            stderr: opts.stderr,
            follow: opts.follow,
            tail: opts
                .tail
                .map(|n| n.to_string())
                .unwrap_or_else(|| "all".to_string()),
            ..Default::default()
        };

        let stream = self.client.logs(id.as_str(), Some(log_opts)).map(|result| {
            result
                .map(|output| {
                    let (stream, data) = match output {
                        bollard::container::LogOutput::StdErr { message } => {
                            (LogStream::Stderr, message)
                        }
                        bollard::container::LogOutput::StdOut { message }
                        | bollard::container::LogOutput::StdIn { message }
                        | bollard::container::LogOutput::Console { message } => {
                            (LogStream::Stdout, message)
                        }
                    };
                    LogLine {
                        content: String::from_utf8_lossy(&data).trim_end().to_string(),
                        stream,
                    }
                })
                .map_err(|e| LogError::StreamError(e.to_string()))
        });

        Ok(Box::pin(stream))
    }
}

/// Prefix that passes an option through to the network driver.
const DRIVER_OPT_PREFIX: &str = "driver_opt.";

/// Translate network options: `driver`, `internal` and `driver_opt.<key>`
/// are understood, anything else is logged and ignored.
fn network_create_request(config: &NetworkConfig) -> bollard::models::NetworkCreateRequest {
    let mut driver = "bridge".to_string();
    let mut internal = None;
    let mut driver_options: HashMap<String, String> = HashMap::new();
    for (key, value) in &config.options {
        match key.as_str() {
            "driver" => driver = value.clone(),
            "internal" => internal = Some(value == "true"),
            other => match other.strip_prefix(DRIVER_OPT_PREFIX) {
                Some(opt) if !opt.is_empty() => {
                    driver_options.insert(opt.to_string(), value.clone());
                }
                _ => tracing::debug!(option = other, "ignoring unknown network option"),
            },
        }
    }

    bollard::models::NetworkCreateRequest {
        name: config.name.clone(),
        driver: Some(driver),
        internal,
        options: (!driver_options.is_empty()).then_some(driver_options),
        labels: (!config.labels.is_empty()).then(|| config.labels.clone()),
        ..Default::default()
    }
}
