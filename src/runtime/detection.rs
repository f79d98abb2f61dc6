// ABOUTME: Runtime detection for the local host.
// ABOUTME: Honors explicit config and DOCKER_HOST, then checks Podman and Docker sockets.

use super::types::{DetectedRuntime, RuntimeConfig, RuntimeType};
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum DetectionError {
    #[error("no container runtime found (checked DOCKER_HOST, Podman and Docker sockets)")]
    NoRuntimeFound,

    #[error("unsupported DOCKER_HOST {0:?}: only unix:// sockets are supported")]
    UnsupportedHost(String),
}

const ROOTFUL_PODMAN: &str = "/run/podman/podman.sock";
const DOCKER_SOCKET: &str = "/var/run/docker.sock";

/// Detect the container runtime on this host.
///
/// Order:
/// 1. Explicit `runtime`/`socket` in config
/// 2. `DOCKER_HOST=unix://...`
/// 3. Rootless Podman (`/run/user/$UID/podman/podman.sock`)
/// 4. Rootful Podman (`/run/podman/podman.sock`)
/// 5. Docker (`/var/run/docker.sock`)
pub fn detect_local(config: Option<&RuntimeConfig>) -> Result<DetectedRuntime, DetectionError> {
    if let Some(cfg) = config
        && let Some(runtime_type) = cfg.runtime
    {
        let socket_path = cfg
            .socket
            .clone()
            .unwrap_or_else(|| default_socket_path(runtime_type).to_string());
        return Ok(DetectedRuntime {
            runtime_type,
            socket_path,
        });
    }

    if let Ok(host) = std::env::var("DOCKER_HOST")
        && !host.is_empty()
    {
        return from_docker_host(&host);
    }

    if let Some(uid) = get_uid() {
        let rootless_socket = format!("/run/user/{uid}/podman/podman.sock");
        if Path::new(&rootless_socket).exists() {
            return Ok(DetectedRuntime {
                runtime_type: RuntimeType::Podman,
                socket_path: rootless_socket,
            });
        }
    }

    for (runtime_type, socket) in [
        (RuntimeType::Podman, ROOTFUL_PODMAN),
        (RuntimeType::Docker, DOCKER_SOCKET),
    ] {
        if Path::new(socket).exists() {
            return Ok(DetectedRuntime {
                runtime_type,
                socket_path: socket.to_string(),
            });
        }
    }

    Err(DetectionError::NoRuntimeFound)
}

fn from_docker_host(host: &str) -> Result<DetectedRuntime, DetectionError> {
    let socket_path = host
        .strip_prefix("unix://")
        .ok_or_else(|| DetectionError::UnsupportedHost(host.to_string()))?;
    let runtime_type = if socket_path.contains("podman") {
        RuntimeType::Podman
    } else {
        RuntimeType::Docker
    };
    Ok(DetectedRuntime {
        runtime_type,
        socket_path: socket_path.to_string(),
    })
}

fn get_uid() -> Option<String> {
    std::env::var("UID").ok().or_else(|| {
        std::fs::read_to_string("/proc/self/status")
            .ok()
            .and_then(|s| {
                s.lines()
                    .find(|l| l.starts_with("Uid:"))
                    .and_then(|l| l.split_whitespace().nth(1))
                    .map(str::to_string)
            })
    })
}

fn default_socket_path(runtime: RuntimeType) -> &'static str {
    match runtime {
        RuntimeType::Docker => DOCKER_SOCKET,
        RuntimeType::Podman => ROOTFUL_PODMAN,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_config_wins() {
        let config = RuntimeConfig {
            runtime: Some(RuntimeType::Podman),
            socket: Some("/tmp/custom.sock".to_string()),
        };
        let detected = detect_local(Some(&config)).unwrap();
        assert_eq!(detected.runtime_type, RuntimeType::Podman);
        assert_eq!(detected.socket_path, "/tmp/custom.sock");
    }

    #[test]
    fn explicit_runtime_without_socket_uses_default_path() {
        let config = RuntimeConfig {
            runtime: Some(RuntimeType::Docker),
            socket: None,
        };
        let detected = detect_local(Some(&config)).unwrap();
        assert_eq!(detected.socket_path, DOCKER_SOCKET);
    }

    #[test]
    fn docker_host_unix_socket_is_used() {
        temp_env::with_var("DOCKER_HOST", Some("unix:///tmp/podman/podman.sock"), || {
            let detected = detect_local(None).unwrap();
            assert_eq!(detected.runtime_type, RuntimeType::Podman);
            assert_eq!(detected.socket_path, "/tmp/podman/podman.sock");
        });
    }

    #[test]
    fn docker_host_tcp_is_rejected() {
        temp_env::with_var("DOCKER_HOST", Some("tcp://10.0.0.1:2375"), || {
            let err = detect_local(None).unwrap_err();
            assert!(matches!(err, DetectionError::UnsupportedHost(_)));
        });
    }
}
