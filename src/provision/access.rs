// ABOUTME: Access point resolution from a container inspection.
// ABOUTME: Pairs the internal address with the host-published port for each binding.

use super::error::{ProvisionError, Result};
use super::handle::{AccessPoint, Uri};
use crate::plan::PortBinding;
use crate::runtime::{ContainerInfo, PublishedPort};
use crate::types::SlotName;

/// Resolve one access point per declared binding.
///
/// The local address is the container's IP on `network`, else its IP on any
/// attached network, else its name. The public address uses the published
/// host port; wildcard bind addresses map to `public_host`.
pub fn resolve(
    slot: &SlotName,
    info: &ContainerInfo,
    bindings: &[PortBinding],
    network: Option<&str>,
    public_host: &str,
) -> Result<Vec<AccessPoint>> {
    let local_host = local_host(info, network);

    bindings
        .iter()
        .map(|binding| -> Result<AccessPoint> {
            let (host_ip, host_port) = find_published(&info.network_settings.ports, binding)
                .ok_or_else(|| ProvisionError::AccessPointUnavailable {
                    slot: slot.clone(),
                    container_port: binding.container_port,
                    protocol: binding.protocol,
                    reason: "port is not published on the host".to_string(),
                })?;
            let host = match host_ip {
                None | Some("" | "0.0.0.0" | "::") => public_host,
                Some(ip) => ip,
            };
            Ok(AccessPoint {
                scheme: binding.scheme,
                protocol: binding.protocol,
                container_port: binding.container_port,
                local: Uri::new(binding.scheme, local_host.clone(), binding.container_port),
                public: Uri::new(binding.scheme, host, host_port),
            })
        })
        .collect()
}

fn local_host(info: &ContainerInfo, network: Option<&str>) -> String {
    let networks = &info.network_settings.networks;
    if let Some(ip) = network
        .and_then(|name| networks.get(name))
        .map(|n| n.ip_address.as_str())
        .filter(|ip| !ip.is_empty())
    {
        return ip.to_string();
    }

    let mut attached: Vec<_> = networks
        .iter()
        .filter(|(_, n)| !n.ip_address.is_empty())
        .collect();
    attached.sort_by(|a, b| a.0.cmp(b.0));
    match attached.first() {
        Some((_, n)) => n.ip_address.clone(),
        None => info.name.clone(),
    }
}

/// Prefer a wildcard binding when the runtime published several.
fn find_published<'a>(
    ports: &'a [PublishedPort],
    binding: &PortBinding,
) -> Option<(Option<&'a str>, u16)> {
    let candidates = ports.iter().filter(|p| {
        p.container_port == binding.container_port && p.protocol == binding.protocol
    });
    let mut first = None;
    for port in candidates {
        let Some(host_port) = port.host_port else {
            continue;
        };
        let host_ip = port.host_ip.as_deref();
        if matches!(host_ip, None | Some("" | "0.0.0.0")) {
            return Some((host_ip, host_port));
        }
        first.get_or_insert((host_ip, host_port));
    }
    first
}
