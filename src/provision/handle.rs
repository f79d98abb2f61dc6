// ABOUTME: Read-only handles for provisioned containers and networks.
// ABOUTME: Carry runtime ids, instance ids, health and resolved access points.

use super::status::HealthStatus;
use crate::plan::{Account, Scheme};
use crate::runtime::Protocol;
use crate::types::{ContainerId, ImageRef, InstanceId, NetworkId, SlotName};
use serde::{Serialize, Serializer};
use std::fmt;

/// `scheme://host:port`. IPv6 hosts are bracketed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Uri {
    scheme: Scheme,
    host: String,
    port: u16,
}

impl Uri {
    pub fn new(scheme: Scheme, host: impl Into<String>, port: u16) -> Self {
        Self {
            scheme,
            host: host.into(),
            port,
        }
    }

    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

impl fmt::Display for Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "{}://[{}]:{}", self.scheme, self.host, self.port)
        } else {
            write!(f, "{}://{}:{}", self.scheme, self.host, self.port)
        }
    }
}

impl Serialize for Uri {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A way to reach one declared port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessPoint {
    pub scheme: Scheme,
    pub protocol: Protocol,
    pub container_port: u16,
    /// Reachable from other containers on the environment network.
    pub local: Uri,
    /// Reachable from the test process.
    pub public: Uri,
}

impl AccessPoint {
    pub fn is_secure(&self) -> bool {
        self.scheme.is_secure()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ContainerHandle {
    slot: SlotName,
    instance: InstanceId,
    name: String,
    id: ContainerId,
    image: ImageRef,
    status: HealthStatus,
    access_points: Vec<AccessPoint>,
    #[serde(skip)]
    accounts: Vec<Account>,
}

impl ContainerHandle {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        slot: SlotName,
        instance: InstanceId,
        name: String,
        id: ContainerId,
        image: ImageRef,
        status: HealthStatus,
        access_points: Vec<AccessPoint>,
        accounts: Vec<Account>,
    ) -> Self {
        Self {
            slot,
            instance,
            name,
            id,
            image,
            status,
            access_points,
            accounts,
        }
    }

    pub fn slot(&self) -> &SlotName {
        &self.slot
    }

    pub fn instance(&self) -> InstanceId {
        self.instance
    }

    /// Runtime container name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn id(&self) -> &ContainerId {
        &self.id
    }

    pub fn image(&self) -> &ImageRef {
        &self.image
    }

    pub fn status(&self) -> HealthStatus {
        self.status
    }

    pub fn access_points(&self) -> &[AccessPoint] {
        &self.access_points
    }

    /// First access point speaking `scheme`.
    pub fn access_point(&self, scheme: Scheme) -> Option<&AccessPoint> {
        self.access_points.iter().find(|ap| ap.scheme == scheme)
    }

    pub fn secure(&self) -> impl Iterator<Item = &AccessPoint> {
        self.access_points.iter().filter(|ap| ap.is_secure())
    }

    pub fn unsecure(&self) -> impl Iterator<Item = &AccessPoint> {
        self.access_points.iter().filter(|ap| !ap.is_secure())
    }

    /// Accounts seeded into the container.
    pub fn accounts(&self) -> &[Account] {
        &self.accounts
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NetworkHandle {
    slot: SlotName,
    instance: InstanceId,
    name: String,
    id: NetworkId,
}

impl NetworkHandle {
    pub(crate) fn new(slot: SlotName, instance: InstanceId, name: String, id: NetworkId) -> Self {
        Self {
            slot,
            instance,
            name,
            id,
        }
    }

    pub fn slot(&self) -> &SlotName {
        &self.slot
    }

    pub fn instance(&self) -> InstanceId {
        self.instance
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn id(&self) -> &NetworkId {
        &self.id
    }
}
