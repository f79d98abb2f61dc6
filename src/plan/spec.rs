// ABOUTME: Resolved container and network specs plus the ordered materialization plan.
// ABOUTME: Immutable output of the resolver, consumed by the provisioner.

use super::descriptor::{Account, Capability, PortBinding};
use crate::config::HealthCheck;
use crate::types::{ImageRef, SlotName};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// The shared environment network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkSpec {
    pub slot: SlotName,
    pub identity: String,
    pub options: BTreeMap<String, String>,
    /// Synthesized because the descriptor declared no network slot.
    pub implicit: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageSource {
    Image(ImageRef),
    Build {
        context: PathBuf,
        dockerfile: PathBuf,
        /// Tag given to the built image.
        tag: ImageRef,
    },
}

impl ImageSource {
    /// The image the container is created from.
    pub fn image(&self) -> &ImageRef {
        match self {
            ImageSource::Image(image) => image,
            ImageSource::Build { tag, .. } => tag,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContainerSpec {
    pub slot: SlotName,
    pub identity: String,
    pub capability: Capability,
    pub source: ImageSource,
    pub ports: Vec<PortBinding>,
    pub accounts: Vec<Account>,
    pub env: BTreeMap<String, String>,
    pub command: Option<Vec<String>>,
    pub healthcheck: Option<HealthCheck>,
    pub options: BTreeMap<String, String>,
    /// Network slot to join; `None` for isolated containers.
    pub network: Option<SlotName>,
}

/// A borrowed view over one entry of the plan, in materialization order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResourceSpec<'a> {
    Network(&'a NetworkSpec),
    Container(&'a ContainerSpec),
}

impl<'a> ResourceSpec<'a> {
    pub fn slot(&self) -> &'a SlotName {
        match self {
            ResourceSpec::Network(spec) => &spec.slot,
            ResourceSpec::Container(spec) => &spec.slot,
        }
    }

    pub fn identity(&self) -> &str {
        match self {
            ResourceSpec::Network(spec) => &spec.identity,
            ResourceSpec::Container(spec) => &spec.identity,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Dependency {
    JoinsNetwork {
        container: SlotName,
        network: SlotName,
    },
    BuildsFrom {
        container: SlotName,
        context: PathBuf,
    },
}

/// Everything an environment needs, in the order it must be created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Plan {
    environment: String,
    network: NetworkSpec,
    containers: Vec<ContainerSpec>,
    dependencies: Vec<Dependency>,
}

impl Plan {
    pub(super) fn new(
        environment: String,
        network: NetworkSpec,
        containers: Vec<ContainerSpec>,
        dependencies: Vec<Dependency>,
    ) -> Self {
        Self {
            environment,
            network,
            containers,
            dependencies,
        }
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn network(&self) -> &NetworkSpec {
        &self.network
    }

    /// Containers in declaration order.
    pub fn containers(&self) -> &[ContainerSpec] {
        &self.containers
    }

    pub fn container(&self, slot: &str) -> Option<&ContainerSpec> {
        self.containers.iter().find(|c| c.slot.as_str() == slot)
    }

    pub fn dependencies(&self) -> &[Dependency] {
        &self.dependencies
    }

    /// Network first, then containers.
    pub fn resources(&self) -> impl Iterator<Item = ResourceSpec<'_>> {
        std::iter::once(ResourceSpec::Network(&self.network))
            .chain(self.containers.iter().map(ResourceSpec::Container))
    }
}
