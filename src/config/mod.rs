// ABOUTME: Configuration types and parsing for testbed.yml.
// ABOUTME: Loads the environment descriptor, provisioning settings and runtime override.

mod deserialize;
mod healthcheck;
mod init;
mod settings;

pub use healthcheck::HealthCheck;
pub use init::init_config;
pub use settings::ProvisionSettings;

use crate::error::{Error, Result};
use crate::plan::{Descriptor, Slot};
use crate::runtime::RuntimeConfig;
use deserialize::{deserialize_environment_name, deserialize_slots};
use nonempty::NonEmpty;
use serde::Deserialize;
use std::path::Path;

pub const CONFIG_FILENAME: &str = "testbed.yml";
pub const CONFIG_FILENAME_ALT: &str = "testbed.yaml";
pub const CONFIG_FILENAME_DIR: &str = ".testbed/config.yml";

#[derive(Debug, Clone, Deserialize)]
pub struct EnvironmentConfig {
    #[serde(deserialize_with = "deserialize_environment_name")]
    pub environment: String,

    #[serde(deserialize_with = "deserialize_slots")]
    pub slots: NonEmpty<Slot>,

    #[serde(default)]
    pub provision: ProvisionSettings,

    #[serde(default)]
    pub runtime: RuntimeConfig,
}

impl EnvironmentConfig {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(Error::from)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn discover(dir: &Path) -> Result<Self> {
        let candidates = [
            dir.join(CONFIG_FILENAME),
            dir.join(CONFIG_FILENAME_ALT),
            dir.join(CONFIG_FILENAME_DIR),
        ];

        for path in &candidates {
            if path.exists() {
                return Self::load(path);
            }
        }

        Err(Error::ConfigNotFound(dir.to_path_buf()))
    }

    /// The descriptor the resolver consumes.
    pub fn descriptor(&self) -> Descriptor {
        Descriptor {
            name: self.environment.clone(),
            slots: self.slots.iter().cloned().collect(),
        }
    }
}
