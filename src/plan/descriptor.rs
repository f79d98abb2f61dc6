// ABOUTME: Declarative environment descriptor: named slots carrying tagged fragments.
// ABOUTME: Built in code with the builder API or deserialized from YAML.

use crate::config::HealthCheck;
use crate::runtime::Protocol;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// The environment a test run asks for.
#[derive(Debug, Clone, Deserialize)]
pub struct Descriptor {
    pub name: String,
    #[serde(default)]
    pub slots: Vec<Slot>,
}

impl Descriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            slots: Vec::new(),
        }
    }

    pub fn slot(mut self, slot: Slot) -> Self {
        self.slots.push(slot);
        self
    }
}

/// One named position in the environment.
///
/// The name stays unvalidated until resolution so that a bad name is
/// reported as a resolve error rather than a parse error.
#[derive(Debug, Clone, Deserialize)]
pub struct Slot {
    pub name: String,
    #[serde(default)]
    pub capability: Capability,
    #[serde(
        default,
        deserialize_with = "serde_yaml::with::singleton_map_recursive::deserialize"
    )]
    pub fragments: Vec<Fragment>,
}

impl Slot {
    pub fn new(name: impl Into<String>, capability: Capability) -> Self {
        Self {
            name: name.into(),
            capability,
            fragments: Vec::new(),
        }
    }

    pub fn service(name: impl Into<String>) -> Self {
        Self::new(name, Capability::Service)
    }

    pub fn http(name: impl Into<String>) -> Self {
        Self::new(name, Capability::Http)
    }

    pub fn file_transfer(name: impl Into<String>) -> Self {
        Self::new(name, Capability::FileTransfer)
    }

    pub fn network(name: impl Into<String>) -> Self {
        Self::new(name, Capability::Network)
    }

    pub fn with(mut self, fragment: Fragment) -> Self {
        self.fragments.push(fragment);
        self
    }
}

/// What a slot provides. Decides the resource kind and extra requirements.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Capability {
    Network,
    #[default]
    Service,
    /// Needs at least one port.
    Http,
    /// Needs at least one account.
    FileTransfer,
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::Network => "network",
            Capability::Service => "service",
            Capability::Http => "http",
            Capability::FileTransfer => "file-transfer",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single piece of configuration attached to a slot.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Fragment {
    /// Runtime name template; `${VAR}` placeholders are filled from the
    /// environment snapshot.
    Identity(String),
    Image(String),
    Build(BuildContext),
    Port(PortBinding),
    Account(Account),
    Option(Setting),
    Env(Setting),
    Command(Vec<String>),
    HealthCheck(HealthCheck),
    Isolated(bool),
}

impl Fragment {
    pub fn identity(template: impl Into<String>) -> Self {
        Fragment::Identity(template.into())
    }

    pub fn image(reference: impl Into<String>) -> Self {
        Fragment::Image(reference.into())
    }

    pub fn build(context: impl Into<PathBuf>) -> Self {
        Fragment::Build(BuildContext {
            context: context.into(),
            dockerfile: default_dockerfile(),
        })
    }

    pub fn port(scheme: Scheme, container_port: u16) -> Self {
        Fragment::Port(PortBinding {
            protocol: Protocol::Tcp,
            scheme,
            container_port,
            host_port: None,
        })
    }

    pub fn account(username: impl Into<String>, credential: impl Into<String>) -> Self {
        Fragment::Account(Account {
            username: username.into(),
            credential: credential.into(),
        })
    }

    pub fn option(key: impl Into<String>, value: impl Into<String>) -> Self {
        Fragment::Option(Setting::new(key, value))
    }

    pub fn env(key: impl Into<String>, value: impl Into<String>) -> Self {
        Fragment::Env(Setting::new(key, value))
    }

    pub fn command<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Fragment::Command(args.into_iter().map(Into::into).collect())
    }

    /// Fragment kind as written in YAML.
    pub fn kind(&self) -> &'static str {
        match self {
            Fragment::Identity(_) => "identity",
            Fragment::Image(_) => "image",
            Fragment::Build(_) => "build",
            Fragment::Port(_) => "port",
            Fragment::Account(_) => "account",
            Fragment::Option(_) => "option",
            Fragment::Env(_) => "env",
            Fragment::Command(_) => "command",
            Fragment::HealthCheck(_) => "health_check",
            Fragment::Isolated(_) => "isolated",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct BuildContext {
    pub context: PathBuf,
    /// Relative to the context directory.
    #[serde(default = "default_dockerfile")]
    pub dockerfile: PathBuf,
}

fn default_dockerfile() -> PathBuf {
    PathBuf::from("Dockerfile")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct PortBinding {
    #[serde(default)]
    pub protocol: Protocol,
    #[serde(default)]
    pub scheme: Scheme,
    pub container_port: u16,
    /// Fixed host port; left empty the runtime picks a free one.
    #[serde(default)]
    pub host_port: Option<u16>,
}

impl PortBinding {
    pub fn with_host_port(mut self, host_port: u16) -> Self {
        self.host_port = Some(host_port);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Account {
    pub username: String,
    pub credential: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Setting {
    pub key: String,
    pub value: String,
}

impl Setting {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Application protocol spoken on a port.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    Http,
    Https,
    Ftp,
    Ftps,
    Sftp,
    Ssh,
    #[default]
    Tcp,
    Tls,
}

impl Scheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
            Scheme::Ftp => "ftp",
            Scheme::Ftps => "ftps",
            Scheme::Sftp => "sftp",
            Scheme::Ssh => "ssh",
            Scheme::Tcp => "tcp",
            Scheme::Tls => "tls",
        }
    }

    /// Whether traffic on this scheme is encrypted.
    pub fn is_secure(&self) -> bool {
        matches!(
            self,
            Scheme::Https | Scheme::Ftps | Scheme::Sftp | Scheme::Ssh | Scheme::Tls
        )
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}
