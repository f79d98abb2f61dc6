// ABOUTME: Provisioning timing and addressing settings.
// ABOUTME: Deadlines, poll cadence, stop grace period and the public host name.

use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProvisionSettings {
    /// Overall budget for bringing the whole environment up.
    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,

    #[serde(default = "default_poll_interval", with = "humantime_serde")]
    pub poll_interval: Duration,

    /// Grace period given to a container on stop before it is killed.
    #[serde(default = "default_stop_timeout", with = "humantime_serde")]
    pub stop_timeout: Duration,

    /// Host name used in public access points.
    #[serde(default = "default_public_host")]
    pub public_host: String,
}

fn default_timeout() -> Duration {
    Duration::from_secs(120)
}

fn default_poll_interval() -> Duration {
    Duration::from_millis(500)
}

fn default_stop_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_public_host() -> String {
    "localhost".to_string()
}

impl Default for ProvisionSettings {
    fn default() -> Self {
        ProvisionSettings {
            timeout: default_timeout(),
            poll_interval: default_poll_interval(),
            stop_timeout: default_stop_timeout(),
            public_host: default_public_host(),
        }
    }
}
