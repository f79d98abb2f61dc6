// ABOUTME: Container health check declaration.
// ABOUTME: Command-based checks with defaults tuned for short-lived test environments.

use crate::runtime::HealthcheckConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct HealthCheck {
    /// Command run inside the container; exit status 0 means healthy.
    pub test: Vec<String>,

    #[serde(default = "default_interval", with = "humantime_serde")]
    pub interval: Duration,

    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,

    #[serde(default = "default_retries")]
    pub retries: u32,

    #[serde(default = "default_start_period", with = "humantime_serde")]
    pub start_period: Duration,
}

fn default_interval() -> Duration {
    Duration::from_secs(1)
}

fn default_timeout() -> Duration {
    Duration::from_secs(5)
}

fn default_retries() -> u32 {
    3
}

fn default_start_period() -> Duration {
    Duration::ZERO
}

impl HealthCheck {
    pub fn command<I, S>(test: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            test: test.into_iter().map(Into::into).collect(),
            interval: default_interval(),
            timeout: default_timeout(),
            retries: default_retries(),
            start_period: default_start_period(),
        }
    }

    /// Convert to the runtime form. A bare command is wrapped in `CMD`; a
    /// single string runs through the shell.
    pub fn to_runtime(&self) -> HealthcheckConfig {
        let test = match self.test.first().map(String::as_str) {
            Some("CMD" | "CMD-SHELL" | "NONE") => self.test.clone(),
            _ if self.test.len() == 1 => vec!["CMD-SHELL".to_string(), self.test[0].clone()],
            _ => std::iter::once("CMD".to_string())
                .chain(self.test.iter().cloned())
                .collect(),
        };
        HealthcheckConfig {
            test,
            interval: self.interval,
            timeout: self.timeout,
            retries: self.retries,
            start_period: self.start_period,
        }
    }
}
