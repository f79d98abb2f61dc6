// ABOUTME: Exec operations trait for container runtimes.
// ABOUTME: Run commands inside running containers from test bodies.

use super::shared_types::{ExecConfig, ExecResult};
use crate::types::ContainerId;
use async_trait::async_trait;

#[async_trait]
pub trait ExecOps: Send + Sync {
    /// Run a command to completion and collect its output.
    async fn exec(
        &self,
        container: &ContainerId,
        config: &ExecConfig,
    ) -> Result<ExecResult, ExecError>;

    /// Like `exec`, but a non-zero exit is an error. Returns stdout.
    async fn exec_ok(&self, container: &ContainerId, config: &ExecConfig) -> Result<String, ExecError> {
        let result = self.exec(container, config).await?;
        if !result.success() {
            return Err(ExecError::NonZeroExit {
                command: config.cmd.join(" "),
                exit_code: result.exit_code,
                stderr: String::from_utf8_lossy(&result.stderr).trim_end().to_string(),
            });
        }
        Ok(result.stdout_lossy())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    #[error("container not found: {0}")]
    ContainerNotFound(String),

    #[error("container not running: {0}")]
    ContainerNotRunning(String),

    #[error("`{command}` exited with {exit_code}: {stderr}")]
    NonZeroExit {
        command: String,
        exit_code: i64,
        stderr: String,
    },

    #[error("exec failed: {0}")]
    Failed(String),

    #[error("runtime error: {0}")]
    Runtime(String),
}
