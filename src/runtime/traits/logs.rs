// ABOUTME: Log operations trait for container runtimes.
// ABOUTME: Streams container output and collects the tail for diagnostics.

use crate::types::ContainerId;
use async_trait::async_trait;
use futures::{Stream, StreamExt};
use std::pin::Pin;

pub type LogLineStream = Pin<Box<dyn Stream<Item = Result<LogLine, LogError>> + Send>>;

#[async_trait]
pub trait LogOps: Send + Sync {
    async fn container_logs(
        &self,
        id: &ContainerId,
        opts: &LogOptions,
    ) -> Result<LogLineStream, LogError>;
}

/// Options for reading logs.
#[derive(Debug, Clone, Default)]
pub struct LogOptions {
    pub stdout: bool,
    pub stderr: bool,
    /// Keep the stream open for new output.
    pub follow: bool,
    /// Number of lines to show from the end (`None` = all).
    pub tail: Option<u64>,
}

impl LogOptions {
    /// The last `n` lines of both streams, without following.
    pub fn tail(n: u64) -> Self {
        Self {
            stdout: true,
            stderr: true,
            follow: false,
            tail: Some(n),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LogLine {
    pub content: String,
    pub stream: LogStream,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogStream {
    Stdout,
    Stderr,
}

#[derive(Debug, thiserror::Error)]
pub enum LogError {
    #[error("container not found: {0}")]
    ContainerNotFound(String),

    #[error("stream error: {0}")]
    StreamError(String),

    #[error("runtime error: {0}")]
    Runtime(String),
}

/// Collect the last `n` log lines of a container into memory.
pub async fn collect_tail<L: LogOps + ?Sized>(
    runtime: &L,
    id: &ContainerId,
    n: u64,
) -> Result<Vec<LogLine>, LogError> {
    let mut stream = runtime.container_logs(id, &LogOptions::tail(n)).await?;
    let mut lines = Vec::new();
    while let Some(line) = stream.next().await {
        lines.push(line?);
    }
    Ok(lines)
}
