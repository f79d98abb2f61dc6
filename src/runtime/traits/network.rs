// ABOUTME: Network operations trait for container runtimes.
// ABOUTME: Create, remove and list environment networks.

use super::shared_types::NetworkConfig;
use crate::types::NetworkId;
use async_trait::async_trait;
use std::collections::HashMap;

#[async_trait]
pub trait NetworkOps: Send + Sync {
    async fn create_network(&self, config: &NetworkConfig) -> Result<NetworkId, NetworkError>;

    /// Fails with `InUse` while containers are still attached.
    async fn remove_network(&self, id: &NetworkId) -> Result<(), NetworkError>;

    /// List networks carrying every given label.
    async fn list_networks(
        &self,
        labels: &HashMap<String, String>,
    ) -> Result<Vec<NetworkSummary>, NetworkError>;
}

#[derive(Debug, Clone)]
pub struct NetworkSummary {
    pub id: NetworkId,
    pub name: String,
    pub labels: HashMap<String, String>,
}

/// Errors from network operations.
#[derive(Debug, thiserror::Error)]
pub enum NetworkError {
    #[error("network not found: {0}")]
    NotFound(String),

    #[error("network already exists: {0}")]
    AlreadyExists(String),

    #[error("network in use, cannot remove: {0}")]
    InUse(String),

    #[error("runtime error: {0}")]
    Runtime(String),
}
