// ABOUTME: Image operations trait for container runtimes.
// ABOUTME: Pull, check existence, and build images from a local context.

use super::shared_types::BuildRequest;
use crate::types::ImageRef;
use async_trait::async_trait;

#[async_trait]
pub trait ImageOps: Send + Sync {
    async fn pull_image(&self, reference: &ImageRef) -> Result<(), ImageError>;

    async fn image_exists(&self, reference: &ImageRef) -> Result<bool, ImageError>;

    /// Build an image from a context directory and return its reference.
    /// Builds can take minutes; callers bound them with their own deadline.
    async fn build_image(&self, request: &BuildRequest) -> Result<ImageRef, ImageError>;
}

/// Errors from image operations.
#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    #[error("image not found: {0}")]
    NotFound(String),

    #[error("pull failed: {0}")]
    PullFailed(String),

    #[error("build context unreadable: {0}")]
    Context(String),

    #[error("build failed: {0}")]
    BuildFailed(String),

    #[error("runtime error: {0}")]
    Runtime(String),
}
