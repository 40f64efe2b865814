//! Container lifecycle port

use async_trait::async_trait;
use converge_domain::ServiceGroup;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LifecycleError {
    #[error("Failed to pull image {image}: {reason}")]
    PullFailed { image: String, reason: String },

    #[error("Failed to apply service group {group}: {reason}")]
    ApplyFailed { group: String, reason: String },

    #[error("Container runtime not available: {0}")]
    RuntimeUnavailable(String),
}

/// Pull images and (re)apply service groups.
///
/// Both operations must be idempotent; no timeout is managed by the caller.
#[async_trait]
pub trait ContainerLifecycle: Send + Sync {
    async fn pull_image(&self, image: &str, tag: &str) -> Result<(), LifecycleError>;

    /// Apply a group once, whatever number of its artifacts changed.
    async fn apply_group(&self, group: &ServiceGroup) -> Result<(), LifecycleError>;
}
