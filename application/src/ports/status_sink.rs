//! Status sink port
//!
//! The only user-visible failure channel. Every evaluation overwrites the
//! previous status.

use async_trait::async_trait;
use converge_domain::HealthState;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SinkError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to report status: {0}")]
    Other(String),
}

#[async_trait]
pub trait StatusSink: Send + Sync {
    async fn set_status(&self, state: &HealthState) -> Result<(), SinkError>;
}
