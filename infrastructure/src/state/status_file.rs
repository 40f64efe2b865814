//! Status sink writing `status.json`.

use crate::fs_util::write_atomic;
use async_trait::async_trait;
use converge_application::ports::status_sink::{SinkError, StatusSink};
use converge_domain::HealthState;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::info;

/// On-disk shape of the reported status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusRecord {
    /// `blocked`, `maintenance` or `active`.
    pub state: String,
    pub reason: String,
    /// RFC 3339 timestamp of the report.
    pub updated_at: String,
}

pub struct FileStatusSink {
    path: PathBuf,
}

impl FileStatusSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Read back the last reported status.
    pub async fn read(&self) -> Result<Option<StatusRecord>, SinkError> {
        match crate::fs_util::read_optional(&self.path).await? {
            Some(content) => serde_json::from_str(&content)
                .map(Some)
                .map_err(|e| SinkError::Other(e.to_string())),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl StatusSink for FileStatusSink {
    async fn set_status(&self, state: &HealthState) -> Result<(), SinkError> {
        let record = StatusRecord {
            state: state.label().to_string(),
            reason: state.reason().to_string(),
            updated_at: chrono::Utc::now().to_rfc3339(),
        };
        let bytes =
            serde_json::to_vec_pretty(&record).map_err(|e| SinkError::Other(e.to_string()))?;
        write_atomic(&self.path, &bytes).await?;
        info!("Status: {}", state);
        Ok(())
    }
}
