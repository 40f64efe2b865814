//! JSON state store

use crate::fs_util::{read_optional, write_atomic};
use async_trait::async_trait;
use converge_application::ports::state_store::{AgentState, StateStore, StoreError};
use std::path::PathBuf;
use tracing::{debug, info};

/// Persists [`AgentState`] as a single pretty-printed JSON document.
pub struct JsonStateStore {
    path: PathBuf,
}

impl JsonStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

#[async_trait]
impl StateStore for JsonStateStore {
    async fn load(&self) -> Result<AgentState, StoreError> {
        let Some(content) = read_optional(&self.path).await? else {
            info!("No state at {}, starting fresh", self.path.display());
            return Ok(AgentState::default());
        };
        serde_json::from_str(&content)
            .map_err(|e| StoreError::Corrupt(format!("{}: {}", self.path.display(), e)))
    }

    async fn save(&self, state: &AgentState) -> Result<(), StoreError> {
        let bytes =
            serde_json::to_vec_pretty(state).map_err(|e| StoreError::Corrupt(e.to_string()))?;
        write_atomic(&self.path, &bytes).await?;
        debug!("Saved state to {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use converge_domain::{ArtifactId, FactValue, HealthState};
    use serde_json::json;

    #[tokio::test]
    async fn test_missing_file_loads_default() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStateStore::new(dir.path().join("state.json"));

        let state = store.load().await.unwrap();

        assert_eq!(state, AgentState::default());
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStateStore::new(dir.path().join("nested/state.json"));

        let mut state = AgentState::default();
        state.config.set("auth_info", json!(r#"{"keystone_ip": "10.0.0.5"}"#));
        state.registry.record_fact(
            "identity-admin",
            "keystone/0",
            "service_hostname",
            "10.0.0.5".into(),
        );
        state.registry.record_fact("identity-admin", "keystone/0", "service_port", FactValue::Null);
        state.detector.commit(&ArtifactId::new("controller/redis.env"), "REDIS=1\n");
        state.last_status = Some(HealthState::active("Unit ready"));

        store.save(&state).await.unwrap();
        let loaded = store.load().await.unwrap();

        assert_eq!(loaded, state);
    }

    #[tokio::test]
    async fn test_corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "{ not json").unwrap();

        let result = JsonStateStore::new(&path).load().await;

        assert!(matches!(result, Err(StoreError::Corrupt(_))));
    }

    #[tokio::test]
    async fn test_partial_document_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        let doc = r#"{
            "last_status": {"state": "blocked", "reason": "Missing relations: identity"}
        }"#;
        std::fs::write(&path, doc).unwrap();

        let state = JsonStateStore::new(&path).load().await.unwrap();

        assert_eq!(state.last_status, Some(HealthState::blocked("Missing relations: identity")));
        assert!(state.config.keys().next().is_none());
    }
}
