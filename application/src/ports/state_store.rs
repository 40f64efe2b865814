//! State store port
//!
//! The only state persisted between passes: local config, the peer
//! registry, change-detector baselines and the last reported status.

use async_trait::async_trait;
use converge_domain::{ChangeDetector, HealthState, LocalConfig, PeerRegistry};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt state: {0}")]
    Corrupt(String),
}

/// Everything a unit carries from one pass to the next.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentState {
    pub config: LocalConfig,
    pub registry: PeerRegistry,
    pub detector: ChangeDetector,
    pub last_status: Option<HealthState>,
    /// Immutable options whose change was rejected. The unit stays blocked
    /// until a config-changed delivers the installed value again.
    pub rejected_options: BTreeSet<String>,
}

/// Durable storage for [`AgentState`]
///
/// `save` must be durable before it returns: a pass only reports success
/// after its state has been flushed.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Load the persisted state, or the default state on first run.
    async fn load(&self) -> Result<AgentState, StoreError>;

    async fn save(&self, state: &AgentState) -> Result<(), StoreError>;
}
