//! Relation port
//!
//! Defines how the agent exchanges facts with its peers. The delivery
//! substrate (how notifications arrive, how outbound data reaches peers) is
//! an adapter concern.

use async_trait::async_trait;
use converge_domain::FactLookup;
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors that can occur while talking to the relation substrate
#[derive(Error, Debug)]
pub enum RelationError {
    #[error("Relation data unavailable: {0}")]
    Unavailable(String),

    #[error("Failed to publish on {relation}: {reason}")]
    PublishFailed { relation: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Inbound and outbound relation data
#[async_trait]
pub trait RelationPort: Send + Sync {
    /// Read one key a peer published.
    ///
    /// Must distinguish a key the peer never published
    /// ([`FactLookup::Absent`]) from an explicit null ([`FactLookup::Null`]).
    async fn get_fact(
        &self,
        relation: &str,
        peer: &str,
        key: &str,
    ) -> Result<FactLookup, RelationError>;

    /// Publish this unit's facts on a relation. `None` publishes a null.
    async fn set_facts(
        &self,
        relation: &str,
        facts: &BTreeMap<String, Option<String>>,
    ) -> Result<(), RelationError>;

    /// Peers the substrate currently lists on a relation.
    async fn list_peers(&self, relation: &str) -> Result<Vec<String>, RelationError>;

    async fn is_leader(&self) -> Result<bool, RelationError>;

    /// Name of the local unit, e.g. `analytics/0`.
    fn unit_name(&self) -> String;
}
