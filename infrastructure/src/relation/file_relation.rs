//! File-backed relation substrate.
//!
//! Inbound peer data is read from a JSON document maintained by whatever
//! delivers events to the agent:
//!
//! ```json
//! {
//!   "leader": true,
//!   "relations": {
//!     "identity-admin": {
//!       "keystone/0": { "service_hostname": "10.0.0.5", "service_tenant": null }
//!     }
//!   }
//! }
//! ```
//!
//! A key the peer never published is absent from its object; an explicit
//! `null` is a removal. Outbound facts are merged into a second document
//! keyed the same way, minus the peer level.

use crate::fs_util::{read_optional, write_atomic};
use async_trait::async_trait;
use converge_application::ports::relation::{RelationError, RelationPort};
use converge_domain::FactLookup;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::debug;

/// Facts per relation, per peer, per key.
pub type PeerData = BTreeMap<String, BTreeMap<String, BTreeMap<String, Value>>>;

/// Outbound facts per relation, per key.
pub type OutboundDocument = BTreeMap<String, BTreeMap<String, Option<String>>>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InboundDocument {
    /// Overrides the configured leadership when present.
    pub leader: Option<bool>,
    pub relations: PeerData,
}

pub struct FileRelationAdapter {
    unit_name: String,
    leader: bool,
    inbound: PathBuf,
    outbound: PathBuf,
}

impl FileRelationAdapter {
    pub fn new(
        unit_name: impl Into<String>,
        inbound: impl Into<PathBuf>,
        outbound: impl Into<PathBuf>,
    ) -> Self {
        Self {
            unit_name: unit_name.into(),
            leader: false,
            inbound: inbound.into(),
            outbound: outbound.into(),
        }
    }

    pub fn with_leader(mut self, leader: bool) -> Self {
        self.leader = leader;
        self
    }

    /// Read the inbound document; a missing file is an empty document.
    pub async fn inbound(&self) -> Result<InboundDocument, RelationError> {
        match read_optional(&self.inbound).await? {
            Some(content) => serde_json::from_str(&content).map_err(|e| {
                RelationError::Unavailable(format!("{}: {}", self.inbound.display(), e))
            }),
            None => Ok(InboundDocument::default()),
        }
    }

    /// Read the outbound document; a missing file is an empty document.
    pub async fn outbound(&self) -> Result<OutboundDocument, RelationError> {
        match read_optional(&self.outbound).await? {
            Some(content) => serde_json::from_str(&content).map_err(|e| {
                RelationError::Unavailable(format!("{}: {}", self.outbound.display(), e))
            }),
            None => Ok(OutboundDocument::new()),
        }
    }
}

#[async_trait]
impl RelationPort for FileRelationAdapter {
    async fn get_fact(
        &self,
        relation: &str,
        peer: &str,
        key: &str,
    ) -> Result<FactLookup, RelationError> {
        let doc = self.inbound().await?;
        let value = doc
            .relations
            .get(relation)
            .and_then(|peers| peers.get(peer))
            .and_then(|facts| facts.get(key));

        Ok(match value {
            None => FactLookup::Absent,
            Some(Value::Null) => FactLookup::Null,
            Some(Value::String(s)) => FactLookup::Value(s.clone()),
            // Peers publish strings; anything else is passed on encoded.
            Some(other) => FactLookup::Value(other.to_string()),
        })
    }

    async fn set_facts(
        &self,
        relation: &str,
        facts: &BTreeMap<String, Option<String>>,
    ) -> Result<(), RelationError> {
        let mut doc = self.outbound().await?;
        let entry = doc.entry(relation.to_string()).or_default();
        for (key, value) in facts {
            entry.insert(key.clone(), value.clone());
        }

        let bytes = serde_json::to_vec_pretty(&doc).map_err(|e| RelationError::PublishFailed {
            relation: relation.to_string(),
            reason: e.to_string(),
        })?;
        write_atomic(&self.outbound, &bytes)
            .await
            .map_err(|e| RelationError::PublishFailed {
                relation: relation.to_string(),
                reason: e.to_string(),
            })?;

        debug!("Wrote {} facts for {} to {}", facts.len(), relation, self.outbound.display());
        Ok(())
    }

    async fn list_peers(&self, relation: &str) -> Result<Vec<String>, RelationError> {
        let doc = self.inbound().await?;
        Ok(doc
            .relations
            .get(relation)
            .map(|peers| peers.keys().cloned().collect())
            .unwrap_or_default())
    }

    async fn is_leader(&self) -> Result<bool, RelationError> {
        Ok(self.inbound().await?.leader.unwrap_or(self.leader))
    }

    fn unit_name(&self) -> String {
        self.unit_name.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INBOUND: &str = r#"{
        "relations": {
            "identity-admin": {
                "keystone/0": {
                    "service_hostname": "10.0.0.5",
                    "service_port": 5000,
                    "service_tenant": null
                }
            }
        }
    }"#;

    fn adapter(dir: &tempfile::TempDir) -> FileRelationAdapter {
        FileRelationAdapter::new(
            "keystone-auth/0",
            dir.path().join("relations.json"),
            dir.path().join("outbound.json"),
        )
    }

    #[tokio::test]
    async fn test_lookup_distinguishes_absent_and_null() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("relations.json"), INBOUND).unwrap();
        let relation = adapter(&dir);

        let get = |key: &'static str| relation.get_fact("identity-admin", "keystone/0", key);
        assert_eq!(get("service_hostname").await.unwrap(), FactLookup::Value("10.0.0.5".into()));
        assert_eq!(get("service_port").await.unwrap(), FactLookup::Value("5000".into()));
        assert_eq!(get("service_tenant").await.unwrap(), FactLookup::Null);
        assert_eq!(get("service_username").await.unwrap(), FactLookup::Absent);
        assert_eq!(
            relation.get_fact("identity-admin", "keystone/1", "service_hostname").await.unwrap(),
            FactLookup::Absent
        );
    }

    #[tokio::test]
    async fn test_list_peers_and_leadership() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("relations.json"), INBOUND).unwrap();
        let relation = adapter(&dir).with_leader(true);

        assert_eq!(relation.list_peers("identity-admin").await.unwrap(), vec!["keystone/0"]);
        assert!(relation.list_peers("contrail-auth").await.unwrap().is_empty());
        assert!(relation.is_leader().await.unwrap());

        std::fs::write(dir.path().join("relations.json"), r#"{"leader": false}"#).unwrap();
        assert!(!relation.is_leader().await.unwrap());
    }

    #[tokio::test]
    async fn test_missing_inbound_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let relation = adapter(&dir);

        assert!(relation.list_peers("identity-admin").await.unwrap().is_empty());
        assert!(!relation.is_leader().await.unwrap());
    }

    #[tokio::test]
    async fn test_corrupt_inbound_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("relations.json"), "[").unwrap();

        let result = adapter(&dir).list_peers("identity-admin").await;

        assert!(matches!(result, Err(RelationError::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_set_facts_merges_per_relation() {
        let dir = tempfile::tempdir().unwrap();
        let relation = adapter(&dir);

        let first = BTreeMap::from([
            ("auth-info".to_string(), Some("{}".to_string())),
            ("ready".to_string(), Some("false".to_string())),
        ]);
        relation.set_facts("contrail-auth", &first).await.unwrap();
        let second = BTreeMap::from([("ready".to_string(), Some("true".to_string()))]);
        relation.set_facts("contrail-auth", &second).await.unwrap();
        let cleared = BTreeMap::from([("private-address".to_string(), None)]);
        relation.set_facts("http-services", &cleared).await.unwrap();

        let doc = relation.outbound().await.unwrap();
        assert_eq!(doc["contrail-auth"]["auth-info"].as_deref(), Some("{}"));
        assert_eq!(doc["contrail-auth"]["ready"].as_deref(), Some("true"));
        assert_eq!(doc["http-services"]["private-address"], None);
    }
}
