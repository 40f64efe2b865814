//! Change detector: last-applied baselines per artifact.

use super::entities::{ArtifactId, GroupId};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet};

/// SHA-256 of the content, hex encoded.
pub fn content_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

/// Persisted baselines (artifact id → content hash) plus the groups whose
/// last apply failed.
///
/// A group stays pending until one of its applies succeeds, so a failed
/// apply is retried on the next pass even if nothing changed since.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChangeDetector {
    hashes: BTreeMap<ArtifactId, String>,
    pending: BTreeSet<GroupId>,
}

impl ChangeDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compare `content` with the baseline and advance it when they differ.
    ///
    /// Returns `true` only when the content differs; an equal render leaves
    /// the detector untouched.
    pub fn rendered(&mut self, id: &ArtifactId, content: &str) -> bool {
        let hash = content_hash(content);
        if self.hashes.get(id) == Some(&hash) {
            return false;
        }
        self.hashes.insert(id.clone(), hash);
        true
    }

    /// Same comparison as [`rendered`](Self::rendered) without advancing the
    /// baseline.
    pub fn differs(&self, id: &ArtifactId, content: &str) -> bool {
        self.hashes.get(id) != Some(&content_hash(content))
    }

    /// Advance the baseline after the artifact has been applied.
    pub fn commit(&mut self, id: &ArtifactId, content: &str) {
        self.hashes.insert(id.clone(), content_hash(content));
    }

    pub fn baseline(&self, id: &ArtifactId) -> Option<&str> {
        self.hashes.get(id).map(String::as_str)
    }

    pub fn mark_pending(&mut self, group: &GroupId) {
        self.pending.insert(group.clone());
    }

    pub fn clear_pending(&mut self, group: &GroupId) {
        self.pending.remove(group);
    }

    pub fn is_pending(&self, group: &GroupId) -> bool {
        self.pending.contains(group)
    }
}
