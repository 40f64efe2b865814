//! Peer registry: the known peers of every relation and what they published.

use super::fact::FactValue;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Facts published by one peer, keyed by fact key.
pub type PeerFacts = BTreeMap<String, FactValue>;

static NO_PEERS: BTreeMap<String, PeerFacts> = BTreeMap::new();

/// Outcome of removing a peer from a relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeerDeparture {
    /// The peer was known before the call.
    pub removed: bool,
    /// No peers remain on the relation afterwards.
    pub last_peer: bool,
}

/// Relation → peer → key → value store.
///
/// Ordered maps keep iteration (and therefore serialization) independent of
/// the order in which notifications arrived.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerRegistry {
    relations: BTreeMap<String, BTreeMap<String, PeerFacts>>,
}

impl PeerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a peer on a relation without any facts yet.
    ///
    /// Returns `true` if the peer was not known before.
    pub fn join_peer(&mut self, relation: &str, peer: &str) -> bool {
        let peers = self.relations.entry(relation.to_string()).or_default();
        if peers.contains_key(peer) {
            return false;
        }
        peers.insert(peer.to_string(), PeerFacts::new());
        true
    }

    /// Record one fact. Last write wins per key.
    ///
    /// Returns `true` if the stored value changed; recording an identical
    /// value again is a no-op.
    pub fn record_fact(&mut self, relation: &str, peer: &str, key: &str, value: FactValue) -> bool {
        let facts = self
            .relations
            .entry(relation.to_string())
            .or_default()
            .entry(peer.to_string())
            .or_default();

        if facts.get(key) == Some(&value) {
            return false;
        }
        facts.insert(key.to_string(), value);
        true
    }

    /// Drop a peer and every fact it published.
    pub fn remove_peer(&mut self, relation: &str, peer: &str) -> PeerDeparture {
        let Some(peers) = self.relations.get_mut(relation) else {
            return PeerDeparture {
                removed: false,
                last_peer: true,
            };
        };

        let removed = peers.remove(peer).is_some();
        let last_peer = peers.is_empty();
        if last_peer {
            self.relations.remove(relation);
        }
        PeerDeparture { removed, last_peer }
    }

    /// Remove peers of `relation` that are not in `listed`.
    ///
    /// Used to recover from missed departure notifications. Returns the ids
    /// of the pruned peers.
    pub fn retain_peers(&mut self, relation: &str, listed: &BTreeSet<String>) -> Vec<String> {
        let stale: Vec<String> = self
            .peers_of(relation)
            .into_iter()
            .filter(|peer| !listed.contains(*peer))
            .map(str::to_string)
            .collect();

        for peer in &stale {
            self.remove_peer(relation, peer);
        }
        stale
    }

    /// All peers of a relation with their facts.
    pub fn facts_for(&self, relation: &str) -> &BTreeMap<String, PeerFacts> {
        self.relations.get(relation).unwrap_or(&NO_PEERS)
    }

    pub fn peers_of(&self, relation: &str) -> BTreeSet<&str> {
        self.facts_for(relation).keys().map(String::as_str).collect()
    }

    pub fn has_peers(&self, relation: &str) -> bool {
        !self.facts_for(relation).is_empty()
    }

    pub fn fact(&self, relation: &str, peer: &str, key: &str) -> Option<&FactValue> {
        self.facts_for(relation).get(peer)?.get(key)
    }

    /// Names of relations that currently have at least one peer.
    pub fn relations(&self) -> impl Iterator<Item = &str> {
        self.relations.keys().map(String::as_str)
    }
}
