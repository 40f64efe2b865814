//! The reconciliation [`Context`] snapshot.

use crate::core::error::ConvergeError;
use serde_json::Value;
use std::collections::BTreeMap;
use std::net::Ipv4Addr;

/// Immutable, fully merged configuration snapshot for one pass.
///
/// Built from scratch on every pass by
/// [`ContextBuilder`](super::builder::ContextBuilder). Values live in an
/// ordered map so that two builds from equal inputs serialize to identical
/// bytes, which keeps artifact comparison stable.
#[derive(Debug, Clone, PartialEq)]
pub struct Context {
    pub(super) values: BTreeMap<String, Value>,
    pub(super) peer_counts: BTreeMap<String, usize>,
    pub(super) own_address: Ipv4Addr,
    pub(super) unit_name: String,
    pub(super) is_leader: bool,
    pub(super) malformed: Vec<ConvergeError>,
}

impl Context {
    /// Template-facing values.
    pub fn values(&self) -> &BTreeMap<String, Value> {
        &self.values
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.values.get(field).filter(|v| !v.is_null())
    }

    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(Value::as_str)
    }

    /// String items of a list field; non-string items are skipped.
    pub fn get_list(&self, field: &str) -> Vec<String> {
        match self.get(field) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Whether a field carries a usable value: not null, not an empty
    /// string, not an empty list or object.
    pub fn is_present(&self, field: &str) -> bool {
        match self.get(field) {
            None => false,
            Some(Value::String(s)) => !s.is_empty(),
            Some(Value::Array(items)) => !items.is_empty(),
            Some(Value::Object(map)) => !map.is_empty(),
            Some(_) => true,
        }
    }

    /// Number of peers seen on a relation the profile declares.
    pub fn peer_count(&self, relation: &str) -> usize {
        self.peer_counts.get(relation).copied().unwrap_or(0)
    }

    pub fn own_address(&self) -> Ipv4Addr {
        self.own_address
    }

    pub fn unit_name(&self) -> &str {
        &self.unit_name
    }

    pub fn is_leader(&self) -> bool {
        self.is_leader
    }

    /// Facts that failed to parse and were treated as absent.
    pub fn malformed(&self) -> &[ConvergeError] {
        &self.malformed
    }

    /// Canonical byte encoding of the snapshot.
    pub fn canonical_bytes(&self) -> Vec<u8> {
        let snapshot = serde_json::json!({
            "values": self.values,
            "peers": self.peer_counts,
            "own_address": self.own_address.to_string(),
            "unit": self.unit_name,
            "leader": self.is_leader,
        });
        serde_json::to_vec(&snapshot).unwrap_or_default()
    }
}
