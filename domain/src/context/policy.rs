//! Per-field merge policies.
//!
//! Every context field a role renders is declared with exactly one
//! [`FieldPolicy`]. There is no generic "copy whatever differs" rule: each
//! field states where its value comes from and how absent, null and
//! malformed inputs are treated.

use crate::relation::fact::FactKind;
use serde_json::Value;

/// Fallback used when an option or promoted value is absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultValue {
    Text(&'static str),
    Flag(bool),
}

impl DefaultValue {
    pub fn to_value(self) -> Value {
        match self {
            DefaultValue::Text(s) => Value::String(s.to_string()),
            DefaultValue::Flag(b) => Value::Bool(b),
        }
    }
}

/// Values computed on the unit itself, never taken from peers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComputedField {
    OwnAddress,
    UnitName,
    /// `<hostname>-contrail-rmq`, the name rabbitmq cluster nodes use.
    RabbitHostname,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldPolicy {
    /// Operator option copied verbatim.
    Option {
        option: &'static str,
        field: &'static str,
        default: Option<DefaultValue>,
    },
    /// Value promoted into local config from `source`, parsed as `kind`.
    /// Malformed values are reported and treated as absent.
    Promoted {
        config_key: &'static str,
        field: &'static str,
        kind: FactKind,
        source: &'static str,
        default: Option<DefaultValue>,
    },
    /// Promoted JSON object whose keys are merged into the context.
    /// Disappears from the context once the config key is removed.
    Expand {
        config_key: &'static str,
        source: &'static str,
    },
    /// One address per peer of `relation`, deduplicated and sorted by
    /// numeric value.
    CollectSorted {
        relation: &'static str,
        key: &'static str,
        field: &'static str,
        include_self: bool,
    },
    /// Cluster membership: the leader collects peer addresses plus its own;
    /// other units take the first list published under `published_key`.
    ClusterMembers {
        relation: &'static str,
        key: &'static str,
        published_key: &'static str,
        field: &'static str,
    },
    Computed {
        field: &'static str,
        value: ComputedField,
    },
}

impl FieldPolicy {
    /// Relation this policy reads peer facts from, if any.
    pub fn relation(&self) -> Option<&'static str> {
        match self {
            FieldPolicy::CollectSorted { relation, .. }
            | FieldPolicy::ClusterMembers { relation, .. } => Some(*relation),
            _ => None,
        }
    }
}
