//! Inbound events that trigger a reconciliation pass.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum Event {
    Install,
    /// Operator options; a `null` value resets the option.
    ConfigChanged {
        #[serde(default)]
        options: BTreeMap<String, Value>,
    },
    RelationJoined {
        relation: String,
        peer: String,
    },
    /// The peer's recognized keys are pulled through the relation port.
    RelationChanged {
        relation: String,
        peer: String,
    },
    RelationDeparted {
        relation: String,
        peer: String,
    },
    /// Periodic heartbeat; also prunes peers the substrate no longer lists.
    UpdateStatus,
    UpgradeCharm,
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::Install => "install",
            Event::ConfigChanged { .. } => "config-changed",
            Event::RelationJoined { .. } => "relation-joined",
            Event::RelationChanged { .. } => "relation-changed",
            Event::RelationDeparted { .. } => "relation-departed",
            Event::UpdateStatus => "update-status",
            Event::UpgradeCharm => "upgrade-charm",
        }
    }

    /// `(relation, peer)` for relation events.
    pub fn peer(&self) -> Option<(&str, &str)> {
        match self {
            Event::RelationJoined { relation, peer }
            | Event::RelationChanged { relation, peer }
            | Event::RelationDeparted { relation, peer } => Some((relation, peer)),
            _ => None,
        }
    }
}

impl std::fmt::Display for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.peer() {
            Some((relation, peer)) => write!(f, "{} ({} from {})", self.name(), relation, peer),
            None => write!(f, "{}", self.name()),
        }
    }
}
