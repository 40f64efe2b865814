//! Promotion of peer facts into local config.
//!
//! Promotion follows the null-vs-absent rule: a key the peer did not report
//! leaves local config untouched, an explicit null deletes the config key,
//! and any other value replaces it when different.

use crate::config::LocalConfig;
use crate::core::error::ConvergeError;
use crate::relation::fact::{FactKind, FactValue, KnownFact};
use crate::relation::registry::PeerFacts;
use serde_json::{Map, Value};

/// Keys composed into `auth_info` from an identity service, in publish order.
const IDENTITY_KEYS: &[(&str, &str)] = &[
    ("keystone_protocol", "service_protocol"),
    ("keystone_ip", "service_hostname"),
    ("keystone_public_port", "service_port"),
    ("keystone_admin_user", "service_username"),
    ("keystone_admin_password", "service_password"),
    ("keystone_admin_tenant", "service_tenant_name"),
    ("keystone_region", "service_region"),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Promotion {
    /// Copy one fact into one config key.
    Copy {
        fact_key: &'static str,
        config_key: &'static str,
    },
    /// Copy the first non-empty fact among `fact_keys`.
    FirstOf {
        fact_keys: &'static [&'static str],
        config_key: &'static str,
    },
    /// Compose identity service facts into a JSON `auth_info` blob, or
    /// delete it when the service hostname is not known.
    IdentityAuth { config_key: &'static str },
    /// Accumulate per-plugin settings keyed by plugin address once the
    /// plugin reports ready.
    PluginSettings { config_key: &'static str },
}

/// Config keys changed by a promotion, plus facts that could not be used.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PromotionOutcome {
    pub changed: Vec<String>,
    pub malformed: Vec<ConvergeError>,
}

impl PromotionOutcome {
    pub fn is_changed(&self) -> bool {
        !self.changed.is_empty()
    }
}

/// Shared inputs of one promotion run.
pub(super) struct PromotionInput<'a> {
    pub relation: &'a str,
    pub facts: &'a PeerFacts,
    pub kind_of: &'a dyn Fn(&str) -> FactKind,
}

impl Promotion {
    pub(super) fn apply(
        &self,
        input: &PromotionInput<'_>,
        config: &mut LocalConfig,
        outcome: &mut PromotionOutcome,
    ) {
        match self {
            Promotion::Copy {
                fact_key,
                config_key,
            } => {
                if let Some(value) = input.facts.get(*fact_key) {
                    promote_value(input, fact_key, value, config_key, config, outcome);
                }
            }
            Promotion::FirstOf {
                fact_keys,
                config_key,
            } => {
                let chosen = fact_keys
                    .iter()
                    .find(|key| {
                        input
                            .facts
                            .get(**key)
                            .and_then(FactValue::as_str)
                            .is_some_and(|v| !v.is_empty())
                    })
                    .or(fact_keys.last());
                if let Some(key) = chosen
                    && let Some(value) = input.facts.get(*key)
                {
                    promote_value(input, key, value, config_key, config, outcome);
                }
            }
            Promotion::IdentityAuth { config_key } => {
                let hostname = input
                    .facts
                    .get("service_hostname")
                    .and_then(FactValue::as_str)
                    .filter(|h| !h.is_empty());
                let changed = match hostname {
                    Some(_) => {
                        let auth_info: Map<String, Value> = IDENTITY_KEYS
                            .iter()
                            .map(|(out, key)| {
                                let value = input
                                    .facts
                                    .get(*key)
                                    .and_then(FactValue::as_str)
                                    .map(|v| Value::String(v.to_string()))
                                    .unwrap_or(Value::Null);
                                (out.to_string(), value)
                            })
                            .collect();
                        config.set(*config_key, Value::String(Value::Object(auth_info).to_string()))
                    }
                    None => config.remove(config_key),
                };
                if changed {
                    outcome.changed.push(config_key.to_string());
                }
            }
            Promotion::PluginSettings { config_key } => {
                let ready = input
                    .facts
                    .get("ready")
                    .and_then(FactValue::as_str)
                    .and_then(crate::relation::fact::parse_flag)
                    .unwrap_or(false);
                if !ready {
                    return;
                }
                let Some(address) = ["ingress-address", "private-address"]
                    .iter()
                    .find_map(|key| input.facts.get(*key).and_then(FactValue::as_str))
                    .filter(|a| !a.is_empty())
                else {
                    return;
                };
                let settings = match input.facts.get("settings") {
                    None | Some(FactValue::Null) => Map::new(),
                    Some(value) => match KnownFact::parse(FactKind::JsonObject, value) {
                        KnownFact::Object(map) => map,
                        KnownFact::Malformed { reason } => {
                            outcome.malformed.push(malformed(input.relation, "settings", reason));
                            return;
                        }
                        _ => Map::new(),
                    },
                };
                let mut plugins: Map<String, Value> = config
                    .get_str(config_key)
                    .and_then(|raw| serde_json::from_str(raw).ok())
                    .unwrap_or_default();
                plugins.insert(address.to_string(), Value::Object(settings));
                if config.set(*config_key, Value::String(Value::Object(plugins).to_string())) {
                    outcome.changed.push(config_key.to_string());
                }
            }
        }
    }
}

fn promote_value(
    input: &PromotionInput<'_>,
    fact_key: &str,
    value: &FactValue,
    config_key: &str,
    config: &mut LocalConfig,
    outcome: &mut PromotionOutcome,
) {
    let changed = match KnownFact::parse((input.kind_of)(fact_key), value) {
        KnownFact::Cleared => config.remove(config_key),
        KnownFact::Malformed { reason } => {
            outcome.malformed.push(malformed(input.relation, fact_key, reason));
            false
        }
        _ => match value.as_str() {
            Some(raw) => config.set(config_key, Value::String(raw.to_string())),
            None => false,
        },
    };
    if changed {
        outcome.changed.push(config_key.to_string());
    }
}

fn malformed(relation: &str, key: &str, reason: String) -> ConvergeError {
    ConvergeError::MalformedFact {
        relation: relation.to_string(),
        key: key.to_string(),
        reason,
    }
}
