//! Context builder: projects local config, peer facts and host facts into a
//! [`Context`].
//!
//! Building is a pure function of its inputs. The only failure is a missing
//! own address; malformed facts are collected on the context and treated as
//! absent.

use super::entities::Context;
use super::host::HostFacts;
use super::policy::{ComputedField, DefaultValue, FieldPolicy};
use crate::config::LocalConfig;
use crate::core::error::ConvergeError;
use crate::core::ip::{parse_ipv4, sort_dedup};
use crate::profile::UnitProfile;
use crate::relation::fact::{FactKind, FactValue, KnownFact};
use crate::relation::registry::PeerRegistry;
use serde_json::Value;
use std::collections::BTreeMap;
use std::net::Ipv4Addr;

pub struct ContextBuilder<'a> {
    profile: &'a UnitProfile,
}

impl<'a> ContextBuilder<'a> {
    pub fn new(profile: &'a UnitProfile) -> Self {
        Self { profile }
    }

    /// Build the snapshot for one pass.
    ///
    /// # Errors
    ///
    /// [`ConvergeError::ContextUnavailable`] when `host.own_address` is
    /// `None`.
    pub fn build(
        &self,
        config: &LocalConfig,
        registry: &PeerRegistry,
        host: &HostFacts,
    ) -> Result<Context, ConvergeError> {
        let own_address = host.own_address.ok_or_else(|| {
            ConvergeError::ContextUnavailable(format!(
                "own address of {} could not be resolved",
                host.unit_name
            ))
        })?;

        let mut state = BuildState {
            values: BTreeMap::new(),
            malformed: Vec::new(),
        };

        for policy in &self.profile.fields {
            match policy {
                FieldPolicy::Option {
                    option,
                    field,
                    default,
                } => {
                    let value = config.get(option).cloned().or(default.map(DefaultValue::to_value));
                    state.insert(field, value);
                }
                FieldPolicy::Promoted {
                    config_key,
                    field,
                    kind,
                    source,
                    default,
                } => {
                    let value = match config.get(config_key) {
                        Some(raw) => match promoted_value(raw, *kind) {
                            Ok(value) => Some(value),
                            Err(reason) => {
                                state.malformed(source, config_key, reason);
                                None
                            }
                        },
                        None => None,
                    };
                    state.insert(field, value.or(default.map(DefaultValue::to_value)));
                }
                FieldPolicy::Expand { config_key, source } => {
                    let Some(raw) = config.get(config_key) else {
                        continue;
                    };
                    match promoted_value(raw, FactKind::JsonObject) {
                        Ok(Value::Object(map)) => {
                            for (key, value) in map {
                                state.values.insert(key, value);
                            }
                        }
                        Ok(_) => {
                            state.malformed(source, config_key, "expected a JSON object".into())
                        }
                        Err(reason) => state.malformed(source, config_key, reason),
                    }
                }
                FieldPolicy::CollectSorted {
                    relation,
                    key,
                    field,
                    include_self,
                } => {
                    let mut ips = state.collect_addresses(registry, relation, key);
                    if *include_self {
                        ips.push(own_address);
                    }
                    state.insert(field, Some(address_list(ips)));
                }
                FieldPolicy::ClusterMembers {
                    relation,
                    key,
                    published_key,
                    field,
                } => {
                    let ips = if host.is_leader {
                        let mut ips = state.collect_addresses(registry, relation, key);
                        ips.push(own_address);
                        ips
                    } else {
                        state.first_published_list(registry, relation, published_key)
                    };
                    state.insert(field, Some(address_list(ips)));
                }
                FieldPolicy::Computed { field, value } => {
                    let value = match value {
                        ComputedField::OwnAddress => Some(Value::String(own_address.to_string())),
                        ComputedField::UnitName => Some(Value::String(host.unit_name.clone())),
                        ComputedField::RabbitHostname => host
                            .hostname
                            .as_ref()
                            .map(|h| Value::String(format!("{}-contrail-rmq", h))),
                    };
                    state.insert(field, value);
                }
            }
        }

        let peer_counts = self
            .profile
            .relations
            .iter()
            .map(|schema| (schema.name.to_string(), registry.facts_for(schema.name).len()))
            .collect();

        Ok(Context {
            values: state.values,
            peer_counts,
            own_address,
            unit_name: host.unit_name.clone(),
            is_leader: host.is_leader,
            malformed: state.malformed,
        })
    }
}

struct BuildState {
    values: BTreeMap<String, Value>,
    malformed: Vec<ConvergeError>,
}

impl BuildState {
    fn insert(&mut self, field: &str, value: Option<Value>) {
        match value {
            Some(value) => {
                self.values.insert(field.to_string(), value);
            }
            None => {
                self.values.remove(field);
            }
        }
    }

    fn malformed(&mut self, relation: &str, key: &str, reason: String) {
        self.malformed.push(ConvergeError::MalformedFact {
            relation: relation.to_string(),
            key: key.to_string(),
            reason,
        });
    }

    /// One address per peer; explicit nulls are skipped silently.
    fn collect_addresses(
        &mut self,
        registry: &PeerRegistry,
        relation: &str,
        key: &str,
    ) -> Vec<Ipv4Addr> {
        let mut ips = Vec::new();
        for facts in registry.facts_for(relation).values() {
            let Some(value) = facts.get(key) else {
                continue;
            };
            match KnownFact::parse(FactKind::Address, value) {
                KnownFact::Address(ip) => ips.push(ip),
                KnownFact::Malformed { reason } => self.malformed(relation, key, reason),
                _ => {}
            }
        }
        ips
    }

    /// The first well-formed address list published by a peer, in peer id
    /// order.
    fn first_published_list(
        &mut self,
        registry: &PeerRegistry,
        relation: &str,
        published_key: &str,
    ) -> Vec<Ipv4Addr> {
        for facts in registry.facts_for(relation).values() {
            let Some(value) = facts.get(published_key) else {
                continue;
            };
            match KnownFact::parse(FactKind::JsonList, value) {
                KnownFact::List(items) => {
                    let mut ips = Vec::new();
                    for item in items {
                        match item.as_str().and_then(parse_ipv4) {
                            Some(ip) => ips.push(ip),
                            None => self.malformed(
                                relation,
                                published_key,
                                format!("'{}' is not an IPv4 address", item),
                            ),
                        }
                    }
                    return ips;
                }
                KnownFact::Malformed { reason } => self.malformed(relation, published_key, reason),
                _ => {}
            }
        }
        Vec::new()
    }
}

fn address_list(ips: Vec<Ipv4Addr>) -> Value {
    Value::Array(
        sort_dedup(ips)
            .into_iter()
            .map(|ip| Value::String(ip.to_string()))
            .collect(),
    )
}

/// Interpret a stored config value according to its declared kind.
///
/// Promoted values are stored as the raw strings peers published; operator
/// options may already be typed.
fn promoted_value(raw: &Value, kind: FactKind) -> Result<Value, String> {
    match (raw, kind) {
        (Value::String(s), _) => match KnownFact::parse(kind, &FactValue::Value(s.clone())) {
            KnownFact::Text(text) => Ok(Value::String(text)),
            KnownFact::Address(ip) => Ok(Value::String(ip.to_string())),
            KnownFact::Flag(flag) => Ok(Value::Bool(flag)),
            KnownFact::Object(map) => Ok(Value::Object(map)),
            KnownFact::List(items) => Ok(Value::Array(items)),
            KnownFact::Cleared => Ok(Value::Null),
            KnownFact::Malformed { reason } => Err(reason),
        },
        (Value::Bool(_), FactKind::Flag)
        | (Value::Object(_), FactKind::JsonObject)
        | (Value::Array(_), FactKind::JsonList) => Ok(raw.clone()),
        (Value::Number(n), FactKind::Text) => Ok(Value::String(n.to_string())),
        (other, kind) => Err(format!("{} does not match {:?}", other, kind)),
    }
}
