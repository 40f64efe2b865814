//! Relation publisher: outbound facts projected from the context.

pub mod proxy;

use crate::config::LocalConfig;
use crate::context::Context;
use crate::status::HealthState;
use proxy::{ProxyService, services_yaml};
use serde_json::Value;
use std::collections::BTreeMap;

/// Outbound facts per relation; `None` publishes an explicit null.
pub type OutboundFacts = BTreeMap<String, BTreeMap<String, Option<String>>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundValue {
    OwnAddress,
    Literal(&'static str),
    /// Raw local config value.
    ConfigValue(&'static str),
    /// Context field, JSON encoded unless it is a string.
    ContextField(&'static str),
    /// `"true"` when the unit is active.
    Ready,
    /// haproxy services YAML; empty list when `vip_field` is absent.
    ProxyServices {
        service_name: &'static str,
        port: u16,
        vip_field: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundFact {
    pub relation: &'static str,
    pub key: &'static str,
    pub value: OutboundValue,
    pub leader_only: bool,
}

impl OutboundFact {
    pub fn new(relation: &'static str, key: &'static str, value: OutboundValue) -> Self {
        Self {
            relation,
            key,
            value,
            leader_only: false,
        }
    }

    pub fn leader_only(mut self) -> Self {
        self.leader_only = true;
        self
    }
}

/// Compute what this unit publishes. Pure projection; nothing is sent.
pub fn publish(
    outbound: &[OutboundFact],
    ctx: &Context,
    config: &LocalConfig,
    health: &HealthState,
) -> OutboundFacts {
    let mut facts = OutboundFacts::new();
    for fact in outbound {
        if fact.leader_only && !ctx.is_leader() {
            continue;
        }
        let value = match &fact.value {
            OutboundValue::OwnAddress => Some(ctx.own_address().to_string()),
            OutboundValue::Literal(s) => Some(s.to_string()),
            OutboundValue::ConfigValue(key) => config.get(key).map(encode),
            OutboundValue::ContextField(field) => ctx.get(field).map(encode),
            OutboundValue::Ready => Some(health.is_active().to_string()),
            OutboundValue::ProxyServices {
                service_name,
                port,
                vip_field,
            } => {
                let services: Vec<ProxyService> = ctx
                    .get_str(vip_field)
                    .filter(|vip| !vip.is_empty())
                    .map(|vip| {
                        ProxyService::single_backend(
                            service_name,
                            vip,
                            *port,
                            ctx.unit_name(),
                            &ctx.own_address().to_string(),
                        )
                    })
                    .into_iter()
                    .collect();
                // Serializing plain strings and integers cannot fail.
                services_yaml(&services).ok()
            }
        };
        facts
            .entry(fact.relation.to_string())
            .or_default()
            .insert(fact.key.to_string(), value);
    }
    facts
}

fn encode(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{ContextBuilder, HostFacts};
    use crate::profile::{UnitProfile, UnitRole};
    use crate::relation::registry::PeerRegistry;
    use serde_json::json;

    fn build(
        role: UnitRole,
        unit: &str,
        config: &LocalConfig,
        leader: bool,
    ) -> (UnitProfile, Context) {
        let profile = UnitProfile::for_role(role);
        let host = HostFacts::new(unit, Some("10.0.0.3".parse().unwrap()))
            .with_hostname("host-3")
            .with_leader(leader);
        let ctx = ContextBuilder::new(&profile)
            .build(config, &PeerRegistry::new(), &host)
            .unwrap();
        (profile, ctx)
    }

    #[test]
    fn test_analytics_publishes_empty_services_without_vip() {
        let config = LocalConfig::new();
        let (profile, ctx) = build(UnitRole::Analytics, "analytics/0", &config, false);

        let facts = publish(&profile.outbound, &ctx, &config, &HealthState::active("Unit ready"));
        let yaml = facts["http-services"]["services"].clone().unwrap();
        let parsed: Vec<serde_yaml::Value> = serde_yaml::from_str(&yaml).unwrap();
        assert!(parsed.is_empty());
        assert_eq!(
            facts["contrail-analytics"]["private-address"],
            Some("10.0.0.3".to_string())
        );
    }

    #[test]
    fn test_analytics_publishes_services_with_vip() {
        let mut config = LocalConfig::new();
        config.set("api_vip", json!("10.0.0.100"));
        let (profile, ctx) = build(UnitRole::Analytics, "analytics/2", &config, false);

        let facts = publish(&profile.outbound, &ctx, &config, &HealthState::active("Unit ready"));
        let yaml = facts["http-services"]["services"].clone().unwrap();
        let parsed: serde_yaml::Value = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed[0]["service_host"].as_str(), Some("10.0.0.100"));
        assert_eq!(parsed[0]["servers"][0][0].as_str(), Some("analytics-2"));
    }

    #[test]
    fn test_leader_only_facts_skipped_on_followers() {
        let mut config = LocalConfig::new();
        config.set("auth_info", json!(r#"{"keystone_ip": "10.0.0.5"}"#));

        let (profile, ctx) = build(UnitRole::KeystoneAuth, "keystone-auth/1", &config, false);
        let facts = publish(&profile.outbound, &ctx, &config, &HealthState::active("Unit ready"));
        assert!(!facts.contains_key("contrail-auth"));

        let (profile, ctx) = build(UnitRole::KeystoneAuth, "keystone-auth/0", &config, true);
        let facts = publish(&profile.outbound, &ctx, &config, &HealthState::active("Unit ready"));
        assert_eq!(
            facts["contrail-auth"]["auth-info"],
            Some(r#"{"keystone_ip": "10.0.0.5"}"#.to_string())
        );
    }

    #[test]
    fn test_absent_config_value_publishes_null() {
        let config = LocalConfig::new();
        let (profile, ctx) = build(UnitRole::KeystoneAuth, "keystone-auth/0", &config, true);

        let blocked = HealthState::blocked("Missing relations: identity");
        let facts = publish(&profile.outbound, &ctx, &config, &blocked);
        assert_eq!(facts["contrail-auth"]["auth-info"], None);
    }

    #[test]
    fn test_ready_follows_health() {
        let config = LocalConfig::new();
        let (profile, ctx) = build(UnitRole::Controller, "controller/0", &config, true);

        let blocked = publish(&profile.outbound, &ctx, &config, &HealthState::blocked("x"));
        let active = publish(&profile.outbound, &ctx, &config, &HealthState::active("Unit ready"));
        assert_eq!(blocked["contrail-analytics"]["ready"], Some("false".to_string()));
        assert_eq!(active["contrail-analytics"]["ready"], Some("true".to_string()));
    }

    #[test]
    fn test_encode_non_string_as_json() {
        assert_eq!(encode(&json!(["10.0.0.1", "10.0.0.2"])), r#"["10.0.0.1","10.0.0.2"]"#);
        assert_eq!(encode(&json!("plain")), "plain");
        assert_eq!(encode(&json!(true)), "true");
    }
}
