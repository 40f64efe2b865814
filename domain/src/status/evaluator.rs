//! Status evaluator: ordered readiness checklist.
//!
//! The first failing check wins:
//!
//! 1. No rejected immutable option outstanding
//! 2. Required resources available
//! 3. Required relations present
//! 4. Required facts present, in declaration order
//! 5. Otherwise `active("Unit ready")`

use super::health::{HealthState, ResourceCheck};
use crate::context::Context;
use crate::core::error::ConvergeError;

pub const UNIT_READY: &str = "Unit ready";

/// A relation the unit cannot run without.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelationRequirement {
    /// At least one peer on `relation`.
    Peers { relation: &'static str },
    /// The list field `field` collected from `relation` is non-empty. A peer
    /// that joined but published nothing does not count.
    Collected {
        field: &'static str,
        relation: &'static str,
    },
    /// The unit's own address appears in the list field `field`; reported
    /// as the missing relation `display`.
    SelfInField {
        field: &'static str,
        display: &'static str,
    },
}

impl RelationRequirement {
    fn display(&self) -> &'static str {
        match self {
            RelationRequirement::Peers { relation } => relation,
            RelationRequirement::Collected { relation, .. } => relation,
            RelationRequirement::SelfInField { display, .. } => display,
        }
    }

    fn satisfied(&self, ctx: &Context) -> bool {
        match self {
            RelationRequirement::Peers { relation } => ctx.peer_count(relation) > 0,
            RelationRequirement::Collected { field, .. } => ctx.is_present(field),
            RelationRequirement::SelfInField { field, .. } => {
                let own = ctx.own_address().to_string();
                ctx.get_list(field).iter().any(|ip| *ip == own)
            }
        }
    }
}

/// A context field that must carry a value, with the reason reported when
/// it does not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FactRequirement {
    pub field: &'static str,
    pub message: &'static str,
}

/// Readiness checklist of a role.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Checklist {
    pub relations: Vec<RelationRequirement>,
    pub facts: Vec<FactRequirement>,
}

impl Checklist {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn require_peers(mut self, relation: &'static str) -> Self {
        self.relations.push(RelationRequirement::Peers { relation });
        self
    }

    pub fn require_collected(mut self, field: &'static str, relation: &'static str) -> Self {
        self.relations
            .push(RelationRequirement::Collected { field, relation });
        self
    }

    pub fn require_self_in(mut self, field: &'static str, display: &'static str) -> Self {
        self.relations
            .push(RelationRequirement::SelfInField { field, display });
        self
    }

    pub fn require_fact(mut self, field: &'static str, message: &'static str) -> Self {
        self.facts.push(FactRequirement { field, message });
        self
    }
}

pub struct StatusEvaluator<'a> {
    checklist: &'a Checklist,
    rejected: Vec<&'a str>,
}

impl<'a> StatusEvaluator<'a> {
    pub fn new(checklist: &'a Checklist) -> Self {
        Self {
            checklist,
            rejected: Vec::new(),
        }
    }

    /// Immutable options whose change was rejected and not yet reverted.
    pub fn with_rejected(mut self, options: impl IntoIterator<Item = &'a str>) -> Self {
        self.rejected.extend(options);
        self
    }

    pub fn evaluate(&self, ctx: &Context, resources: &ResourceCheck) -> HealthState {
        if let Some(option) = self.rejected.first() {
            let violation = ConvergeError::ImmutableConfigViolation {
                option: option.to_string(),
            };
            return HealthState::blocked(violation.to_string());
        }

        if let ResourceCheck::Unavailable { resource } = resources {
            return HealthState::blocked(format!("Image could not be pulled: {}", resource));
        }

        let missing: Vec<&str> = self
            .checklist
            .relations
            .iter()
            .filter(|req| !req.satisfied(ctx))
            .map(RelationRequirement::display)
            .collect();
        if !missing.is_empty() {
            return HealthState::blocked(format!("Missing relations: {}", missing.join(", ")));
        }

        if let Some(req) = self.checklist.facts.iter().find(|req| !ctx.is_present(req.field)) {
            return HealthState::blocked(req.message);
        }

        HealthState::active(UNIT_READY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LocalConfig;
    use crate::context::{ContextBuilder, HostFacts};
    use crate::profile::{UnitProfile, UnitRole};
    use crate::relation::registry::PeerRegistry;
    use serde_json::json;

    fn controller_context(config: &LocalConfig, registry: &PeerRegistry) -> Context {
        let profile = UnitProfile::for_role(UnitRole::Controller);
        let host = HostFacts::new("controller/0", Some("10.0.0.1".parse().unwrap()))
            .with_hostname("ctl-0")
            .with_leader(true);
        ContextBuilder::new(&profile).build(config, registry, &host).unwrap()
    }

    fn evaluate(ctx: &Context, resources: &ResourceCheck) -> HealthState {
        let profile = UnitProfile::for_role(UnitRole::Controller);
        StatusEvaluator::new(&profile.checklist).evaluate(ctx, resources)
    }

    #[test]
    fn test_missing_analytics_relation() {
        let ctx = controller_context(&LocalConfig::new(), &PeerRegistry::new());
        assert_eq!(
            evaluate(&ctx, &ResourceCheck::Available),
            HealthState::blocked("Missing relations: contrail-analytics")
        );
    }

    #[test]
    fn test_resource_check_precedes_relations() {
        let ctx = controller_context(&LocalConfig::new(), &PeerRegistry::new());
        let state = evaluate(
            &ctx,
            &ResourceCheck::Unavailable {
                resource: "contrail-controller-webui-web:5.0".to_string(),
            },
        );
        assert_eq!(
            state,
            HealthState::blocked("Image could not be pulled: contrail-controller-webui-web:5.0")
        );
    }

    #[test]
    fn test_fact_checks_in_order() {
        let mut registry = PeerRegistry::new();
        registry.record_fact(
            "contrail-analytics",
            "analytics/0",
            "private-address",
            "10.0.0.3".into(),
        );
        let mut config = LocalConfig::new();

        let ctx = controller_context(&config, &registry);
        assert_eq!(
            evaluate(&ctx, &ResourceCheck::Available),
            HealthState::blocked("Missing cloud orchestrator info in relations.")
        );

        config.set("orchestrator_info", json!(r#"{"cloud_orchestrator": "openstack"}"#));
        let ctx = controller_context(&config, &registry);
        assert_eq!(
            evaluate(&ctx, &ResourceCheck::Available),
            HealthState::blocked("Missing auth info in relation with contrail-auth.")
        );

        config.set("auth_info", json!(r#"{"keystone_ip": "10.0.0.5"}"#));
        let ctx = controller_context(&config, &registry);
        assert_eq!(evaluate(&ctx, &ResourceCheck::Available), HealthState::active(UNIT_READY));
    }

    #[test]
    fn test_multiple_missing_relations_are_joined() {
        let checklist = Checklist::new()
            .require_collected("analytics_servers", "contrail-analytics")
            .require_self_in("missing_field", "contrail-cluster");
        let ctx = controller_context(&LocalConfig::new(), &PeerRegistry::new());

        assert_eq!(
            StatusEvaluator::new(&checklist).evaluate(&ctx, &ResourceCheck::Available),
            HealthState::blocked("Missing relations: contrail-analytics, contrail-cluster")
        );
    }

    #[test]
    fn test_joined_peer_without_address_is_missing() {
        let mut registry = PeerRegistry::new();
        registry.join_peer("contrail-analytics", "analytics/0");
        let ctx = controller_context(&LocalConfig::new(), &registry);

        assert_eq!(ctx.peer_count("contrail-analytics"), 1);
        assert_eq!(
            evaluate(&ctx, &ResourceCheck::Available),
            HealthState::blocked("Missing relations: contrail-analytics")
        );
    }

    #[test]
    fn test_rejected_option_reported_first() {
        let profile = UnitProfile::for_role(UnitRole::Controller);
        let ctx = controller_context(&LocalConfig::new(), &PeerRegistry::new());
        let state = StatusEvaluator::new(&profile.checklist)
            .with_rejected(["dpdk"])
            .evaluate(
                &ctx,
                &ResourceCheck::Unavailable {
                    resource: "contrail-nodemgr:5.0".to_string(),
                },
            );

        assert_eq!(
            state,
            HealthState::blocked("Configuration parameter dpdk couldn't be changed")
        );
    }
}
