//! Role profiles: everything that distinguishes one agent role from another.
//!
//! The reconciliation pipeline is the same for every role. A
//! [`UnitProfile`] supplies the data it runs on:
//!
//! - relation schemas (recognized keys, promotions, scoped config keys)
//! - context field policies
//! - images, service groups and the readiness checklist
//! - outbound facts and options that may not change after install

mod agent;
mod analytics;
mod analyticsdb;
mod controller;
mod keystone_auth;
pub mod promotion;
pub mod schema;

pub use promotion::{Promotion, PromotionOutcome};
pub use schema::RelationSchema;

use crate::artifact::ServiceGroup;
use crate::context::FieldPolicy;
use crate::publish::OutboundFact;
use crate::status::Checklist;
use serde::{Deserialize, Serialize};

/// Local option holding the image tag to pull.
pub const IMAGE_TAG_OPTION: &str = "image-tag";
/// Local option holding the container registry prefix.
pub const REGISTRY_OPTION: &str = "docker-registry";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnitRole {
    Controller,
    Analytics,
    AnalyticsDb,
    Agent,
    KeystoneAuth,
}

impl UnitRole {
    pub const ALL: [UnitRole; 5] = [
        UnitRole::Controller,
        UnitRole::Analytics,
        UnitRole::AnalyticsDb,
        UnitRole::Agent,
        UnitRole::KeystoneAuth,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            UnitRole::Controller => "controller",
            UnitRole::Analytics => "analytics",
            UnitRole::AnalyticsDb => "analytics-db",
            UnitRole::Agent => "agent",
            UnitRole::KeystoneAuth => "keystone-auth",
        }
    }
}

impl std::fmt::Display for UnitRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for UnitRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        UnitRole::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| {
                let expected = UnitRole::ALL.map(|role| role.as_str()).join(", ");
                format!("unknown role '{}', expected one of: {}", s, expected)
            })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnitProfile {
    pub role: UnitRole,
    pub relations: Vec<RelationSchema>,
    pub fields: Vec<FieldPolicy>,
    pub checklist: Checklist,
    /// Images pulled before any artifact is rendered.
    pub images: Vec<&'static str>,
    pub groups: Vec<ServiceGroup>,
    pub outbound: Vec<OutboundFact>,
    pub immutable_options: Vec<&'static str>,
}

impl UnitProfile {
    pub fn for_role(role: UnitRole) -> Self {
        match role {
            UnitRole::Controller => controller::profile(),
            UnitRole::Analytics => analytics::profile(),
            UnitRole::AnalyticsDb => analyticsdb::profile(),
            UnitRole::Agent => agent::profile(),
            UnitRole::KeystoneAuth => keystone_auth::profile(),
        }
    }

    pub fn relation(&self, name: &str) -> Option<&RelationSchema> {
        self.relations.iter().find(|r| r.name == name)
    }

    /// Artifact templates this role renders.
    pub fn templates(&self) -> impl Iterator<Item = &str> {
        self.groups
            .iter()
            .flat_map(|g| g.artifacts.iter())
            .map(|a| a.template.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::dependency_order;
    use crate::status::RelationRequirement;

    #[test]
    fn test_role_round_trip() {
        for role in UnitRole::ALL {
            assert_eq!(role.as_str().parse::<UnitRole>().unwrap(), role);
            let json = serde_json::to_string(&role).unwrap();
            assert_eq!(json, format!("\"{}\"", role.as_str()));
        }
        assert!("compute".parse::<UnitRole>().is_err());
    }

    #[test]
    fn test_every_profile_orders_cleanly() {
        for role in UnitRole::ALL {
            let profile = UnitProfile::for_role(role);
            assert!(dependency_order(&profile.groups).is_ok(), "{}", role);
        }
    }

    #[test]
    fn test_field_relations_are_declared() {
        for role in UnitRole::ALL {
            let profile = UnitProfile::for_role(role);
            for policy in &profile.fields {
                if let Some(relation) = policy.relation() {
                    assert!(profile.relation(relation).is_some(), "{}: {}", role, relation);
                }
            }
            for req in &profile.checklist.relations {
                match req {
                    RelationRequirement::Peers { relation } => {
                        assert!(profile.relation(relation).is_some(), "{}: {}", role, relation);
                    }
                    RelationRequirement::Collected { field, relation } => {
                        assert!(profile.relation(relation).is_some(), "{}: {}", role, relation);
                        let collected = profile.fields.iter().any(|policy| {
                            matches!(
                                policy,
                                FieldPolicy::CollectSorted { field: f, relation: r, .. }
                                    if f == field && r == relation
                            )
                        });
                        assert!(
                            collected,
                            "{}: {} is not collected from {}",
                            role, field, relation
                        );
                    }
                    RelationRequirement::SelfInField { .. } => {}
                }
            }
        }
    }

    #[test]
    fn test_controller_groups_consume_common_env() {
        let profile = UnitProfile::for_role(UnitRole::Controller);
        let ordered = dependency_order(&profile.groups).unwrap();
        assert_eq!(ordered[0].id.as_str(), "common");
        assert!(ordered[0].foundational);
        for group in ["config-api", "config-database", "control", "webui"] {
            let g = profile.groups.iter().find(|g| g.id.as_str() == group).unwrap();
            assert_eq!(g.consumes[0].as_str(), "controller/common_config.env");
        }
    }

    #[test]
    fn test_only_agent_has_immutable_options() {
        for role in UnitRole::ALL {
            let profile = UnitProfile::for_role(role);
            if role == UnitRole::Agent {
                assert_eq!(profile.immutable_options, vec!["dpdk"]);
            } else {
                assert!(profile.immutable_options.is_empty());
            }
        }
    }
}
