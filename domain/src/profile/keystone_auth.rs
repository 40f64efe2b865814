use super::{Promotion, RelationSchema, UnitProfile, UnitRole};
use crate::context::FieldPolicy;
use crate::publish::{OutboundFact, OutboundValue};
use crate::relation::fact::FactKind;
use crate::status::Checklist;

/// Identity service facts read from `identity-admin`.
const IDENTITY_FACTS: &[&str] = &[
    "service_hostname",
    "service_protocol",
    "service_port",
    "service_username",
    "service_password",
    "service_tenant_name",
    "service_region",
];

pub(super) fn profile() -> UnitProfile {
    let identity = IDENTITY_FACTS.iter().fold(
        RelationSchema::new("identity-admin"),
        |schema, key| schema.key(*key, FactKind::Text),
    );

    let relations = vec![
        identity
            .with_promotion(Promotion::IdentityAuth {
                config_key: "auth_info",
            })
            .scoped("auth_info"),
        RelationSchema::new("contrail-auth"),
    ];

    let fields = vec![FieldPolicy::Expand {
        config_key: "auth_info",
        source: "identity-admin",
    }];

    let checklist = Checklist::new().require_fact("keystone_ip", "Missing relations: identity");

    let outbound = vec![
        OutboundFact::new("contrail-auth", "auth-info", OutboundValue::ConfigValue("auth_info"))
            .leader_only(),
    ];

    UnitProfile {
        role: UnitRole::KeystoneAuth,
        relations,
        fields,
        checklist,
        images: Vec::new(),
        groups: Vec::new(),
        outbound,
        immutable_options: Vec::new(),
    }
}
