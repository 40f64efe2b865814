use super::{RelationSchema, UnitProfile, UnitRole};
use crate::artifact::{ApplyAction, ArtifactSpec, ServiceGroup};
use crate::context::{ComputedField, DefaultValue, FieldPolicy};
use crate::publish::{OutboundFact, OutboundValue};
use crate::relation::fact::FactKind;
use crate::status::Checklist;

const COMMON_ENV: &str = "analytics/common_config.env";

const IMAGES: &[&str] = &[
    "contrail-node-init",
    "contrail-nodemgr",
    "contrail-analytics-api",
    "contrail-analytics-collector",
    "contrail-analytics-query-engine",
    "contrail-analytics-alarm-gen",
    "contrail-analytics-snmp-collector",
    "contrail-analytics-topology",
];

pub(super) fn profile() -> UnitProfile {
    let relations = vec![
        RelationSchema::new("contrail-analytics")
            .key("private-address", FactKind::Address)
            .promote("api-vip", FactKind::Text, "api_vip")
            .promote("auth-mode", FactKind::Text, "auth_mode")
            .promote("auth-info", FactKind::JsonObject, "auth_info")
            .promote("orchestrator-info", FactKind::JsonObject, "orchestrator_info")
            .promote("ssl-enabled", FactKind::Flag, "ssl_enabled")
            .promote("rabbitmq_hosts", FactKind::Text, "rabbitmq_hosts"),
        RelationSchema::new("contrail-analyticsdb")
            .key("private-address", FactKind::Address)
            .key("unit-type", FactKind::Text),
        RelationSchema::new("analytics-cluster").key("private-address", FactKind::Address),
        RelationSchema::new("http-services"),
    ];

    let fields = vec![
        FieldPolicy::Option {
            option: "log-level",
            field: "log_level",
            default: Some(DefaultValue::Text("SYS_NOTICE")),
        },
        FieldPolicy::Option {
            option: "docker-registry",
            field: "container_registry",
            default: None,
        },
        FieldPolicy::Option {
            option: "image-tag",
            field: "contrail_version_tag",
            default: None,
        },
        FieldPolicy::Promoted {
            config_key: "api_vip",
            field: "api_vip",
            kind: FactKind::Text,
            source: "contrail-analytics",
            default: None,
        },
        FieldPolicy::Promoted {
            config_key: "auth_mode",
            field: "auth_mode",
            kind: FactKind::Text,
            source: "contrail-analytics",
            default: None,
        },
        FieldPolicy::Expand {
            config_key: "orchestrator_info",
            source: "contrail-analytics",
        },
        FieldPolicy::Promoted {
            config_key: "ssl_enabled",
            field: "ssl_enabled",
            kind: FactKind::Flag,
            source: "contrail-analytics",
            default: Some(DefaultValue::Flag(false)),
        },
        FieldPolicy::Promoted {
            config_key: "rabbitmq_hosts",
            field: "rabbitmq_hosts",
            kind: FactKind::Text,
            source: "contrail-analytics",
            default: None,
        },
        FieldPolicy::CollectSorted {
            relation: "contrail-analytics",
            key: "private-address",
            field: "controller_servers",
            include_self: false,
        },
        FieldPolicy::CollectSorted {
            relation: "analytics-cluster",
            key: "private-address",
            field: "analytics_servers",
            include_self: true,
        },
        FieldPolicy::CollectSorted {
            relation: "contrail-analyticsdb",
            key: "private-address",
            field: "analyticsdb_servers",
            include_self: false,
        },
        FieldPolicy::Expand {
            config_key: "auth_info",
            source: "contrail-analytics",
        },
        FieldPolicy::Computed {
            field: "host_ip",
            value: ComputedField::OwnAddress,
        },
    ];

    let checklist = Checklist::new()
        .require_collected("controller_servers", "contrail-analytics")
        .require_collected("analyticsdb_servers", "contrail-analyticsdb")
        .require_fact("cloud_orchestrator", "Missing cloud orchestrator info in relations.")
        .require_fact("keystone_ip", "Missing auth info in relation with contrail-analytics.");

    let groups = vec![
        ServiceGroup::new("common", ApplyAction::WriteOnly)
            .with_artifact(ArtifactSpec::new(COMMON_ENV, "/etc/contrail/common_analytics.env"))
            .foundational(),
        ServiceGroup::new(
            "analytics",
            ApplyAction::Recompose {
                compose_file: "/etc/contrail/analytics/docker-compose.yaml".into(),
            },
        )
        .with_artifact(ArtifactSpec::new(
            "analytics/analytics.yaml",
            "/etc/contrail/analytics/docker-compose.yaml",
        ))
        .consuming(COMMON_ENV),
    ];

    let outbound = vec![
        OutboundFact::new("contrail-analytics", "private-address", OutboundValue::OwnAddress),
        OutboundFact::new("contrail-analyticsdb", "private-address", OutboundValue::OwnAddress),
        OutboundFact::new("contrail-analyticsdb", "unit-type", OutboundValue::Literal("analytics")),
        OutboundFact::new("analytics-cluster", "private-address", OutboundValue::OwnAddress),
        OutboundFact::new(
            "http-services",
            "services",
            OutboundValue::ProxyServices {
                service_name: "contrail-analytics-api",
                port: 8081,
                vip_field: "api_vip",
            },
        ),
    ];

    UnitProfile {
        role: UnitRole::Analytics,
        relations,
        fields,
        checklist,
        images: IMAGES.to_vec(),
        groups,
        outbound,
        immutable_options: Vec::new(),
    }
}
