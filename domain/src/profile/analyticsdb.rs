use super::{RelationSchema, UnitProfile, UnitRole};
use crate::artifact::{ApplyAction, ArtifactSpec, ServiceGroup};
use crate::context::{ComputedField, DefaultValue, FieldPolicy};
use crate::publish::{OutboundFact, OutboundValue};
use crate::relation::fact::FactKind;
use crate::status::Checklist;

const COMMON_ENV: &str = "analyticsdb/common_config.env";

const IMAGES: &[&str] = &[
    "contrail-node-init",
    "contrail-nodemgr",
    "contrail-external-cassandra",
    "contrail-external-zookeeper",
    "contrail-external-kafka",
];

pub(super) fn profile() -> UnitProfile {
    let relations = vec![
        RelationSchema::new("contrail-analyticsdb")
            .key("private-address", FactKind::Address)
            .key("unit-type", FactKind::Text)
            .promote("auth-info", FactKind::JsonObject, "auth_info")
            .promote("orchestrator-info", FactKind::JsonObject, "orchestrator_info")
            .promote("ssl-enabled", FactKind::Flag, "ssl_enabled"),
        RelationSchema::new("analyticsdb-cluster").key("private-address", FactKind::Address),
    ];

    let fields = vec![
        FieldPolicy::Option {
            option: "log-level",
            field: "log_level",
            default: Some(DefaultValue::Text("SYS_NOTICE")),
        },
        FieldPolicy::Option {
            option: "cassandra-minimum-diskgb",
            field: "analyticsdb_minimum_diskgb",
            default: None,
        },
        FieldPolicy::Option {
            option: "cassandra-jvm-extra-opts",
            field: "jvm_extra_opts",
            default: None,
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
        FieldPolicy::Expand {
            config_key: "orchestrator_info",
            source: "contrail-analyticsdb",
        },
        FieldPolicy::Promoted {
            config_key: "ssl_enabled",
            field: "ssl_enabled",
            kind: FactKind::Flag,
            source: "contrail-analyticsdb",
            default: Some(DefaultValue::Flag(false)),
        },
        FieldPolicy::CollectSorted {
            relation: "contrail-analyticsdb",
            key: "private-address",
            field: "analytics_servers",
            include_self: false,
        },
        FieldPolicy::CollectSorted {
            relation: "analyticsdb-cluster",
            key: "private-address",
            field: "analyticsdb_servers",
            include_self: true,
        },
        FieldPolicy::Expand {
            config_key: "auth_info",
            source: "contrail-analyticsdb",
        },
        FieldPolicy::Computed {
            field: "host_ip",
            value: ComputedField::OwnAddress,
        },
    ];

    let checklist = Checklist::new()
        .require_collected("analytics_servers", "contrail-analyticsdb")
        .require_fact("cloud_orchestrator", "Missing cloud orchestrator info in relations.")
        .require_fact("keystone_ip", "Missing auth info in relation with contrail-analyticsdb.");

    let groups = vec![
        ServiceGroup::new("common", ApplyAction::WriteOnly)
            .with_artifact(ArtifactSpec::new(COMMON_ENV, "/etc/contrail/common_analyticsdb.env"))
            .foundational(),
        ServiceGroup::new(
            "analytics-database",
            ApplyAction::Recompose {
                compose_file: "/etc/contrail/analytics_database/docker-compose.yaml".into(),
            },
        )
        .with_artifact(ArtifactSpec::new(
            "analyticsdb/analytics-database.yaml",
            "/etc/contrail/analytics_database/docker-compose.yaml",
        ))
        .consuming(COMMON_ENV),
    ];

    let outbound = vec![
        OutboundFact::new("contrail-analyticsdb", "private-address", OutboundValue::OwnAddress),
        OutboundFact::new("analyticsdb-cluster", "private-address", OutboundValue::OwnAddress),
    ];

    UnitProfile {
        role: UnitRole::AnalyticsDb,
        relations,
        fields,
        checklist,
        images: IMAGES.to_vec(),
        groups,
        outbound,
        immutable_options: Vec::new(),
    }
}
