use super::{RelationSchema, UnitProfile, UnitRole};
use crate::artifact::{ApplyAction, ArtifactSpec, ServiceGroup};
use crate::context::{ComputedField, DefaultValue, FieldPolicy};
use crate::publish::{OutboundFact, OutboundValue};
use crate::relation::fact::FactKind;
use crate::status::Checklist;

const COMMON_ENV: &str = "controller/common_config.env";

const IMAGES: &[&str] = &[
    "contrail-node-init",
    "contrail-nodemgr",
    "contrail-controller-config-api",
    "contrail-controller-config-svcmonitor",
    "contrail-controller-config-schema",
    "contrail-controller-config-devicemgr",
    "contrail-controller-control-control",
    "contrail-controller-control-named",
    "contrail-controller-control-dns",
    "contrail-controller-webui-web",
    "contrail-controller-webui-job",
    "contrail-external-cassandra",
    "contrail-external-zookeeper",
    "contrail-external-rabbitmq",
    "contrail-external-redis",
];

fn compose_group(id: &str, dir: &str) -> ServiceGroup {
    let compose = format!("/etc/contrail/{}/docker-compose.yaml", dir);
    ServiceGroup::new(
        id,
        ApplyAction::Recompose {
            compose_file: compose.clone().into(),
        },
    )
    .with_artifact(ArtifactSpec::new(format!("controller/{}.yaml", id), compose))
    .consuming(COMMON_ENV)
}

pub(super) fn profile() -> UnitProfile {
    let relations = vec![
        RelationSchema::new("controller-cluster")
            .key("unit-address", FactKind::Address)
            .key("controller-ip-list", FactKind::JsonList),
        RelationSchema::new("contrail-analytics").key("private-address", FactKind::Address),
        RelationSchema::new("contrail-controller").promote(
            "orchestrator-info",
            FactKind::JsonObject,
            "orchestrator_info",
        ),
        RelationSchema::new("contrail-auth").promote(
            "auth-info",
            FactKind::JsonObject,
            "auth_info",
        ),
    ];

    let option = |option, field| FieldPolicy::Option {
        option,
        field,
        default: None,
    };
    let fields = vec![
        FieldPolicy::Option {
            option: "log-level",
            field: "log_level",
            default: Some(DefaultValue::Text("SYS_NOTICE")),
        },
        option("flow-export-rate", "flow_export_rate"),
        option("auth-mode", "auth_mode"),
        option("cloud-admin-role", "cloud_admin_role"),
        option("global-read-only-role", "global_read_only_role"),
        option("cassandra-minimum-diskgb", "configdb_minimum_diskgb"),
        option("cassandra-jvm-extra-opts", "jvm_extra_opts"),
        option("docker-registry", "container_registry"),
        option("image-tag", "contrail_version_tag"),
        FieldPolicy::Expand {
            config_key: "orchestrator_info",
            source: "contrail-controller",
        },
        FieldPolicy::Option {
            option: "ssl_enabled",
            field: "ssl_enabled",
            default: Some(DefaultValue::Flag(false)),
        },
        FieldPolicy::ClusterMembers {
            relation: "controller-cluster",
            key: "unit-address",
            published_key: "controller-ip-list",
            field: "controller_servers",
        },
        FieldPolicy::CollectSorted {
            relation: "contrail-analytics",
            key: "private-address",
            field: "analytics_servers",
            include_self: false,
        },
        FieldPolicy::Expand {
            config_key: "auth_info",
            source: "contrail-auth",
        },
        FieldPolicy::Computed {
            field: "host_ip",
            value: ComputedField::OwnAddress,
        },
        FieldPolicy::Computed {
            field: "rabbitmq_hostname",
            value: ComputedField::RabbitHostname,
        },
    ];

    let checklist = Checklist::new()
        .require_collected("analytics_servers", "contrail-analytics")
        .require_self_in("controller_servers", "contrail-cluster")
        .require_fact("cloud_orchestrator", "Missing cloud orchestrator info in relations.")
        .require_fact("keystone_ip", "Missing auth info in relation with contrail-auth.");

    let groups = vec![
        ServiceGroup::new("common", ApplyAction::WriteOnly)
            .with_artifact(ArtifactSpec::new(COMMON_ENV, "/etc/contrail/common_config.env"))
            .foundational(),
        compose_group("config-api", "config_api"),
        compose_group("config-database", "config_database"),
        compose_group("control", "control"),
        compose_group("webui", "webui"),
        // redis keeps its own environment, independent of the common one
        ServiceGroup::new(
            "redis",
            ApplyAction::Recompose {
                compose_file: "/etc/contrail/redis/docker-compose.yaml".into(),
            },
        )
        .with_artifact(ArtifactSpec::new("controller/redis.env", "/etc/contrail/redis.env"))
        .with_artifact(ArtifactSpec::new(
            "controller/redis.yaml",
            "/etc/contrail/redis/docker-compose.yaml",
        )),
    ];

    let outbound = vec![
        OutboundFact::new("controller-cluster", "unit-address", OutboundValue::OwnAddress),
        OutboundFact::new(
            "controller-cluster",
            "controller-ip-list",
            OutboundValue::ContextField("controller_servers"),
        )
        .leader_only(),
        OutboundFact::new(
            "contrail-analytics",
            "auth-mode",
            OutboundValue::ContextField("auth_mode"),
        ),
        OutboundFact::new(
            "contrail-analytics",
            "auth-info",
            OutboundValue::ConfigValue("auth_info"),
        ),
        OutboundFact::new(
            "contrail-analytics",
            "orchestrator-info",
            OutboundValue::ConfigValue("orchestrator_info"),
        ),
        OutboundFact::new(
            "contrail-analytics",
            "ssl-enabled",
            OutboundValue::ContextField("ssl_enabled"),
        ),
        OutboundFact::new("contrail-analytics", "ready", OutboundValue::Ready),
        OutboundFact::new(
            "contrail-controller",
            "analytics-server",
            OutboundValue::ContextField("analytics_servers"),
        ),
        OutboundFact::new("contrail-controller", "port", OutboundValue::Literal("8082")),
        OutboundFact::new(
            "contrail-controller",
            "auth-info",
            OutboundValue::ConfigValue("auth_info"),
        ),
        OutboundFact::new("contrail-controller", "ready", OutboundValue::Ready),
    ];

    UnitProfile {
        role: UnitRole::Controller,
        relations,
        fields,
        checklist,
        images: IMAGES.to_vec(),
        groups,
        outbound,
        immutable_options: Vec::new(),
    }
}
