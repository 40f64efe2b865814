use super::{Promotion, RelationSchema, UnitProfile, UnitRole};
use crate::artifact::{ApplyAction, ArtifactSpec, ServiceGroup};
use crate::context::{ComputedField, DefaultValue, FieldPolicy};
use crate::publish::{OutboundFact, OutboundValue};
use crate::relation::fact::FactKind;
use crate::status::Checklist;

const COMMON_ENV: &str = "agent/common_config.env";

const IMAGES: &[&str] = &[
    "contrail-node-init",
    "contrail-nodemgr",
    "contrail-vrouter-kernel-init",
    "contrail-vrouter-agent",
];

pub(super) fn profile() -> UnitProfile {
    let relations = vec![
        RelationSchema::new("contrail-controller")
            .key("ingress-address", FactKind::Address)
            .key("private-address", FactKind::Address)
            .promote("analytics-server", FactKind::JsonList, "analytics_servers")
            .with_promotion(Promotion::FirstOf {
                fact_keys: &["ingress-address", "private-address"],
                config_key: "api_ip",
            })
            .scoped("api_ip")
            .promote("port", FactKind::Text, "api_port")
            .promote("auth-info", FactKind::JsonObject, "auth_info")
            .promote("orchestrator-info", FactKind::JsonObject, "orchestrator_info"),
        // Plugin settings accumulate and are never cleared by departures.
        RelationSchema::new("vrouter-plugin")
            .key("ingress-address", FactKind::Address)
            .key("private-address", FactKind::Address)
            .key("ready", FactKind::Flag)
            .key("settings", FactKind::JsonObject)
            .with_promotion(Promotion::PluginSettings {
                config_key: "plugin-ips",
            }),
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
        FieldPolicy::Option {
            option: "dpdk",
            field: "dpdk",
            default: Some(DefaultValue::Flag(false)),
        },
        FieldPolicy::Option {
            option: "physical-interface",
            field: "physical_interface",
            default: None,
        },
        FieldPolicy::Option {
            option: "vhost-gateway",
            field: "vrouter_gateway",
            default: None,
        },
        FieldPolicy::Promoted {
            config_key: "analytics_servers",
            field: "analytics_servers",
            kind: FactKind::JsonList,
            source: "contrail-controller",
            default: None,
        },
        FieldPolicy::Promoted {
            config_key: "api_ip",
            field: "api_ip",
            kind: FactKind::Address,
            source: "contrail-controller",
            default: None,
        },
        FieldPolicy::Promoted {
            config_key: "api_port",
            field: "api_port",
            kind: FactKind::Text,
            source: "contrail-controller",
            default: None,
        },
        FieldPolicy::Expand {
            config_key: "orchestrator_info",
            source: "contrail-controller",
        },
        FieldPolicy::Expand {
            config_key: "auth_info",
            source: "contrail-controller",
        },
        FieldPolicy::Promoted {
            config_key: "plugin-ips",
            field: "plugin_ips",
            kind: FactKind::JsonObject,
            source: "vrouter-plugin",
            default: None,
        },
        FieldPolicy::Computed {
            field: "host_ip",
            value: ComputedField::OwnAddress,
        },
    ];

    let checklist = Checklist::new()
        .require_peers("contrail-controller")
        .require_fact(
            "api_ip",
            "Missing controller API address in relation with contrail-controller.",
        )
        .require_fact("keystone_ip", "Missing auth info in relation with contrail-controller.");

    let groups = vec![
        ServiceGroup::new("common", ApplyAction::WriteOnly)
            .with_artifact(ArtifactSpec::new(COMMON_ENV, "/etc/contrail/common_vrouter.env"))
            .foundational(),
        ServiceGroup::new(
            "vrouter",
            ApplyAction::Recompose {
                compose_file: "/etc/contrail/vrouter/docker-compose.yaml".into(),
            },
        )
        .with_artifact(ArtifactSpec::new(
            "agent/vrouter.yaml",
            "/etc/contrail/vrouter/docker-compose.yaml",
        ))
        .consuming(COMMON_ENV),
    ];

    let outbound = vec![
        OutboundFact::new("contrail-controller", "dpdk", OutboundValue::ContextField("dpdk")),
        OutboundFact::new("contrail-controller", "unit-type", OutboundValue::Literal("agent")),
    ];

    UnitProfile {
        role: UnitRole::Agent,
        relations,
        fields,
        checklist,
        images: IMAGES.to_vec(),
        groups,
        outbound,
        immutable_options: vec!["dpdk"],
    }
}
