//! Handlebars artifact renderer
//!
//! Every template a role profile names is built into the binary. A template
//! directory laid out the same way (`<role>/<file>`) overrides individual
//! built-ins.

use converge_application::ports::renderer::{ArtifactRenderer, RenderError};
use converge_domain::{ArtifactSpec, Context};
use handlebars::{Handlebars, handlebars_helper};
use serde_json::Value;
use std::path::Path;
use tracing::{debug, info};

macro_rules! builtin {
    ($name:literal) => {
        ($name, include_str!(concat!("../../templates/", $name)))
    };
}

/// Template name and source of every built-in template.
pub const BUILTIN_TEMPLATES: &[(&str, &str)] = &[
    builtin!("agent/common_config.env"),
    builtin!("agent/vrouter.yaml"),
    builtin!("analytics/analytics.yaml"),
    builtin!("analytics/common_config.env"),
    builtin!("analyticsdb/analytics-database.yaml"),
    builtin!("analyticsdb/common_config.env"),
    builtin!("controller/common_config.env"),
    builtin!("controller/config-api.yaml"),
    builtin!("controller/config-database.yaml"),
    builtin!("controller/control.yaml"),
    builtin!("controller/redis.env"),
    builtin!("controller/redis.yaml"),
    builtin!("controller/webui.yaml"),
];

// `{{join list ","}}`: string items as-is, other items JSON-encoded, empty
// for anything that is not a list.
handlebars_helper!(join: |items: Json, sep: str| match items {
    Value::Array(items) => items
        .iter()
        .map(|item| match item {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .collect::<Vec<_>>()
        .join(sep),
    _ => String::new(),
});

pub struct HandlebarsRenderer {
    registry: Handlebars<'static>,
}

impl HandlebarsRenderer {
    /// Renderer with the built-in templates only.
    pub fn new() -> Result<Self, RenderError> {
        let mut registry = Self::registry();
        for (name, source) in BUILTIN_TEMPLATES {
            Self::register(&mut registry, name, source)?;
        }
        Ok(Self { registry })
    }

    /// Renderer whose built-ins are replaced by files found in `dir`.
    pub fn with_overrides(dir: &Path) -> Result<Self, RenderError> {
        let mut renderer = Self::new()?;
        for (name, _) in BUILTIN_TEMPLATES {
            let path = dir.join(name);
            if !path.is_file() {
                continue;
            }
            let source = std::fs::read_to_string(&path).map_err(|e| RenderError::Render {
                template: name.to_string(),
                reason: format!("failed to read {}: {}", path.display(), e),
            })?;
            Self::register(&mut renderer.registry, name, &source)?;
            info!("Template {} overridden by {}", name, path.display());
        }
        Ok(renderer)
    }

    pub fn has_template(&self, name: &str) -> bool {
        self.registry.has_template(name)
    }

    fn registry() -> Handlebars<'static> {
        let mut registry = Handlebars::new();
        // Artifacts are env files and compose YAML, not HTML.
        registry.register_escape_fn(handlebars::no_escape);
        registry.set_strict_mode(false);
        registry.register_helper("join", Box::new(join));
        registry
    }

    fn register(
        registry: &mut Handlebars<'static>,
        name: &str,
        source: &str,
    ) -> Result<(), RenderError> {
        registry
            .register_template_string(name, source)
            .map_err(|e| RenderError::Render {
                template: name.to_string(),
                reason: e.to_string(),
            })
    }
}

impl ArtifactRenderer for HandlebarsRenderer {
    fn render(&self, spec: &ArtifactSpec, ctx: &Context) -> Result<String, RenderError> {
        if !self.has_template(&spec.template) {
            return Err(RenderError::UnknownTemplate(spec.template.clone()));
        }
        debug!("Rendering {} for {}", spec.template, spec.destination.display());
        self.registry
            .render(&spec.template, ctx.values())
            .map_err(|e| RenderError::Render {
                template: spec.template.clone(),
                reason: e.to_string(),
            })
    }
}
