//! Artifact rendering and writing ports

use async_trait::async_trait;
use converge_domain::{ArtifactSpec, Context, RenderedArtifact};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Unknown template: {0}")]
    UnknownTemplate(String),

    #[error("Failed to render {template}: {reason}")]
    Render { template: String, reason: String },
}

#[derive(Error, Debug)]
pub enum WriteError {
    #[error("Failed to write {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Render an artifact from a context.
///
/// Rendering must be deterministic: equal contexts give equal bytes.
pub trait ArtifactRenderer: Send + Sync {
    fn render(&self, spec: &ArtifactSpec, ctx: &Context) -> Result<String, RenderError>;
}

/// Place rendered artifacts at their destination.
#[async_trait]
pub trait ArtifactWriter: Send + Sync {
    async fn write(&self, artifact: &RenderedArtifact) -> Result<(), WriteError>;
}
