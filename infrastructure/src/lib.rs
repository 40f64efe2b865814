//! Infrastructure layer for converge-agent
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer, including configuration file loading.

pub mod config;
pub(crate) mod fs_util;
pub mod network;
pub mod relation;
pub mod render;
pub mod runtime;
pub mod state;

// Re-export commonly used types
pub use config::{ConfigLoader, ConfigValidationError, FileConfig};
pub use network::HostNetwork;
pub use relation::{FileRelationAdapter, InboundDocument};
pub use render::{BUILTIN_TEMPLATES, FsArtifactWriter, HandlebarsRenderer};
pub use runtime::DockerComposeLifecycle;
pub use state::{FileStatusSink, JsonStateStore, StatusRecord};
