//! Rendered artifacts, service groups and change detection.

pub mod change_detector;
pub mod entities;

pub use change_detector::{ChangeDetector, content_hash};
pub use entities::{
    ApplyAction, ArtifactId, ArtifactSpec, GroupId, RenderedArtifact, ServiceGroup,
    dependency_order,
};
