//! Filesystem artifact writer

use super::rooted;
use crate::fs_util::write_atomic;
use async_trait::async_trait;
use converge_application::ports::renderer::{ArtifactWriter, WriteError};
use converge_domain::RenderedArtifact;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Writes artifacts through a sibling temp file and a rename, so readers
/// never observe a partially written file.
pub struct FsArtifactWriter {
    root: PathBuf,
}

impl FsArtifactWriter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Where `destination` lands on this host.
    pub fn resolve(&self, destination: &Path) -> PathBuf {
        rooted(&self.root, destination)
    }
}

#[async_trait]
impl ArtifactWriter for FsArtifactWriter {
    async fn write(&self, artifact: &RenderedArtifact) -> Result<(), WriteError> {
        let path = self.resolve(&artifact.destination);
        write_atomic(&path, artifact.content.as_bytes())
            .await
            .map_err(|source| WriteError::Io {
                path: path.display().to_string(),
                source,
            })?;

        debug!("Wrote {} ({} bytes)", path.display(), artifact.content.len());
        Ok(())
    }
}
