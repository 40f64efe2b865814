//! Artifact rendering and placement
//!
//! - [`HandlebarsRenderer`] - built-in templates, optionally overridden from a directory
//! - [`FsArtifactWriter`] - atomic file placement under a root prefix

mod fs_writer;
mod handlebars_renderer;

pub use fs_writer::FsArtifactWriter;
pub use handlebars_renderer::{BUILTIN_TEMPLATES, HandlebarsRenderer};

use std::path::{Path, PathBuf};

/// Re-root an absolute destination under `root`.
pub(crate) fn rooted(root: &Path, destination: &Path) -> PathBuf {
    match destination.strip_prefix("/") {
        Ok(relative) => root.join(relative),
        Err(_) => root.join(destination),
    }
}
