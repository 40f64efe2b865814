//! Configuration file loading for converge-agent
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `CONVERGE_*` environment variables
//! 2. `--config <path>` specified file
//! 3. Project root: `./converge.toml` or `./.converge.toml`
//! 4. Global: `~/.config/converge-agent/config.toml`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    ConfigValidationError, FileConfig, FileImagesConfig, FileLoggingConfig, FileOutputConfig,
    FileRelationsConfig, FileRuntimeConfig, FileStateConfig, FileUnitConfig,
};
pub use loader::ConfigLoader;
