//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and use domain types where appropriate.

use converge_application::ReconcileParams;
use converge_domain::UnitRole;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Configuration validation errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigValidationError {
    #[error("unit.role must be set (or pass --role)")]
    MissingRole,

    #[error("unit.name cannot be empty")]
    EmptyUnitName,

    #[error("images.default_tag cannot be empty")]
    EmptyImageTag,

    #[error("runtime.docker cannot be empty")]
    EmptyDockerBinary,
}

/// Raw unit identity from TOML
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileUnitConfig {
    /// Role this unit plays
    pub role: Option<UnitRole>,
    /// Unit name as peers see it, e.g. `controller/0`
    pub name: Option<String>,
    /// Endpoint whose network the unit address is taken from
    pub endpoint: Option<String>,
    /// Fixed unit address, skipping route discovery
    pub address: Option<String>,
    /// Whether this unit is the leader of its application
    pub leader: bool,
}

impl FileUnitConfig {
    /// Unit name, falling back to `<role>/0`.
    pub fn unit_name(&self) -> Option<String> {
        self.name
            .clone()
            .or_else(|| self.role.map(|role| format!("{}/0", role)))
    }
}

/// Raw state directory configuration from TOML
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileStateConfig {
    /// Directory holding `state.json`, `status.json` and relation documents
    pub dir: PathBuf,
}

impl Default for FileStateConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("/var/lib/converge-agent"),
        }
    }
}

/// Raw image configuration from TOML
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileImagesConfig {
    /// Skip pulling images before converging
    pub skip_pull: bool,
    /// Tag used when the `image-tag` option is unset
    pub default_tag: String,
}

impl Default for FileImagesConfig {
    fn default() -> Self {
        Self {
            skip_pull: false,
            default_tag: "latest".to_string(),
        }
    }
}

/// Raw container runtime configuration from TOML
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileRuntimeConfig {
    /// Docker binary name or path
    pub docker: String,
    /// Log runtime commands instead of running them
    pub dry_run: bool,
    /// Prefix prepended to every artifact destination
    pub root: PathBuf,
    /// Directory with template overrides, laid out like the built-ins
    pub templates_dir: Option<PathBuf>,
}

impl Default for FileRuntimeConfig {
    fn default() -> Self {
        Self {
            docker: "docker".to_string(),
            dry_run: false,
            root: PathBuf::from("/"),
            templates_dir: None,
        }
    }
}

/// Raw relation document locations from TOML
///
/// Both default to files inside the state directory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileRelationsConfig {
    /// Inbound peer facts document
    pub inbound: Option<PathBuf>,
    /// Outbound facts document
    pub outbound: Option<PathBuf>,
}

/// Raw logging configuration from TOML
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLoggingConfig {
    /// Directory for JSON-lines log files (console only when unset)
    pub dir: Option<PathBuf>,
}

/// Raw output configuration from TOML
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileOutputConfig {
    /// Enable colored terminal output
    pub color: bool,
}

impl Default for FileOutputConfig {
    fn default() -> Self {
        Self { color: true }
    }
}

/// Complete configuration file structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub unit: FileUnitConfig,
    pub state: FileStateConfig,
    pub images: FileImagesConfig,
    pub runtime: FileRuntimeConfig,
    pub relations: FileRelationsConfig,
    pub logging: FileLoggingConfig,
    pub output: FileOutputConfig,
}

impl FileConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.unit.role.is_none() {
            return Err(ConfigValidationError::MissingRole);
        }

        if let Some(name) = &self.unit.name
            && name.trim().is_empty()
        {
            return Err(ConfigValidationError::EmptyUnitName);
        }

        if self.images.default_tag.trim().is_empty() {
            return Err(ConfigValidationError::EmptyImageTag);
        }

        if self.runtime.docker.trim().is_empty() {
            return Err(ConfigValidationError::EmptyDockerBinary);
        }

        Ok(())
    }

    pub fn state_file(&self) -> PathBuf {
        self.state.dir.join("state.json")
    }

    pub fn status_file(&self) -> PathBuf {
        self.state.dir.join("status.json")
    }

    pub fn inbound_file(&self) -> PathBuf {
        self.relations
            .inbound
            .clone()
            .unwrap_or_else(|| self.state.dir.join("relations.json"))
    }

    pub fn outbound_file(&self) -> PathBuf {
        self.relations
            .outbound
            .clone()
            .unwrap_or_else(|| self.state.dir.join("outbound.json"))
    }

    /// Pass parameters derived from the image and unit sections.
    pub fn reconcile_params(&self) -> ReconcileParams {
        let params = ReconcileParams::default()
            .with_skip_image_pull(self.images.skip_pull)
            .with_default_image_tag(self.images.default_tag.clone());
        match &self.unit.endpoint {
            Some(endpoint) => params.with_endpoint_hint(endpoint.clone()),
            None => params,
        }
    }
}
