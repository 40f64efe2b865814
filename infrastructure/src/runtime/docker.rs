//! Docker container lifecycle using the `docker` CLI.
//!
//! Images are pulled with `docker pull <image>:<tag>` and compose groups are
//! (re)applied with `docker compose -f <file> up -d`, which only recreates
//! containers whose definition or environment changed.

use crate::render::rooted;
use async_trait::async_trait;
use converge_application::ports::container::{ContainerLifecycle, LifecycleError};
use converge_domain::{ApplyAction, ServiceGroup};
use std::path::PathBuf;
use tokio::process::Command;
use tracing::{debug, info};

pub struct DockerComposeLifecycle {
    docker: String,
    root: PathBuf,
    dry_run: bool,
}

impl DockerComposeLifecycle {
    pub fn new(docker: impl Into<String>) -> Self {
        Self {
            docker: docker.into(),
            root: PathBuf::from("/"),
            dry_run: false,
        }
    }

    /// Prefix for compose file paths, matching the artifact writer root.
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    /// Log commands instead of running them.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Check if the docker binary is available
    pub fn is_available(&self) -> bool {
        which::which(&self.docker).is_ok()
    }

    fn compose_args(&self, group: &ServiceGroup) -> Option<Vec<String>> {
        match &group.action {
            ApplyAction::WriteOnly => None,
            ApplyAction::Recompose { compose_file } => Some(vec![
                "compose".to_string(),
                "-f".to_string(),
                rooted(&self.root, compose_file).display().to_string(),
                "up".to_string(),
                "-d".to_string(),
            ]),
        }
    }

    /// Run docker with `args`; the error is the trimmed stderr.
    async fn run(&self, args: &[String]) -> Result<(), String> {
        if self.dry_run {
            info!("[dry-run] {} {}", self.docker, args.join(" "));
            return Ok(());
        }

        debug!("Running {} {}", self.docker, args.join(" "));
        let output = Command::new(&self.docker)
            .args(args)
            .output()
            .await
            .map_err(|e| format!("Failed to execute {}: {}", self.docker, e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(format!(
                "exit status {}: {}",
                output.status.code().unwrap_or(-1),
                stderr.trim()
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl ContainerLifecycle for DockerComposeLifecycle {
    async fn pull_image(&self, image: &str, tag: &str) -> Result<(), LifecycleError> {
        if !self.dry_run && !self.is_available() {
            return Err(LifecycleError::RuntimeUnavailable(self.docker.clone()));
        }
        self.run(&["pull".to_string(), format!("{}:{}", image, tag)])
            .await
            .map_err(|reason| LifecycleError::PullFailed {
                image: image.to_string(),
                reason,
            })
    }

    async fn apply_group(&self, group: &ServiceGroup) -> Result<(), LifecycleError> {
        let Some(args) = self.compose_args(group) else {
            return Ok(());
        };
        if !self.dry_run && !self.is_available() {
            return Err(LifecycleError::RuntimeUnavailable(self.docker.clone()));
        }
        self.run(&args)
            .await
            .map_err(|reason| LifecycleError::ApplyFailed {
                group: group.id.to_string(),
                reason,
            })?;
        info!("Applied service group {}", group.id);
        Ok(())
    }
}
