//! Artifacts and service groups.

use crate::core::error::ConvergeError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

/// Identifier of a rendered artifact, e.g. `controller/common_config.env`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ArtifactId(String);

impl ArtifactId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<T: Into<String>> From<T> for ArtifactId {
    fn from(s: T) -> Self {
        Self::new(s)
    }
}

impl std::fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a service group, e.g. `config-api`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GroupId(String);

impl GroupId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<T: Into<String>> From<T> for GroupId {
    fn from(s: T) -> Self {
        Self::new(s)
    }
}

impl std::fmt::Display for GroupId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where an artifact comes from and where it lands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactSpec {
    pub id: ArtifactId,
    /// Template name understood by the renderer.
    pub template: String,
    pub destination: PathBuf,
}

impl ArtifactSpec {
    /// An artifact whose template name equals its id.
    pub fn new(id: impl Into<String>, destination: impl Into<PathBuf>) -> Self {
        let id = id.into();
        Self {
            template: id.clone(),
            id: ArtifactId::new(id),
            destination: destination.into(),
        }
    }
}

/// Output of rendering one artifact against a context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedArtifact {
    pub id: ArtifactId,
    pub content: String,
    pub destination: PathBuf,
}

/// Lifecycle action taken once per group when any of its inputs changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyAction {
    /// Re-apply a compose file (`docker compose up -d`).
    Recompose { compose_file: PathBuf },
    /// Writing the artifacts is the whole action.
    WriteOnly,
}

/// A set of co-rendered artifacts applied together as one lifecycle unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceGroup {
    pub id: GroupId,
    pub artifacts: Vec<ArtifactSpec>,
    /// Artifacts owned by other groups whose changes also require this group
    /// to be re-applied.
    pub consumes: Vec<ArtifactId>,
    pub depends_on: Vec<GroupId>,
    pub action: ApplyAction,
    /// A failed apply of a foundational group aborts the remaining groups.
    pub foundational: bool,
}

impl ServiceGroup {
    pub fn new(id: impl Into<String>, action: ApplyAction) -> Self {
        Self {
            id: GroupId::new(id),
            artifacts: Vec::new(),
            consumes: Vec::new(),
            depends_on: Vec::new(),
            action,
            foundational: false,
        }
    }

    pub fn with_artifact(mut self, artifact: ArtifactSpec) -> Self {
        self.artifacts.push(artifact);
        self
    }

    pub fn consuming(mut self, artifact: impl Into<String>) -> Self {
        self.consumes.push(ArtifactId::new(artifact));
        self
    }

    pub fn after(mut self, group: impl Into<String>) -> Self {
        self.depends_on.push(GroupId::new(group));
        self
    }

    pub fn foundational(mut self) -> Self {
        self.foundational = true;
        self
    }

    pub fn owns(&self, artifact: &ArtifactId) -> bool {
        self.artifacts.iter().any(|a| &a.id == artifact)
    }
}

/// Order groups so that every group comes after the groups it depends on,
/// explicitly or through a consumed artifact. Declaration order is kept
/// wherever the dependencies allow it.
///
/// # Errors
///
/// [`ConvergeError::InvalidProfile`] on unknown dependencies or cycles.
pub fn dependency_order(groups: &[ServiceGroup]) -> Result<Vec<&ServiceGroup>, ConvergeError> {
    let index: BTreeMap<&GroupId, usize> = groups
        .iter()
        .enumerate()
        .map(|(i, g)| (&g.id, i))
        .collect();

    let mut prerequisites: Vec<BTreeSet<usize>> = Vec::with_capacity(groups.len());
    for group in groups {
        let mut deps = BTreeSet::new();
        for dep in &group.depends_on {
            let i = index.get(dep).ok_or_else(|| {
                ConvergeError::InvalidProfile(format!(
                    "group {} depends on unknown group {}",
                    group.id, dep
                ))
            })?;
            deps.insert(*i);
        }
        for artifact in &group.consumes {
            let owner = groups.iter().position(|g| g.owns(artifact)).ok_or_else(|| {
                ConvergeError::InvalidProfile(format!(
                    "group {} consumes unknown artifact {}",
                    group.id, artifact
                ))
            })?;
            deps.insert(owner);
        }
        prerequisites.push(deps);
    }

    let mut placed = vec![false; groups.len()];
    let mut ordered = Vec::with_capacity(groups.len());
    while ordered.len() < groups.len() {
        let next = (0..groups.len())
            .find(|&i| !placed[i] && prerequisites[i].iter().all(|&d| placed[d] && d != i));
        match next {
            Some(i) => {
                placed[i] = true;
                ordered.push(&groups[i]);
            }
            None => {
                let stuck: Vec<&str> = (0..groups.len())
                    .filter(|&i| !placed[i])
                    .map(|i| groups[i].id.as_str())
                    .collect();
                return Err(ConvergeError::InvalidProfile(format!(
                    "dependency cycle between groups: {}",
                    stuck.join(", ")
                )));
            }
        }
    }
    Ok(ordered)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(groups: &[&ServiceGroup]) -> Vec<String> {
        groups.iter().map(|g| g.id.to_string()).collect()
    }

    #[test]
    fn test_consumed_artifact_orders_owner_first() {
        let groups = vec![
            ServiceGroup::new("api", ApplyAction::WriteOnly).consuming("common.env"),
            ServiceGroup::new("common", ApplyAction::WriteOnly)
                .with_artifact(ArtifactSpec::new("common.env", "/etc/common.env"))
                .foundational(),
        ];

        let ordered = dependency_order(&groups).unwrap();
        assert_eq!(ids(&ordered), vec!["common", "api"]);
    }

    #[test]
    fn test_declaration_order_kept_for_independent_groups() {
        let groups = vec![
            ServiceGroup::new("b", ApplyAction::WriteOnly),
            ServiceGroup::new("a", ApplyAction::WriteOnly),
            ServiceGroup::new("c", ApplyAction::WriteOnly).after("a"),
        ];

        let ordered = dependency_order(&groups).unwrap();
        assert_eq!(ids(&ordered), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_cycle_is_invalid_profile() {
        let groups = vec![
            ServiceGroup::new("a", ApplyAction::WriteOnly).after("b"),
            ServiceGroup::new("b", ApplyAction::WriteOnly).after("a"),
        ];

        let err = dependency_order(&groups).unwrap_err();
        assert!(matches!(err, ConvergeError::InvalidProfile(msg) if msg.contains("cycle")));
    }

    #[test]
    fn test_unknown_dependency_is_invalid_profile() {
        let groups = vec![ServiceGroup::new("a", ApplyAction::WriteOnly).after("missing")];
        assert!(dependency_order(&groups).is_err());
    }

    #[test]
    fn test_artifact_spec_template_defaults_to_id() {
        let spec = ArtifactSpec::new("controller/redis.env", "/etc/contrail/redis/redis.env");
        assert_eq!(spec.template, "controller/redis.env");
        assert_eq!(spec.id.as_str(), "controller/redis.env");
    }
}
