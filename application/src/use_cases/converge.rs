//! Convergence driver
//!
//! Renders each service group in dependency order, asks the change detector
//! which artifacts moved, and applies a group once when anything it owns or
//! consumes changed.
//!
//! # Failure handling
//!
//! - A failed group keeps its old baselines and is marked pending, so the
//!   next pass retries it even when nothing else changed.
//! - A failed foundational group aborts the remaining groups.
//! - Any other failure is recorded and the remaining groups proceed.

use crate::ports::container::ContainerLifecycle;
use crate::ports::progress::ReconcileProgress;
use crate::ports::renderer::{ArtifactRenderer, ArtifactWriter};
use converge_domain::{
    ApplyAction, ArtifactId, ChangeDetector, Context, ConvergeError, GroupId, RenderedArtifact,
    ResourceCheck, ServiceGroup, dependency_order,
};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// What one convergence run did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConvergeOutcome {
    pub applied: Vec<GroupId>,
    pub unchanged: Vec<GroupId>,
    pub failures: Vec<ConvergeError>,
    /// Group whose failure stopped the run.
    pub aborted_at: Option<GroupId>,
}

impl ConvergeOutcome {
    /// Every group converged.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && self.aborted_at.is_none()
    }
}

pub struct ConvergenceDriver {
    renderer: Arc<dyn ArtifactRenderer>,
    writer: Arc<dyn ArtifactWriter>,
    lifecycle: Arc<dyn ContainerLifecycle>,
}

impl ConvergenceDriver {
    pub fn new(
        renderer: Arc<dyn ArtifactRenderer>,
        writer: Arc<dyn ArtifactWriter>,
        lifecycle: Arc<dyn ContainerLifecycle>,
    ) -> Self {
        Self {
            renderer,
            writer,
            lifecycle,
        }
    }

    /// Pull every image before anything is rendered.
    ///
    /// Stops at the first image that cannot be pulled and reports it as
    /// `image:tag`.
    pub async fn check_images(&self, images: &[String], tag: &str) -> ResourceCheck {
        for image in images {
            if let Err(e) = self.lifecycle.pull_image(image, tag).await {
                warn!("Can't load image {}: {}", image, e);
                let name = image.rsplit('/').next().unwrap_or(image);
                return ResourceCheck::Unavailable {
                    resource: format!("{}:{}", name, tag),
                };
            }
        }
        ResourceCheck::Available
    }

    /// Converge `groups` against `ctx`.
    ///
    /// # Errors
    ///
    /// [`ConvergeError::InvalidProfile`] when the groups cannot be ordered.
    /// Apply failures are reported in the outcome, not as errors.
    pub async fn converge(
        &self,
        ctx: &Context,
        groups: &[ServiceGroup],
        detector: &mut ChangeDetector,
        progress: &dyn ReconcileProgress,
    ) -> Result<ConvergeOutcome, ConvergeError> {
        let ordered = dependency_order(groups)?;
        let mut outcome = ConvergeOutcome::default();
        let mut changed_this_pass: BTreeSet<ArtifactId> = BTreeSet::new();

        for group in ordered {
            match self
                .converge_group(ctx, group, detector, &mut changed_this_pass)
                .await
            {
                Ok(true) => {
                    info!("Service group {} applied", group.id);
                    progress.on_group_applied(&group.id);
                    outcome.applied.push(group.id.clone());
                }
                Ok(false) => {
                    debug!("Service group {} unchanged", group.id);
                    progress.on_group_unchanged(&group.id);
                    outcome.unchanged.push(group.id.clone());
                }
                Err(error) => {
                    warn!("{}", error);
                    detector.mark_pending(&group.id);
                    progress.on_group_failed(&group.id, &error);
                    outcome.failures.push(error);
                    if group.foundational {
                        warn!("Foundational group {} failed, skipping remaining groups", group.id);
                        outcome.aborted_at = Some(group.id.clone());
                        break;
                    }
                }
            }
        }

        Ok(outcome)
    }

    /// Returns whether the group was applied.
    async fn converge_group(
        &self,
        ctx: &Context,
        group: &ServiceGroup,
        detector: &mut ChangeDetector,
        changed_this_pass: &mut BTreeSet<ArtifactId>,
    ) -> Result<bool, ConvergeError> {
        let failed = |reason: String| ConvergeError::ApplyFailed {
            group: group.id.to_string(),
            reason,
        };

        let mut changed = Vec::new();
        for spec in &group.artifacts {
            let content = self
                .renderer
                .render(spec, ctx)
                .map_err(|e| failed(e.to_string()))?;
            if detector.differs(&spec.id, &content) {
                changed.push(RenderedArtifact {
                    id: spec.id.clone(),
                    content,
                    destination: spec.destination.clone(),
                });
            }
        }

        let consumed_changed = group.consumes.iter().any(|id| changed_this_pass.contains(id));
        let pending = detector.is_pending(&group.id);
        if changed.is_empty() && !consumed_changed && !pending {
            return Ok(false);
        }

        for artifact in &changed {
            self.writer
                .write(artifact)
                .await
                .map_err(|e| failed(e.to_string()))?;
            debug!("Rendered {} to {}", artifact.id, artifact.destination.display());
            changed_this_pass.insert(artifact.id.clone());
        }

        if let ApplyAction::Recompose { .. } = group.action {
            self.lifecycle
                .apply_group(group)
                .await
                .map_err(|e| failed(e.to_string()))?;
        }

        for artifact in &changed {
            detector.commit(&artifact.id, &artifact.content);
        }
        detector.clear_pending(&group.id);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::container::LifecycleError;
    use crate::ports::progress::NoProgress;
    use crate::ports::renderer::{RenderError, WriteError};
    use async_trait::async_trait;
    use converge_domain::{
        ArtifactSpec, ContextBuilder, HostFacts, LocalConfig, PeerRegistry, UnitProfile, UnitRole,
    };
    use std::collections::{BTreeMap, HashSet};
    use std::sync::Mutex;

    // ==================== Test Mocks ====================

    /// Renders whatever content the test assigned to a template.
    #[derive(Default)]
    struct MockRenderer {
        contents: Mutex<BTreeMap<String, String>>,
    }

    impl MockRenderer {
        fn set(&self, template: &str, content: &str) {
            self.contents
                .lock()
                .unwrap()
                .insert(template.to_string(), content.to_string());
        }
    }

    impl ArtifactRenderer for MockRenderer {
        fn render(&self, spec: &ArtifactSpec, _ctx: &Context) -> Result<String, RenderError> {
            self.contents
                .lock()
                .unwrap()
                .get(&spec.template)
                .cloned()
                .ok_or_else(|| RenderError::UnknownTemplate(spec.template.clone()))
        }
    }

    #[derive(Default)]
    struct MockWriter {
        written: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ArtifactWriter for MockWriter {
        async fn write(&self, artifact: &RenderedArtifact) -> Result<(), WriteError> {
            self.written.lock().unwrap().push(artifact.id.to_string());
            Ok(())
        }
    }

    #[derive(Default)]
    struct MockLifecycle {
        applied: Mutex<Vec<String>>,
        pulled: Mutex<Vec<String>>,
        failing_groups: Mutex<HashSet<String>>,
        missing_images: HashSet<String>,
    }

    impl MockLifecycle {
        fn fail_group(&self, group: &str) {
            self.failing_groups.lock().unwrap().insert(group.to_string());
        }

        fn heal_group(&self, group: &str) {
            self.failing_groups.lock().unwrap().remove(group);
        }

        fn applied(&self) -> Vec<String> {
            self.applied.lock().unwrap().clone()
        }

        fn reset(&self) {
            self.applied.lock().unwrap().clear();
        }
    }

    #[async_trait]
    impl ContainerLifecycle for MockLifecycle {
        async fn pull_image(&self, image: &str, tag: &str) -> Result<(), LifecycleError> {
            self.pulled.lock().unwrap().push(format!("{}:{}", image, tag));
            if self.missing_images.contains(image) {
                return Err(LifecycleError::PullFailed {
                    image: image.to_string(),
                    reason: "not found".to_string(),
                });
            }
            Ok(())
        }

        async fn apply_group(&self, group: &ServiceGroup) -> Result<(), LifecycleError> {
            if self.failing_groups.lock().unwrap().contains(group.id.as_str()) {
                return Err(LifecycleError::ApplyFailed {
                    group: group.id.to_string(),
                    reason: "compose exited with 1".to_string(),
                });
            }
            self.applied.lock().unwrap().push(group.id.to_string());
            Ok(())
        }
    }

    fn context() -> Context {
        let profile = UnitProfile::for_role(UnitRole::KeystoneAuth);
        let host = HostFacts::new("unit/0", Some("10.0.0.1".parse().unwrap()));
        ContextBuilder::new(&profile)
            .build(&LocalConfig::new(), &PeerRegistry::new(), &host)
            .unwrap()
    }

    fn recompose(id: &str) -> ApplyAction {
        ApplyAction::Recompose {
            compose_file: format!("/etc/{}/docker-compose.yaml", id).into(),
        }
    }

    /// Foundational `a` and dependent `b`, each with its own artifact.
    fn two_groups() -> Vec<ServiceGroup> {
        vec![
            ServiceGroup::new("a", recompose("a"))
                .with_artifact(ArtifactSpec::new("a.env", "/etc/a.env"))
                .foundational(),
            ServiceGroup::new("b", recompose("b"))
                .with_artifact(ArtifactSpec::new("b.yaml", "/etc/b.yaml"))
                .after("a"),
        ]
    }

    /// Write-only `common` consumed by `api`.
    fn shared_env_groups() -> Vec<ServiceGroup> {
        vec![
            ServiceGroup::new("common", ApplyAction::WriteOnly)
                .with_artifact(ArtifactSpec::new("common.env", "/etc/common.env"))
                .foundational(),
            ServiceGroup::new("api", recompose("api"))
                .with_artifact(ArtifactSpec::new("api.yaml", "/etc/api.yaml"))
                .consuming("common.env"),
        ]
    }

    struct Fixture {
        renderer: Arc<MockRenderer>,
        writer: Arc<MockWriter>,
        lifecycle: Arc<MockLifecycle>,
        driver: ConvergenceDriver,
    }

    fn fixture(lifecycle: MockLifecycle) -> Fixture {
        let renderer = Arc::new(MockRenderer::default());
        let writer = Arc::new(MockWriter::default());
        let lifecycle = Arc::new(lifecycle);
        let driver = ConvergenceDriver::new(renderer.clone(), writer.clone(), lifecycle.clone());
        Fixture {
            renderer,
            writer,
            lifecycle,
            driver,
        }
    }

    // ==================== Tests ====================

    #[tokio::test]
    async fn test_second_converge_with_same_context_applies_nothing() {
        let f = fixture(MockLifecycle::default());
        f.renderer.set("a.env", "A=1");
        f.renderer.set("b.yaml", "b: 1");
        let mut detector = ChangeDetector::new();
        let ctx = context();

        let first = f
            .driver
            .converge(&ctx, &two_groups(), &mut detector, &NoProgress)
            .await
            .unwrap();
        assert_eq!(first.applied.len(), 2);
        f.lifecycle.reset();

        let second = f
            .driver
            .converge(&ctx, &two_groups(), &mut detector, &NoProgress)
            .await
            .unwrap();
        assert!(second.applied.is_empty());
        assert_eq!(second.unchanged.len(), 2);
        assert!(f.lifecycle.applied().is_empty());
    }

    #[tokio::test]
    async fn test_only_changed_group_is_applied() {
        let f = fixture(MockLifecycle::default());
        f.renderer.set("a.env", "A=1");
        f.renderer.set("b.yaml", "b: 1");
        let mut detector = ChangeDetector::new();
        let ctx = context();
        f.driver.converge(&ctx, &two_groups(), &mut detector, &NoProgress).await.unwrap();
        f.lifecycle.reset();

        f.renderer.set("a.env", "A=2");
        let outcome = f
            .driver
            .converge(&ctx, &two_groups(), &mut detector, &NoProgress)
            .await
            .unwrap();

        assert_eq!(f.lifecycle.applied(), vec!["a"]);
        assert_eq!(outcome.unchanged, vec![GroupId::new("b")]);
    }

    #[tokio::test]
    async fn test_group_applied_once_for_several_changed_artifacts() {
        let f = fixture(MockLifecycle::default());
        f.renderer.set("redis.env", "R=1");
        f.renderer.set("redis.yaml", "redis: 1");
        let groups = vec![
            ServiceGroup::new("redis", recompose("redis"))
                .with_artifact(ArtifactSpec::new("redis.env", "/etc/redis.env"))
                .with_artifact(ArtifactSpec::new("redis.yaml", "/etc/redis/docker-compose.yaml")),
        ];
        let mut detector = ChangeDetector::new();

        f.driver.converge(&context(), &groups, &mut detector, &NoProgress).await.unwrap();

        assert_eq!(f.lifecycle.applied(), vec!["redis"]);
        assert_eq!(f.writer.written.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_shared_env_change_recomposes_consumers() {
        let f = fixture(MockLifecycle::default());
        f.renderer.set("common.env", "LOG=1");
        f.renderer.set("api.yaml", "api: 1");
        let mut detector = ChangeDetector::new();
        let ctx = context();
        f.driver.converge(&ctx, &shared_env_groups(), &mut detector, &NoProgress).await.unwrap();
        f.lifecycle.reset();

        f.renderer.set("common.env", "LOG=2");
        let outcome = f
            .driver
            .converge(&ctx, &shared_env_groups(), &mut detector, &NoProgress)
            .await
            .unwrap();

        assert_eq!(outcome.applied, vec![GroupId::new("common"), GroupId::new("api")]);
        assert_eq!(f.lifecycle.applied(), vec!["api"]);
    }

    #[tokio::test]
    async fn test_failed_group_keeps_baseline_and_retries() {
        let f = fixture(MockLifecycle::default());
        f.renderer.set("common.env", "LOG=1");
        f.renderer.set("api.yaml", "api: 1");
        f.lifecycle.fail_group("api");
        let mut detector = ChangeDetector::new();
        let ctx = context();

        let first = f
            .driver
            .converge(&ctx, &shared_env_groups(), &mut detector, &NoProgress)
            .await
            .unwrap();
        assert!(matches!(
            first.failures.as_slice(),
            [ConvergeError::ApplyFailed { group, .. }] if group == "api"
        ));
        assert!(first.aborted_at.is_none());
        assert!(detector.baseline(&ArtifactId::new("api.yaml")).is_none());
        assert!(detector.is_pending(&GroupId::new("api")));

        f.lifecycle.heal_group("api");
        let second = f
            .driver
            .converge(&ctx, &shared_env_groups(), &mut detector, &NoProgress)
            .await
            .unwrap();
        assert!(second.is_clean());
        assert_eq!(f.lifecycle.applied(), vec!["api"]);
        assert!(!detector.is_pending(&GroupId::new("api")));
    }

    #[tokio::test]
    async fn test_pending_group_retried_without_changes() {
        let f = fixture(MockLifecycle::default());
        f.renderer.set("a.env", "A=1");
        f.renderer.set("b.yaml", "b: 1");
        let mut detector = ChangeDetector::new();
        let ctx = context();
        f.driver.converge(&ctx, &two_groups(), &mut detector, &NoProgress).await.unwrap();
        f.lifecycle.reset();

        detector.mark_pending(&GroupId::new("b"));
        let outcome = f
            .driver
            .converge(&ctx, &two_groups(), &mut detector, &NoProgress)
            .await
            .unwrap();

        assert_eq!(outcome.applied, vec![GroupId::new("b")]);
        assert_eq!(f.writer.written.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_foundational_failure_aborts_remaining_groups() {
        let f = fixture(MockLifecycle::default());
        f.renderer.set("a.env", "A=1");
        f.renderer.set("b.yaml", "b: 1");
        f.lifecycle.fail_group("a");
        let mut detector = ChangeDetector::new();

        let outcome = f
            .driver
            .converge(&context(), &two_groups(), &mut detector, &NoProgress)
            .await
            .unwrap();

        assert_eq!(outcome.aborted_at, Some(GroupId::new("a")));
        assert!(outcome.applied.is_empty());
        assert!(f.lifecycle.applied().is_empty());
        assert!(detector.baseline(&ArtifactId::new("b.yaml")).is_none());
    }

    #[tokio::test]
    async fn test_independent_failure_does_not_block_other_groups() {
        let f = fixture(MockLifecycle::default());
        f.renderer.set("x.yaml", "x");
        f.renderer.set("y.yaml", "y");
        let groups = vec![
            ServiceGroup::new("x", recompose("x"))
                .with_artifact(ArtifactSpec::new("x.yaml", "/etc/x.yaml")),
            ServiceGroup::new("y", recompose("y"))
                .with_artifact(ArtifactSpec::new("y.yaml", "/etc/y.yaml")),
        ];
        f.lifecycle.fail_group("x");
        let mut detector = ChangeDetector::new();

        let outcome = f
            .driver
            .converge(&context(), &groups, &mut detector, &NoProgress)
            .await
            .unwrap();

        assert_eq!(outcome.applied, vec![GroupId::new("y")]);
        assert_eq!(outcome.failures.len(), 1);
        assert!(!outcome.is_clean());
    }

    #[tokio::test]
    async fn test_render_failure_is_an_apply_failure() {
        let f = fixture(MockLifecycle::default());
        let mut detector = ChangeDetector::new();

        let outcome = f
            .driver
            .converge(&context(), &two_groups(), &mut detector, &NoProgress)
            .await
            .unwrap();

        assert_eq!(outcome.aborted_at, Some(GroupId::new("a")));
        assert!(f.writer.written.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_check_images_reports_first_missing() {
        let lifecycle = MockLifecycle {
            missing_images: HashSet::from(["registry:5000/contrail-nodemgr".to_string()]),
            ..Default::default()
        };
        let f = fixture(lifecycle);
        let images = vec![
            "registry:5000/contrail-node-init".to_string(),
            "registry:5000/contrail-nodemgr".to_string(),
            "registry:5000/contrail-analytics-api".to_string(),
        ];

        let check = f.driver.check_images(&images, "5.0").await;

        assert_eq!(
            check,
            ResourceCheck::Unavailable {
                resource: "contrail-nodemgr:5.0".to_string()
            }
        );
        assert_eq!(f.lifecycle.pulled.lock().unwrap().len(), 2);
    }
}
