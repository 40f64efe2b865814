//! Reconcile use case
//!
//! One [`ReconcileUseCase::execute`] call is one convergence pass for one
//! inbound event:
//!
//! 1. **Ingest** - record peer facts, promote them into local config, clear
//!    relation-scoped keys when the last peer departs
//! 2. **Build** - rebuild the context from local config, registry and host
//! 3. **Check** - pull images, then evaluate the readiness checklist
//! 4. **Converge** - render, compare and apply service groups (skipped while
//!    blocked)
//! 5. **Report** - set the status, publish outbound facts, flush state
//!
//! Errors are recovered at the pass boundary: the returned error only tells
//! the caller which pass failed, the operator sees the status sink.

use crate::config::ReconcileParams;
use crate::ports::container::ContainerLifecycle;
use crate::ports::network::NetworkPort;
use crate::ports::progress::{NoProgress, ReconcileProgress};
use crate::ports::relation::{RelationError, RelationPort};
use crate::ports::renderer::{ArtifactRenderer, ArtifactWriter};
use crate::ports::state_store::{AgentState, StateStore, StoreError};
use crate::ports::status_sink::{SinkError, StatusSink};
use crate::use_cases::converge::{ConvergeOutcome, ConvergenceDriver};
use converge_domain::profile::{IMAGE_TAG_OPTION, REGISTRY_OPTION};
use converge_domain::{
    ContextBuilder, ConvergeError, Event, HealthState, HostFacts, LocalConfig, ResourceCheck,
    StatusEvaluator, UnitProfile, publish,
};
use std::collections::BTreeSet;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};

#[derive(Error, Debug)]
pub enum ReconcileError {
    #[error(transparent)]
    Converge(#[from] ConvergeError),

    #[error("Relation error: {0}")]
    Relation(#[from] RelationError),

    #[error("Status sink error: {0}")]
    Status(#[from] SinkError),
}

impl From<StoreError> for ReconcileError {
    fn from(e: StoreError) -> Self {
        ReconcileError::Converge(ConvergeError::StateStore(e.to_string()))
    }
}

/// Adapters a pass runs against.
#[derive(Clone)]
pub struct ReconcilePorts {
    pub relation: Arc<dyn RelationPort>,
    pub store: Arc<dyn StateStore>,
    pub network: Arc<dyn NetworkPort>,
    pub lifecycle: Arc<dyn ContainerLifecycle>,
    pub renderer: Arc<dyn ArtifactRenderer>,
    pub writer: Arc<dyn ArtifactWriter>,
    pub status: Arc<dyn StatusSink>,
}

/// Summary of one pass, for logging and console output.
#[derive(Debug, Clone, PartialEq)]
pub struct PassReport {
    pub event: String,
    pub status: HealthState,
    /// Local config keys changed by options or promotion.
    pub config_changed: Vec<String>,
    /// Relation-scoped keys cleared after the last peer departed.
    pub config_cleared: Vec<String>,
    /// `relation:peer` entries dropped because the substrate no longer lists
    /// them.
    pub pruned_peers: Vec<String>,
    /// `None` when convergence was skipped.
    pub convergence: Option<ConvergeOutcome>,
    pub published: Vec<String>,
    /// Recovered problems: malformed facts, apply and publish failures.
    pub issues: Vec<String>,
}

#[derive(Debug, Default)]
struct Ingested {
    changed: Vec<String>,
    cleared: Vec<String>,
    pruned: Vec<String>,
    malformed: Vec<ConvergeError>,
}

pub struct ReconcileUseCase {
    profile: UnitProfile,
    params: ReconcileParams,
    ports: ReconcilePorts,
    driver: ConvergenceDriver,
}

impl ReconcileUseCase {
    pub fn new(profile: UnitProfile, params: ReconcileParams, ports: ReconcilePorts) -> Self {
        let driver = ConvergenceDriver::new(
            ports.renderer.clone(),
            ports.writer.clone(),
            ports.lifecycle.clone(),
        );
        Self {
            profile,
            params,
            ports,
            driver,
        }
    }

    pub fn profile(&self) -> &UnitProfile {
        &self.profile
    }

    pub async fn execute(&self, event: Event) -> Result<PassReport, ReconcileError> {
        self.execute_with_progress(event, &NoProgress).await
    }

    /// Run one pass for `event`.
    ///
    /// # Errors
    ///
    /// - [`ConvergeError::ImmutableConfigViolation`] - status set to blocked,
    ///   only the rejected option is persisted
    /// - [`ConvergeError::ContextUnavailable`] - status untouched, ingested
    ///   facts persisted
    /// - port failures that prevent reading or flushing state
    pub async fn execute_with_progress(
        &self,
        event: Event,
        progress: &dyn ReconcileProgress,
    ) -> Result<PassReport, ReconcileError> {
        progress.on_event(&event);
        info!("Handling {} for {}", event, self.profile.role);

        let mut state = self.ports.store.load().await?;

        if let Event::Install = event {
            self.report_status(&HealthState::maintenance("Installing..."), progress)
                .await?;
        }

        let ingested = match self.ingest(&event, &mut state).await {
            Ok(ingested) => ingested,
            Err(ReconcileError::Converge(
                violation @ ConvergeError::ImmutableConfigViolation { .. },
            )) => {
                error!("{}", violation);
                let health = HealthState::blocked(violation.to_string());
                self.report_status(&health, progress).await?;
                if let ConvergeError::ImmutableConfigViolation { option } = &violation {
                    state.rejected_options.insert(option.clone());
                }
                state.last_status = Some(health);
                self.ports.store.save(&state).await?;
                return Err(violation.into());
            }
            Err(e) => return Err(e),
        };

        let host = self.resolve_host().await;
        let built = ContextBuilder::new(&self.profile).build(&state.config, &state.registry, &host);
        let ctx = match built {
            Ok(ctx) => ctx,
            Err(e) => {
                warn!("{}, keeping previous status", e);
                self.ports.store.save(&state).await?;
                return Err(e.into());
            }
        };

        let mut issues: Vec<String> = Vec::new();
        for malformed in ingested.malformed.iter().chain(ctx.malformed()) {
            warn!("Ignoring {}", malformed);
            issues.push(malformed.to_string());
        }

        let resources = self.check_resources(&state.config).await;
        let mut health = StatusEvaluator::new(&self.profile.checklist)
            .with_rejected(state.rejected_options.iter().map(String::as_str))
            .evaluate(&ctx, &resources);

        let convergence = if health.is_blocked() {
            info!("Unit blocked ({}), not converging", health.reason());
            None
        } else {
            let outcome = self
                .driver
                .converge(&ctx, &self.profile.groups, &mut state.detector, progress)
                .await?;
            issues.extend(outcome.failures.iter().map(ToString::to_string));
            if let Some(group) = &outcome.aborted_at {
                health =
                    HealthState::maintenance(format!("Service group {} failed to apply", group));
            }
            Some(outcome)
        };

        let status_changed = state.last_status.as_ref() != Some(&health);
        self.report_status(&health, progress).await?;

        // A pass that applied nothing has nothing new to announce.
        let converged = convergence
            .as_ref()
            .is_some_and(|outcome| outcome.is_clean() && !outcome.applied.is_empty());
        let local_changed = !ingested.changed.is_empty() || !ingested.cleared.is_empty();
        let joined = matches!(event, Event::RelationJoined { .. });
        let mut published = Vec::new();
        if converged || status_changed || local_changed || joined {
            let facts = publish(&self.profile.outbound, &ctx, &state.config, &health);
            for (relation, values) in &facts {
                match self.ports.relation.set_facts(relation, values).await {
                    Ok(()) => {
                        debug!("Published {} facts on {}", values.len(), relation);
                        progress.on_published(relation);
                        published.push(relation.clone());
                    }
                    Err(e) => {
                        warn!("{}", e);
                        issues.push(e.to_string());
                    }
                }
            }
        }

        state.last_status = Some(health.clone());
        self.ports.store.save(&state).await?;

        Ok(PassReport {
            event: event.name().to_string(),
            status: health,
            config_changed: ingested.changed,
            config_cleared: ingested.cleared,
            pruned_peers: ingested.pruned,
            convergence,
            published,
            issues,
        })
    }

    async fn report_status(
        &self,
        state: &HealthState,
        progress: &dyn ReconcileProgress,
    ) -> Result<(), ReconcileError> {
        self.ports.status.set_status(state).await?;
        progress.on_status(state);
        Ok(())
    }

    /// Apply the event to the registry and local config.
    async fn ingest(
        &self,
        event: &Event,
        state: &mut AgentState,
    ) -> Result<Ingested, ReconcileError> {
        let mut ingested = Ingested::default();

        match event {
            Event::Install | Event::UpgradeCharm => {}
            Event::ConfigChanged { options } => {
                ingested.changed = state
                    .config
                    .apply_options(options, &self.profile.immutable_options)?;
                let restored: Vec<String> = state
                    .rejected_options
                    .iter()
                    .filter(|option| options.contains_key(option.as_str()))
                    .cloned()
                    .collect();
                for option in restored {
                    info!("Option {} is back to its installed value", option);
                    state.rejected_options.remove(&option);
                }
            }
            Event::RelationJoined { relation, peer } => {
                if self.profile.relation(relation).is_none() {
                    warn!("Relation {} is not used by role {}", relation, self.profile.role);
                } else if state.registry.join_peer(relation, peer) {
                    debug!("Peer {} joined {}", peer, relation);
                }
            }
            Event::RelationChanged { relation, peer } => {
                let Some(schema) = self.profile.relation(relation) else {
                    warn!("Relation {} is not used by role {}", relation, self.profile.role);
                    return Ok(ingested);
                };
                state.registry.join_peer(relation, peer);

                for (key, _) in &schema.keys {
                    let lookup = self.ports.relation.get_fact(relation, peer, key).await?;
                    if let Some(value) = lookup.into_fact() {
                        state.registry.record_fact(relation, peer, key, value);
                    }
                }

                if let Some(facts) = state.registry.facts_for(relation).get(peer.as_str()) {
                    let outcome = schema.promote_facts(facts, &mut state.config);
                    ingested.changed = outcome.changed;
                    ingested.malformed = outcome.malformed;
                }
            }
            Event::RelationDeparted { relation, peer } => {
                let departure = state.registry.remove_peer(relation, peer);
                if departure.last_peer {
                    let remaining: Vec<String> = self
                        .ports
                        .relation
                        .list_peers(relation)
                        .await?
                        .into_iter()
                        .filter(|p| p != peer)
                        .collect();
                    if remaining.is_empty() {
                        ingested.cleared = self.clear_scoped(relation, &mut state.config);
                    } else {
                        debug!(
                            "{} still lists {} peers on {}",
                            self.ports.relation.unit_name(),
                            remaining.len(),
                            relation
                        );
                    }
                }
            }
            Event::UpdateStatus => {
                for schema in &self.profile.relations {
                    let listed: BTreeSet<String> = self
                        .ports
                        .relation
                        .list_peers(schema.name)
                        .await?
                        .into_iter()
                        .collect();
                    let pruned = state.registry.retain_peers(schema.name, &listed);
                    if pruned.is_empty() {
                        continue;
                    }
                    info!("Pruned {} stale peers from {}", pruned.len(), schema.name);
                    if !state.registry.has_peers(schema.name) {
                        ingested
                            .cleared
                            .extend(self.clear_scoped(schema.name, &mut state.config));
                    }
                    ingested
                        .pruned
                        .extend(pruned.into_iter().map(|peer| format!("{}:{}", schema.name, peer)));
                }
            }
        }

        if !ingested.changed.is_empty() {
            debug!("Local config changed: {}", ingested.changed.join(", "));
        }
        Ok(ingested)
    }

    /// Clear config keys scoped to `relation` once no peer remains.
    fn clear_scoped(&self, relation: &str, config: &mut LocalConfig) -> Vec<String> {
        let cleared = self
            .profile
            .relation(relation)
            .map(|schema| config.clear_keys(&schema.scoped_keys))
            .unwrap_or_default();
        if !cleared.is_empty() {
            info!("Last peer left {}, cleared {}", relation, cleared.join(", "));
        }
        cleared
    }

    async fn resolve_host(&self) -> HostFacts {
        let network = &self.ports.network;
        let own_address = network.own_address(self.params.endpoint_hint.as_deref()).await;
        let hostname = match own_address {
            Some(ip) => network.resolve_hostname(ip).await,
            None => None,
        };
        let is_leader = match self.ports.relation.is_leader().await {
            Ok(leader) => leader,
            Err(e) => {
                warn!("Leadership unknown, acting as non-leader: {}", e);
                false
            }
        };

        let host =
            HostFacts::new(self.ports.relation.unit_name(), own_address).with_leader(is_leader);
        match hostname {
            Some(name) => host.with_hostname(name),
            None => host,
        }
    }

    async fn check_resources(&self, config: &LocalConfig) -> ResourceCheck {
        if self.params.skip_image_pull || self.profile.images.is_empty() {
            return ResourceCheck::Available;
        }
        let tag = config
            .get_str(IMAGE_TAG_OPTION)
            .unwrap_or(self.params.default_image_tag.as_str());
        let registry = config
            .get_str(REGISTRY_OPTION)
            .map(|r| r.trim_end_matches('/'))
            .filter(|r| !r.is_empty());
        let images: Vec<String> = self
            .profile
            .images
            .iter()
            .map(|image| match registry {
                Some(registry) => format!("{}/{}", registry, image),
                None => image.to_string(),
            })
            .collect();
        self.driver.check_images(&images, tag).await
    }
}
