//! Domain layer for converge-agent
//!
//! This crate contains the reconciliation model: peer facts, local config,
//! the context snapshot, artifacts and change detection, health derivation
//! and outbound facts. It performs no I/O.
//!
//! # Core Concepts
//!
//! ## Peer Registry and Local Config
//!
//! - **Peer Registry**: facts published by peers, per relation and peer
//! - **Local Config**: operator options plus values promoted from peers
//!
//! ## Reconciliation
//!
//! - **Context**: deterministic snapshot rebuilt on every pass
//! - **Change Detector**: last-applied baselines that gate restarts
//! - **Status Evaluator**: ordered readiness checklist
//! - **Relation Publisher**: outbound facts projected from the context
//!
//! What differs per agent role lives in a [`UnitProfile`].

pub mod artifact;
pub mod config;
pub mod context;
pub mod core;
pub mod event;
pub mod profile;
pub mod publish;
pub mod relation;
pub mod status;

// Re-export commonly used types
pub use artifact::{
    ApplyAction, ArtifactId, ArtifactSpec, ChangeDetector, GroupId, RenderedArtifact, ServiceGroup,
    dependency_order,
};
pub use config::LocalConfig;
pub use context::{Context, ContextBuilder, HostFacts};
pub use core::error::ConvergeError;
pub use event::Event;
pub use profile::{RelationSchema, UnitProfile, UnitRole};
pub use publish::{OutboundFacts, publish};
pub use relation::{
    fact::{FactKind, FactLookup, FactValue, KnownFact},
    registry::{PeerDeparture, PeerRegistry},
};
pub use status::{HealthState, ResourceCheck, StatusEvaluator};
