//! Application layer for converge-agent
//!
//! This crate contains use cases, port definitions, and application configuration.
//! It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use config::ReconcileParams;
pub use ports::{
    container::{ContainerLifecycle, LifecycleError},
    network::NetworkPort,
    progress::{NoProgress, ReconcileProgress},
    relation::{RelationError, RelationPort},
    renderer::{ArtifactRenderer, ArtifactWriter, RenderError, WriteError},
    state_store::{AgentState, StateStore, StoreError},
    status_sink::{SinkError, StatusSink},
};
pub use use_cases::converge::{ConvergeOutcome, ConvergenceDriver};
pub use use_cases::reconcile::{PassReport, ReconcileError, ReconcilePorts, ReconcileUseCase};
