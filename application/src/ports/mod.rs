//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts that infrastructure adapters must implement.

pub mod container;
pub mod network;
pub mod progress;
pub mod relation;
pub mod renderer;
pub mod state_store;
pub mod status_sink;
