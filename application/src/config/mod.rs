//! Application-level configuration.
//!
//! - [`ReconcileParams`] - pass behavior control (image pulls, tags, address endpoint)

pub mod reconcile_params;

pub use reconcile_params::ReconcileParams;
