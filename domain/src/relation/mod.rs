//! Relations: named channels between clustered units.
//!
//! - [`registry::PeerRegistry`] - peers per relation and the facts they published
//! - [`fact`] - fact values, lookups and typed interpretation

pub mod fact;
pub mod registry;
