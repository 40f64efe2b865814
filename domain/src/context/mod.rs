//! Context module: the per-pass configuration snapshot
//!
//! A [`Context`] is rebuilt from scratch on every reconciliation pass by the
//! [`ContextBuilder`] from three inputs:
//!
//! - **Local config**: operator options plus values promoted from peers
//! - **Peer registry**: facts published by peers, per relation
//! - **Host facts**: own address, hostname and leadership, resolved by the
//!   caller
//!
//! Each field a role renders is declared with a [`FieldPolicy`] in its
//! profile.

pub mod builder;
pub mod entities;
pub mod host;
pub mod policy;

pub use builder::ContextBuilder;
pub use entities::Context;
pub use host::HostFacts;
pub use policy::{ComputedField, DefaultValue, FieldPolicy};
