//! Configuration value objects for the domain layer
//!
//! [`LocalConfig`] is the single mutable configuration store of a unit. It is
//! passed explicitly to the context builder; there is no ambient global.

mod local_config;

pub use local_config::LocalConfig;
