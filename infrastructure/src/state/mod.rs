//! File-backed state adapters
//!
//! Both live in the agent state directory and are replaced atomically.

mod json_store;
mod status_file;

pub use json_store::JsonStateStore;
pub use status_file::{FileStatusSink, StatusRecord};
