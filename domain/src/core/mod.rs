//! Core domain concepts shared across all subdomains.
//!
//! - [`error::ConvergeError`] - reconciliation error taxonomy
//! - [`ip`] - IPv4 parsing and numeric ordering helpers

pub mod error;
pub mod ip;
