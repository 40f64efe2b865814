//! Facts about the local host, resolved before the context is built.

use std::net::Ipv4Addr;

/// Locally computed inputs of the context builder.
///
/// These are resolved through the network port by the caller so that
/// building stays a pure function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostFacts {
    pub unit_name: String,
    /// `None` when the address could not be resolved; building then fails.
    pub own_address: Option<Ipv4Addr>,
    pub hostname: Option<String>,
    pub is_leader: bool,
}

impl HostFacts {
    pub fn new(unit_name: impl Into<String>, own_address: Option<Ipv4Addr>) -> Self {
        Self {
            unit_name: unit_name.into(),
            own_address,
            hostname: None,
            is_leader: false,
        }
    }

    pub fn with_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = Some(hostname.into());
        self
    }

    pub fn with_leader(mut self, is_leader: bool) -> Self {
        self.is_leader = is_leader;
        self
    }
}
