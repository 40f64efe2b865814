//! Host network lookups.
//!
//! The unit address is either configured or discovered from the source
//! address the kernel picks for an outbound UDP route; no packet is sent.
//! Hostnames are resolved from the hosts file, falling back to the local
//! hostname for the unit's own address.

use async_trait::async_trait;
use converge_application::ports::network::NetworkPort;
use converge_domain::core::ip::parse_ipv4;
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;
use tokio::net::UdpSocket;
use tracing::{debug, warn};

const ROUTE_PROBE: &str = "8.8.8.8:53";

pub struct HostNetwork {
    address: Option<Ipv4Addr>,
    hosts_file: PathBuf,
    hostname_file: PathBuf,
}

impl Default for HostNetwork {
    fn default() -> Self {
        Self::new()
    }
}

impl HostNetwork {
    pub fn new() -> Self {
        Self {
            address: None,
            hosts_file: PathBuf::from("/etc/hosts"),
            hostname_file: PathBuf::from("/etc/hostname"),
        }
    }

    /// Use a fixed address instead of route discovery.
    pub fn with_address(mut self, address: Ipv4Addr) -> Self {
        self.address = Some(address);
        self
    }

    pub fn with_hosts_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.hosts_file = path.into();
        self
    }

    pub fn with_hostname_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.hostname_file = path.into();
        self
    }

    async fn discover_address() -> Option<Ipv4Addr> {
        let socket = UdpSocket::bind("0.0.0.0:0").await.ok()?;
        socket.connect(ROUTE_PROBE).await.ok()?;
        match socket.local_addr().ok()?.ip() {
            IpAddr::V4(ip) if !ip.is_unspecified() => Some(ip),
            _ => None,
        }
    }

    async fn local_hostname(&self) -> Option<String> {
        let content = tokio::fs::read_to_string(&self.hostname_file).await.ok()?;
        let name = content.trim();
        (!name.is_empty()).then(|| name.to_string())
    }
}

/// First name listed for `ip` in a hosts file.
fn lookup_hosts(content: &str, ip: Ipv4Addr) -> Option<String> {
    content
        .lines()
        .map(|line| line.split('#').next().unwrap_or_default())
        .find_map(|line| {
            let mut fields = line.split_whitespace();
            let address = parse_ipv4(fields.next()?)?;
            (address == ip).then(|| fields.next().map(str::to_string)).flatten()
        })
}

#[async_trait]
impl NetworkPort for HostNetwork {
    async fn own_address(&self, endpoint_hint: Option<&str>) -> Option<Ipv4Addr> {
        if let Some(address) = self.address {
            return Some(address);
        }
        if let Some(hint) = endpoint_hint {
            debug!("No binding for endpoint {}, using the default route", hint);
        }
        let discovered = Self::discover_address().await;
        if discovered.is_none() {
            warn!("Could not determine the unit address");
        }
        discovered
    }

    async fn resolve_hostname(&self, ip: Ipv4Addr) -> Option<String> {
        if let Ok(content) = tokio::fs::read_to_string(&self.hosts_file).await
            && let Some(name) = lookup_hosts(&content, ip)
        {
            return Some(name);
        }
        if self.own_address(None).await == Some(ip) {
            return self.local_hostname().await;
        }
        None
    }
}
