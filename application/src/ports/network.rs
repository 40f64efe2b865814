//! Network facts port

use async_trait::async_trait;
use std::net::Ipv4Addr;

/// Local network primitives.
///
/// Both lookups return `None` instead of failing; the caller decides
/// whether a missing answer is fatal.
#[async_trait]
pub trait NetworkPort: Send + Sync {
    /// Address of this unit, optionally on the network bound to
    /// `endpoint_hint`.
    async fn own_address(&self, endpoint_hint: Option<&str>) -> Option<Ipv4Addr>;

    async fn resolve_hostname(&self, ip: Ipv4Addr) -> Option<String>;
}
