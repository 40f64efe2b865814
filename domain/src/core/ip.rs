//! IPv4 helpers.
//!
//! Peer address lists must be ordered the same way on every unit regardless
//! of relation delivery order, so they are sorted by the 32-bit numeric value
//! of the address rather than lexically (`10.0.0.10` sorts after `10.0.0.9`).

use std::net::Ipv4Addr;

/// Parse a peer-published address, tolerating surrounding whitespace.
pub fn parse_ipv4(raw: &str) -> Option<Ipv4Addr> {
    raw.trim().parse().ok()
}

/// Deduplicate and sort addresses by their numeric value.
pub fn sort_dedup(mut ips: Vec<Ipv4Addr>) -> Vec<Ipv4Addr> {
    ips.sort_by_key(|ip| u32::from(*ip));
    ips.dedup();
    ips
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_ordering() {
        let ips = vec![
            "10.0.0.10".parse().unwrap(),
            "10.0.0.9".parse().unwrap(),
            "9.255.255.255".parse().unwrap(),
        ];
        let sorted: Vec<String> = sort_dedup(ips).iter().map(|ip| ip.to_string()).collect();
        assert_eq!(sorted, vec!["9.255.255.255", "10.0.0.9", "10.0.0.10"]);
    }

    #[test]
    fn test_dedup() {
        let ips = vec!["10.0.0.1".parse().unwrap(), "10.0.0.1".parse().unwrap()];
        assert_eq!(sort_dedup(ips).len(), 1);
    }

    #[test]
    fn test_parse_rejects_hostnames() {
        assert!(parse_ipv4(" 10.0.0.1 ").is_some());
        assert!(parse_ipv4("controller-0").is_none());
        assert!(parse_ipv4("").is_none());
    }
}
