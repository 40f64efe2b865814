//! haproxy `services` payload published on `http-services`.

use serde::Serialize;

const SERVER_CHECK: &str = "check inter 2000 rise 2 fall 3";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProxyService {
    pub service_name: String,
    pub service_host: String,
    pub service_port: u16,
    pub service_options: Vec<String>,
    /// `[name, address, port, check]` per backend.
    pub servers: Vec<(String, String, u16, String)>,
}

impl ProxyService {
    /// A single-backend round-robin service fronted by `vip`.
    pub fn single_backend(
        service_name: &str,
        vip: &str,
        port: u16,
        unit_name: &str,
        address: &str,
    ) -> Self {
        Self {
            service_name: service_name.to_string(),
            service_host: vip.to_string(),
            service_port: port,
            service_options: vec!["option nolinger".to_string(), "balance roundrobin".to_string()],
            servers: vec![(
                unit_name.replace('/', "-"),
                address.to_string(),
                port,
                SERVER_CHECK.to_string(),
            )],
        }
    }
}

/// YAML document for the `services` key; an empty list without a VIP.
pub fn services_yaml(services: &[ProxyService]) -> Result<String, serde_yaml::Error> {
    serde_yaml::to_string(services)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_backend_server_name() {
        let svc = ProxyService::single_backend(
            "contrail-analytics-api",
            "10.0.0.100",
            8081,
            "analytics/1",
            "10.0.0.3",
        );
        assert_eq!(svc.servers[0].0, "analytics-1");
        assert_eq!(svc.servers[0].3, "check inter 2000 rise 2 fall 3");
    }

    #[test]
    fn test_yaml_round_trips_as_list() {
        let svc = ProxyService::single_backend(
            "contrail-analytics-api",
            "10.0.0.100",
            8081,
            "analytics/1",
            "10.0.0.3",
        );
        let yaml = services_yaml(&[svc]).unwrap();
        let parsed: serde_yaml::Value = serde_yaml::from_str(&yaml).unwrap();

        let first = &parsed[0];
        assert_eq!(first["service_name"].as_str(), Some("contrail-analytics-api"));
        assert_eq!(first["service_port"].as_u64(), Some(8081));
        assert_eq!(first["servers"][0][1].as_str(), Some("10.0.0.3"));
    }

    #[test]
    fn test_empty_services() {
        let yaml = services_yaml(&[]).unwrap();
        let parsed: Vec<serde_yaml::Value> = serde_yaml::from_str(&yaml).unwrap();
        assert!(parsed.is_empty());
    }
}
