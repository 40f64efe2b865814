//! Host network adapters

mod host_network;

pub use host_network::HostNetwork;
