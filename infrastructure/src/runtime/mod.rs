//! Container runtime adapters

mod docker;

pub use docker::DockerComposeLifecycle;
