//! CLI entrypoint for converge-agent
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;
use converge_application::{NoProgress, ReconcilePorts, ReconcileProgress, ReconcileUseCase};
use converge_domain::{UnitProfile, core::ip::parse_ipv4};
use converge_infrastructure::{
    ConfigLoader, DockerComposeLifecycle, FileConfig, FileRelationAdapter, FileStatusSink,
    FsArtifactWriter, HandlebarsRenderer, HostNetwork, JsonStateStore,
};
use converge_presentation::{Cli, Command, ConsoleFormatter, ConsoleProgress, OutputFormat};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.show_config {
        ConfigLoader::print_config_sources();
        return Ok(());
    }

    let mut config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref())
            .map_err(|e| anyhow!("Invalid configuration: {}", e))?
    };
    apply_overrides(&cli, &mut config);
    config.validate()?;

    let _log_guard = init_logging(cli.verbose, config.logging.dir.as_deref());

    if !config.output.color {
        colored::control::set_override(false);
    }

    let Some(command) = cli.command.clone() else {
        bail!("No event given. Run with --help to list the events.");
    };

    if command == Command::Status {
        return print_status(&config).await;
    }

    let file_options = match &command {
        Command::ConfigChanged {
            options_file: Some(path),
            ..
        } => read_options(path)?,
        _ => BTreeMap::new(),
    };
    let Some(event) = command.to_event(file_options) else {
        return Ok(());
    };

    let Some(role) = config.unit.role else {
        bail!("unit.role must be set");
    };
    let unit_name = config
        .unit
        .unit_name()
        .context("unit.name could not be derived")?;
    info!("Starting converge-agent as {} ({})", unit_name, role);

    // === Dependency Injection ===
    let ports = build_ports(&config, unit_name)?;
    let use_case =
        ReconcileUseCase::new(UnitProfile::for_role(role), config.reconcile_params(), ports);

    let progress: Box<dyn ReconcileProgress> = if cli.quiet || cli.output == OutputFormat::Json {
        Box::new(NoProgress)
    } else {
        Box::new(ConsoleProgress::new().with_unchanged(cli.verbose > 0))
    };

    match use_case.execute_with_progress(event, progress.as_ref()).await {
        Ok(report) => {
            match cli.output {
                OutputFormat::Text => {
                    if !cli.quiet {
                        println!();
                        print!("{}", ConsoleFormatter::format(&report));
                    }
                }
                OutputFormat::Json => println!("{}", ConsoleFormatter::format_json(&report)),
            }
            Ok(())
        }
        Err(e) => {
            error!("Pass failed: {}", e);
            Err(e.into())
        }
    }
}

/// Command-line flags win over every configuration source.
fn apply_overrides(cli: &Cli, config: &mut FileConfig) {
    if let Some(role) = cli.role {
        config.unit.role = Some(role);
    }
    if let Some(dir) = &cli.state_dir {
        config.state.dir = dir.clone();
    }
    if cli.dry_run {
        config.runtime.dry_run = true;
    }
}

/// Console logging by `-v` count, plus JSON lines in `dir` when configured.
fn init_logging(verbose: u8, dir: Option<&Path>) -> Option<WorkerGuard> {
    let filter = match verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"), // -vvv or more
    };

    let Some(dir) = dir else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
        return None;
    };

    let appender = tracing_appender::rolling::daily(dir, "converge-agent.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(tracing_subscriber::fmt::layer().json().with_writer(writer))
        .init();
    Some(guard)
}

fn build_ports(config: &FileConfig, unit_name: String) -> Result<ReconcilePorts> {
    let mut network = HostNetwork::new();
    if let Some(raw) = &config.unit.address {
        let address = parse_ipv4(raw)
            .with_context(|| format!("unit.address '{}' is not an IPv4 address", raw))?;
        network = network.with_address(address);
    }

    let renderer = match &config.runtime.templates_dir {
        Some(dir) => HandlebarsRenderer::with_overrides(dir)?,
        None => HandlebarsRenderer::new()?,
    };

    let lifecycle = DockerComposeLifecycle::new(config.runtime.docker.clone())
        .with_root(config.runtime.root.clone())
        .with_dry_run(config.runtime.dry_run);

    let relation =
        FileRelationAdapter::new(unit_name, config.inbound_file(), config.outbound_file())
            .with_leader(config.unit.leader);

    Ok(ReconcilePorts {
        relation: Arc::new(relation),
        store: Arc::new(JsonStateStore::new(config.state_file())),
        network: Arc::new(network),
        lifecycle: Arc::new(lifecycle),
        renderer: Arc::new(renderer),
        writer: Arc::new(FsArtifactWriter::new(config.runtime.root.clone())),
        status: Arc::new(FileStatusSink::new(config.status_file())),
    })
}

/// Read an `--options-file` JSON object.
fn read_options(path: &Path) -> Result<BTreeMap<String, Value>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("{} is not a JSON object", path.display()))
}

async fn print_status(config: &FileConfig) -> Result<()> {
    let sink = FileStatusSink::new(config.status_file());
    match sink.read().await? {
        Some(record) => println!("{}: {} ({})", record.state, record.reason, record.updated_at),
        None => println!("No status reported yet"),
    }
    Ok(())
}
