//! CLI command definitions

use clap::{Parser, Subcommand, ValueEnum};
use converge_domain::{Event, UnitRole};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Output format for pass reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable summary
    Text,
    /// JSON document
    Json,
}

/// CLI arguments for converge-agent
#[derive(Parser, Debug)]
#[command(name = "converge-agent")]
#[command(author, version, about = "Event-driven reconciliation agent for Contrail units")]
#[command(long_about = r#"
converge-agent runs one convergence pass per inbound event. Each pass
rebuilds the unit context from local options and peer facts, renders the
service configuration, restarts only the service groups whose inputs
changed, reports a health status and publishes facts back to peers.

Configuration files are loaded from (in priority order):
1. CONVERGE_* environment variables
2. --config <path>     Explicit config file
3. ./converge.toml     Project-level config
4. ~/.config/converge-agent/config.toml   Global config

Example:
  converge-agent --role keystone-auth relation-changed identity-admin keystone/0
  converge-agent --role agent config-changed --set dpdk=false --set log-level=SYS_DEBUG
  converge-agent --role controller update-status
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Role of this unit (overrides unit.role)
    #[arg(long, value_parser = parse_role, global = true)]
    pub role: Option<UnitRole>,

    /// State directory (overrides state.dir)
    #[arg(long, value_name = "DIR", global = true)]
    pub state_dir: Option<PathBuf>,

    /// Log container runtime commands instead of running them
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text", global = true)]
    pub output: OutputFormat,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress progress output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long, global = true)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// First pass after the unit is deployed
    Install,
    /// Operator options changed
    ConfigChanged {
        /// Option as key=value; the value is parsed as JSON when possible
        #[arg(long = "set", value_name = "KEY=VALUE", value_parser = parse_option)]
        options: Vec<(String, Value)>,

        /// JSON object with the full option set
        #[arg(long, value_name = "PATH")]
        options_file: Option<PathBuf>,
    },
    /// A peer joined a relation
    RelationJoined { relation: String, peer: String },
    /// A peer changed its published facts
    RelationChanged { relation: String, peer: String },
    /// A peer left a relation
    RelationDeparted { relation: String, peer: String },
    /// Periodic heartbeat
    UpdateStatus,
    /// The agent was upgraded in place
    UpgradeCharm,
    /// Print the last reported status
    Status,
}

impl Command {
    /// The event this command delivers; `None` for commands that do not
    /// run a pass. `file_options` are the parsed `--options-file` contents.
    pub fn to_event(&self, file_options: BTreeMap<String, Value>) -> Option<Event> {
        let event = match self {
            Command::Install => Event::Install,
            Command::ConfigChanged { options, .. } => {
                let mut merged = file_options;
                merged.extend(options.iter().cloned());
                Event::ConfigChanged { options: merged }
            }
            Command::RelationJoined { relation, peer } => Event::RelationJoined {
                relation: relation.clone(),
                peer: peer.clone(),
            },
            Command::RelationChanged { relation, peer } => Event::RelationChanged {
                relation: relation.clone(),
                peer: peer.clone(),
            },
            Command::RelationDeparted { relation, peer } => Event::RelationDeparted {
                relation: relation.clone(),
                peer: peer.clone(),
            },
            Command::UpdateStatus => Event::UpdateStatus,
            Command::UpgradeCharm => Event::UpgradeCharm,
            Command::Status => return None,
        };
        Some(event)
    }
}

fn parse_role(s: &str) -> Result<UnitRole, String> {
    s.parse()
}

/// Parse `key=value`. `true`, `42` and `["a"]` become JSON values, anything
/// else is kept as a string.
pub fn parse_option(s: &str) -> Result<(String, Value), String> {
    let (key, raw) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", s))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty option name in '{}'", s));
    }
    let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    Ok((key.to_string(), value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_option_values() {
        assert_eq!(parse_option("dpdk=true").unwrap(), ("dpdk".to_string(), json!(true)));
        assert_eq!(
            parse_option("log-level=SYS_DEBUG").unwrap(),
            ("log-level".to_string(), json!("SYS_DEBUG"))
        );
        assert_eq!(parse_option("image-tag=5").unwrap().1, json!(5));
        assert_eq!(parse_option("vhost-gateway=").unwrap().1, json!(""));
        assert!(parse_option("no-equals").is_err());
        assert!(parse_option("=x").is_err());
    }

    #[test]
    fn test_parse_relation_changed() {
        let cli = Cli::try_parse_from([
            "converge-agent",
            "--role",
            "keystone-auth",
            "relation-changed",
            "identity-admin",
            "keystone/0",
        ])
        .unwrap();

        assert_eq!(cli.role, Some(UnitRole::KeystoneAuth));
        let event = cli.command.unwrap().to_event(BTreeMap::new()).unwrap();
        assert_eq!(
            event,
            Event::RelationChanged {
                relation: "identity-admin".to_string(),
                peer: "keystone/0".to_string(),
            }
        );
    }

    #[test]
    fn test_config_changed_set_overrides_file() {
        let cli = Cli::try_parse_from([
            "converge-agent",
            "config-changed",
            "--set",
            "dpdk=false",
            "-vv",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);

        let file = BTreeMap::from([
            ("dpdk".to_string(), json!(true)),
            ("log-level".to_string(), json!("SYS_INFO")),
        ]);
        let Some(Event::ConfigChanged { options }) = cli.command.unwrap().to_event(file) else {
            panic!("Expected ConfigChanged");
        };
        assert_eq!(options["dpdk"], json!(false));
        assert_eq!(options["log-level"], json!("SYS_INFO"));
    }

    #[test]
    fn test_status_runs_no_pass() {
        let cli = Cli::try_parse_from(["converge-agent", "status"]).unwrap();
        assert!(cli.command.unwrap().to_event(BTreeMap::new()).is_none());
    }

    #[test]
    fn test_unknown_role_rejected() {
        assert!(Cli::try_parse_from(["converge-agent", "--role", "database", "install"]).is_err());
    }
}
