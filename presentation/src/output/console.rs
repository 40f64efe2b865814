//! Console output formatter for pass reports

use colored::Colorize;
use converge_application::PassReport;
use converge_domain::HealthState;
use serde_json::json;

/// Formats pass reports for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Format a completed pass
    pub fn format(report: &PassReport) -> String {
        let mut output = String::new();

        output.push_str(&format!(
            "{} {}\n",
            "Event:".cyan().bold(),
            report.event
        ));
        output.push_str(&format!(
            "{} {}\n",
            "Status:".cyan().bold(),
            Self::status(&report.status)
        ));

        if !report.config_changed.is_empty() {
            output.push_str(&Self::list("Config changed:", &report.config_changed));
        }
        if !report.config_cleared.is_empty() {
            output.push_str(&Self::list("Config cleared:", &report.config_cleared));
        }
        if !report.pruned_peers.is_empty() {
            output.push_str(&Self::list("Peers pruned:", &report.pruned_peers));
        }

        match &report.convergence {
            Some(outcome) => {
                let applied: Vec<String> =
                    outcome.applied.iter().map(ToString::to_string).collect();
                if applied.is_empty() {
                    output.push_str(&format!("{} nothing changed\n", "Applied:".cyan().bold()));
                } else {
                    output.push_str(&Self::list("Applied:", &applied));
                }
                if let Some(group) = &outcome.aborted_at {
                    output.push_str(&format!(
                        "{} at {}\n",
                        "Aborted:".red().bold(),
                        group
                    ));
                }
            }
            None => output.push_str(&format!("{} skipped\n", "Convergence:".cyan().bold())),
        }

        if !report.published.is_empty() {
            output.push_str(&Self::list("Published:", &report.published));
        }

        if !report.issues.is_empty() {
            output.push_str(&format!("{}\n", "Issues:".yellow().bold()));
            for issue in &report.issues {
                output.push_str(&format!("  * {}\n", issue));
            }
        }

        output
    }

    /// Format as JSON
    pub fn format_json(report: &PassReport) -> String {
        let convergence = report.convergence.as_ref().map(|outcome| {
            json!({
                "applied": outcome.applied.iter().map(ToString::to_string).collect::<Vec<_>>(),
                "unchanged": outcome.unchanged.iter().map(ToString::to_string).collect::<Vec<_>>(),
                "aborted_at": outcome.aborted_at.as_ref().map(ToString::to_string),
            })
        });
        let doc = json!({
            "event": report.event,
            "status": report.status,
            "config_changed": report.config_changed,
            "config_cleared": report.config_cleared,
            "pruned_peers": report.pruned_peers,
            "convergence": convergence,
            "published": report.published,
            "issues": report.issues,
        });
        serde_json::to_string_pretty(&doc).unwrap_or_else(|_| "{}".to_string())
    }

    /// Colored `label: reason`
    pub fn status(state: &HealthState) -> String {
        let label = match state {
            HealthState::Active(_) => state.label().green().bold(),
            HealthState::Maintenance(_) => state.label().yellow().bold(),
            HealthState::Blocked(_) => state.label().red().bold(),
        };
        format!("{}: {}", label, state.reason())
    }

    fn list(title: &str, items: &[String]) -> String {
        format!("{} {}\n", title.cyan().bold(), items.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use converge_application::ConvergeOutcome;
    use converge_domain::GroupId;

    fn report() -> PassReport {
        PassReport {
            event: "relation-changed".to_string(),
            status: HealthState::active("Unit ready"),
            config_changed: vec!["auth_info".to_string()],
            config_cleared: Vec::new(),
            pruned_peers: Vec::new(),
            convergence: Some(ConvergeOutcome {
                applied: vec![GroupId::new("webui")],
                unchanged: vec![GroupId::new("common")],
                failures: Vec::new(),
                aborted_at: None,
            }),
            published: vec!["contrail-analytics".to_string()],
            issues: vec!["Malformed fact".to_string()],
        }
    }

    #[test]
    fn test_format_text() {
        colored::control::set_override(false);
        let text = ConsoleFormatter::format(&report());

        assert!(text.contains("Status: active: Unit ready"));
        assert!(text.contains("Config changed: auth_info"));
        assert!(text.contains("Applied: webui"));
        assert!(text.contains("Published: contrail-analytics"));
        assert!(text.contains("  * Malformed fact"));
    }

    #[test]
    fn test_format_json() {
        let json = ConsoleFormatter::format_json(&report());
        let doc: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(doc["status"]["state"], "active");
        assert_eq!(doc["convergence"]["applied"][0], "webui");
        assert!(doc["convergence"]["aborted_at"].is_null());
    }

    #[test]
    fn test_skipped_convergence() {
        colored::control::set_override(false);
        let mut report = report();
        report.convergence = None;
        report.status = HealthState::blocked("Missing relations: identity");

        let text = ConsoleFormatter::format(&report);

        assert!(text.contains("Convergence: skipped"));
        assert!(text.contains("blocked: Missing relations: identity"));
    }
}
