//! Progress reporting for reconciliation passes

use colored::Colorize;
use converge_application::ports::progress::ReconcileProgress;
use converge_domain::{ConvergeError, Event, GroupId, HealthState};

use crate::output::console::ConsoleFormatter;

/// Prints one line per pass step
pub struct ConsoleProgress {
    /// Also print groups that were left untouched
    pub show_unchanged: bool,
}

impl ConsoleProgress {
    pub fn new() -> Self {
        Self {
            show_unchanged: false,
        }
    }

    pub fn with_unchanged(mut self, show: bool) -> Self {
        self.show_unchanged = show;
        self
    }
}

impl Default for ConsoleProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ReconcileProgress for ConsoleProgress {
    fn on_event(&self, event: &Event) {
        println!("{} {}", "->".cyan(), event.to_string().bold());
    }

    fn on_group_applied(&self, group: &GroupId) {
        println!("  {} {}", "v".green(), group);
    }

    fn on_group_unchanged(&self, group: &GroupId) {
        if self.show_unchanged {
            println!("  {} {} (unchanged)", "-".dimmed(), group);
        }
    }

    fn on_group_failed(&self, group: &GroupId, error: &ConvergeError) {
        println!("  {} {} ({})", "x".red(), group, error);
    }

    fn on_status(&self, state: &HealthState) {
        println!("  {} {}", "=".cyan(), ConsoleFormatter::status(state));
    }

    fn on_published(&self, relation: &str) {
        println!("  {} {}", "^".blue(), relation);
    }
}
