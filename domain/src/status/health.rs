//! Health state reported through the status sink.

use serde::{Deserialize, Serialize};

/// Coarse three-state health signal with a human-readable reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "reason", rename_all = "lowercase")]
pub enum HealthState {
    Blocked(String),
    Maintenance(String),
    Active(String),
}

impl HealthState {
    pub fn blocked(reason: impl Into<String>) -> Self {
        HealthState::Blocked(reason.into())
    }

    pub fn maintenance(reason: impl Into<String>) -> Self {
        HealthState::Maintenance(reason.into())
    }

    pub fn active(reason: impl Into<String>) -> Self {
        HealthState::Active(reason.into())
    }

    pub fn label(&self) -> &'static str {
        match self {
            HealthState::Blocked(_) => "blocked",
            HealthState::Maintenance(_) => "maintenance",
            HealthState::Active(_) => "active",
        }
    }

    pub fn reason(&self) -> &str {
        match self {
            HealthState::Blocked(r) | HealthState::Maintenance(r) | HealthState::Active(r) => r,
        }
    }

    pub fn is_blocked(&self) -> bool {
        matches!(self, HealthState::Blocked(_))
    }

    pub fn is_active(&self) -> bool {
        matches!(self, HealthState::Active(_))
    }
}

impl std::fmt::Display for HealthState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.label(), self.reason())
    }
}

/// Outcome of the up-front resource availability check.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ResourceCheck {
    #[default]
    Available,
    Unavailable { resource: String },
}
