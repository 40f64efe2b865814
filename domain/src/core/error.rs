//! Domain error types

use thiserror::Error;

/// Errors raised while reconciling a unit.
///
/// Every variant is recovered at the pass boundary: none of them is allowed
/// to escape and crash the agent. Some abort the pass
/// ([`ContextUnavailable`](ConvergeError::ContextUnavailable),
/// [`ImmutableConfigViolation`](ConvergeError::ImmutableConfigViolation)),
/// the others are recorded and the pass keeps going.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConvergeError {
    #[error("Context unavailable: {0}")]
    ContextUnavailable(String),

    #[error("Image could not be pulled: {image}")]
    ResourceUnavailable { image: String },

    #[error("Apply failed for service group {group}: {reason}")]
    ApplyFailed { group: String, reason: String },

    #[error("Malformed fact {key} on relation {relation}: {reason}")]
    MalformedFact {
        relation: String,
        key: String,
        reason: String,
    },

    #[error("Configuration parameter {option} couldn't be changed")]
    ImmutableConfigViolation { option: String },

    #[error("State store error: {0}")]
    StateStore(String),

    #[error("Invalid unit profile: {0}")]
    InvalidProfile(String),
}

impl ConvergeError {
    /// Whether this error aborts the pass instead of being recorded.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ConvergeError::ContextUnavailable(_)
                | ConvergeError::ImmutableConfigViolation { .. }
                | ConvergeError::StateStore(_)
                | ConvergeError::InvalidProfile(_)
        )
    }
}
