//! Progress notification port
//!
//! Defines the callbacks a reconciliation pass reports through.

use converge_domain::{ConvergeError, Event, GroupId, HealthState};

/// Callback for progress updates during a pass
///
/// Implementations live in the presentation layer. All methods default to
/// no-ops.
pub trait ReconcileProgress: Send + Sync {
    fn on_event(&self, _event: &Event) {}

    fn on_group_applied(&self, _group: &GroupId) {}

    fn on_group_unchanged(&self, _group: &GroupId) {}

    fn on_group_failed(&self, _group: &GroupId, _error: &ConvergeError) {}

    fn on_status(&self, _state: &HealthState) {}

    fn on_published(&self, _relation: &str) {}
}

/// No-op progress notifier for when progress reporting is not needed
pub struct NoProgress;

impl ReconcileProgress for NoProgress {}
