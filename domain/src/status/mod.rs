//! Unit health derivation.

pub mod evaluator;
pub mod health;

pub use evaluator::{Checklist, FactRequirement, RelationRequirement, StatusEvaluator, UNIT_READY};
pub use health::{HealthState, ResourceCheck};
