//! Reconcile parameters - pass behavior control.
//!
//! [`ReconcileParams`] groups the static parameters of
//! [`ReconcileUseCase`](crate::use_cases::reconcile::ReconcileUseCase) that
//! are operator choices rather than role policy.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileParams {
    /// Skip the up-front image pull (images are pre-loaded).
    pub skip_image_pull: bool,
    /// Tag used when the `image-tag` option is not set.
    pub default_image_tag: String,
    /// Endpoint whose network the unit's own address is taken from.
    pub endpoint_hint: Option<String>,
}

impl Default for ReconcileParams {
    fn default() -> Self {
        Self {
            skip_image_pull: false,
            default_image_tag: "latest".to_string(),
            endpoint_hint: None,
        }
    }
}

impl ReconcileParams {
    // ==================== Builder Methods ====================

    pub fn with_skip_image_pull(mut self, skip: bool) -> Self {
        self.skip_image_pull = skip;
        self
    }

    pub fn with_default_image_tag(mut self, tag: impl Into<String>) -> Self {
        self.default_image_tag = tag.into();
        self
    }

    pub fn with_endpoint_hint(mut self, hint: impl Into<String>) -> Self {
        self.endpoint_hint = Some(hint.into());
        self
    }
}
