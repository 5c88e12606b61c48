//! Engine configuration.

use serde::{Deserialize, Serialize};

/// Tunables for auto-assignment and apply.
///
/// Missing fields fall back to [`EngineConfig::default`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum number of `assign_user` calls in flight during apply.
    pub apply_concurrency: usize,

    /// Whether unassigned cancelled tasks still get proposals.
    pub include_cancelled: bool,
}

impl EngineConfig {
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }

    /// `apply_concurrency`, never below 1.
    pub fn effective_apply_concurrency(&self) -> usize {
        self.apply_concurrency.max(1)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            apply_concurrency: 8,
            include_cancelled: true,
        }
    }
}
