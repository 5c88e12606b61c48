//! Outcome of one apply run.
//!
//! Partial success is an expected result, not an error, so failures are
//! collected here instead of being returned as `Err`.

use serde::Serialize;

use super::errors::SourceError;
use super::ids::UserId;
use super::proposal::ProposalKey;

/// One remote write that did not go through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentFailure {
    pub key: ProposalKey,
    pub user_id: UserId,
    pub error: SourceError,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyResult {
    pub success_count: usize,
    pub failures: Vec<AssignmentFailure>,

    /// Keys of the proposals that were committed, in completion order.
    pub applied: Vec<ProposalKey>,

    /// The run stopped before every selected proposal was attempted.
    pub cancelled: bool,
}

impl ApplyResult {
    pub fn record_success(&mut self, key: ProposalKey) {
        self.success_count += 1;
        self.applied.push(key);
    }

    pub fn record_failure(&mut self, key: ProposalKey, user_id: UserId, error: SourceError) {
        self.failures.push(AssignmentFailure {
            key,
            user_id,
            error,
        });
    }

    /// Number of writes that completed, successfully or not.
    pub fn attempted(&self) -> usize {
        self.success_count + self.failures.len()
    }

    pub fn is_complete_success(&self) -> bool {
        self.failures.is_empty() && !self.cancelled
    }

    pub fn summary(&self) -> String {
        format!(
            "{} of {} assignments applied",
            self.success_count,
            self.attempted()
        )
    }

    pub fn report(&self) -> ApplyReport {
        ApplyReport {
            success_count: self.success_count,
            attempted: self.attempted(),
            applied: self.applied.clone(),
            cancelled: self.cancelled,
            failures: self
                .failures
                .iter()
                .map(|f| FailureReport {
                    key: f.key.clone(),
                    user_id: f.user_id.clone(),
                    error: f.error.to_string(),
                    retryable: f.error.is_retryable(),
                })
                .collect(),
        }
    }
}

/// Serializable view of an [`ApplyResult`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyReport {
    pub success_count: usize,
    pub attempted: usize,
    pub applied: Vec<ProposalKey>,
    pub cancelled: bool,
    pub failures: Vec<FailureReport>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureReport {
    pub key: ProposalKey,
    pub user_id: UserId,
    pub error: String,
    pub retryable: bool,
}
