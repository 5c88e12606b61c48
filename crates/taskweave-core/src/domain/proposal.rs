//! Assignment proposal model.
//!
//! A proposal moves through a small state machine:
//!
//! ```text
//! Accepted <-> Rejected
//!    |
//!    +-- apply --> Applied
//!    +-- apply --> Failed --(accept)--> Accepted
//! ```
//!
//! New proposals start as `Accepted`. "Accepted and rejected at once" has no
//! representation.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::ids::{ProjectId, TaskId, UserId};
use super::task::TaskSnapshot;

/// Identifies the task a proposal is about. Task ids are only unique per project.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalKey {
    pub project_id: ProjectId,
    pub task_id: TaskId,
}

impl ProposalKey {
    pub fn new(project_id: impl Into<ProjectId>, task_id: impl Into<TaskId>) -> Self {
        Self {
            project_id: project_id.into(),
            task_id: task_id.into(),
        }
    }
}

impl fmt::Display for ProposalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.project_id, self.task_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProposalState {
    Accepted,
    Rejected,
    Applied,
    Failed { reason: String },
}

/// A candidate (task, user) assignment awaiting review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentProposal {
    pub task: TaskSnapshot,
    pub proposed_user_id: UserId,
    pub state: ProposalState,
}

impl AssignmentProposal {
    pub fn new(task: TaskSnapshot, proposed_user_id: UserId) -> Self {
        Self {
            task,
            proposed_user_id,
            state: ProposalState::Accepted,
        }
    }

    pub fn key(&self) -> ProposalKey {
        ProposalKey::new(self.task.project_id.clone(), self.task.task_id.clone())
    }

    pub fn is_accepted(&self) -> bool {
        self.state == ProposalState::Accepted
    }

    pub fn is_rejected(&self) -> bool {
        self.state == ProposalState::Rejected
    }

    /// Whether the applier should commit this proposal.
    pub fn is_selected(&self) -> bool {
        self.is_accepted()
    }
}

/// Why an eligible task did not get a proposal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SkipReason {
    /// The task's project has no members.
    EmptyRoster,
    /// The round-robin pick does not resolve to a known user.
    UnresolvedUser { user_id: UserId },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedTask {
    pub key: ProposalKey,
    #[serde(flatten)]
    pub reason: SkipReason,
}
