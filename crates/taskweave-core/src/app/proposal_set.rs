//! AssignmentProposalSet - レビューセッション内の提案一覧
//!
//! 1 回の画面訪問（レビューセッション）が排他的に所有する。永続化はしない。

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::{
    ApplyResult, AssignmentProposal, ProposalKey, ProposalState, ReviewError, SessionId,
    SkippedTask,
};

/// Session-scoped, mutable collection of proposals with accept / reject state.
///
/// Review operations never touch a proposal that was already applied.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentProposalSet {
    session_id: SessionId,
    created_at: DateTime<Utc>,
    proposals: Vec<AssignmentProposal>,
    skipped: Vec<SkippedTask>,
}

impl AssignmentProposalSet {
    pub fn new(
        session_id: SessionId,
        created_at: DateTime<Utc>,
        proposals: Vec<AssignmentProposal>,
        skipped: Vec<SkippedTask>,
    ) -> Self {
        Self {
            session_id,
            created_at,
            proposals,
            skipped,
        }
    }

    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn proposals(&self) -> &[AssignmentProposal] {
        &self.proposals
    }

    /// Eligible tasks that did not get a proposal, with the reason.
    pub fn skipped(&self) -> &[SkippedTask] {
        &self.skipped
    }

    pub fn len(&self) -> usize {
        self.proposals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.proposals.is_empty()
    }

    pub fn get(&self, key: &ProposalKey) -> Option<&AssignmentProposal> {
        self.proposals.iter().find(|p| p.key() == *key)
    }

    /// Proposals the applier will commit.
    pub fn selected(&self) -> impl Iterator<Item = &AssignmentProposal> {
        self.proposals.iter().filter(|p| p.is_selected())
    }

    pub fn selected_count(&self) -> usize {
        self.selected().count()
    }

    pub fn accept(&mut self, key: &ProposalKey) -> Result<&mut Self, ReviewError> {
        self.transition(key, ProposalState::Accepted)
    }

    pub fn reject(&mut self, key: &ProposalKey) -> Result<&mut Self, ReviewError> {
        self.transition(key, ProposalState::Rejected)
    }

    pub fn accept_all(&mut self) -> &mut Self {
        self.transition_all(ProposalState::Accepted)
    }

    pub fn reject_all(&mut self) -> &mut Self {
        self.transition_all(ProposalState::Rejected)
    }

    fn transition(
        &mut self,
        key: &ProposalKey,
        next: ProposalState,
    ) -> Result<&mut Self, ReviewError> {
        let proposal = self
            .proposals
            .iter_mut()
            .find(|p| p.key() == *key)
            .ok_or_else(|| ReviewError::UnknownProposal(key.clone()))?;
        if proposal.state == ProposalState::Applied {
            return Err(ReviewError::AlreadyApplied(key.clone()));
        }
        proposal.state = next;
        Ok(self)
    }

    fn transition_all(&mut self, next: ProposalState) -> &mut Self {
        for proposal in &mut self.proposals {
            if proposal.state != ProposalState::Applied {
                proposal.state = next.clone();
            }
        }
        self
    }

    /// Move every attempted proposal to `Applied` or `Failed`.
    pub fn record_outcome(&mut self, result: &ApplyResult) {
        for proposal in &mut self.proposals {
            let key = proposal.key();
            if result.applied.contains(&key) {
                proposal.state = ProposalState::Applied;
            } else if let Some(failure) = result.failures.iter().find(|f| f.key == key) {
                proposal.state = ProposalState::Failed {
                    reason: failure.error.to_string(),
                };
            }
        }
    }
}
