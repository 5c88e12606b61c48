//! ProposalApplier - 承認済み提案の一括適用
//!
//! # 設計原則
//! - 1 件ずつ独立した `assign_user` 呼び出し（トランザクションなし）
//! - 1 件の失敗で他を止めない。失敗は ApplyResult に集約する
//! - 書き込みは互いに無関係なドキュメントなので並行に投げる（順序保証なし）
//! - 途中でキャンセルされても、完了済みの書き込みはそのまま（ロールバックしない）
//! - キャンセルは CancellationToken で受け取り、それまでの ApplyResult を返す

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use super::config::EngineConfig;
use super::proposal_set::AssignmentProposalSet;
use crate::domain::{ApplyError, ApplyResult, AssignmentProposal};
use crate::ports::TaskSource;

pub struct ProposalApplier {
    tasks: Arc<dyn TaskSource>,
    config: EngineConfig,
    cancellation_token: CancellationToken,
}

impl ProposalApplier {
    pub fn new(tasks: Arc<dyn TaskSource>) -> Self {
        Self {
            tasks,
            config: EngineConfig::default(),
            cancellation_token: CancellationToken::new(),
        }
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Stop applying once `token` is cancelled.
    ///
    /// Writes still in flight at that point are abandoned and not reported;
    /// the returned [`ApplyResult`] has `cancelled` set.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation_token = token;
        self
    }

    /// Request cancellation of the current and any later apply run.
    pub fn cancel(&self) {
        self.cancellation_token.cancel();
    }

    /// Commit every selected proposal of the set.
    pub async fn apply(&self, set: &AssignmentProposalSet) -> Result<ApplyResult, ApplyError> {
        let span = tracing::info_span!("apply_proposals", session = %set.session_id());
        self.apply_proposals(set.proposals()).instrument(span).await
    }

    /// Commit every proposal that is accepted and not rejected.
    ///
    /// Fails with [`ApplyError::NoSelection`] before any write when nothing qualifies.
    pub async fn apply_proposals(
        &self,
        proposals: &[AssignmentProposal],
    ) -> Result<ApplyResult, ApplyError> {
        let selected: Vec<&AssignmentProposal> =
            proposals.iter().filter(|p| p.is_selected()).collect();
        if selected.is_empty() {
            return Err(ApplyError::NoSelection);
        }
        let total = selected.len();

        let mut writes = stream::iter(selected)
            .map(|proposal| async move {
                let key = proposal.key();
                let outcome = self
                    .tasks
                    .assign_user(&key.project_id, &key.task_id, &proposal.proposed_user_id)
                    .await;
                (key, proposal, outcome)
            })
            .buffer_unordered(self.config.effective_apply_concurrency());

        let mut result = ApplyResult::default();
        loop {
            let next = tokio::select! {
                biased;
                _ = self.cancellation_token.cancelled() => {
                    result.cancelled = true;
                    break;
                }
                next = writes.next() => next,
            };
            let Some((key, proposal, outcome)) = next else {
                break;
            };
            match outcome {
                Ok(()) => {
                    tracing::debug!(%key, user_id = %proposal.proposed_user_id, "assignment applied");
                    result.record_success(key);
                }
                Err(error) => {
                    tracing::warn!(%key, user_id = %proposal.proposed_user_id, %error, "assignment failed");
                    result.record_failure(key, proposal.proposed_user_id.clone(), error);
                }
            }
        }

        if result.cancelled {
            tracing::warn!(
                attempted = result.attempted(),
                total,
                "apply cancelled; remaining proposals left untouched"
            );
        }
        tracing::info!(
            applied = result.success_count,
            failed = result.failures.len(),
            total,
            "{}",
            result.summary()
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ProposalKey, SessionId, SourceError, TaskSnapshot, UserId};
    use crate::domain::{ProjectId, ProposalState, TaskId};
    use crate::impls::{InMemoryWorkspace, WorkspaceFixture};
    use async_trait::async_trait;
    use chrono::Utc;
    use std::time::Duration;
    use tokio::sync::{Barrier, Notify};
    use ulid::Ulid;

    /// Delegates to an in-memory store, but never finishes writing `stuck`.
    struct StuckStore {
        inner: Arc<InMemoryWorkspace>,
        stuck: TaskId,
        reached: Notify,
    }

    #[async_trait]
    impl TaskSource for StuckStore {
        async fn tasks_in_project(
            &self,
            project_id: &ProjectId,
        ) -> Result<Vec<TaskSnapshot>, SourceError> {
            self.inner.tasks_in_project(project_id).await
        }

        async fn assign_user(
            &self,
            project_id: &ProjectId,
            task_id: &TaskId,
            user_id: &UserId,
        ) -> Result<(), SourceError> {
            if *task_id == self.stuck {
                self.reached.notify_one();
                std::future::pending::<()>().await;
            }
            self.inner.assign_user(project_id, task_id, user_id).await
        }

        async fn update_dependencies(
            &self,
            project_id: &ProjectId,
            task_id: &TaskId,
            dependencies: &[TaskId],
        ) -> Result<(), SourceError> {
            self.inner
                .update_dependencies(project_id, task_id, dependencies)
                .await
        }
    }

    /// Every write waits until `barrier` has as many writers as it expects.
    struct LatchedStore {
        inner: Arc<InMemoryWorkspace>,
        barrier: Barrier,
    }

    #[async_trait]
    impl TaskSource for LatchedStore {
        async fn tasks_in_project(
            &self,
            project_id: &ProjectId,
        ) -> Result<Vec<TaskSnapshot>, SourceError> {
            self.inner.tasks_in_project(project_id).await
        }

        async fn assign_user(
            &self,
            project_id: &ProjectId,
            task_id: &TaskId,
            user_id: &UserId,
        ) -> Result<(), SourceError> {
            self.barrier.wait().await;
            self.inner.assign_user(project_id, task_id, user_id).await
        }

        async fn update_dependencies(
            &self,
            project_id: &ProjectId,
            task_id: &TaskId,
            dependencies: &[TaskId],
        ) -> Result<(), SourceError> {
            self.inner
                .update_dependencies(project_id, task_id, dependencies)
                .await
        }
    }

    fn fixture(tasks: usize) -> WorkspaceFixture {
        let mut fixture = WorkspaceFixture::default()
            .project("p", "P")
            .member("p", "u1")
            .user("u1");
        for i in 0..tasks {
            fixture = fixture.task(TaskSnapshot::new("p", format!("t{i}"), "T"));
        }
        fixture
    }

    fn proposals(tasks: usize) -> AssignmentProposalSet {
        let proposals = (0..tasks)
            .map(|i| {
                AssignmentProposal::new(TaskSnapshot::new("p", format!("t{i}"), "T"), UserId::new("u1"))
            })
            .collect();
        AssignmentProposalSet::new(SessionId::from(Ulid::new()), Utc::now(), proposals, Vec::new())
    }

    #[tokio::test]
    async fn accept_all_applies_everything() {
        let store = Arc::new(InMemoryWorkspace::from_fixture(fixture(5)));
        let applier = ProposalApplier::new(store.clone());

        let mut set = proposals(5);
        set.accept_all();
        let result = applier.apply(&set).await.unwrap();

        assert_eq!(result.success_count, set.len());
        assert!(result.is_complete_success());
        assert_eq!(store.assign_calls().await.len(), 5);
    }

    #[tokio::test]
    async fn reject_all_fails_with_no_selection_and_writes_nothing() {
        let store = Arc::new(InMemoryWorkspace::from_fixture(fixture(2)));
        let applier = ProposalApplier::new(store.clone());

        let mut set = proposals(2);
        set.reject_all();

        assert_eq!(applier.apply(&set).await, Err(ApplyError::NoSelection));
        assert!(store.assign_calls().await.is_empty());
    }

    #[tokio::test]
    async fn one_failure_does_not_stop_the_others() {
        let store = Arc::new(InMemoryWorkspace::from_fixture(fixture(3)));
        store
            .fail_assignment(ProposalKey::new("p", "t1"), SourceError::transient("timeout"))
            .await;
        let applier = ProposalApplier::new(store.clone()).with_config(EngineConfig {
            apply_concurrency: 1,
            ..EngineConfig::default()
        });

        let result = applier.apply(&proposals(3)).await.unwrap();

        assert_eq!(result.success_count, 2);
        assert_eq!(result.failures.len(), 1);
        assert_eq!(result.failures[0].key, ProposalKey::new("p", "t1"));
        assert!(result.failures[0].error.is_retryable());
        assert_eq!(store.assign_calls().await.len(), 3);
    }

    #[tokio::test]
    async fn missing_task_is_reported_per_proposal() {
        // t9 is proposed but not in the store
        let store = Arc::new(InMemoryWorkspace::from_fixture(fixture(1)));
        let applier = ProposalApplier::new(store);

        let set = AssignmentProposalSet::new(
            SessionId::from(Ulid::new()),
            Utc::now(),
            vec![
                AssignmentProposal::new(TaskSnapshot::new("p", "t0", "T"), UserId::new("u1")),
                AssignmentProposal::new(TaskSnapshot::new("p", "t9", "T"), UserId::new("u1")),
            ],
            Vec::new(),
        );
        let result = applier.apply(&set).await.unwrap();

        assert_eq!(result.summary(), "1 of 2 assignments applied");
        assert_eq!(
            result.failures[0].error.kind(),
            crate::domain::ErrorKind::NotFound
        );
    }

    #[tokio::test]
    async fn cancelling_keeps_completed_writes_in_the_result() {
        let inner = Arc::new(InMemoryWorkspace::from_fixture(fixture(3)));
        let store = Arc::new(StuckStore {
            inner: inner.clone(),
            stuck: TaskId::new("t1"),
            reached: Notify::new(),
        });
        let token = CancellationToken::new();
        let applier = ProposalApplier::new(store.clone())
            .with_config(EngineConfig {
                apply_concurrency: 1,
                ..EngineConfig::default()
            })
            .with_cancellation(token.clone());

        let mut set = proposals(3);
        let cancel_when_stuck = async {
            store.reached.notified().await;
            token.cancel();
        };
        let (result, ()) = tokio::join!(applier.apply(&set), cancel_when_stuck);
        let result = result.unwrap();

        assert!(result.cancelled);
        assert!(!result.is_complete_success());
        assert_eq!(result.applied, vec![ProposalKey::new("p", "t0")]);
        assert_eq!(result.attempted(), 1);
        let t0 = inner.task(&ProjectId::new("p"), &TaskId::new("t0")).await.unwrap();
        assert_eq!(t0.assigned_user_ids.len(), 1);

        // unattempted proposals stay selected for a later run
        set.record_outcome(&result);
        assert_eq!(set.get(&ProposalKey::new("p", "t0")).unwrap().state, ProposalState::Applied);
        assert_eq!(set.get(&ProposalKey::new("p", "t1")).unwrap().state, ProposalState::Accepted);
        assert_eq!(set.get(&ProposalKey::new("p", "t2")).unwrap().state, ProposalState::Accepted);
    }

    #[tokio::test]
    async fn cancelled_before_start_writes_nothing() {
        let store = Arc::new(InMemoryWorkspace::from_fixture(fixture(2)));
        let applier = ProposalApplier::new(store.clone());
        applier.cancel();

        let result = applier.apply(&proposals(2)).await.unwrap();

        assert!(result.cancelled);
        assert_eq!(result.attempted(), 0);
        assert!(store.assign_calls().await.is_empty());
    }

    #[tokio::test]
    async fn writes_overlap_up_to_the_configured_concurrency() {
        // both writes must be in flight together to pass the barrier
        let inner = Arc::new(InMemoryWorkspace::from_fixture(fixture(2)));
        let store = Arc::new(LatchedStore {
            inner: inner.clone(),
            barrier: Barrier::new(2),
        });
        let applier = ProposalApplier::new(store).with_config(EngineConfig {
            apply_concurrency: 2,
            ..EngineConfig::default()
        });

        let result = tokio::time::timeout(Duration::from_secs(5), applier.apply(&proposals(2)))
            .await
            .expect("writes were serialized");

        assert_eq!(result.unwrap().success_count, 2);
        assert_eq!(inner.assign_calls().await.len(), 2);
    }
}
