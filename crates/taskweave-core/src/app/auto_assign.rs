//! AutoAssignmentEngine - 未割り当てタスクの担当者提案
//!
//! # フロー
//! 1. ProjectSource から所属プロジェクトとメンバーを取得
//! 2. TaskSource から各プロジェクトのタスクを取得
//! 3. メンバーを UserSource で解決
//! 4. `plan()`（純粋関数）でプロジェクトごとにラウンドロビン
//!
//! 割り当ては決定的: 同じ入力からは常に同じ提案が出る。

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use futures::future::try_join_all;
use tracing::Instrument;

use super::config::EngineConfig;
use super::proposal_set::AssignmentProposalSet;
use crate::domain::{
    AssignmentError, AssignmentProposal, Member, Project, ProjectId, ProposalKey, SkipReason,
    SkippedTask, SourceError, TaskSnapshot, TaskStatus, UserId,
};
use crate::ports::{
    Clock, IdGenerator, ProjectSource, SystemClock, TaskSource, UlidGenerator, UserSource,
};

/// Everything the planner needs to know about one project.
#[derive(Debug, Clone)]
pub struct ProjectSnapshot {
    pub project: Project,
    pub members: Vec<Member>,
    pub tasks: Vec<TaskSnapshot>,
}

impl ProjectSnapshot {
    pub fn project_id(&self) -> &ProjectId {
        &self.project.project_id
    }

    /// De-duplicated member ids, in lexical order.
    pub fn roster(&self) -> Vec<UserId> {
        self.members
            .iter()
            .map(|m| m.user_id.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

/// Result of [`plan`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Plan {
    pub proposals: Vec<AssignmentProposal>,
    pub skipped: Vec<SkippedTask>,
}

/// Union of every project's roster, de-duplicated by user id.
pub fn candidate_pool(projects: &[ProjectSnapshot]) -> BTreeSet<UserId> {
    projects
        .iter()
        .flat_map(|p| p.members.iter().map(|m| m.user_id.clone()))
        .collect()
}

/// Distribute every unassigned task over its own project's roster.
///
/// Per project, eligible tasks (in delivered order) are dealt round-robin over
/// the roster sorted by user id. When the pick for a task does not resolve to
/// a known user, the task is skipped instead of proposed.
pub fn plan(
    projects: &[ProjectSnapshot],
    resolved: &HashSet<UserId>,
    config: &EngineConfig,
) -> Plan {
    let mut plan = Plan::default();

    for snapshot in projects {
        let roster = snapshot.roster();
        let eligible = snapshot.tasks.iter().filter(|task| {
            task.project_id == *snapshot.project_id()
                && task.is_unassigned()
                && (config.include_cancelled || task.status != TaskStatus::Cancelled)
        });

        for (slot, task) in eligible.enumerate() {
            let key = ProposalKey::new(task.project_id.clone(), task.task_id.clone());
            if roster.is_empty() {
                plan.skipped.push(SkippedTask {
                    key,
                    reason: SkipReason::EmptyRoster,
                });
                continue;
            }

            let user_id = &roster[slot % roster.len()];
            if !resolved.contains(user_id) {
                tracing::warn!(%key, %user_id, "skipping task: member does not resolve to a user");
                plan.skipped.push(SkippedTask {
                    key,
                    reason: SkipReason::UnresolvedUser {
                        user_id: user_id.clone(),
                    },
                });
                continue;
            }

            tracing::debug!(%key, %user_id, "proposing assignment");
            plan.proposals
                .push(AssignmentProposal::new(task.clone(), user_id.clone()));
        }
    }
    plan
}

/// Builds an [`AssignmentProposalSet`] for the current user's projects.
pub struct AutoAssignmentEngine {
    projects: Arc<dyn ProjectSource>,
    tasks: Arc<dyn TaskSource>,
    users: Arc<dyn UserSource>,
    ids: Arc<dyn IdGenerator>,
    clock: Arc<dyn Clock>,
    config: EngineConfig,
}

impl AutoAssignmentEngine {
    pub fn new(
        projects: Arc<dyn ProjectSource>,
        tasks: Arc<dyn TaskSource>,
        users: Arc<dyn UserSource>,
    ) -> Self {
        Self {
            projects,
            tasks,
            users,
            ids: Arc::new(UlidGenerator::new(SystemClock)),
            clock: Arc::new(SystemClock),
            config: EngineConfig::default(),
        }
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_clock<C: Clock + Clone + 'static>(mut self, clock: C) -> Self {
        self.ids = Arc::new(UlidGenerator::new(clock.clone()));
        self.clock = Arc::new(clock);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Fetch fresh snapshots and build a new proposal set.
    pub async fn propose(&self) -> Result<AssignmentProposalSet, AssignmentError> {
        let session_id = self.ids.generate_session_id();
        let span = tracing::info_span!("auto_assign", session = %session_id);

        async move {
            let snapshots = self.load_snapshots().await?;
            if snapshots.is_empty() {
                return Err(AssignmentError::NoProjects);
            }

            let pool = candidate_pool(&snapshots);
            if pool.is_empty() {
                return Err(AssignmentError::NoMembers);
            }

            let resolved = self.resolve_users(&pool).await?;
            let Plan { proposals, skipped } = plan(&snapshots, &resolved, &self.config);

            tracing::info!(
                projects = snapshots.len(),
                candidates = pool.len(),
                proposals = proposals.len(),
                skipped = skipped.len(),
                "auto-assignment proposals ready"
            );
            Ok(AssignmentProposalSet::new(
                session_id,
                self.clock.now(),
                proposals,
                skipped,
            ))
        }
        .instrument(span)
        .await
    }

    async fn load_snapshots(&self) -> Result<Vec<ProjectSnapshot>, SourceError> {
        let mut seen = HashSet::new();
        let projects: Vec<Project> = self
            .projects
            .projects_for_current_user()
            .await?
            .into_iter()
            .filter(|p| seen.insert(p.project_id.clone()))
            .collect();

        try_join_all(projects.into_iter().map(|project| async move {
            let members = self.projects.members_of(&project.project_id).await?;
            let tasks = self.tasks.tasks_in_project(&project.project_id).await?;
            Ok::<_, SourceError>(ProjectSnapshot {
                project,
                members,
                tasks,
            })
        }))
        .await
    }

    async fn resolve_users(&self, pool: &BTreeSet<UserId>) -> Result<HashSet<UserId>, SourceError> {
        let users = try_join_all(pool.iter().map(|user_id| self.users.user_by_id(user_id))).await?;
        Ok(users.into_iter().flatten().map(|u| u.user_id).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::User;
    use crate::impls::{InMemoryWorkspace, WorkspaceFixture};
    use async_trait::async_trait;
    use rstest::rstest;
    use std::collections::HashMap;

    /// Project and user lookups that always fail.
    struct Offline;

    #[async_trait]
    impl ProjectSource for Offline {
        async fn projects_for_current_user(&self) -> Result<Vec<Project>, SourceError> {
            Err(SourceError::transient("projects unavailable"))
        }

        async fn members_of(&self, _project_id: &ProjectId) -> Result<Vec<Member>, SourceError> {
            Err(SourceError::transient("members unavailable"))
        }
    }

    #[async_trait]
    impl UserSource for Offline {
        async fn user_by_id(&self, _user_id: &UserId) -> Result<Option<User>, SourceError> {
            Err(SourceError::transient("users unavailable"))
        }
    }

    fn workspace() -> Arc<InMemoryWorkspace> {
        Arc::new(InMemoryWorkspace::from_fixture(
            WorkspaceFixture::default()
                .project("p", "P")
                .member("p", "u1")
                .user("u1")
                .task(TaskSnapshot::new("p", "t1", "T1")),
        ))
    }

    fn snapshot(project: &str, members: &[&str], tasks: Vec<TaskSnapshot>) -> ProjectSnapshot {
        ProjectSnapshot {
            project: Project::new(project, project),
            members: members.iter().map(|u| Member::new(project, *u)).collect(),
            tasks,
        }
    }

    fn unassigned(project: &str, n: usize) -> Vec<TaskSnapshot> {
        (1..=n)
            .map(|i| TaskSnapshot::new(project, format!("task{i}"), format!("Task {i}")))
            .collect()
    }

    fn everyone(projects: &[ProjectSnapshot]) -> HashSet<UserId> {
        candidate_pool(projects).into_iter().collect()
    }

    fn pairs(plan: &Plan) -> Vec<(String, String)> {
        plan.proposals
            .iter()
            .map(|p| (p.task.task_id.to_string(), p.proposed_user_id.to_string()))
            .collect()
    }

    #[test]
    fn two_tasks_two_members_round_robin_by_user_id() {
        let projects = vec![snapshot("proj1", &["user2", "user1"], unassigned("proj1", 2))];
        let plan = plan(&projects, &everyone(&projects), &EngineConfig::default());

        assert_eq!(
            pairs(&plan),
            vec![
                ("task1".to_string(), "user1".to_string()),
                ("task2".to_string(), "user2".to_string())
            ]
        );
        assert!(plan.proposals.iter().all(|p| p.is_accepted()));
    }

    #[rstest]
    #[case(7, 3)]
    #[case(6, 3)]
    #[case(10, 4)]
    #[case(5, 5)]
    #[case(9, 1)]
    fn distribution_is_balanced(#[case] tasks: usize, #[case] members: usize) {
        let names: Vec<String> = (0..members).map(|i| format!("user{i:02}")).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let projects = vec![snapshot("p", &refs, unassigned("p", tasks))];

        let plan = plan(&projects, &everyone(&projects), &EngineConfig::default());

        let mut load: HashMap<UserId, usize> = HashMap::new();
        for p in &plan.proposals {
            *load.entry(p.proposed_user_id.clone()).or_default() += 1;
        }
        assert_eq!(plan.proposals.len(), tasks);
        for name in &names {
            let got = load.get(name.as_str()).copied().unwrap_or_default();
            assert!(
                got == tasks / members || got == tasks.div_ceil(members),
                "{name} got {got}"
            );
        }
    }

    #[test]
    fn assigned_tasks_are_not_proposed_but_completed_ones_are() {
        let tasks = vec![
            TaskSnapshot::new("p", "a", "A").with_assignee("user1"),
            TaskSnapshot::new("p", "b", "B").with_status(TaskStatus::Completed),
        ];
        let projects = vec![snapshot("p", &["user1"], tasks)];
        let plan = plan(&projects, &everyone(&projects), &EngineConfig::default());
        assert_eq!(pairs(&plan), vec![("b".to_string(), "user1".to_string())]);
    }

    #[test]
    fn cancelled_tasks_can_be_excluded_by_config() {
        let tasks = vec![TaskSnapshot::new("p", "a", "A").with_status(TaskStatus::Cancelled)];
        let projects = vec![snapshot("p", &["user1"], tasks)];
        let config = EngineConfig {
            include_cancelled: false,
            ..EngineConfig::default()
        };
        assert!(plan(&projects, &everyone(&projects), &config).proposals.is_empty());
    }

    #[test]
    fn members_only_receive_tasks_from_their_own_projects() {
        let projects = vec![
            snapshot("alpha", &["ann", "shared"], unassigned("alpha", 2)),
            snapshot("beta", &["bob", "shared"], unassigned("beta", 2)),
        ];
        let plan = plan(&projects, &everyone(&projects), &EngineConfig::default());

        for p in &plan.proposals {
            let roster = projects
                .iter()
                .find(|s| *s.project_id() == p.task.project_id)
                .unwrap()
                .roster();
            assert!(roster.contains(&p.proposed_user_id));
        }
        assert_eq!(candidate_pool(&projects).len(), 3);
    }

    #[test]
    fn unresolved_pick_skips_the_task() {
        let projects = vec![snapshot("p", &["ghost", "user1"], unassigned("p", 2))];
        let resolved: HashSet<UserId> = [UserId::new("user1")].into_iter().collect();

        let plan = plan(&projects, &resolved, &EngineConfig::default());

        assert_eq!(pairs(&plan), vec![("task2".to_string(), "user1".to_string())]);
        assert_eq!(
            plan.skipped,
            vec![SkippedTask {
                key: ProposalKey::new("p", "task1"),
                reason: SkipReason::UnresolvedUser {
                    user_id: UserId::new("ghost")
                },
            }]
        );
    }

    #[test]
    fn project_without_members_skips_its_tasks() {
        let projects = vec![
            snapshot("empty", &[], unassigned("empty", 1)),
            snapshot("p", &["user1"], unassigned("p", 1)),
        ];
        let plan = plan(&projects, &everyone(&projects), &EngineConfig::default());
        assert_eq!(plan.proposals.len(), 1);
        assert_eq!(plan.skipped[0].reason, SkipReason::EmptyRoster);
    }

    #[test]
    fn duplicate_members_count_once() {
        let projects = vec![snapshot("p", &["user1", "user1"], unassigned("p", 2))];
        let plan = plan(&projects, &everyone(&projects), &EngineConfig::default());
        assert!(plan.proposals.iter().all(|p| p.proposed_user_id.as_str() == "user1"));
    }

    #[test]
    fn same_input_same_plan() {
        let projects = vec![snapshot("p", &["c", "a", "b"], unassigned("p", 5))];
        let first = plan(&projects, &everyone(&projects), &EngineConfig::default());
        let second = plan(&projects, &everyone(&projects), &EngineConfig::default());
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn user_lookup_failure_aborts_instead_of_skipping() {
        let ws = workspace();
        let engine = AutoAssignmentEngine::new(ws.clone(), ws.clone(), Arc::new(Offline));

        assert_eq!(
            engine.propose().await.unwrap_err(),
            AssignmentError::Source(SourceError::transient("users unavailable"))
        );
    }

    #[tokio::test]
    async fn project_lookup_failure_aborts() {
        let ws = workspace();
        let engine = AutoAssignmentEngine::new(Arc::new(Offline), ws.clone(), ws.clone());

        let err = engine.propose().await.unwrap_err();
        assert!(matches!(err, AssignmentError::Source(ref e) if e.is_retryable()));
    }
}
