//! InMemoryWorkspace - 開発用のタスク / プロジェクト / ユーザーストア
//!
//! # 実装詳細
//! - WorkspaceFixture（JSON からも読める）で初期状態を作る
//! - tokio::sync::Mutex で排他制御
//! - assign_user / update_dependencies の呼び出しを記録する
//! - fail_assignment() で特定タスクへの書き込みを失敗させられる

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::Mutex;

use crate::domain::{
    Member, Project, ProjectId, ProposalKey, SourceError, TaskId, TaskSnapshot, User, UserId,
};
use crate::ports::{ProjectSource, TaskSource, UserSource};

/// Initial contents of an [`InMemoryWorkspace`].
///
/// Every project listed here belongs to the current user.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WorkspaceFixture {
    pub projects: Vec<Project>,
    pub members: Vec<Member>,
    pub users: Vec<User>,
    pub tasks: Vec<TaskSnapshot>,
}

impl WorkspaceFixture {
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }

    pub fn project(mut self, project_id: &str, name: &str) -> Self {
        self.projects.push(Project::new(project_id, name));
        self
    }

    pub fn member(mut self, project_id: &str, user_id: &str) -> Self {
        self.members.push(Member::new(project_id, user_id));
        self
    }

    pub fn user(mut self, user_id: &str) -> Self {
        self.users.push(User::new(user_id, user_id));
        self
    }

    pub fn task(mut self, task: TaskSnapshot) -> Self {
        self.tasks.push(task);
        self
    }
}

/// One recorded `assign_user` call, successful or not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignCall {
    pub project_id: ProjectId,
    pub task_id: TaskId,
    pub user_id: UserId,
}

/// One successful `update_dependencies` write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyWrite {
    pub project_id: ProjectId,
    pub task_id: TaskId,
    pub dependencies: Vec<TaskId>,
}

struct WorkspaceState {
    projects: Vec<Project>,
    members: HashMap<ProjectId, Vec<Member>>,
    users: HashMap<UserId, User>,

    /// Tasks per project, in insertion order.
    tasks: HashMap<ProjectId, Vec<TaskSnapshot>>,

    /// Injected failures for assign_user.
    failing: HashMap<ProposalKey, SourceError>,

    assign_calls: Vec<AssignCall>,
    dependency_writes: Vec<DependencyWrite>,
}

impl WorkspaceState {
    fn from_fixture(fixture: WorkspaceFixture) -> Self {
        let mut members: HashMap<ProjectId, Vec<Member>> = HashMap::new();
        for member in fixture.members {
            members
                .entry(member.project_id.clone())
                .or_default()
                .push(member);
        }

        let mut tasks: HashMap<ProjectId, Vec<TaskSnapshot>> = HashMap::new();
        for task in fixture.tasks {
            tasks.entry(task.project_id.clone()).or_default().push(task);
        }

        Self {
            projects: fixture.projects,
            members,
            users: fixture
                .users
                .into_iter()
                .map(|u| (u.user_id.clone(), u))
                .collect(),
            tasks,
            failing: HashMap::new(),
            assign_calls: Vec::new(),
            dependency_writes: Vec::new(),
        }
    }

    fn task_mut(&mut self, project_id: &ProjectId, task_id: &TaskId) -> Option<&mut TaskSnapshot> {
        self.tasks
            .get_mut(project_id)?
            .iter_mut()
            .find(|t| t.task_id == *task_id)
    }
}

/// In-memory implementation of all three source ports.
#[derive(Clone)]
pub struct InMemoryWorkspace {
    state: Arc<Mutex<WorkspaceState>>,
}

impl InMemoryWorkspace {
    pub fn from_fixture(fixture: WorkspaceFixture) -> Self {
        Self {
            state: Arc::new(Mutex::new(WorkspaceState::from_fixture(fixture))),
        }
    }

    /// Make every later `assign_user` for `key` fail with `error`.
    pub async fn fail_assignment(&self, key: ProposalKey, error: SourceError) {
        self.state.lock().await.failing.insert(key, error);
    }

    pub async fn task(&self, project_id: &ProjectId, task_id: &TaskId) -> Option<TaskSnapshot> {
        let state = self.state.lock().await;
        state
            .tasks
            .get(project_id)?
            .iter()
            .find(|t| t.task_id == *task_id)
            .cloned()
    }

    pub async fn assign_calls(&self) -> Vec<AssignCall> {
        self.state.lock().await.assign_calls.clone()
    }

    pub async fn dependency_writes(&self) -> Vec<DependencyWrite> {
        self.state.lock().await.dependency_writes.clone()
    }
}

#[async_trait]
impl TaskSource for InMemoryWorkspace {
    async fn tasks_in_project(
        &self,
        project_id: &ProjectId,
    ) -> Result<Vec<TaskSnapshot>, SourceError> {
        let state = self.state.lock().await;
        Ok(state.tasks.get(project_id).cloned().unwrap_or_default())
    }

    async fn assign_user(
        &self,
        project_id: &ProjectId,
        task_id: &TaskId,
        user_id: &UserId,
    ) -> Result<(), SourceError> {
        let mut state = self.state.lock().await;
        state.assign_calls.push(AssignCall {
            project_id: project_id.clone(),
            task_id: task_id.clone(),
            user_id: user_id.clone(),
        });

        let key = ProposalKey::new(project_id.clone(), task_id.clone());
        if let Some(error) = state.failing.get(&key) {
            return Err(error.clone());
        }

        let task = state
            .task_mut(project_id, task_id)
            .ok_or_else(|| SourceError::not_found(format!("task {key} does not exist")))?;
        task.assigned_user_ids.insert(user_id.clone());
        Ok(())
    }

    async fn update_dependencies(
        &self,
        project_id: &ProjectId,
        task_id: &TaskId,
        dependencies: &[TaskId],
    ) -> Result<(), SourceError> {
        let mut state = self.state.lock().await;
        let task = state.task_mut(project_id, task_id).ok_or_else(|| {
            SourceError::not_found(format!("task {project_id}/{task_id} does not exist"))
        })?;
        task.depending_on_tasks = dependencies.to_vec();

        state.dependency_writes.push(DependencyWrite {
            project_id: project_id.clone(),
            task_id: task_id.clone(),
            dependencies: dependencies.to_vec(),
        });
        Ok(())
    }
}

#[async_trait]
impl ProjectSource for InMemoryWorkspace {
    async fn projects_for_current_user(&self) -> Result<Vec<Project>, SourceError> {
        Ok(self.state.lock().await.projects.clone())
    }

    async fn members_of(&self, project_id: &ProjectId) -> Result<Vec<Member>, SourceError> {
        let state = self.state.lock().await;
        Ok(state.members.get(project_id).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl UserSource for InMemoryWorkspace {
    async fn user_by_id(&self, user_id: &UserId) -> Result<Option<User>, SourceError> {
        Ok(self.state.lock().await.users.get(user_id).cloned())
    }
}
