//! DependencyEditor - 依存関係の編集フロー
//!
//! load（最新スナップショット）→ DependencyGraph で検証 → update_dependencies で永続化。
//! グラフは毎回作り直すので、セッションをまたいだキャッシュはない。

use std::sync::Arc;

use crate::domain::{EditError, GraphError, ProjectId, SourceError, TaskId};
use crate::graph::DependencyGraph;
use crate::ports::TaskSource;

pub struct DependencyEditor {
    tasks: Arc<dyn TaskSource>,
}

impl DependencyEditor {
    pub fn new(tasks: Arc<dyn TaskSource>) -> Self {
        Self { tasks }
    }

    /// Build a graph from the project's current task list.
    pub async fn load_graph(&self, project_id: &ProjectId) -> Result<DependencyGraph, SourceError> {
        let tasks = self.tasks.tasks_in_project(project_id).await?;
        let graph = DependencyGraph::from_tasks(project_id.clone(), &tasks);
        if let Some(cycle) = graph.find_cycle() {
            tracing::warn!(
                %project_id,
                cycle = ?cycle,
                "stored dependencies already contain a cycle"
            );
        }
        Ok(graph)
    }

    /// Make `from` depend on `to` and persist the new list.
    ///
    /// Returns the updated dependency list of `from`. Nothing is written when
    /// the edge is rejected or already present.
    pub async fn add_dependency(
        &self,
        project_id: &ProjectId,
        from: &TaskId,
        to: &TaskId,
    ) -> Result<Vec<TaskId>, EditError> {
        let mut graph = self.load_graph(project_id).await?;
        let before = graph.dependencies_of(from).len();
        let updated = graph.add_dependency(from, to)?;
        if updated.len() != before {
            self.persist(project_id, from, &updated).await?;
        }
        Ok(updated)
    }

    /// Drop the `from -> to` edge and persist the new list.
    pub async fn remove_dependency(
        &self,
        project_id: &ProjectId,
        from: &TaskId,
        to: &TaskId,
    ) -> Result<Vec<TaskId>, EditError> {
        let mut graph = self.load_graph(project_id).await?;
        if !graph.contains(from) {
            return Err(GraphError::UnknownTask(from.clone()).into());
        }
        let before = graph.dependencies_of(from).len();
        let updated = graph.remove_dependency(from, to);
        if updated.len() != before {
            self.persist(project_id, from, &updated).await?;
        }
        Ok(updated)
    }

    /// Remove references to deleted tasks from `task`'s list and persist it.
    pub async fn prune_dangling(
        &self,
        project_id: &ProjectId,
        task: &TaskId,
    ) -> Result<Vec<TaskId>, EditError> {
        let mut graph = self.load_graph(project_id).await?;
        if !graph.contains(task) {
            return Err(GraphError::UnknownTask(task.clone()).into());
        }
        let before = graph.dependencies_of(task).len();
        let updated = graph.prune_dangling(task);
        if updated.len() != before {
            self.persist(project_id, task, &updated).await?;
        }
        Ok(updated)
    }

    /// Tasks selectable as a new dependency of `task`.
    pub async fn available_targets(
        &self,
        project_id: &ProjectId,
        task: &TaskId,
    ) -> Result<Vec<TaskId>, SourceError> {
        let graph = self.load_graph(project_id).await?;
        Ok(graph.available_dependency_targets(task))
    }

    async fn persist(
        &self,
        project_id: &ProjectId,
        task: &TaskId,
        dependencies: &[TaskId],
    ) -> Result<(), SourceError> {
        self.tasks
            .update_dependencies(project_id, task, dependencies)
            .await
            .inspect_err(|error| tracing::warn!(%project_id, %task, %error, "dependency write failed"))?;
        tracing::debug!(%project_id, %task, count = dependencies.len(), "dependencies updated");
        Ok(())
    }
}
