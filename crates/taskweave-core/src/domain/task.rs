//! Task snapshot: the read-only view of a task this crate computes over.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::ids::{ProjectId, TaskId, UserId};

/// Lifecycle status of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    #[default]
    Todo,
    InProgress,
    Completed,
    Cancelled,
}

impl TaskStatus {
    /// Whether a dependency in this status no longer blocks its dependents.
    pub fn is_resolved(self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Cancelled)
    }
}

/// Immutable value describing one task as delivered by the task source.
///
/// `depending_on_tasks` keeps the stored order; `assigned_user_ids` is a set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSnapshot {
    pub task_id: TaskId,
    pub project_id: ProjectId,

    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub status: TaskStatus,

    #[serde(default)]
    pub assigned_user_ids: BTreeSet<UserId>,

    #[serde(default)]
    pub depending_on_tasks: Vec<TaskId>,
}

impl TaskSnapshot {
    pub fn new(
        project_id: impl Into<ProjectId>,
        task_id: impl Into<TaskId>,
        title: impl Into<String>,
    ) -> Self {
        Self {
            task_id: task_id.into(),
            project_id: project_id.into(),
            title: title.into(),
            status: TaskStatus::Todo,
            assigned_user_ids: BTreeSet::new(),
            depending_on_tasks: Vec::new(),
        }
    }

    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_assignee(mut self, user_id: impl Into<UserId>) -> Self {
        self.assigned_user_ids.insert(user_id.into());
        self
    }

    pub fn with_dependency(mut self, task_id: impl Into<TaskId>) -> Self {
        self.depending_on_tasks.push(task_id.into());
        self
    }

    pub fn is_unassigned(&self) -> bool {
        self.assigned_user_ids.is_empty()
    }
}
