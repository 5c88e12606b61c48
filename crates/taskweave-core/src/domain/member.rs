//! Project, member and user values supplied by the project / user sources.

use serde::{Deserialize, Serialize};

use super::ids::{ProjectId, UserId};

/// Role of a member inside a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MemberRole {
    Owner,
    Admin,
    #[default]
    Member,
}

/// A user's membership in one project. Only used as an assignment target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub user_id: UserId,
    pub project_id: ProjectId,

    #[serde(default)]
    pub role: MemberRole,
}

impl Member {
    pub fn new(project_id: impl Into<ProjectId>, user_id: impl Into<UserId>) -> Self {
        Self {
            user_id: user_id.into(),
            project_id: project_id.into(),
            role: MemberRole::Member,
        }
    }

    pub fn with_role(mut self, role: MemberRole) -> Self {
        self.role = role;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub project_id: ProjectId,

    #[serde(default)]
    pub name: String,
}

impl Project {
    pub fn new(project_id: impl Into<ProjectId>, name: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub user_id: UserId,

    #[serde(default)]
    pub display_name: String,
}

impl User {
    pub fn new(user_id: impl Into<UserId>, display_name: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            display_name: display_name.into(),
        }
    }
}
