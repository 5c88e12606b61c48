//! ProjectSource port - プロジェクトとメンバー

use async_trait::async_trait;

use crate::domain::{Member, Project, ProjectId, SourceError};

#[async_trait]
pub trait ProjectSource: Send + Sync {
    /// 現在のユーザーが所属するプロジェクト
    async fn projects_for_current_user(&self) -> Result<Vec<Project>, SourceError>;

    async fn members_of(&self, project_id: &ProjectId) -> Result<Vec<Member>, SourceError>;
}
