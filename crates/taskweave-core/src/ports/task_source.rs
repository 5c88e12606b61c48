//! TaskSource port - タスクの正本（ドキュメント DB）
//!
//! 購読（push）ではなく、計算の直前に最新スナップショットを取りに行く（pull）。
//! 受け取ったスナップショットをそのまま正とし、前回との差分は取らない。

use async_trait::async_trait;

use crate::domain::{ProjectId, SourceError, TaskId, TaskSnapshot, UserId};

/// TaskSource はタスクの読み出しと書き込み
///
/// # 設計原則
/// - `assign_user` は集合への追加（set 的操作）なので、リトライしても二重にならない
/// - タイムアウトは実装側の責務。失敗は `SourceError` として返す
/// - 複数ドキュメントにまたがるトランザクションは提供しない
#[async_trait]
pub trait TaskSource: Send + Sync {
    /// プロジェクトの現在のタスク一覧
    async fn tasks_in_project(&self, project_id: &ProjectId)
    -> Result<Vec<TaskSnapshot>, SourceError>;

    /// `user_id` をタスクの担当者に追加
    async fn assign_user(
        &self,
        project_id: &ProjectId,
        task_id: &TaskId,
        user_id: &UserId,
    ) -> Result<(), SourceError>;

    /// タスクの依存リストを丸ごと置き換える
    async fn update_dependencies(
        &self,
        project_id: &ProjectId,
        task_id: &TaskId,
        dependencies: &[TaskId],
    ) -> Result<(), SourceError>;
}
