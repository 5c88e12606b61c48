//! UserSource port - ユーザー解決

use async_trait::async_trait;

use crate::domain::{SourceError, User, UserId};

#[async_trait]
pub trait UserSource: Send + Sync {
    /// 存在しないユーザーは `Ok(None)`
    async fn user_by_id(&self, user_id: &UserId) -> Result<Option<User>, SourceError>;
}
