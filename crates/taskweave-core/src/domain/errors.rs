//! Errors - エラー型と分類
//!
//! 操作ごとに enum を分けています。
//! - 検証エラー（GraphError, ApplyError::NoSelection）は変更前に同期的に返す
//! - 一括適用中の個別失敗は `AssignmentFailure` として ApplyResult に集約する

use thiserror::Error;

use super::ids::TaskId;
use super::proposal::ProposalKey;

/// ErrorKind は外部コラボレータのエラー分類
///
/// - Transient: 一時的なエラー（リトライ推奨）
/// - Permanent: 恒久的なエラー（リトライ無意味）
/// - NotFound: 対象ドキュメントが存在しない
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Transient,
    Permanent,
    NotFound,
}

/// Failure reported by an external source (task / project / user store).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("source error (kind: {kind:?}): {message}")]
pub struct SourceError {
    kind: ErrorKind,
    message: String,
}

impl SourceError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn transient(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Transient, message)
    }

    pub fn permanent(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Permanent, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_retryable(&self) -> bool {
        self.kind == ErrorKind::Transient
    }
}

/// Rejected dependency-graph mutation. Nothing has been changed when this is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("adding dependency {from} -> {to} would create a cycle")]
    CycleDetected { from: TaskId, to: TaskId },

    #[error("task {0} is not part of this project")]
    UnknownTask(TaskId),
}

/// Auto-assignment preconditions that were not met.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssignmentError {
    #[error("the current user belongs to no project")]
    NoProjects,

    #[error("none of the user's projects has any member")]
    NoMembers,

    #[error(transparent)]
    Source(#[from] SourceError),
}

/// Review operation addressed a proposal it cannot change.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReviewError {
    #[error("no proposal for {0}")]
    UnknownProposal(ProposalKey),

    #[error("proposal for {0} was already applied")]
    AlreadyApplied(ProposalKey),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApplyError {
    #[error("no accepted proposal to apply")]
    NoSelection,
}

/// Failure of a dependency edit that goes through the remote store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Source(#[from] SourceError),
}
