//! Domain model (IDs, task snapshots, members, proposals, results, errors).

pub mod apply_result;
pub mod errors;
pub mod ids;
pub mod member;
pub mod proposal;
pub mod task;

pub use apply_result::{ApplyReport, ApplyResult, AssignmentFailure};
pub use errors::{
    ApplyError, AssignmentError, EditError, ErrorKind, GraphError, ReviewError, SourceError,
};
pub use ids::{ProjectId, SessionId, TaskId, UserId};
pub use member::{Member, MemberRole, Project, User};
pub use proposal::{AssignmentProposal, ProposalKey, ProposalState, SkipReason, SkippedTask};
pub use task::{TaskSnapshot, TaskStatus};
