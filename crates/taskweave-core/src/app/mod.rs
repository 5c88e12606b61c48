//! App - アプリケーション層
//!
//! このモジュールは、ports と domain / graph を組み合わせてユースケースを実装します。
//!
//! # 主要コンポーネント
//! - **AutoAssignmentEngine**: 未割り当てタスクの担当者提案
//! - **AssignmentProposalSet**: 提案のレビュー（accept / reject）
//! - **ProposalApplier**: 承認済み提案の一括適用
//! - **DependencyEditor**: 依存関係の検証付き編集

pub mod applier;
pub mod auto_assign;
pub mod config;
pub mod editor;
pub mod proposal_set;

// 主要な型を再エクスポート
pub use self::applier::ProposalApplier;
pub use self::auto_assign::{AutoAssignmentEngine, Plan, ProjectSnapshot, candidate_pool, plan};
pub use self::config::EngineConfig;
pub use self::editor::DependencyEditor;
pub use self::proposal_set::AssignmentProposalSet;
