//! taskweave-core
//!
//! Task dependency graph and auto-assignment engine.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, task, member, proposal, apply_result, errors）
//! - **graph**: プロジェクト単位の依存グラフ（循環検出・編集可能な候補の計算）
//! - **ports**: 抽象化レイヤー（TaskSource, ProjectSource, UserSource, Clock, IdGenerator）
//! - **app**: アプリケーションロジック（auto_assign, proposal_set, applier, editor, config）
//! - **impls**: 実装（InMemoryWorkspace など開発・テスト用）

pub mod app;
pub mod domain;
pub mod graph;
pub mod impls;
pub mod ports;

pub use app::{
    AssignmentProposalSet, AutoAssignmentEngine, DependencyEditor, EngineConfig, ProposalApplier,
};
pub use graph::DependencyGraph;
