//! Impls - 実装（開発用・テスト用）
//!
//! このモジュールには ports の実装を含めます。
//!
//! # 含まれる実装
//! - **InMemoryWorkspace**: TaskSource / ProjectSource / UserSource をまとめて実装
//!
//! # 本番用実装
//! ドキュメント DB への接続はアプリケーション側で ports を実装してください。

pub mod in_memory;

// 主要な型を再エクスポート
pub use self::in_memory::{AssignCall, DependencyWrite, InMemoryWorkspace, WorkspaceFixture};
