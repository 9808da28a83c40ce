//! App - アプリケーション層
//!
//! このモジュールは、ports を組み合わせてアプリケーションロジックを実装します。
//!
//! # 主要コンポーネント
//! - **MutationCoordinator**: 楽観的更新（stage → remote → settle）
//! - **Mutations**: ChangeStatus / UpdateProduct / CreateProduct
//! - **status_actions**: 現在の状態から選べる操作
//! - **Queries**: 取得してキャッシュへ書き込む
//! - **SessionTracker**: ログイン状態と認可フック
//! - **SellerConsole**: 上記をまとめたファサード

pub mod coordinator;
pub mod mutations;
pub mod status_actions;
pub mod queries;
pub mod session;
pub mod console;

// 主要な型を再エクスポート
pub use self::coordinator::{Mutation, MutationCoordinator, Staged, merge_confirmed, settle, stage};
pub use self::mutations::{ChangeStatus, CreateProduct, UpdateProduct};
pub use self::status_actions::{StatusAction, status_actions};
pub use self::queries::Queries;
pub use self::session::SessionTracker;
pub use self::console::SellerConsole;
