//! Impls - ports の実装
//!
//! # 含まれる実装
//! - **HttpMarketplaceApi**: reqwest による本番用 API クライアント
//! - **InMemoryMarketplace**: テスト・デモ用のバックエンド
//! - **InMemoryResponseCache**: プロセス内のレスポンスキャッシュ
//! - **TracingNotifier / RecordingNotifier**: 通知先

pub mod http_api;
pub mod inmem_api;
pub mod memory_cache;
pub mod notifiers;

// 主要な型を再エクスポート
pub use self::http_api::{HttpMarketplaceApi, SessionToken};
pub use self::inmem_api::InMemoryMarketplace;
pub use self::memory_cache::InMemoryResponseCache;
pub use self::notifiers::{RecordingNotifier, TracingNotifier};
