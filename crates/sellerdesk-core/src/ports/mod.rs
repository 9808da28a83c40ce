//! Ports - 抽象化レイヤー
//!
//! このモジュールは Hexagonal Architecture の「ポート」を定義します。
//! 各 trait は外部の協力者（REST API、レスポンスキャッシュ、通知先）への
//! インターフェースを提供し、実装の詳細を隠蔽します。
//!
//! # 設計原則
//! - サーバーが source of truth（正本）
//! - キャッシュはサーバーの最後の応答を保持するだけ（楽観的更新の間を除く）
//! - 通知は fire-and-forget

pub mod api;
pub mod cache;
pub mod notifier;

pub use self::api::MarketplaceApi;
pub use self::cache::{CacheEvent, CacheEventKind, CacheExt, ResponseCache};
pub use self::notifier::Notifier;
