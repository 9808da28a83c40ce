//! sellerdesk-core
//!
//! Core building blocks for the seller console.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, status, product, seller, metrics, query_key, forms, errors, events）
//! - **ports**: 抽象化レイヤー（MarketplaceApi, ResponseCache, Notifier）
//! - **impls**: 実装（HttpMarketplaceApi, InMemoryMarketplace, InMemoryResponseCache, 通知先）
//! - **app**: アプリケーションロジック（coordinator, mutations, queries, session, console）
//! - **config**: 設定の読み込み

pub mod domain;
pub mod ports;
pub mod impls;
pub mod app;
pub mod config;

pub use config::{ConfigError, ConsoleConfig};
