//! ResponseCache port - クエリキーごとのレスポンスキャッシュ
//!
//! # 設計原則
//! - 1 キーにつき値は 1 つ（後勝ち）
//! - TTL なし。値が変わるのは明示的な write / remove / clear のみ
//! - 書き込みは購読者へ同期的に通知（`broadcast` への送信はブロックしない）
//! - 値はサーバーのレスポンス形状をそのまま `serde_json::Value` で保持
//!
//! 型付きの読み書きは `CacheExt` を使います。

use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::broadcast;

use crate::domain::QueryKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheEventKind {
    Written,
    Removed,
}

/// 購読者へ届く変更通知
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheEvent {
    Changed { key: QueryKey, kind: CacheEventKind },
    Cleared,
}

pub trait ResponseCache: Send + Sync {
    fn read(&self, key: &QueryKey) -> Option<serde_json::Value>;

    /// Replace the value stored under `key`.
    fn write(&self, key: &QueryKey, value: serde_json::Value);

    fn remove(&self, key: &QueryKey) -> Option<serde_json::Value>;

    fn clear(&self);

    fn subscribe(&self) -> broadcast::Receiver<CacheEvent>;
}

/// 型付きの読み書き（serde 経由）
pub trait CacheExt {
    /// `None` when the entry is absent or does not have the shape of `T`.
    fn read_as<T: DeserializeOwned>(&self, key: &QueryKey) -> Option<T>;

    fn write_as<T: Serialize>(&self, key: &QueryKey, value: &T) -> Result<(), serde_json::Error>;
}

impl<C: ResponseCache + ?Sized> CacheExt for C {
    fn read_as<T: DeserializeOwned>(&self, key: &QueryKey) -> Option<T> {
        let value = self.read(key)?;
        match serde_json::from_value(value) {
            Ok(typed) => Some(typed),
            Err(err) => {
                tracing::warn!(%key, error = %err, "cached value has an unexpected shape");
                None
            }
        }
    }

    fn write_as<T: Serialize>(&self, key: &QueryKey, value: &T) -> Result<(), serde_json::Error> {
        let value = serde_json::to_value(value)?;
        self.write(key, value);
        Ok(())
    }
}
