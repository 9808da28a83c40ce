//! InMemoryResponseCache - プロセス内のレスポンスキャッシュ
//!
//! # 実装詳細
//! - HashMap<QueryKey, Value> を std の Mutex で保護
//! - ロックは await をまたいで保持しない（read / write は同期処理）
//! - 書き込みごとに broadcast で CacheEvent を送信
//!
//! # 使用例
//! ```ignore
//! let cache = InMemoryResponseCache::new();
//! cache.write(&QueryKey::categories(), json!({ "categories": [] }));
//! let mut events = cache.subscribe();
//! ```

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde_json::Value;
use tokio::sync::broadcast;

use crate::domain::QueryKey;
use crate::ports::{CacheEvent, CacheEventKind, ResponseCache};

const EVENT_CAPACITY: usize = 256;

pub struct InMemoryResponseCache {
    entries: Mutex<HashMap<QueryKey, Value>>,
    events: broadcast::Sender<CacheEvent>,
}

impl InMemoryResponseCache {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            entries: Mutex::new(HashMap::new()),
            events,
        }
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    // 書き込み途中で panic してもマップ自体は壊れないので、poison は無視する
    fn entries(&self) -> MutexGuard<'_, HashMap<QueryKey, Value>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, event: CacheEvent) {
        // 購読者がいないときの送信エラーは無視してよい
        let _ = self.events.send(event);
    }
}

impl Default for InMemoryResponseCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseCache for InMemoryResponseCache {
    fn read(&self, key: &QueryKey) -> Option<Value> {
        self.entries().get(key).cloned()
    }

    fn write(&self, key: &QueryKey, value: Value) {
        self.entries().insert(key.clone(), value);
        tracing::trace!(%key, "cache write");
        self.publish(CacheEvent::Changed {
            key: key.clone(),
            kind: CacheEventKind::Written,
        });
    }

    fn remove(&self, key: &QueryKey) -> Option<Value> {
        let removed = self.entries().remove(key);
        if removed.is_some() {
            self.publish(CacheEvent::Changed {
                key: key.clone(),
                kind: CacheEventKind::Removed,
            });
        }
        removed
    }

    fn clear(&self) {
        self.entries().clear();
        self.publish(CacheEvent::Cleared);
    }

    fn subscribe(&self) -> broadcast::Receiver<CacheEvent> {
        self.events.subscribe()
    }
}
