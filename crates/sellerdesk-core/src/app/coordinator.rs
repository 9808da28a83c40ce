//! MutationCoordinator - 楽観的更新とキャッシュの整合
//!
//! # フロー
//! 1. target_key のロックを取得（同じキーへのミューテーションは直列化）
//! 2. キャッシュを読み、値があれば `apply` した値を書き込む（元の値はスナップショット）
//! 3. `remote_call` を実行（唯一の await ポイント）
//! 4. 成功: サーバーの値をマージして書き込み、成功通知
//!    失敗: スナップショットをそのまま書き戻し、エラー通知
//! 5. 結果（`Result`）を呼び出し側へ返す（エラーは握りつぶさない）
//!
//! キャッシュ上の値の見え方は必ず `old → optimistic → (confirmed | old)` です。
//!
//! # 純粋関数
//! キャッシュの計算は `stage` / `settle` / `merge_confirmed` に分けてあり、
//! I/O なしでテストできます。

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::OwnedMutexGuard;

use crate::domain::{ApiError, QueryKey};
use crate::ports::{Notifier, ResponseCache};

/// Mutation は楽観的更新の記述子
///
/// `{ targetKey, apply, remoteCall }` に、成功時の整合（reconcile）と
/// 成功メッセージを加えたものです。
#[async_trait]
pub trait Mutation: Send + Sync {
    /// サーバーが確定した結果
    type Confirmed: Send;

    fn target_key(&self) -> QueryKey;

    /// 現在のキャッシュ値から楽観的な値を作る。
    ///
    /// 値の形が想定と違うときは `None` を返し、楽観的書き込みを行わない。
    fn apply(&self, current: &Value) -> Option<Value>;

    async fn remote_call(&self) -> Result<Self::Confirmed, ApiError>;

    /// 楽観的な値にサーバーの確定値を反映する。
    fn reconcile(&self, optimistic: &Value, confirmed: &Self::Confirmed) -> Value;

    fn success_message(&self) -> String;
}

/// 楽観的書き込みの前後の値
#[derive(Debug, Clone, PartialEq)]
pub struct Staged {
    /// 書き込み前の値（失敗時にそのまま戻す）
    pub snapshot: Value,
    pub optimistic: Value,
}

/// Step 1: compute the optimistic value. `None` when there is nothing cached
/// (or `apply` declines), which means no optimistic write and no rollback.
pub fn stage(current: Option<Value>, apply: impl FnOnce(&Value) -> Option<Value>) -> Option<Staged> {
    let snapshot = current?;
    let optimistic = apply(&snapshot)?;
    Some(Staged {
        snapshot,
        optimistic,
    })
}

/// Step 3: the value to write once the outcome is known, `None` meaning the
/// key is left untouched.
pub fn settle<C, E>(
    staged: Option<Staged>,
    outcome: Result<&C, &E>,
    reconcile: impl FnOnce(&Value, &C) -> Value,
) -> Option<Value> {
    let staged = staged?;
    Some(match outcome {
        Ok(confirmed) => reconcile(&staged.optimistic, confirmed),
        Err(_) => staged.snapshot,
    })
}

/// Overlay `confirmed` onto `base`: objects merge key by key (recursively),
/// anything else is replaced. Keys the server did not send keep their local
/// value.
pub fn merge_confirmed(base: &mut Value, confirmed: Value) {
    match (base, confirmed) {
        (Value::Object(base), Value::Object(confirmed)) => {
            for (key, value) in confirmed {
                match base.get_mut(&key) {
                    Some(existing) => merge_confirmed(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, confirmed) => *base = confirmed,
    }
}

/// キーごとの非同期ロック
#[derive(Default)]
struct KeyLocks {
    locks: Mutex<HashMap<QueryKey, Arc<tokio::sync::Mutex<()>>>>,
}

impl KeyLocks {
    async fn acquire(&self, key: &QueryKey) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            // マップだけが参照しているロックは、保持者も待機者もいない
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            locks.entry(key.clone()).or_default().clone()
        };
        lock.lock_owned().await
    }
}

/// MutationCoordinator はキャッシュ・リモート呼び出し・通知をつなぐ
///
/// # 使用例
/// ```ignore
/// let coordinator = MutationCoordinator::new(cache.clone(), notifier.clone());
/// let confirmed = coordinator.run(&ChangeStatus::new(api, id, ProductStatus::Sold)).await?;
/// ```
pub struct MutationCoordinator {
    cache: Arc<dyn ResponseCache>,
    notifier: Arc<dyn Notifier>,
    locks: KeyLocks,
}

impl MutationCoordinator {
    pub fn new(cache: Arc<dyn ResponseCache>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            cache,
            notifier,
            locks: KeyLocks::default(),
        }
    }

    pub fn cache(&self) -> &Arc<dyn ResponseCache> {
        &self.cache
    }

    pub async fn run<M: Mutation>(&self, mutation: &M) -> Result<M::Confirmed, ApiError> {
        let key = mutation.target_key();
        let _guard = self.locks.acquire(&key).await;

        let staged = stage(self.cache.read(&key), |current| mutation.apply(current));
        match &staged {
            Some(staged) => {
                self.cache.write(&key, staged.optimistic.clone());
                tracing::debug!(%key, "optimistic value written");
            }
            None => tracing::debug!(%key, "nothing cached, optimistic write skipped"),
        }

        let outcome = mutation.remote_call().await;

        let rolled_back = staged.is_some() && outcome.is_err();
        if let Some(value) = settle(staged, outcome.as_ref(), |optimistic, confirmed| {
            mutation.reconcile(optimistic, confirmed)
        }) {
            self.cache.write(&key, value);
        }

        match &outcome {
            Ok(_) => {
                tracing::info!(%key, "mutation confirmed");
                self.notifier.success(&mutation.success_message());
            }
            Err(err) => {
                tracing::warn!(%key, error = %err, rolled_back, "mutation failed");
                self.notifier.error(&err.user_message());
            }
        }
        outcome
    }
}
