//! ProductStatus - 商品の状態と遷移表
//!
//! # 状態遷移
//! - available → sold
//! - available → cancelled
//! - sold → available
//! - cancelled → available
//!
//! sold ↔ cancelled の直接遷移はありません。終端状態もありません
//! （どの状態からも available を経由して他の状態へ到達できます）。
//!
//! この表はクライアント（操作の提示・事前チェック）とインメモリのバックエンド
//! （サーバー側チェック）の両方で使います。

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 商品の公開状態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductStatus {
    /// 出品中
    Available,
    /// 販売済み
    Sold,
    /// 出品停止
    Cancelled,
}

impl ProductStatus {
    pub const ALL: [ProductStatus; 3] = [
        ProductStatus::Available,
        ProductStatus::Sold,
        ProductStatus::Cancelled,
    ];

    /// 現在の状態から遷移できる状態の一覧（表の順序を保つ）
    pub fn allowed_transitions(self) -> &'static [ProductStatus] {
        match self {
            ProductStatus::Available => &[ProductStatus::Sold, ProductStatus::Cancelled],
            ProductStatus::Sold => &[ProductStatus::Available],
            ProductStatus::Cancelled => &[ProductStatus::Available],
        }
    }

    pub fn can_transition_to(self, next: ProductStatus) -> bool {
        self.allowed_transitions().contains(&next)
    }

    /// Wire form used in paths and query strings.
    pub fn as_str(self) -> &'static str {
        match self {
            ProductStatus::Available => "available",
            ProductStatus::Sold => "sold",
            ProductStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for ProductStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown product status '{0}' (expected available, sold or cancelled)")]
pub struct ParseStatusError(pub String);

impl FromStr for ProductStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "available" => Ok(ProductStatus::Available),
            "sold" => Ok(ProductStatus::Sold),
            "cancelled" => Ok(ProductStatus::Cancelled),
            _ => Err(ParseStatusError(s.to_string())),
        }
    }
}
