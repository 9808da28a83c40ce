//! Domain identifiers (strongly-typed IDs).
//!
//! # サーバー発行の文字列 ID + ジェネリック実装
//! マーケットプレイス API の ID はサーバーが発行する不透明な文字列です。
//! Phantom type パターンで `ProductId` と `CategoryId` などを型レベルで区別します。
//!
//! ## Phantom Type パターン
//! `Id<T>` というジェネリック型で共通実装を提供しつつ、
//! `T` は実行時には使わない（PhantomData）マーカー型として、
//! コンパイル時の型安全性を提供します。
//!
//! ## 仮 ID（provisional）
//! 楽観的な一覧挿入では、サーバーが ID を返す前に一覧へ商品を追加します。
//! そのときは `pending-<ULID>` 形式の仮 ID を使い、確定時にサーバーの ID で置き換えます。

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::marker::PhantomData;
use ulid::Ulid;

const PROVISIONAL_PREFIX: &str = "pending-";

/// IdMarker は各 ID 型のマーカー trait
pub trait IdMarker: Send + Sync + 'static {
    /// ログのフィールドと 404 メッセージで使うエンティティ名（例: "product"）
    fn entity() -> &'static str;
}

/// ジェネリック ID 型
///
/// # 例
/// ```ignore
/// let product_id = ProductId::new("p1");
/// let category_id = CategoryId::new("c1");
/// // product_id と category_id は異なる型なので、混同できない
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Id<T: IdMarker> {
    value: String,
    _marker: PhantomData<T>,
}

impl<T: IdMarker> Id<T> {
    /// サーバーから受け取った文字列で Id を作成
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            _marker: PhantomData,
        }
    }

    /// クライアント側の仮 ID を作成（`pending-<ULID>`）
    pub fn provisional() -> Self {
        Self::new(format!("{PROVISIONAL_PREFIX}{}", Ulid::new()))
    }

    /// 仮 ID かどうか
    pub fn is_provisional(&self) -> bool {
        self.value.starts_with(PROVISIONAL_PREFIX)
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    pub fn into_inner(self) -> String {
        self.value
    }
}

impl<T: IdMarker> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

impl<T: IdMarker> From<&str> for Id<T> {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl<T: IdMarker> From<String> for Id<T> {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

// 文字列としてそのまま（透過的に）シリアライズする
impl<T: IdMarker> Serialize for Id<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.value)
    }
}

impl<'de, T: IdMarker> Deserialize<'de> for Id<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::new)
    }
}

// ========================================
// マーカー型の定義
// ========================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Product {}

impl IdMarker for Product {
    fn entity() -> &'static str {
        "product"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {}

impl IdMarker for Category {
    fn entity() -> &'static str {
        "category"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Attachment {}

impl IdMarker for Attachment {
    fn entity() -> &'static str {
        "attachment"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Seller {}

impl IdMarker for Seller {
    fn entity() -> &'static str {
        "seller"
    }
}

// ========================================
// Type Alias（使いやすさのため）
// ========================================

/// Identifier of a product listing.
pub type ProductId = Id<Product>;

/// Identifier of a product category.
pub type CategoryId = Id<Category>;

/// Identifier of an uploaded attachment (image).
pub type AttachmentId = Id<Attachment>;

/// Identifier of a seller account.
pub type SellerId = Id<Seller>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_serialize_as_plain_strings() {
        let id = ProductId::new("p1");
        let serialized = serde_json::to_string(&id).unwrap();
        assert_eq!(serialized, "\"p1\"");

        let back: ProductId = serde_json::from_str(&serialized).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn provisional_ids_are_unique_and_marked() {
        let a = ProductId::provisional();
        let b = ProductId::provisional();

        assert_ne!(a, b);
        assert!(a.is_provisional());
        assert!(a.as_str().starts_with("pending-"));
        assert!(!ProductId::new("p1").is_provisional());
    }

    #[test]
    fn marker_reports_entity_name() {
        assert_eq!(Product::entity(), "product");
        assert_eq!(Attachment::entity(), "attachment");

        // let _: ProductId = CategoryId::new("c1"); // <- does not compile
    }

    #[test]
    fn phantom_data_does_not_consume_memory() {
        use std::mem::size_of;
        assert_eq!(size_of::<ProductId>(), size_of::<String>());
    }
}
