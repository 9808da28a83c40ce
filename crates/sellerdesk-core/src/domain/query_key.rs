//! QueryKey - レスポンスキャッシュのキー
//!
//! キーは「リソース名 + パラメータ」の組です。パラメータは `BTreeMap` なので
//! 挿入順に関係なく同じ組み合わせは同じキーになります。値のないパラメータは
//! 入れないため、フィルタなしの商品一覧は `products{}` になります。
//!
//! # キーの規約
//! - `product{id}`: 商品 1 件（`{ product }`）
//! - `products{page,search,status}`: 自分の商品一覧（`{ products }`）
//! - `categories`: カテゴリ一覧
//! - `me`: ログイン中のセラー
//! - `metrics{kind}`: ダッシュボードの各指標

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

use super::ids::ProductId;
use super::product::ProductFilter;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryKey {
    resource: Cow<'static, str>,
    params: BTreeMap<String, String>,
}

/// 指標の種類（`metrics{kind}` の kind）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricKind {
    ProductsSold,
    ProductsAvailable,
    SellerViews,
    SellerViewsPerDay,
}

impl MetricKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MetricKind::ProductsSold => "sold",
            MetricKind::ProductsAvailable => "available",
            MetricKind::SellerViews => "seller-views",
            MetricKind::SellerViewsPerDay => "seller-views-per-day",
        }
    }
}

impl QueryKey {
    pub fn new(resource: impl Into<Cow<'static, str>>) -> Self {
        Self {
            resource: resource.into(),
            params: BTreeMap::new(),
        }
    }

    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    /// `None` のパラメータはキーに含めない
    pub fn with_optional_param(self, name: impl Into<String>, value: Option<impl Into<String>>) -> Self {
        match value {
            Some(value) => self.with_param(name, value),
            None => self,
        }
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    // ========================================
    // キーの規約
    // ========================================

    pub fn product(id: &ProductId) -> Self {
        Self::new("product").with_param("id", id.as_str())
    }

    pub fn products(filter: &ProductFilter) -> Self {
        Self::new("products")
            .with_optional_param("page", filter.page.map(|p| p.to_string()))
            .with_optional_param("status", filter.status.map(|s| s.to_string()))
            .with_optional_param("search", filter.search.clone())
    }

    /// フィルタなしの一覧（新規作成時の挿入先）
    pub fn product_listing() -> Self {
        Self::products(&ProductFilter::default())
    }

    pub fn categories() -> Self {
        Self::new("categories")
    }

    pub fn profile() -> Self {
        Self::new("me")
    }

    pub fn metric(kind: MetricKind) -> Self {
        Self::new("metrics").with_param("kind", kind.as_str())
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.resource)?;
        if self.params.is_empty() {
            return Ok(());
        }
        f.write_str("{")?;
        for (i, (name, value)) in self.params.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{name}={value}")?;
        }
        f.write_str("}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ProductStatus;

    #[test]
    fn empty_filter_is_the_listing_key() {
        let key = QueryKey::products(&ProductFilter::default());
        assert_eq!(key, QueryKey::product_listing());
        assert_eq!(key.to_string(), "products");
    }

    #[test]
    fn param_order_does_not_matter() {
        let a = QueryKey::new("products")
            .with_param("status", "sold")
            .with_param("search", "lamp");
        let b = QueryKey::new("products")
            .with_param("search", "lamp")
            .with_param("status", "sold");
        assert_eq!(a, b);
    }

    #[test]
    fn filtered_listing_differs_from_unfiltered() {
        let filter = ProductFilter::default().with_status(ProductStatus::Sold);
        let key = QueryKey::products(&filter);
        assert_ne!(key, QueryKey::product_listing());
        assert_eq!(key.param("status"), Some("sold"));
        assert_eq!(key.to_string(), "products{status=sold}");
    }

    #[test]
    fn product_key_carries_id() {
        let key = QueryKey::product(&ProductId::new("p1"));
        assert_eq!(key.resource(), "product");
        assert_eq!(key.param("id"), Some("p1"));
        assert_ne!(key, QueryKey::product(&ProductId::new("p2")));
    }

    #[test]
    fn metric_keys_are_distinct() {
        assert_ne!(
            QueryKey::metric(MetricKind::SellerViews),
            QueryKey::metric(MetricKind::SellerViewsPerDay)
        );
    }
}
