//! Queries - 取得してキャッシュへ書き込む
//!
//! 各レスポンスはクエリキーの下にサーバーの形状のまま保存されます。
//! 失敗した取得はキャッシュに触れません。

use std::future::Future;
use std::sync::Arc;

use serde::Serialize;

use crate::domain::{
    ApiError, CategoriesResponse, MetricAmount, MetricKind, ProductFilter, ProductId,
    ProductResponse, ProductsResponse, QueryKey, SellerResponse, ViewsPerDayResponse,
};
use crate::ports::{CacheExt, MarketplaceApi, ResponseCache};

/// `call` の結果を `key` に書き込んで返す
pub async fn fetch_through<T, F>(
    cache: &dyn ResponseCache,
    key: QueryKey,
    call: F,
) -> Result<T, ApiError>
where
    T: Serialize,
    F: Future<Output = Result<T, ApiError>>,
{
    let response = call.await?;
    cache.write_as(&key, &response)?;
    tracing::debug!(%key, "query cached");
    Ok(response)
}

#[derive(Clone)]
pub struct Queries {
    api: Arc<dyn MarketplaceApi>,
    cache: Arc<dyn ResponseCache>,
}

impl Queries {
    pub fn new(api: Arc<dyn MarketplaceApi>, cache: Arc<dyn ResponseCache>) -> Self {
        Self { api, cache }
    }

    pub async fn profile(&self) -> Result<SellerResponse, ApiError> {
        fetch_through(&*self.cache, QueryKey::profile(), self.api.seller_profile()).await
    }

    pub async fn categories(&self) -> Result<CategoriesResponse, ApiError> {
        fetch_through(&*self.cache, QueryKey::categories(), self.api.categories()).await
    }

    pub async fn products(&self, filter: &ProductFilter) -> Result<ProductsResponse, ApiError> {
        fetch_through(
            &*self.cache,
            QueryKey::products(filter),
            self.api.list_products(filter),
        )
        .await
    }

    pub async fn product(&self, id: &ProductId) -> Result<ProductResponse, ApiError> {
        fetch_through(&*self.cache, QueryKey::product(id), self.api.product(id)).await
    }

    pub async fn products_sold(&self) -> Result<MetricAmount, ApiError> {
        let key = QueryKey::metric(MetricKind::ProductsSold);
        fetch_through(&*self.cache, key, self.api.products_sold()).await
    }

    pub async fn products_available(&self) -> Result<MetricAmount, ApiError> {
        let key = QueryKey::metric(MetricKind::ProductsAvailable);
        fetch_through(&*self.cache, key, self.api.products_available()).await
    }

    pub async fn seller_views(&self) -> Result<MetricAmount, ApiError> {
        let key = QueryKey::metric(MetricKind::SellerViews);
        fetch_through(&*self.cache, key, self.api.seller_views()).await
    }

    pub async fn views_per_day(&self) -> Result<ViewsPerDayResponse, ApiError> {
        fetch_through(
            &*self.cache,
            QueryKey::metric(MetricKind::SellerViewsPerDay),
            self.api.seller_views_per_day(),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Credentials;
    use crate::impls::{InMemoryMarketplace, InMemoryResponseCache};

    async fn queries() -> (Queries, Arc<InMemoryMarketplace>, Arc<InMemoryResponseCache>) {
        let market = Arc::new(InMemoryMarketplace::new());
        market.seed_category("Toys").await;
        market.seed_seller("Ana", "ana@example.com", "secret").await;
        market
            .sign_in(&Credentials {
                email: "ana@example.com".into(),
                password: "secret".into(),
            })
            .await
            .unwrap();
        let cache = Arc::new(InMemoryResponseCache::new());
        (Queries::new(market.clone(), cache.clone()), market, cache)
    }

    #[tokio::test]
    async fn responses_are_cached_under_their_key() {
        let (queries, _, cache) = queries().await;
        let categories = queries.categories().await.unwrap();
        assert_eq!(
            cache.read_as::<CategoriesResponse>(&QueryKey::categories()),
            Some(categories)
        );

        let me = queries.profile().await.unwrap();
        assert_eq!(me.seller.name, "Ana");
        assert!(cache.read(&QueryKey::profile()).is_some());
    }

    #[tokio::test]
    async fn filtered_listings_use_distinct_keys() {
        let (queries, _, cache) = queries().await;
        queries.products(&ProductFilter::default()).await.unwrap();
        queries
            .products(&ProductFilter::default().with_search("lamp"))
            .await
            .unwrap();
        assert!(cache.read(&QueryKey::product_listing()).is_some());
        assert_eq!(cache.len(), 2);
    }

    #[tokio::test]
    async fn failures_do_not_touch_the_cache() {
        let (queries, market, cache) = queries().await;
        market.fail_next(ApiError::Transport("down".into())).await;
        assert!(queries.categories().await.is_err());
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn metrics_are_cached_per_kind() {
        let (queries, _, cache) = queries().await;
        let sold = queries.products_sold().await.unwrap();
        assert_eq!(sold.amount, 0);
        queries.views_per_day().await.unwrap();
        assert!(cache.read(&QueryKey::metric(MetricKind::ProductsSold)).is_some());
        assert!(cache.read(&QueryKey::metric(MetricKind::SellerViewsPerDay)).is_some());
        assert!(cache.read(&QueryKey::metric(MetricKind::SellerViews)).is_none());
    }
}
