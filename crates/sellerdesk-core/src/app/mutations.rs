//! Mutations - 商品に対する楽観的更新の記述子
//!
//! - `ChangeStatus`: `PATCH /products/:id/:status`（キー: `product{id}`）
//! - `UpdateProduct`: `PUT /products/:id`（キー: `product{id}`）
//! - `CreateProduct`: `POST /products`（キー: 絞り込みなしの `products`）

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Value, json};

use super::coordinator::{Mutation, merge_confirmed};
use crate::domain::{
    ApiError, Attachment, Category, Product, ProductDraft, ProductId, ProductResponse,
    ProductStatus, QueryKey,
};
use crate::ports::MarketplaceApi;

pub const STATUS_CHANGED_MESSAGE: &str = "Product status changed successfully";
pub const PRODUCT_UPDATED_MESSAGE: &str = "Product updated successfully";
pub const PRODUCT_CREATED_MESSAGE: &str = "Product created successfully";

/// `optimistic` にサーバーの値を重ねる
fn overlay(optimistic: &Value, confirmed: &impl Serialize) -> Value {
    let mut merged = optimistic.clone();
    match serde_json::to_value(confirmed) {
        Ok(confirmed) => merge_confirmed(&mut merged, confirmed),
        Err(err) => tracing::warn!(error = %err, "confirmed value could not be serialized"),
    }
    merged
}

/// `{ product: {...} }` の product オブジェクトを書き換える
fn edit_product(current: &Value, edit: impl FnOnce(&mut serde_json::Map<String, Value>)) -> Option<Value> {
    let mut next = current.clone();
    let product = next.get_mut("product")?.as_object_mut()?;
    edit(product);
    Some(next)
}

// ========================================
// ChangeStatus
// ========================================

pub struct ChangeStatus {
    api: Arc<dyn MarketplaceApi>,
    id: ProductId,
    status: ProductStatus,
}

impl ChangeStatus {
    pub fn new(api: Arc<dyn MarketplaceApi>, id: ProductId, status: ProductStatus) -> Self {
        Self { api, id, status }
    }
}

#[async_trait]
impl Mutation for ChangeStatus {
    type Confirmed = ProductResponse;

    fn target_key(&self) -> QueryKey {
        QueryKey::product(&self.id)
    }

    fn apply(&self, current: &Value) -> Option<Value> {
        edit_product(current, |product| {
            product.insert("status".into(), json!(self.status));
        })
    }

    async fn remote_call(&self) -> Result<ProductResponse, ApiError> {
        self.api.change_product_status(&self.id, self.status).await
    }

    fn reconcile(&self, optimistic: &Value, confirmed: &ProductResponse) -> Value {
        overlay(optimistic, confirmed)
    }

    fn success_message(&self) -> String {
        STATUS_CHANGED_MESSAGE.to_string()
    }
}

// ========================================
// UpdateProduct
// ========================================

/// 編集フォームの送信
///
/// `category` は categories キャッシュから引けたときだけ渡す。引けないときは
/// id だけ差し替え、タイトルはサーバーの応答で埋まる。
pub struct UpdateProduct {
    api: Arc<dyn MarketplaceApi>,
    id: ProductId,
    draft: ProductDraft,
    category: Option<Category>,
    attachments: Vec<Attachment>,
}

impl UpdateProduct {
    pub fn new(
        api: Arc<dyn MarketplaceApi>,
        id: ProductId,
        draft: ProductDraft,
        category: Option<Category>,
        attachments: Vec<Attachment>,
    ) -> Self {
        Self {
            api,
            id,
            draft,
            category,
            attachments,
        }
    }
}

#[async_trait]
impl Mutation for UpdateProduct {
    type Confirmed = ProductResponse;

    fn target_key(&self) -> QueryKey {
        QueryKey::product(&self.id)
    }

    fn apply(&self, current: &Value) -> Option<Value> {
        let category = match &self.category {
            Some(category) => serde_json::to_value(category).ok()?,
            None => json!({ "id": self.draft.category_id }),
        };
        let attachments = serde_json::to_value(&self.attachments).ok()?;

        edit_product(current, |product| {
            product.insert("title".into(), json!(self.draft.title));
            product.insert("description".into(), json!(self.draft.description));
            product.insert("priceInCents".into(), json!(self.draft.price_in_cents));
            product.insert("category".into(), category);
            product.insert("attachments".into(), attachments);
        })
    }

    async fn remote_call(&self) -> Result<ProductResponse, ApiError> {
        self.api.update_product(&self.id, &self.draft).await
    }

    fn reconcile(&self, optimistic: &Value, confirmed: &ProductResponse) -> Value {
        overlay(optimistic, confirmed)
    }

    fn success_message(&self) -> String {
        PRODUCT_UPDATED_MESSAGE.to_string()
    }
}

// ========================================
// CreateProduct
// ========================================

/// 新規作成。仮 ID の商品を一覧の先頭に差し込み、確定後にサーバーの商品で置き換える。
pub struct CreateProduct {
    api: Arc<dyn MarketplaceApi>,
    draft: ProductDraft,
    provisional: Product,
}

impl CreateProduct {
    pub fn new(api: Arc<dyn MarketplaceApi>, draft: ProductDraft, provisional: Product) -> Self {
        debug_assert!(provisional.id.is_provisional());
        Self {
            api,
            draft,
            provisional,
        }
    }

    pub fn provisional(&self) -> &Product {
        &self.provisional
    }
}

/// 一覧の先頭に `product` を追加する。一覧の形でなければ `None`。
pub fn prepend_product(listing: &Value, product: Value) -> Option<Value> {
    let mut next = listing.clone();
    next.get_mut("products")?.as_array_mut()?.insert(0, product);
    Some(next)
}

/// `placeholder` の要素を `confirmed` で置き換える。見つからなければ先頭に追加。
pub fn replace_product(listing: &Value, placeholder: &ProductId, confirmed: Value) -> Value {
    let mut next = listing.clone();
    if let Some(products) = next.get_mut("products").and_then(Value::as_array_mut) {
        match products
            .iter()
            .position(|p| p.get("id").and_then(Value::as_str) == Some(placeholder.as_str()))
        {
            Some(idx) => products[idx] = confirmed,
            None => products.insert(0, confirmed),
        }
    }
    next
}

#[async_trait]
impl Mutation for CreateProduct {
    type Confirmed = ProductResponse;

    fn target_key(&self) -> QueryKey {
        QueryKey::product_listing()
    }

    fn apply(&self, current: &Value) -> Option<Value> {
        prepend_product(current, serde_json::to_value(&self.provisional).ok()?)
    }

    async fn remote_call(&self) -> Result<ProductResponse, ApiError> {
        self.api.create_product(&self.draft).await
    }

    fn reconcile(&self, optimistic: &Value, confirmed: &ProductResponse) -> Value {
        match serde_json::to_value(&confirmed.product) {
            Ok(product) => replace_product(optimistic, &self.provisional.id, product),
            Err(err) => {
                tracing::warn!(error = %err, "created product could not be serialized");
                optimistic.clone()
            }
        }
    }

    fn success_message(&self) -> String {
        PRODUCT_CREATED_MESSAGE.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::coordinator::MutationCoordinator;
    use crate::domain::{Credentials, PriceInCents, ProductFilter, ProductsResponse};
    use crate::impls::{InMemoryMarketplace, InMemoryResponseCache, RecordingNotifier};
    use crate::ports::{CacheExt, ResponseCache};

    struct Fixture {
        market: Arc<InMemoryMarketplace>,
        cache: Arc<InMemoryResponseCache>,
        notifier: Arc<RecordingNotifier>,
        coordinator: MutationCoordinator,
        category: Category,
    }

    async fn fixture() -> Fixture {
        let market = Arc::new(InMemoryMarketplace::new());
        let category = market.seed_category("Toys").await;
        market.seed_seller("Ana", "ana@example.com", "secret").await;
        market
            .sign_in(&Credentials {
                email: "ana@example.com".into(),
                password: "secret".into(),
            })
            .await
            .unwrap();
        let cache = Arc::new(InMemoryResponseCache::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let coordinator = MutationCoordinator::new(cache.clone(), notifier.clone());
        Fixture {
            market,
            cache,
            notifier,
            coordinator,
            category,
        }
    }

    fn draft(title: &str, category: &Category) -> ProductDraft {
        ProductDraft {
            title: title.to_string(),
            category_id: category.id.clone(),
            description: "used".into(),
            price_in_cents: PriceInCents::new(2500),
            attachments_ids: vec![],
        }
    }

    fn provisional(draft: &ProductDraft, category: &Category) -> Product {
        Product {
            id: ProductId::provisional(),
            title: draft.title.clone(),
            description: draft.description.clone(),
            price_in_cents: draft.price_in_cents,
            status: ProductStatus::Available,
            owner: None,
            category: category.clone(),
            attachments: vec![],
        }
    }

    fn create(f: &Fixture, title: &str) -> CreateProduct {
        let body = draft(title, &f.category);
        let placeholder = provisional(&body, &f.category);
        CreateProduct::new(f.market.clone(), body, placeholder)
    }

    #[tokio::test]
    async fn change_status_keeps_unechoed_fields() {
        let f = fixture().await;
        let created = f.market.create_product(&draft("Bike", &f.category)).await.unwrap();
        let key = QueryKey::product(&created.product.id);
        let mut cached = serde_json::to_value(&created).unwrap();
        cached["product"]["localNote"] = json!("kept");
        f.cache.write(&key, cached);

        f.coordinator
            .run(&ChangeStatus::new(
                f.market.clone(),
                created.product.id.clone(),
                ProductStatus::Sold,
            ))
            .await
            .unwrap();

        let value = f.cache.read(&key).unwrap();
        assert_eq!(value["product"]["status"], "sold");
        assert_eq!(value["product"]["localNote"], "kept");
        assert_eq!(f.notifier.successes(), vec![STATUS_CHANGED_MESSAGE]);
    }

    #[tokio::test]
    async fn rejected_status_change_restores_product() {
        let f = fixture().await;
        let created = f.market.create_product(&draft("Bike", &f.category)).await.unwrap();
        let key = QueryKey::product(&created.product.id);
        f.cache.write_as(&key, &created).unwrap();
        f.market
            .fail_next(ApiError::application(400, "cannot sell"))
            .await;

        let err = f
            .coordinator
            .run(&ChangeStatus::new(
                f.market.clone(),
                created.product.id.clone(),
                ProductStatus::Sold,
            ))
            .await
            .unwrap_err();

        assert_eq!(err.user_message(), "cannot sell");
        assert_eq!(f.cache.read_as::<ProductResponse>(&key), Some(created));
        assert_eq!(f.notifier.errors(), vec!["cannot sell"]);
    }

    #[tokio::test]
    async fn update_overwrites_form_fields() {
        let f = fixture().await;
        let created = f.market.create_product(&draft("Bike", &f.category)).await.unwrap();
        let key = QueryKey::product(&created.product.id);
        f.cache.write_as(&key, &created).unwrap();

        let mut body = draft("Road bike", &f.category);
        body.price_in_cents = PriceInCents::new(9900);
        let confirmed = f
            .coordinator
            .run(&UpdateProduct::new(
                f.market.clone(),
                created.product.id.clone(),
                body,
                Some(f.category.clone()),
                vec![],
            ))
            .await
            .unwrap();

        let cached: ProductResponse = f.cache.read_as(&key).unwrap();
        assert_eq!(cached.product.title, "Road bike");
        assert_eq!(cached.product.price_in_cents, PriceInCents::new(9900));
        assert_eq!(cached, confirmed);
        assert_eq!(f.notifier.successes(), vec![PRODUCT_UPDATED_MESSAGE]);
    }

    #[test]
    fn update_without_known_category_sets_only_its_id() {
        let current = json!({
            "product": {
                "id": "p1",
                "category": { "id": "c1", "title": "Toys", "slug": "toys" }
            }
        });
        let mutation = UpdateProduct::new(
            Arc::new(InMemoryMarketplace::new()),
            ProductId::new("p1"),
            ProductDraft {
                title: "t".into(),
                category_id: "c2".into(),
                description: "d".into(),
                price_in_cents: PriceInCents::new(1),
                attachments_ids: vec![],
            },
            None,
            vec![],
        );
        let next = mutation.apply(&current).unwrap();
        assert_eq!(next["product"]["category"], json!({ "id": "c2" }));
    }

    #[tokio::test]
    async fn creates_land_newest_first_in_an_existing_listing() {
        let f = fixture().await;
        let key = QueryKey::product_listing();
        f.cache.write_as(&key, &ProductsResponse { products: vec![] }).unwrap();

        for title in ["First", "Second", "Third"] {
            f.coordinator.run(&create(&f, title)).await.unwrap();
        }

        let listing: ProductsResponse = f.cache.read_as(&key).unwrap();
        let titles: Vec<_> = listing.products.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["Third", "Second", "First"]);
        assert!(listing.products.iter().all(|p| !p.id.is_provisional()));

        // サーバーの一覧と一致する
        let server = f.market.list_products(&ProductFilter::default()).await.unwrap();
        assert_eq!(listing, server);
    }

    #[tokio::test]
    async fn create_against_absent_listing_writes_nothing() {
        let f = fixture().await;
        f.coordinator.run(&create(&f, "Lonely")).await.unwrap();

        assert!(f.cache.read(&QueryKey::product_listing()).is_none());
        assert_eq!(f.market.product_count().await, 1);
        assert_eq!(f.notifier.successes(), vec![PRODUCT_CREATED_MESSAGE]);
    }

    #[tokio::test]
    async fn provisional_entry_is_visible_then_removed_on_failure() {
        let f = fixture().await;
        let key = QueryKey::product_listing();
        f.cache.write_as(&key, &ProductsResponse { products: vec![] }).unwrap();
        let mut events = f.cache.subscribe();
        f.market.fail_next(ApiError::Transport("offline".into())).await;

        let mutation = create(&f, "Ghost");
        f.coordinator.run(&mutation).await.unwrap_err();

        // optimistic → rollback の 2 回
        assert!(events.try_recv().is_ok());
        assert!(events.try_recv().is_ok());
        assert!(events.try_recv().is_err());
        let listing: ProductsResponse = f.cache.read_as(&key).unwrap();
        assert!(listing.products.is_empty());
    }

    #[test]
    fn replace_product_falls_back_to_prepend() {
        let listing = json!({ "products": [{ "id": "p1" }] });
        let next = replace_product(&listing, &ProductId::new("pending-x"), json!({ "id": "p2" }));
        assert_eq!(next, json!({ "products": [{ "id": "p2" }, { "id": "p1" }] }));
    }

    #[test]
    fn prepend_requires_a_listing_shape() {
        assert_eq!(prepend_product(&json!({ "product": {} }), json!({})), None);
    }
}
