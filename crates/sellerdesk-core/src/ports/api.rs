//! MarketplaceApi port - リモート REST API の抽象化
//!
//! 1 エンドポイント = 1 メソッドです。戻り値はサーバーのレスポンス形状
//! （`{ product }`, `{ products }` など）をそのまま保ちます。この形状が
//! レスポンスキャッシュに保存されるためです。
//!
//! # 実装
//! - `HttpMarketplaceApi`: reqwest による本番用
//! - `InMemoryMarketplace`: テスト・デモ用のバックエンド

use async_trait::async_trait;

use crate::domain::{
    ApiError, AttachmentsResponse, CategoriesResponse, Credentials, MetricAmount, NewSeller,
    ProductDraft, ProductFilter, ProductId, ProductResponse, ProductStatus, ProductsResponse,
    SellerResponse, Upload, ViewsPerDayResponse,
};

/// MarketplaceApi はバックエンドへの型付き呼び出し
///
/// # 設計原則
/// - 2xx 以外は必ず `ApiError` になる（呼び出し側で握りつぶさない）
/// - リトライしない（トランスポートのタイムアウトのみ）
/// - セッション（cookie / bearer）の保持は実装側の責務
#[async_trait]
pub trait MarketplaceApi: Send + Sync {
    /// `POST /sellers`
    async fn register_seller(&self, body: &NewSeller) -> Result<SellerResponse, ApiError>;

    /// `POST /sellers/sessions`
    async fn sign_in(&self, credentials: &Credentials) -> Result<(), ApiError>;

    /// `POST /sign-out`
    async fn sign_out(&self) -> Result<(), ApiError>;

    /// `GET /sellers/me`
    async fn seller_profile(&self) -> Result<SellerResponse, ApiError>;

    /// `GET /categories`
    async fn categories(&self) -> Result<CategoriesResponse, ApiError>;

    /// `GET /products/me?page&status&search`
    async fn list_products(&self, filter: &ProductFilter) -> Result<ProductsResponse, ApiError>;

    /// `GET /products/:id`
    async fn product(&self, id: &ProductId) -> Result<ProductResponse, ApiError>;

    /// `POST /products`
    async fn create_product(&self, draft: &ProductDraft) -> Result<ProductResponse, ApiError>;

    /// `PUT /products/:id`
    async fn update_product(
        &self,
        id: &ProductId,
        draft: &ProductDraft,
    ) -> Result<ProductResponse, ApiError>;

    /// `PATCH /products/:id/:status`
    async fn change_product_status(
        &self,
        id: &ProductId,
        status: ProductStatus,
    ) -> Result<ProductResponse, ApiError>;

    /// `POST /attachments` (multipart, field `files`)
    async fn upload_attachments(&self, files: Vec<Upload>) -> Result<AttachmentsResponse, ApiError>;

    /// `GET /sellers/metrics/products/sold`
    async fn products_sold(&self) -> Result<MetricAmount, ApiError>;

    /// `GET /sellers/metrics/products/available`
    async fn products_available(&self) -> Result<MetricAmount, ApiError>;

    /// `GET /sellers/metrics/views`
    async fn seller_views(&self) -> Result<MetricAmount, ApiError>;

    /// `GET /sellers/metrics/views/days`
    async fn seller_views_per_day(&self) -> Result<ViewsPerDayResponse, ApiError>;
}
