//! SellerConsole - 販売者コンソールのファサード
//!
//! API・キャッシュ・通知・コーディネーター・セッションをまとめ、画面の操作に
//! 対応するメソッドを提供します。
//!
//! # エラーの流れ
//! - フォームの検証エラーは `ApiError::Validation` として返す（ネットワークに出ない）
//! - すべての API 呼び出しは `SessionTracker::observe` を通る（401 → サインイン待ち）
//! - ミューテーションの通知はコーディネーターが 1 回だけ出す

use std::sync::Arc;

use crate::domain::{
    ApiError, Attachment, AttachmentId, Category, CategoryId, DashboardMetrics, Product,
    ProductDraft, ProductFilter, ProductForm, ProductId, ProductResponse, ProductStatus,
    ProductsResponse, CategoriesResponse, QueryKey, RegistrationForm, Seller, SellerResponse,
    SessionState, SignInForm, Upload, ValidationErrors, ViewsSeries,
};
use crate::impls::{InMemoryResponseCache, TracingNotifier};
use crate::ports::{CacheExt, MarketplaceApi, Notifier, ResponseCache};

use super::coordinator::MutationCoordinator;
use super::mutations::{ChangeStatus, CreateProduct, UpdateProduct};
use super::queries::Queries;
use super::session::SessionTracker;
use super::status_actions::{StatusAction, status_actions};

pub const REGISTERED_MESSAGE: &str = "Registration completed successfully";

pub struct SellerConsole {
    api: Arc<dyn MarketplaceApi>,
    cache: Arc<dyn ResponseCache>,
    notifier: Arc<dyn Notifier>,
    coordinator: MutationCoordinator,
    queries: Queries,
    session: SessionTracker,
}

impl SellerConsole {
    pub fn new(
        api: Arc<dyn MarketplaceApi>,
        cache: Arc<dyn ResponseCache>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            coordinator: MutationCoordinator::new(cache.clone(), notifier.clone()),
            queries: Queries::new(api.clone(), cache.clone()),
            session: SessionTracker::default(),
            api,
            cache,
            notifier,
        }
    }

    /// 空のキャッシュと tracing への通知で組み立てる
    pub fn with_api(api: Arc<dyn MarketplaceApi>) -> Self {
        Self::new(
            api,
            Arc::new(InMemoryResponseCache::new()),
            Arc::new(TracingNotifier),
        )
    }

    /// 保存済みのセッションで再開したとき
    pub fn assume_signed_in(self) -> Self {
        self.session.signed_in();
        self
    }

    pub fn cache(&self) -> &Arc<dyn ResponseCache> {
        &self.cache
    }

    pub fn session(&self) -> &SessionTracker {
        &self.session
    }

    pub fn session_state(&self) -> SessionState {
        self.session.state()
    }

    // ========================================
    // 認証
    // ========================================

    pub async fn register(&self, form: &RegistrationForm) -> Result<Seller, ApiError> {
        let mut body = form.validate()?;
        if let Some(avatar) = form.avatar.first() {
            let uploaded = self.upload(vec![avatar.clone()]).await?;
            body.avatar_id = uploaded.into_iter().next().map(|a| a.id);
        }

        match self.api.register_seller(&body).await {
            Ok(response) => {
                tracing::info!(seller = %response.seller.id, "seller registered");
                self.notifier.success(REGISTERED_MESSAGE);
                Ok(response.seller)
            }
            Err(err) => {
                self.notifier.error(&err.user_message());
                Err(err)
            }
        }
    }

    pub async fn sign_in(&self, form: &SignInForm) -> Result<Seller, ApiError> {
        let credentials = form.validate()?;
        if let Err(err) = self.api.sign_in(&credentials).await {
            self.notifier.error(&err.user_message());
            return Err(err);
        }
        self.session.signed_in();
        Ok(self.profile().await?.seller)
    }

    /// サーバー側の結果に関わらず、ローカルのキャッシュとセッションは破棄する
    pub async fn sign_out(&self) -> Result<(), ApiError> {
        let result = self.api.sign_out().await;
        self.cache.clear();
        self.session.signed_out();
        result
    }

    // ========================================
    // 取得
    // ========================================

    pub async fn profile(&self) -> Result<SellerResponse, ApiError> {
        self.session.observe(self.queries.profile().await)
    }

    pub async fn categories(&self) -> Result<CategoriesResponse, ApiError> {
        self.session.observe(self.queries.categories().await)
    }

    pub async fn products(&self, filter: &ProductFilter) -> Result<ProductsResponse, ApiError> {
        self.session.observe(self.queries.products(filter).await)
    }

    pub async fn product(&self, id: &ProductId) -> Result<ProductResponse, ApiError> {
        self.session.observe(self.queries.product(id).await)
    }

    /// 4 つの指標を並行して取得する
    pub async fn dashboard(&self) -> Result<DashboardMetrics, ApiError> {
        let result = tokio::try_join!(
            self.queries.products_sold(),
            self.queries.products_available(),
            self.queries.seller_views(),
            self.queries.views_per_day(),
        );
        let (sold, available, views, per_day) = self.session.observe(result)?;
        Ok(DashboardMetrics {
            products_sold: sold.amount,
            products_available: available.amount,
            seller_views: views.amount,
            views_per_day: ViewsSeries::from(per_day),
        })
    }

    /// キャッシュにある状態から選べる操作。商品が未取得なら `None`。
    pub fn cached_status_actions(&self, id: &ProductId) -> Option<Vec<StatusAction>> {
        self.cached_product(id).map(|p| status_actions(p.status))
    }

    // ========================================
    // 変更
    // ========================================

    pub async fn create_product(&self, form: &ProductForm) -> Result<Product, ApiError> {
        let valid = form.validate_new()?;
        let attachments = self.upload(valid.attachments.clone()).await?;
        let draft = ProductDraft {
            title: valid.title,
            category_id: valid.category_id,
            description: valid.description,
            price_in_cents: valid.price_in_cents,
            attachments_ids: attachment_ids(&attachments),
        };

        let provisional = Product {
            id: ProductId::provisional(),
            title: draft.title.clone(),
            description: draft.description.clone(),
            price_in_cents: draft.price_in_cents,
            status: ProductStatus::Available,
            owner: self
                .cache
                .read_as::<SellerResponse>(&QueryKey::profile())
                .map(|me| me.seller),
            category: self
                .cached_category(&draft.category_id)
                .unwrap_or_else(|| Category {
                    id: draft.category_id.clone(),
                    title: String::new(),
                    slug: String::new(),
                }),
            attachments,
        };

        let mutation = CreateProduct::new(self.api.clone(), draft, provisional);
        let confirmed = self.session.observe(self.coordinator.run(&mutation).await)?;
        self.cache
            .write_as(&QueryKey::product(&confirmed.product.id), &confirmed)?;
        Ok(confirmed.product)
    }

    /// 新しい画像がなければ、既存の添付をそのまま送る
    pub async fn update_product(&self, id: &ProductId, form: &ProductForm) -> Result<Product, ApiError> {
        let valid = form.validate()?;
        let attachments = if valid.attachments.is_empty() {
            match self.cached_product(id) {
                Some(product) => product.attachments,
                None => self.product(id).await?.product.attachments,
            }
        } else {
            self.upload(valid.attachments.clone()).await?
        };
        let category = self.cached_category(&valid.category_id);
        let draft = ProductDraft {
            title: valid.title,
            category_id: valid.category_id,
            description: valid.description,
            price_in_cents: valid.price_in_cents,
            attachments_ids: attachment_ids(&attachments),
        };

        let mutation = UpdateProduct::new(self.api.clone(), id.clone(), draft, category, attachments);
        let confirmed = self.session.observe(self.coordinator.run(&mutation).await)?;
        Ok(confirmed.product)
    }

    /// キャッシュに状態があれば遷移表で事前に検証する
    pub async fn change_status(&self, id: &ProductId, next: ProductStatus) -> Result<Product, ApiError> {
        if let Some(current) = self.cached_product(id).map(|p| p.status) {
            if !current.can_transition_to(next) {
                let mut errors = ValidationErrors::new();
                errors.add("status", format!("cannot change status from {current} to {next}"));
                return Err(errors.into());
            }
        }

        let mutation = ChangeStatus::new(self.api.clone(), id.clone(), next);
        let confirmed = self.session.observe(self.coordinator.run(&mutation).await)?;
        Ok(confirmed.product)
    }

    // ========================================
    // 内部
    // ========================================

    async fn upload(&self, files: Vec<Upload>) -> Result<Vec<Attachment>, ApiError> {
        match self.session.observe(self.api.upload_attachments(files).await) {
            Ok(response) => Ok(response.attachments),
            Err(err) => {
                self.notifier.error(&err.user_message());
                Err(err)
            }
        }
    }

    fn cached_product(&self, id: &ProductId) -> Option<Product> {
        self.cache
            .read_as::<ProductResponse>(&QueryKey::product(id))
            .map(|r| r.product)
    }

    fn cached_category(&self, id: &CategoryId) -> Option<Category> {
        self.cache
            .read_as::<CategoriesResponse>(&QueryKey::categories())?
            .categories
            .into_iter()
            .find(|c| &c.id == id)
    }
}

fn attachment_ids(attachments: &[Attachment]) -> Vec<AttachmentId> {
    attachments.iter().map(|a| a.id.clone()).collect()
}
