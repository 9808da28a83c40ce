//! InMemoryMarketplace - 開発・テスト用のバックエンド
//!
//! 本物の API と同じ規則でふるまう、プロセス内のマーケットプレイスです。
//!
//! # 実装詳細
//! - tokio の Mutex で状態全体を保護
//! - セッションは 1 つ（このプロセスのクライアントだけ）
//! - 商品一覧は新しい順、1 ページ 20 件
//! - 状態遷移はクライアントと同じ遷移表で検証（不正な遷移は 400）
//! - `fail_next` で次の 1 回の呼び出しを失敗させられる

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{Days, NaiveDate, Utc};
use tokio::sync::Mutex;

use crate::domain::ids::{Id, IdMarker};
use crate::domain::{
    ApiError, Avatar, Attachment, AttachmentId, AttachmentsResponse, CategoriesResponse, Category,
    CategoryId, Credentials, DailyViews, MetricAmount, NewSeller, Product, ProductDraft,
    ProductFilter, ProductId, ProductResponse, ProductStatus, ProductsResponse, Seller, SellerId,
    SellerResponse, Upload, ViewsPerDayResponse,
};
use crate::ports::MarketplaceApi;

pub const PAGE_SIZE: usize = 20;
const VIEWS_WINDOW_DAYS: u64 = 30;

struct Account {
    seller: Seller,
    password: String,
}

#[derive(Default)]
struct State {
    accounts: Vec<Account>,
    session: Option<SellerId>,
    categories: Vec<Category>,
    /// 作成順
    products: Vec<Product>,
    attachments: HashMap<AttachmentId, Attachment>,
    views: Vec<(ProductId, NaiveDate)>,
    fail_next: Option<ApiError>,
}

fn new_id<T: IdMarker>() -> Id<T> {
    Id::new(ulid::Ulid::new().to_string().to_lowercase())
}

/// 404 "<Entity> not found"
fn not_found<T: IdMarker>(id: &Id<T>) -> ApiError {
    let entity = T::entity();
    tracing::debug!(entity, id = %id, "lookup missed");
    let mut chars = entity.chars();
    let name: String = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    };
    ApiError::application(404, format!("{name} not found"))
}

impl State {
    fn take_failure(&mut self) -> Result<(), ApiError> {
        match self.fail_next.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn current_seller(&self) -> Result<&Seller, ApiError> {
        let id = self.session.as_ref().ok_or(ApiError::Unauthorized)?;
        self.accounts
            .iter()
            .map(|a| &a.seller)
            .find(|s| &s.id == id)
            .ok_or(ApiError::Unauthorized)
    }

    fn category(&self, id: &CategoryId) -> Result<Category, ApiError> {
        self.categories
            .iter()
            .find(|c| &c.id == id)
            .cloned()
            .ok_or_else(|| not_found(id))
    }

    fn attachments(&self, ids: &[AttachmentId]) -> Result<Vec<Attachment>, ApiError> {
        ids.iter()
            .map(|id| {
                self.attachments
                    .get(id)
                    .cloned()
                    .ok_or_else(|| not_found(id))
            })
            .collect()
    }

    fn product_index(&self, id: &ProductId) -> Result<usize, ApiError> {
        self.products
            .iter()
            .position(|p| &p.id == id)
            .ok_or_else(|| not_found(id))
    }

    /// 自分の商品だけ変更できる
    fn owned_product_mut(&mut self, id: &ProductId) -> Result<&mut Product, ApiError> {
        let seller_id = self.current_seller()?.id.clone();
        let idx = self.product_index(id)?;
        let product = &mut self.products[idx];
        let owned = product.owner.as_ref().is_some_and(|owner| owner.id == seller_id);
        if !owned {
            return Err(ApiError::application(403, "You are not the owner of this product"));
        }
        Ok(product)
    }

    fn apply_draft(&self, product: &mut Product, draft: &ProductDraft) -> Result<(), ApiError> {
        product.category = self.category(&draft.category_id)?;
        product.attachments = self.attachments(&draft.attachments_ids)?;
        product.title = draft.title.clone();
        product.description = draft.description.clone();
        product.price_in_cents = draft.price_in_cents;
        Ok(())
    }

    fn count_owned(&self, seller_id: &SellerId, status: ProductStatus) -> u64 {
        self.products
            .iter()
            .filter(|p| p.status == status)
            .filter(|p| p.owner.as_ref().is_some_and(|o| &o.id == seller_id))
            .count() as u64
    }

    fn owned_views_per_day(&self, seller_id: &SellerId, today: NaiveDate) -> Vec<DailyViews> {
        let owned: Vec<&ProductId> = self
            .products
            .iter()
            .filter(|p| p.owner.as_ref().is_some_and(|o| &o.id == seller_id))
            .map(|p| &p.id)
            .collect();
        let first = today
            .checked_sub_days(Days::new(VIEWS_WINDOW_DAYS - 1))
            .unwrap_or(today);

        first
            .iter_days()
            .take_while(|day| *day <= today)
            .map(|date| DailyViews {
                date,
                amount: self
                    .views
                    .iter()
                    .filter(|(id, day)| *day == date && owned.contains(&id))
                    .count() as u64,
            })
            .collect()
    }
}

/// InMemoryMarketplace は MarketplaceApi のプロセス内実装
///
/// # 使用例
/// ```ignore
/// let market = InMemoryMarketplace::new();
/// let toys = market.seed_category("Toys").await;
/// market.seed_seller("Ana", "ana@example.com", "secret").await;
/// market.sign_in(&credentials).await?;
/// ```
#[derive(Default)]
pub struct InMemoryMarketplace {
    state: Mutex<State>,
}

impl InMemoryMarketplace {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn seed_category(&self, title: &str) -> Category {
        let category = Category {
            id: new_id(),
            title: title.to_string(),
            slug: title.to_lowercase().replace(' ', "-"),
        };
        self.state.lock().await.categories.push(category.clone());
        category
    }

    pub async fn seed_seller(&self, name: &str, email: &str, password: &str) -> Seller {
        let seller = Seller {
            id: new_id(),
            name: name.to_string(),
            phone: String::new(),
            email: email.to_string(),
            avatar: None,
        };
        self.state.lock().await.accounts.push(Account {
            seller: seller.clone(),
            password: password.to_string(),
        });
        seller
    }

    /// Count one visit of `product_id` on `date`.
    pub async fn record_view(&self, product_id: &ProductId, date: NaiveDate) {
        self.state.lock().await.views.push((product_id.clone(), date));
    }

    /// The next call (whatever it is) fails with `err`.
    pub async fn fail_next(&self, err: ApiError) {
        self.state.lock().await.fail_next = Some(err);
    }

    /// Drop the session as if it expired on the server.
    pub async fn expire_session(&self) {
        self.state.lock().await.session = None;
    }

    /// Server-side view of a product, bypassing authentication.
    pub async fn stored_product(&self, id: &ProductId) -> Option<Product> {
        let state = self.state.lock().await;
        state.products.iter().find(|p| &p.id == id).cloned()
    }

    pub async fn product_count(&self) -> usize {
        self.state.lock().await.products.len()
    }
}

#[async_trait]
impl MarketplaceApi for InMemoryMarketplace {
    async fn register_seller(&self, body: &NewSeller) -> Result<SellerResponse, ApiError> {
        let mut state = self.state.lock().await;
        state.take_failure()?;

        if state.accounts.iter().any(|a| a.seller.email == body.email) {
            return Err(ApiError::application(409, "This e-mail is already registered"));
        }
        if body.password != body.password_confirmation {
            return Err(ApiError::application(400, "Passwords do not match"));
        }
        let avatar = match &body.avatar_id {
            Some(id) => {
                let attachment = state.attachments(std::slice::from_ref(id))?.remove(0);
                Some(Avatar {
                    id: attachment.id,
                    url: attachment.url,
                })
            }
            None => None,
        };

        let seller = Seller {
            id: new_id(),
            name: body.name.clone(),
            phone: body.phone.clone(),
            email: body.email.clone(),
            avatar,
        };
        state.accounts.push(Account {
            seller: seller.clone(),
            password: body.password.clone(),
        });
        Ok(SellerResponse { seller })
    }

    async fn sign_in(&self, credentials: &Credentials) -> Result<(), ApiError> {
        let mut state = self.state.lock().await;
        state.take_failure()?;

        let seller_id = state
            .accounts
            .iter()
            .find(|a| a.seller.email == credentials.email && a.password == credentials.password)
            .map(|a| a.seller.id.clone())
            .ok_or_else(|| ApiError::application(401, "Invalid credentials"))?;
        state.session = Some(seller_id);
        Ok(())
    }

    async fn sign_out(&self) -> Result<(), ApiError> {
        let mut state = self.state.lock().await;
        state.take_failure()?;
        state.session = None;
        Ok(())
    }

    async fn seller_profile(&self) -> Result<SellerResponse, ApiError> {
        let mut state = self.state.lock().await;
        state.take_failure()?;
        let seller = state.current_seller()?.clone();
        Ok(SellerResponse { seller })
    }

    async fn categories(&self) -> Result<CategoriesResponse, ApiError> {
        let mut state = self.state.lock().await;
        state.take_failure()?;
        Ok(CategoriesResponse {
            categories: state.categories.clone(),
        })
    }

    async fn list_products(&self, filter: &ProductFilter) -> Result<ProductsResponse, ApiError> {
        let mut state = self.state.lock().await;
        state.take_failure()?;
        let seller_id = state.current_seller()?.id.clone();

        let search = filter.search.as_ref().map(|s| s.to_lowercase());
        let page = filter.page.unwrap_or(1).max(1) as usize;
        let products = state
            .products
            .iter()
            .rev()
            .filter(|p| p.owner.as_ref().is_some_and(|o| o.id == seller_id))
            .filter(|p| filter.status.is_none_or(|status| p.status == status))
            .filter(|p| match &search {
                Some(search) => {
                    p.title.to_lowercase().contains(search)
                        || p.description.to_lowercase().contains(search)
                }
                None => true,
            })
            .skip((page - 1) * PAGE_SIZE)
            .take(PAGE_SIZE)
            .cloned()
            .collect();
        Ok(ProductsResponse { products })
    }

    async fn product(&self, id: &ProductId) -> Result<ProductResponse, ApiError> {
        let mut state = self.state.lock().await;
        state.take_failure()?;
        let idx = state.product_index(id)?;
        Ok(ProductResponse {
            product: state.products[idx].clone(),
        })
    }

    async fn create_product(&self, draft: &ProductDraft) -> Result<ProductResponse, ApiError> {
        let mut state = self.state.lock().await;
        state.take_failure()?;
        let owner = state.current_seller()?.clone();

        let mut product = Product {
            id: new_id(),
            title: String::new(),
            description: String::new(),
            price_in_cents: draft.price_in_cents,
            status: ProductStatus::Available,
            owner: Some(owner),
            category: state.category(&draft.category_id)?,
            attachments: Vec::new(),
        };
        state.apply_draft(&mut product, draft)?;
        state.products.push(product.clone());
        Ok(ProductResponse { product })
    }

    async fn update_product(
        &self,
        id: &ProductId,
        draft: &ProductDraft,
    ) -> Result<ProductResponse, ApiError> {
        let mut state = self.state.lock().await;
        state.take_failure()?;

        let mut product = state.owned_product_mut(id)?.clone();
        state.apply_draft(&mut product, draft)?;
        *state.owned_product_mut(id)? = product.clone();
        Ok(ProductResponse { product })
    }

    async fn change_product_status(
        &self,
        id: &ProductId,
        status: ProductStatus,
    ) -> Result<ProductResponse, ApiError> {
        let mut state = self.state.lock().await;
        state.take_failure()?;

        let product = state.owned_product_mut(id)?;
        if !product.status.can_transition_to(status) {
            return Err(ApiError::application(
                400,
                format!("Cannot change status from {} to {}", product.status, status),
            ));
        }
        product.status = status;
        Ok(ProductResponse {
            product: product.clone(),
        })
    }

    async fn upload_attachments(&self, files: Vec<Upload>) -> Result<AttachmentsResponse, ApiError> {
        let mut state = self.state.lock().await;
        state.take_failure()?;
        if files.is_empty() {
            return Err(ApiError::application(400, "No files uploaded"));
        }

        let attachments: Vec<Attachment> = files
            .into_iter()
            .map(|file| {
                let id: AttachmentId = new_id();
                let url = format!("memory://attachments/{id}/{}", file.file_name);
                Attachment { id, url }
            })
            .collect();
        for attachment in &attachments {
            state.attachments.insert(attachment.id.clone(), attachment.clone());
        }
        Ok(AttachmentsResponse { attachments })
    }

    async fn products_sold(&self) -> Result<MetricAmount, ApiError> {
        let mut state = self.state.lock().await;
        state.take_failure()?;
        let seller_id = state.current_seller()?.id.clone();
        Ok(MetricAmount {
            amount: state.count_owned(&seller_id, ProductStatus::Sold),
        })
    }

    async fn products_available(&self) -> Result<MetricAmount, ApiError> {
        let mut state = self.state.lock().await;
        state.take_failure()?;
        let seller_id = state.current_seller()?.id.clone();
        Ok(MetricAmount {
            amount: state.count_owned(&seller_id, ProductStatus::Available),
        })
    }

    async fn seller_views(&self) -> Result<MetricAmount, ApiError> {
        let mut state = self.state.lock().await;
        state.take_failure()?;
        let seller_id = state.current_seller()?.id.clone();
        let amount = state
            .owned_views_per_day(&seller_id, Utc::now().date_naive())
            .iter()
            .map(|d| d.amount)
            .sum();
        Ok(MetricAmount { amount })
    }

    async fn seller_views_per_day(&self) -> Result<ViewsPerDayResponse, ApiError> {
        let mut state = self.state.lock().await;
        state.take_failure()?;
        let seller_id = state.current_seller()?.id.clone();
        Ok(ViewsPerDayResponse {
            views_per_day: state.owned_views_per_day(&seller_id, Utc::now().date_naive()),
        })
    }
}
