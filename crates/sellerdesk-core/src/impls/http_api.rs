//! HttpMarketplaceApi - reqwest による MarketplaceApi の実装
//!
//! # 実装詳細
//! - JSON ボディは serde で送受信
//! - 2xx 以外は `{ statusCode, message }` を読んで ApiError に変換
//!   （message は文字列または文字列の配列）
//! - サインイン時に Set-Cookie（cookie の name=value）またはボディの
//!   `accessToken`（bearer）をセッションとして保持し、以降のリクエストに付与
//! - タイムアウト以外のリトライはしない

use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{COOKIE, HeaderMap, SET_COOKIE};
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::config::ConsoleConfig;
use crate::domain::{
    ApiError, AttachmentsResponse, CategoriesResponse, Credentials, MetricAmount, NewSeller,
    ProductDraft, ProductFilter, ProductId, ProductResponse, ProductStatus, ProductsResponse,
    SellerResponse, Upload, ViewsPerDayResponse,
};
use crate::ports::MarketplaceApi;

/// 認証済みセッション。CLI はこれをファイルに保存して次回の起動で復元する。
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum SessionToken {
    /// `name=value` pair taken from `Set-Cookie`.
    Cookie(String),
    Bearer(String),
}

impl std::fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionToken::Cookie(_) => f.write_str("SessionToken::Cookie(***)"),
            SessionToken::Bearer(_) => f.write_str("SessionToken::Bearer(***)"),
        }
    }
}

pub struct HttpMarketplaceApi {
    client: reqwest::Client,
    base_url: String,
    session: RwLock<Option<SessionToken>>,
}

impl HttpMarketplaceApi {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Transport(format!("failed to build http client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session: RwLock::new(None),
        })
    }

    pub fn from_config(config: &ConsoleConfig) -> Result<Self, ApiError> {
        Self::new(&config.api_url, config.timeout())
    }

    /// Resume a session saved by an earlier process.
    pub fn with_session(self, token: SessionToken) -> Self {
        self.set_session(Some(token));
        self
    }

    pub fn session(&self) -> Option<SessionToken> {
        self.session.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn set_session(&self, token: Option<SessionToken>) {
        *self.session.write().unwrap_or_else(PoisonError::into_inner) = token;
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        tracing::debug!(%method, path, "api request");
        let builder = self.client.request(method, self.url(path));
        match self.session() {
            Some(SessionToken::Cookie(cookie)) => builder.header(COOKIE, cookie),
            Some(SessionToken::Bearer(token)) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response, ApiError> {
        let response = builder.send().await.map_err(transport_error)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.bytes().await.unwrap_or_default();
        let err = error_from_body(status.as_u16(), &body);
        tracing::debug!(status = status.as_u16(), error = %err, "api request failed");
        Err(err)
    }

    async fn json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ApiError> {
        let response = self.send(builder).await?;
        let body = response.bytes().await.map_err(transport_error)?;
        Ok(serde_json::from_slice(&body)?)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.json(self.request(Method::GET, path)).await
    }
}

fn transport_error(err: reqwest::Error) -> ApiError {
    if err.is_decode() {
        ApiError::Decode(err.to_string())
    } else {
        ApiError::Transport(err.to_string())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    #[serde(default)]
    status_code: Option<u16>,
    #[serde(default)]
    message: Option<ErrorMessage>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ErrorMessage {
    One(String),
    Many(Vec<String>),
}

/// Build the typed error for a non-2xx response. The body's `statusCode` wins
/// over the HTTP status when both are present.
pub(crate) fn error_from_body(http_status: u16, body: &[u8]) -> ApiError {
    match serde_json::from_slice::<ErrorBody>(body) {
        Ok(parsed) => {
            let message = parsed.message.map(|m| match m {
                ErrorMessage::One(message) => message,
                ErrorMessage::Many(messages) => messages.join("; "),
            });
            ApiError::from_status(parsed.status_code.unwrap_or(http_status), message)
        }
        Err(_) => ApiError::from_status(http_status, None),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInBody {
    access_token: String,
}

/// Prefer the session cookie; fall back to a bearer token in the body.
pub(crate) fn session_from_response(headers: &HeaderMap, body: &[u8]) -> Option<SessionToken> {
    let cookie = headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(|value| value.split(';').next())
        .map(str::trim)
        .find(|pair| pair.contains('='));
    if let Some(pair) = cookie {
        return Some(SessionToken::Cookie(pair.to_string()));
    }
    serde_json::from_slice::<SignInBody>(body)
        .ok()
        .map(|b| SessionToken::Bearer(b.access_token))
}

#[async_trait]
impl MarketplaceApi for HttpMarketplaceApi {
    async fn register_seller(&self, body: &NewSeller) -> Result<SellerResponse, ApiError> {
        self.json(self.request(Method::POST, "/sellers").json(body)).await
    }

    async fn sign_in(&self, credentials: &Credentials) -> Result<(), ApiError> {
        let response = self
            .send(self.request(Method::POST, "/sellers/sessions").json(credentials))
            .await?;
        let headers = response.headers().clone();
        let body = response.bytes().await.map_err(transport_error)?;
        match session_from_response(&headers, &body) {
            Some(token) => {
                tracing::info!(email = %credentials.email, "signed in");
                self.set_session(Some(token));
                Ok(())
            }
            None => Err(ApiError::Decode(
                "sign-in response carried neither a session cookie nor an access token".into(),
            )),
        }
    }

    async fn sign_out(&self) -> Result<(), ApiError> {
        let result = self.send(self.request(Method::POST, "/sign-out")).await;
        // サーバー側の結果に関係なくローカルのセッションは破棄する
        self.set_session(None);
        result.map(|_| ())
    }

    async fn seller_profile(&self) -> Result<SellerResponse, ApiError> {
        self.get("/sellers/me").await
    }

    async fn categories(&self) -> Result<CategoriesResponse, ApiError> {
        self.get("/categories").await
    }

    async fn list_products(&self, filter: &ProductFilter) -> Result<ProductsResponse, ApiError> {
        let query = filter.query_pairs();
        self.json(self.request(Method::GET, "/products/me").query(&query))
            .await
    }

    async fn product(&self, id: &ProductId) -> Result<ProductResponse, ApiError> {
        self.get(&format!("/products/{id}")).await
    }

    async fn create_product(&self, draft: &ProductDraft) -> Result<ProductResponse, ApiError> {
        self.json(self.request(Method::POST, "/products").json(draft))
            .await
    }

    async fn update_product(
        &self,
        id: &ProductId,
        draft: &ProductDraft,
    ) -> Result<ProductResponse, ApiError> {
        self.json(self.request(Method::PUT, &format!("/products/{id}")).json(draft))
            .await
    }

    async fn change_product_status(
        &self,
        id: &ProductId,
        status: ProductStatus,
    ) -> Result<ProductResponse, ApiError> {
        self.json(self.request(Method::PATCH, &format!("/products/{id}/{status}")))
            .await
    }

    async fn upload_attachments(&self, files: Vec<Upload>) -> Result<AttachmentsResponse, ApiError> {
        let mut form = reqwest::multipart::Form::new();
        for file in files {
            let part = reqwest::multipart::Part::bytes(file.bytes)
                .file_name(file.file_name)
                .mime_str(&file.content_type)
                .map_err(|e| ApiError::Transport(format!("invalid content type: {e}")))?;
            form = form.part("files", part);
        }
        self.json(self.request(Method::POST, "/attachments").multipart(form))
            .await
    }

    async fn products_sold(&self) -> Result<MetricAmount, ApiError> {
        self.get("/sellers/metrics/products/sold").await
    }

    async fn products_available(&self) -> Result<MetricAmount, ApiError> {
        self.get("/sellers/metrics/products/available").await
    }

    async fn seller_views(&self) -> Result<MetricAmount, ApiError> {
        self.get("/sellers/metrics/views").await
    }

    async fn seller_views_per_day(&self) -> Result<ViewsPerDayResponse, ApiError> {
        self.get("/sellers/metrics/views/days").await
    }
}
