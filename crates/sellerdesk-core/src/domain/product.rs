//! Product model and wire envelopes.
//!
//! Response envelopes (`ProductResponse`, `ProductsResponse`, ...) keep the exact
//! JSON shape returned by the API, because that shape is what the response cache
//! stores under each query key.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ids::{AttachmentId, CategoryId, ProductId};
use super::seller::Seller;
use super::status::ProductStatus;

/// Price in the minor currency unit (cents). Never negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PriceInCents(u64);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PriceError {
    #[error("price is required")]
    Empty,
    #[error("price cannot be negative")]
    Negative,
    #[error("price has more than two decimal places")]
    TooPrecise,
    #[error("'{0}' is not a valid price")]
    Invalid(String),
    #[error("price is too large")]
    Overflow,
}

impl PriceInCents {
    pub const fn new(cents: u64) -> Self {
        Self(cents)
    }

    pub const fn cents(self) -> u64 {
        self.0
    }

    /// Parse a price typed in major units ("12", "12.5", "12,50", "1 200,00").
    ///
    /// Both `.` and `,` are accepted as the decimal separator. Integer arithmetic
    /// only, so "0.29" is exactly 29 cents.
    pub fn parse_major(input: &str) -> Result<Self, PriceError> {
        let cleaned: String = input.chars().filter(|c| !c.is_whitespace()).collect();
        if cleaned.is_empty() {
            return Err(PriceError::Empty);
        }
        if cleaned.starts_with('-') {
            return Err(PriceError::Negative);
        }
        let cleaned = cleaned.strip_prefix('+').unwrap_or(&cleaned);

        let (whole, fraction) = match cleaned.rfind(['.', ',']) {
            Some(idx) => (&cleaned[..idx], &cleaned[idx + 1..]),
            None => (cleaned, ""),
        };
        if fraction.len() > 2 {
            return Err(PriceError::TooPrecise);
        }
        let digits_only = |s: &str| s.chars().all(|c| c.is_ascii_digit());
        if !digits_only(whole) || !digits_only(fraction) || (whole.is_empty() && fraction.is_empty()) {
            return Err(PriceError::Invalid(input.to_string()));
        }

        let whole: u64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| PriceError::Overflow)?
        };
        let fraction: u64 = match fraction.len() {
            0 => 0,
            1 => fraction.parse::<u64>().map_err(|_| PriceError::Invalid(input.to_string()))? * 10,
            _ => fraction.parse().map_err(|_| PriceError::Invalid(input.to_string()))?,
        };

        whole
            .checked_mul(100)
            .and_then(|c| c.checked_add(fraction))
            .map(Self)
            .ok_or(PriceError::Overflow)
    }
}

impl fmt::Display for PriceInCents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // width/align 指定を効かせるため pad に通す
        f.pad(&format!("{}.{:02}", self.0 / 100, self.0 % 100))
    }
}

impl FromStr for PriceInCents {
    type Err = PriceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_major(s)
    }
}

/// A category as embedded in products and returned by `GET /categories`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub slug: String,
}

/// An uploaded image: opaque id plus public URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub id: AttachmentId,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    pub description: String,
    pub price_in_cents: PriceInCents,
    pub status: ProductStatus,
    /// Absent only on provisional entries inserted before the server answered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<Seller>,
    pub category: Category,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

/// Body of `POST /products` and `PUT /products/:id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDraft {
    pub title: String,
    pub category_id: CategoryId,
    pub description: String,
    pub price_in_cents: PriceInCents,
    pub attachments_ids: Vec<AttachmentId>,
}

/// Query of `GET /products/me`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ProductStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

impl ProductFilter {
    pub fn with_status(mut self, status: ProductStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Blank searches are dropped so they share the unfiltered key.
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        let search = search.into();
        self.search = if search.trim().is_empty() {
            None
        } else {
            Some(search.trim().to_string())
        };
        self
    }

    pub fn with_page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    /// Query string pairs, absent fields omitted.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(page) = self.page {
            pairs.push(("page", page.to_string()));
        }
        if let Some(status) = self.status {
            pairs.push(("status", status.to_string()));
        }
        if let Some(search) = &self.search {
            pairs.push(("search", search.clone()));
        }
        pairs
    }
}

// ========================================
// Response envelopes
// ========================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductResponse {
    pub product: Product,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductsResponse {
    pub products: Vec<Product>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoriesResponse {
    pub categories: Vec<Category>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttachmentsResponse {
    pub attachments: Vec<Attachment>,
}

/// A file to send to `POST /attachments`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(file_name: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    /// Guess the content type from the file extension.
    pub fn from_path_name(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let extension = file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        let content_type = match extension.as_str() {
            "png" => "image/png",
            "jpg" | "jpeg" => "image/jpeg",
            "webp" => "image/webp",
            "gif" => "image/gif",
            _ => "application/octet-stream",
        };
        Self::new(file_name, content_type, bytes)
    }
}
