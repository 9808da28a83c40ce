//! Domain model (ids, products, sellers, metrics, query keys, forms, errors).

pub mod ids;
pub mod status;
pub mod product;
pub mod seller;
pub mod metrics;
pub mod query_key;
pub mod forms;
pub mod errors;
pub mod events;

pub use ids::{AttachmentId, CategoryId, ProductId, SellerId};
pub use status::{ParseStatusError, ProductStatus};
pub use product::{
    Attachment, AttachmentsResponse, CategoriesResponse, Category, PriceError, PriceInCents,
    Product, ProductDraft, ProductFilter, ProductResponse, ProductsResponse, Upload,
};
pub use seller::{Avatar, Credentials, NewSeller, Seller, SellerResponse};
pub use metrics::{DailyViews, DashboardMetrics, MetricAmount, ViewsPerDayResponse, ViewsSeries};
pub use query_key::{MetricKind, QueryKey};
pub use forms::{ProductForm, RegistrationForm, SignInForm, ValidatedProduct};
pub use errors::{ApiError, ErrorKind, GENERIC_FAILURE_MESSAGE, ValidationErrors};
pub use events::{Notification, NotificationLevel, SessionState};
