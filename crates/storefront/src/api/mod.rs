//! Client for the remote SmilePet REST API.
//!
//! # Architecture
//!
//! - The remote API is the source of truth for catalog, clients and orders;
//!   nothing is synced locally
//! - Every response passes through [`envelope`] once, so callers receive
//!   typed records regardless of how the API wrapped them
//! - Catalog lists are cached in-process via `moka` (5 minute TTL)
//!
//! # Endpoints
//!
//! ```text
//! GET  /products           product list
//! GET  /products/{id}      product detail
//! GET  /categories         category list
//! POST /auth/login         credentials -> user record (+ token)
//! GET  /clients/{id}       canonical client record
//! POST /checkout           order + payment -> payment status
//! ```

pub mod envelope;
pub mod types;

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use reqwest::StatusCode;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::instrument;
use url::Url;

use smilepet_core::{ClientId, ProductId, UserSession};

pub use envelope::{normalize_list, normalize_record};
pub use types::{Category, CheckoutOrder, CheckoutOutcome, LoginRequest, Product, ProductVariant};

/// Request timeout for remote API calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

/// Catalog cache lifetime.
const CATALOG_TTL: Duration = Duration::from_secs(300);

/// Keys that may wrap a user record in auth/client responses.
const USER_KEYS: &[&str] = &["user", "usuario", "cliente", "client", "data"];

/// Keys that may wrap an order/payment record in checkout responses.
const ORDER_KEYS: &[&str] = &["payment", "pagamento", "order", "pedido", "data"];

/// Errors that can occur when calling the remote API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed (connect, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("API returned {status}: {message}")]
    Status { status: u16, message: String },

    /// Response body was not JSON.
    #[error("Malformed response: {0}")]
    Malformed(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The API rejected the credentials.
    #[error("Invalid credentials")]
    Unauthorized,

    /// The configured base URL cannot carry a path.
    #[error("Invalid API URL: {0}")]
    InvalidUrl(String),
}

#[derive(Clone, Hash, PartialEq, Eq)]
enum CatalogKey {
    Products,
    Categories,
}

/// Remote API client. Cheap to clone.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: String,
    catalog: Cache<CatalogKey, Arc<Vec<Value>>>,
}

impl ApiClient {
    /// Create a client for `base_url`. A trailing slash is ignored.
    #[must_use]
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        let catalog = Cache::builder()
            .max_capacity(16)
            .time_to_live(CATALOG_TTL)
            .build();

        Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url: base_url.trim_end_matches('/').to_string(),
                catalog,
            }),
        }
    }

    /// `{base_url}/{segments}`, each segment percent-encoded on its own.
    ///
    /// Empty and dot segments would resolve to a different resource and are
    /// reported as not found.
    fn url(&self, segments: &[&str]) -> Result<Url, ApiError> {
        if segments.iter().any(|segment| matches!(*segment, "" | "." | "..")) {
            return Err(ApiError::NotFound(segments.join("/")));
        }

        let base = &self.inner.base_url;
        let mut url = Url::parse(base).map_err(|e| ApiError::InvalidUrl(format!("{base}: {e}")))?;
        url.path_segments_mut()
            .map_err(|()| ApiError::InvalidUrl(base.clone()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Read a response body as JSON, mapping failures to [`ApiError`].
    async fn read_json(response: reqwest::Response, what: &str) -> Result<Value, ApiError> {
        let status = response.status();
        let text = response.text().await?;

        if status == StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound(what.to_string()));
        }
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ApiError::Unauthorized);
        }
        if !status.is_success() {
            tracing::warn!(
                status = %status,
                body = %text.chars().take(300).collect::<String>(),
                what,
                "Remote API returned non-success status"
            );
            return Err(ApiError::Status {
                status: status.as_u16(),
                message: error_message(&text).unwrap_or_else(|| status.to_string()),
            });
        }

        serde_json::from_str(&text).map_err(|e| ApiError::Malformed(format!("{what}: {e}")))
    }

    async fn get(&self, segments: &[&str]) -> Result<Value, ApiError> {
        let url = self.url(segments)?;
        let response = self
            .inner
            .client
            .get(url)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;
        Self::read_json(response, &segments.join("/")).await
    }

    async fn post<B: Serialize + ?Sized>(
        &self,
        segments: &[&str],
        body: &B,
    ) -> Result<Value, ApiError> {
        let url = self.url(segments)?;
        let response = self
            .inner
            .client
            .post(url)
            .timeout(REQUEST_TIMEOUT)
            .json(body)
            .send()
            .await?;
        Self::read_json(response, &segments.join("/")).await
    }

    async fn catalog_list(&self, key: CatalogKey, path: &str) -> Result<Arc<Vec<Value>>, ApiError> {
        if let Some(cached) = self.inner.catalog.get(&key).await {
            tracing::debug!(path, "Catalog cache hit");
            return Ok(cached);
        }

        let items = Arc::new(normalize_list(self.get(&[path]).await?));
        self.inner.catalog.insert(key, Arc::clone(&items)).await;
        Ok(items)
    }

    /// List all products.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self))]
    pub async fn list_products(&self) -> Result<Vec<Product>, ApiError> {
        let items = self.catalog_list(CatalogKey::Products, "products").await?;
        Ok(envelope::decode_each(items.as_ref().clone(), "product"))
    }

    /// Fetch one product.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the API has no such product or the record is unusable.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_product(&self, id: &ProductId) -> Result<Product, ApiError> {
        let value = self.get(&["products", id.as_str()]).await?;
        let record = normalize_record(value, &["data", "produto", "product"])
            .ok_or_else(|| ApiError::NotFound(format!("product {id}")))?;
        serde_json::from_value(record).map_err(|e| ApiError::Malformed(format!("product {id}: {e}")))
    }

    /// List all categories.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self))]
    pub async fn list_categories(&self) -> Result<Vec<Category>, ApiError> {
        let items = self
            .catalog_list(CatalogKey::Categories, "categories")
            .await?;
        Ok(envelope::decode_each(items.as_ref().clone(), "category"))
    }

    /// Authenticate and return the user record.
    ///
    /// A top-level `token` beside the user record is folded into it.
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized` for bad credentials.
    #[instrument(skip(self, credentials))]
    pub async fn login(&self, credentials: &LoginRequest) -> Result<UserSession, ApiError> {
        let value = self.post(&["auth", "login"], credentials).await?;
        let token = value.get("token").cloned();

        let mut user = normalize_record(value, USER_KEYS)
            .and_then(UserSession::from_value)
            .ok_or_else(|| ApiError::Malformed("login response without user".to_string()))?;

        if let Some(token) = token
            && user.get("token").is_none()
        {
            let mut fields = user.fields().clone();
            fields.insert("token".to_string(), token);
            user = UserSession::new(fields);
        }
        Ok(user)
    }

    /// Fetch the canonical client record.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self), fields(client_id = %id))]
    pub async fn get_client(&self, id: &ClientId) -> Result<UserSession, ApiError> {
        let value = self.get(&["clients", id.as_str()]).await?;
        normalize_record(value, USER_KEYS)
            .and_then(UserSession::from_value)
            .ok_or_else(|| ApiError::NotFound(format!("client {id}")))
    }

    /// Submit an order with payment data.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails. A declined payment is not an error;
    /// inspect [`CheckoutOutcome::status`].
    #[instrument(skip(self, order), fields(total = %order.total, items = order.items.len()))]
    pub async fn create_checkout(&self, order: &CheckoutOrder) -> Result<CheckoutOutcome, ApiError> {
        let value = self.post(&["checkout"], order).await?;
        let record = normalize_record(value, ORDER_KEYS)
            .ok_or_else(|| ApiError::Malformed("checkout response is not an object".to_string()))?;
        Ok(CheckoutOutcome::from_record(&record))
    }
}

/// Pull a human-readable message out of an error body.
fn error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    ["message", "error", "mensagem", "erro"]
        .iter()
        .find_map(|key| value.get(*key)?.as_str().map(str::to_string))
}
