//! Storefront REST API client.
//!
//! # Architecture
//!
//! - The backend service is the source of truth - no local persistence,
//!   direct API calls
//! - In-memory caching via `moka` for the product list (5 minute TTL)
//! - Concurrent product-list fetches are coalesced onto one in-flight
//!   request; the in-flight table and the freshness cache are independent
//! - Cart mutations and checkout always hit the network
//!
//! All requests and responses are JSON. Every call is bounded by the
//! configured network timeout; exceeding it surfaces as a transport error,
//! not a distinct kind.

mod cache;
pub mod types;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use moka::future::Cache;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, instrument};

use shopfront_core::{CartId, OrderId, ProductId};

use crate::config::StoreConfig;

use cache::{CacheKey, CacheValue};
use types::{
    Cart, CartItem, CartMutation, CheckoutRequest, DiscountTrigger, Order, Product, Statistics,
};

/// Errors that can occur when calling the storefront service.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport failure: connection refused, DNS, or the request timed out.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body could not be decoded.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The server answered 404; carries the server's detail message.
    #[error("not found: {0}")]
    NotFound(String),

    /// The server refused the request (other 4xx); carries the server's
    /// detail message, e.g. "Invalid discount code" or "Cart is empty".
    #[error("{0}")]
    Rejected(String),

    /// The server failed (5xx).
    #[error("server error: HTTP {0}")]
    Server(u16),

    /// Failure propagated to callers coalesced onto one in-flight request.
    #[error("{0}")]
    Shared(Arc<ApiError>),
}

impl ApiError {
    /// The server-supplied detail message, if this failure carries one.
    #[must_use]
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::NotFound(detail) | Self::Rejected(detail) => Some(detail),
            Self::Shared(inner) => inner.detail(),
            _ => None,
        }
    }
}

/// FastAPI-style error body.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: Option<String>,
}

/// A product-list fetch shared between coalesced callers.
type SharedFetch = Shared<BoxFuture<'static, Result<Vec<Product>, Arc<ApiError>>>>;

// =============================================================================
// ApiClient
// =============================================================================

/// Client for the storefront REST service.
///
/// Cheap to clone; all clones share one connection pool, one product-list
/// cache, and one in-flight request table.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: String,
    catalog: Cache<CacheKey, CacheValue>,
    in_flight: Mutex<HashMap<CacheKey, SharedFetch>>,
}

impl ApiClient {
    /// Create a new API client.
    ///
    /// # Panics
    ///
    /// Panics if the underlying HTTP client cannot be constructed.
    #[must_use]
    pub fn new(config: &StoreConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .expect("Failed to build HTTP client");

        let catalog = Cache::builder()
            .max_capacity(16)
            .time_to_live(config.cache_ttl)
            .build();

        Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url: config.base_url.clone(),
                catalog,
                in_flight: Mutex::new(HashMap::new()),
            }),
        }
    }

    // =========================================================================
    // Product Methods (cached)
    // =========================================================================

    /// Get the product catalog.
    ///
    /// Served from the freshness cache when a response younger than the
    /// configured TTL exists. On a miss, concurrent callers share a single
    /// network request; the in-flight entry is dropped once that request
    /// settles, whatever the outcome, and only a success populates the
    /// cache.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails; coalesced callers all see the
    /// same failure.
    #[instrument(skip(self))]
    pub async fn products(&self) -> Result<Vec<Product>, ApiError> {
        let key = CacheKey::Products;

        if let Some(CacheValue::Products(products)) = self.inner.catalog.get(&key).await {
            debug!("Cache hit for products");
            return Ok(products);
        }

        let fetch = {
            let mut in_flight = lock(&self.inner.in_flight);
            if let Some(pending) = in_flight.get(&key) {
                debug!("Joining in-flight products fetch");
                pending.clone()
            } else {
                let inner = Arc::clone(&self.inner);
                let fetch: SharedFetch = async move {
                    let result = inner.fetch_products().await.map_err(Arc::new);
                    if let Ok(products) = &result {
                        inner
                            .catalog
                            .insert(CacheKey::Products, CacheValue::Products(products.clone()))
                            .await;
                    }
                    // Settled: leave the in-flight table regardless of outcome
                    lock(&inner.in_flight).remove(&CacheKey::Products);
                    result
                }
                .boxed()
                .shared();
                in_flight.insert(key, fetch.clone());
                fetch
            }
        };

        fetch
            .await
            .map_err(|e| Arc::try_unwrap(e).unwrap_or_else(ApiError::Shared))
    }

    /// Get a single product by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the product is missing or the request fails.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn product(&self, product_id: &ProductId) -> Result<Product, ApiError> {
        self.inner
            .get_json(&format!("/products/{product_id}"))
            .await
    }

    // =========================================================================
    // Cart Methods (not cached - mutable state)
    // =========================================================================

    /// Create a new cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn create_cart(&self) -> Result<Cart, ApiError> {
        self.inner.post_json("/cart", None::<&()>).await
    }

    /// Fetch a cart by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart is missing or the request fails.
    #[instrument(skip(self), fields(cart_id = %cart_id))]
    pub async fn cart(&self, cart_id: &CartId) -> Result<Cart, ApiError> {
        self.inner.get_json(&format!("/cart/{cart_id}")).await
    }

    /// Add an item to a cart. An existing line for the same product has its
    /// quantity increased server-side.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart or product is missing or the request
    /// fails.
    #[instrument(skip(self, item), fields(cart_id = %cart_id, product_id = %item.product_id))]
    pub async fn add_item(
        &self,
        cart_id: &CartId,
        item: &CartItem,
    ) -> Result<CartMutation, ApiError> {
        self.inner
            .post_json(&format!("/cart/{cart_id}/items"), Some(item))
            .await
    }

    /// Set the quantity of a cart line. The server removes the line when
    /// the quantity is zero or less.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart or line is missing or the request fails.
    #[instrument(skip(self), fields(cart_id = %cart_id, product_id = %product_id))]
    pub async fn update_item_quantity(
        &self,
        cart_id: &CartId,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<CartMutation, ApiError> {
        let response = self
            .inner
            .client
            .put(self.inner.url(&format!("/cart/{cart_id}/items/{product_id}")))
            .query(&[("quantity", quantity)])
            .send()
            .await?;
        ApiClientInner::decode(response).await
    }

    /// Remove an item from a cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart is missing or the request fails.
    #[instrument(skip(self), fields(cart_id = %cart_id, product_id = %product_id))]
    pub async fn remove_item(
        &self,
        cart_id: &CartId,
        product_id: &ProductId,
    ) -> Result<CartMutation, ApiError> {
        let response = self
            .inner
            .client
            .delete(self.inner.url(&format!("/cart/{cart_id}/items/{product_id}")))
            .send()
            .await?;
        ApiClientInner::decode(response).await
    }

    // =========================================================================
    // Checkout & Orders
    // =========================================================================

    /// Check out a cart, optionally redeeming a discount code. The returned
    /// order carries the authoritative total.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart is missing or empty, the code is
    /// invalid or already used, or the request fails.
    #[instrument(skip(self, request), fields(cart_id = %request.cart_id))]
    pub async fn checkout(&self, request: &CheckoutRequest) -> Result<Order, ApiError> {
        self.inner.post_json("/checkout", Some(request)).await
    }

    /// List all orders.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn orders(&self) -> Result<Vec<Order>, ApiError> {
        self.inner.get_json("/orders").await
    }

    /// Fetch a single order by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the order is missing or the request fails.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn order(&self, order_id: &OrderId) -> Result<Order, ApiError> {
        self.inner.get_json(&format!("/orders/{order_id}")).await
    }

    // =========================================================================
    // Admin Methods
    // =========================================================================

    /// Fetch aggregate statistics and the discount-code list.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn statistics(&self) -> Result<Statistics, ApiError> {
        self.inner.get_json("/admin/statistics").await
    }

    /// Manually trigger discount-code generation.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn generate_discount(&self) -> Result<DiscountTrigger, ApiError> {
        self.inner
            .post_json("/admin/generate-discount", None::<&()>)
            .await
    }
}

// =============================================================================
// Request plumbing
// =============================================================================

impl ApiClientInner {
    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn fetch_products(&self) -> Result<Vec<Product>, ApiError> {
        self.get_json("/products").await
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.client.get(self.url(path)).send().await?;
        Self::decode(response).await
    }

    async fn post_json<B: serde::Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: Option<&B>,
    ) -> Result<T, ApiError> {
        let mut request = self.client.post(self.url(path));
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().await?;
        Self::decode(response).await
    }

    /// Translate a response into a value or an [`ApiError`], reading the
    /// body as text first so decode failures can be logged with context.
    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let detail = serde_json::from_str::<ErrorBody>(&body)
                .ok()
                .and_then(|b| b.detail);

            if status.is_server_error() {
                tracing::error!(
                    status = %status,
                    body = %body.chars().take(500).collect::<String>(),
                    "Storefront API returned server error"
                );
                return Err(ApiError::Server(status.as_u16()));
            }

            let detail = detail.unwrap_or_else(|| format!("HTTP {status}"));
            if status == reqwest::StatusCode::NOT_FOUND {
                return Err(ApiError::NotFound(detail));
            }
            return Err(ApiError::Rejected(detail));
        }

        match serde_json::from_str(&body) {
            Ok(value) => Ok(value),
            Err(e) => {
                tracing::error!(
                    error = %e,
                    body = %body.chars().take(500).collect::<String>(),
                    "Failed to parse storefront API response"
                );
                Err(ApiError::Parse(e))
            }
        }
    }
}

/// Lock a mutex, recovering the guard if a panicking holder poisoned it.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
