//! Typed operations over the Ruten partner API
//!
//! [`RutenClient`] exposes one method per upstream capability. Each method
//! builds a [`RequestIntent`] with the fixed path for that capability,
//! validates obviously malformed inputs before any network activity, and
//! hands the intent to the dispatcher unchanged — no semantic
//! reinterpretation of the upstream's responses happens here.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use ruten_domain::constants::{
    DEFAULT_PAGE_LIMIT, DEFAULT_PAGE_OFFSET, DEFAULT_PRODUCT_STATUS, REQUEST_TIMEOUT_SECS,
    RUTEN_BASE_URL,
};
use ruten_domain::{ApiError, ApiResult, CredentialCheck, Result};

use crate::credentials::Credentials;
use crate::diagnostics::{DiagnosticsSink, TracingDiagnostics};
use crate::dispatch::RequestDispatcher;
use crate::intent::RequestIntent;
use crate::skew::ClockSkewAdvisor;

/// Query parameters for product listing.
///
/// Contract decision: this endpoint uses `status` / `offset` / `limit` keys
/// (the keys the upstream verifies signatures against).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductListQuery {
    /// Product status filter (`all`, `online`, `offline`, ...).
    pub status: String,
    /// 1-based page offset.
    pub offset: u32,
    /// Page size.
    pub limit: u32,
}

impl Default for ProductListQuery {
    fn default() -> Self {
        Self {
            status: DEFAULT_PRODUCT_STATUS.to_string(),
            offset: DEFAULT_PAGE_OFFSET,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

/// Query parameters for order listing. This endpoint keeps the upstream's
/// `order_status` / `page` / `page_size` key names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderListQuery {
    /// Order status filter (`All`, `Shipped`, ...).
    pub order_status: String,
    /// Optional `YYYY-MM-DD` lower bound.
    pub start_date: Option<String>,
    /// Optional `YYYY-MM-DD` upper bound.
    pub end_date: Option<String>,
    /// 1-based page number.
    pub page: u32,
    /// Page size.
    pub page_size: u32,
}

impl Default for OrderListQuery {
    fn default() -> Self {
        Self {
            order_status: "All".to_string(),
            start_date: None,
            end_date: None,
            page: DEFAULT_PAGE_OFFSET,
            page_size: DEFAULT_PAGE_LIMIT,
        }
    }
}

/// Authenticated client for the Ruten partner API.
///
/// Cheap to clone; holds no mutable state after construction, so clones can
/// issue calls concurrently without coordination.
#[derive(Clone)]
pub struct RutenClient {
    dispatcher: RequestDispatcher,
}

/// Builder for [`RutenClient`].
pub struct RutenClientBuilder {
    credentials: Credentials,
    base_url: String,
    timeout: Duration,
    diagnostics: Arc<dyn DiagnosticsSink>,
}

impl RutenClientBuilder {
    fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            base_url: RUTEN_BASE_URL.to_string(),
            timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
            diagnostics: Arc::new(TracingDiagnostics),
        }
    }

    /// Override the upstream base URL (used by tests against a mock server).
    #[must_use]
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Override the per-request timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Inject a diagnostics sink.
    #[must_use]
    pub fn diagnostics(mut self, diagnostics: Arc<dyn DiagnosticsSink>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    /// Finish building the client.
    ///
    /// # Errors
    /// Returns `RutenError::Internal` if the HTTP transport cannot be built.
    pub fn build(self) -> Result<RutenClient> {
        let dispatcher = RequestDispatcher::with_diagnostics(
            self.base_url,
            self.credentials,
            self.timeout,
            self.diagnostics,
        )?;
        Ok(RutenClient { dispatcher })
    }
}

impl RutenClient {
    /// Client against the production upstream.
    pub fn new(credentials: Credentials) -> Result<Self> {
        Self::builder(credentials).build()
    }

    /// Client from `RUTEN_API_KEY` / `RUTEN_SECRET_KEY` / `RUTEN_SALT_KEY`.
    ///
    /// # Errors
    /// Returns `RutenError::Config` if any variable is missing — before any
    /// network activity.
    pub fn from_env() -> Result<Self> {
        let credentials = Credentials::from_env()?;
        debug!(api_key = %credentials.preview(), "credentials loaded from environment");
        Self::new(credentials)
    }

    /// Start building a client with non-default transport settings.
    pub fn builder(credentials: Credentials) -> RutenClientBuilder {
        RutenClientBuilder::new(credentials)
    }

    /// Kick off the advisory clock-skew probe on its own task.
    ///
    /// Call once at startup from within a tokio runtime. Failures only warn;
    /// they never gate dispatch.
    pub fn spawn_clock_check(&self) -> Result<tokio::task::JoinHandle<()>> {
        Ok(ClockSkewAdvisor::new()?.spawn_startup_check())
    }

    // ------------------------------------------------------------------
    // Products
    // ------------------------------------------------------------------

    /// List products.
    pub async fn list_products(&self, query: ProductListQuery) -> ApiResult {
        let intent = RequestIntent::get("/api/v1/product/list")
            .query("status", query.status)
            .query("offset", query.offset)
            .query("limit", query.limit);
        self.dispatcher.dispatch(intent).await
    }

    /// Fetch one product by item id.
    pub async fn get_product(&self, item_id: &str) -> ApiResult {
        if let Some(invalid) = reject_empty("item_id", item_id) {
            return invalid;
        }
        self.dispatcher
            .dispatch(RequestIntent::get(format!("/api/v1/product/item/{item_id}")))
            .await
    }

    /// Create a product from a full product payload.
    pub async fn create_product(&self, product: serde_json::Value) -> ApiResult {
        match require_object("product", product) {
            Ok(body) => {
                self.dispatcher
                    .dispatch(RequestIntent::post("/api/v1/product/item").body(body))
                    .await
            }
            Err(invalid) => invalid,
        }
    }

    /// Update the stock count of one product.
    pub async fn update_product_stock(&self, item_id: &str, stock: u32) -> ApiResult {
        if let Some(invalid) = reject_empty("item_id", item_id) {
            return invalid;
        }
        let intent = RequestIntent::put("/api/v1/product/item/stock")
            .body(serde_json::json!({"item_id": item_id, "stock": stock}));
        self.dispatcher.dispatch(intent).await
    }

    /// Update the price of one product.
    pub async fn update_product_price(&self, item_id: &str, price: f64) -> ApiResult {
        if let Some(invalid) = reject_empty("item_id", item_id) {
            return invalid;
        }
        let intent = RequestIntent::put("/api/v1/product/item/price")
            .body(serde_json::json!({"item_id": item_id, "price": price}));
        self.dispatcher.dispatch(intent).await
    }

    /// Put a product on sale.
    pub async fn set_product_online(&self, item_id: &str) -> ApiResult {
        self.set_product_listing(item_id, "online").await
    }

    /// Take a product off sale.
    pub async fn set_product_offline(&self, item_id: &str) -> ApiResult {
        self.set_product_listing(item_id, "offline").await
    }

    async fn set_product_listing(&self, item_id: &str, state: &str) -> ApiResult {
        if let Some(invalid) = reject_empty("item_id", item_id) {
            return invalid;
        }
        let intent = RequestIntent::put(format!("/api/v1/product/item/{state}"))
            .body(serde_json::json!({"item_id": item_id}));
        self.dispatcher.dispatch(intent).await
    }

    // ------------------------------------------------------------------
    // Orders
    // ------------------------------------------------------------------

    /// List orders.
    pub async fn list_orders(&self, query: OrderListQuery) -> ApiResult {
        let mut intent = RequestIntent::get("/api/v1/order/list")
            .query("order_status", query.order_status)
            .query("page", query.page)
            .query("page_size", query.page_size);
        if let Some(start) = query.start_date {
            intent = intent.query("start_date", start);
        }
        if let Some(end) = query.end_date {
            intent = intent.query("end_date", end);
        }
        self.dispatcher.dispatch(intent).await
    }

    /// Fetch detail for a batch of orders.
    pub async fn get_order_detail(&self, order_ids: &[String]) -> ApiResult {
        if order_ids.is_empty() || order_ids.iter().any(|id| id.trim().is_empty()) {
            return ApiResult::Error(ApiError::invalid_input(
                "order_ids must be a non-empty list of non-empty ids",
            ));
        }
        let intent = RequestIntent::post("/api/v1/order/detail")
            .body(serde_json::json!({"order_ids": order_ids}));
        self.dispatcher.dispatch(intent).await
    }

    /// Mark an order as shipped. `shipping` carries the carrier fields the
    /// upstream expects and is merged with the order id.
    pub async fn ship_order(&self, order_id: &str, shipping: serde_json::Value) -> ApiResult {
        self.order_action("/api/v1/order/ship", order_id, shipping).await
    }

    /// Cancel an order with a reason.
    pub async fn cancel_order(&self, order_id: &str, reason: &str) -> ApiResult {
        if let Some(invalid) = reject_empty("reason", reason) {
            return invalid;
        }
        self.order_action(
            "/api/v1/order/cancel",
            order_id,
            serde_json::json!({"reason": reason}),
        )
        .await
    }

    /// Refund an order. `refund` carries the amount/reason fields and is
    /// merged with the order id.
    pub async fn refund_order(&self, order_id: &str, refund: serde_json::Value) -> ApiResult {
        self.order_action("/api/v1/order/refund", order_id, refund).await
    }

    async fn order_action(
        &self,
        path: &str,
        order_id: &str,
        extra: serde_json::Value,
    ) -> ApiResult {
        if let Some(invalid) = reject_empty("order_id", order_id) {
            return invalid;
        }
        let mut body = match extra {
            serde_json::Value::Object(map) => map,
            _ => {
                return ApiResult::Error(ApiError::invalid_input("payload must be a JSON object"));
            }
        };
        body.insert("order_id".to_string(), serde_json::Value::String(order_id.to_string()));
        self.dispatcher
            .dispatch(RequestIntent::post(path).body(serde_json::Value::Object(body)))
            .await
    }

    // ------------------------------------------------------------------
    // Store categories
    // ------------------------------------------------------------------

    /// List store categories.
    pub async fn list_categories(&self) -> ApiResult {
        self.dispatcher.dispatch(RequestIntent::get("/api/v1/product/store_class/list")).await
    }

    /// Create a store category.
    pub async fn create_category(&self, category: serde_json::Value) -> ApiResult {
        match require_object("category", category) {
            Ok(body) => {
                self.dispatcher
                    .dispatch(RequestIntent::post("/api/v1/product/store_class").body(body))
                    .await
            }
            Err(invalid) => invalid,
        }
    }

    /// Update a store category.
    pub async fn update_category(&self, category: serde_json::Value) -> ApiResult {
        match require_object("category", category) {
            Ok(body) => {
                self.dispatcher
                    .dispatch(RequestIntent::put("/api/v1/product/store_class").body(body))
                    .await
            }
            Err(invalid) => invalid,
        }
    }

    /// Delete a store category by id.
    pub async fn delete_category(&self, category_id: &str) -> ApiResult {
        if let Some(invalid) = reject_empty("category_id", category_id) {
            return invalid;
        }
        let intent = RequestIntent::delete("/api/v1/product/store_class")
            .body(serde_json::json!({"category_id": category_id}));
        self.dispatcher.dispatch(intent).await
    }

    // ------------------------------------------------------------------
    // Derived operations
    // ------------------------------------------------------------------

    /// Verify the credential triple with a low-cost read call.
    pub async fn verify_credentials(&self) -> CredentialCheck {
        match self.list_categories().await {
            ApiResult::Success { .. } => CredentialCheck {
                valid: true,
                message: "Credentials are valid".to_string(),
            },
            ApiResult::Error(err) => CredentialCheck {
                valid: false,
                message: format!("Credentials invalid or upstream unreachable: {}", err.summary()),
            },
        }
    }
}

fn reject_empty(name: &str, value: &str) -> Option<ApiResult> {
    if value.trim().is_empty() {
        Some(ApiResult::Error(ApiError::invalid_input(format!("{name} must not be empty"))))
    } else {
        None
    }
}

fn require_object(
    name: &str,
    value: serde_json::Value,
) -> std::result::Result<serde_json::Value, ApiResult> {
    if value.is_object() {
        Ok(value)
    } else {
        Err(ApiResult::Error(ApiError::invalid_input(format!("{name} must be a JSON object"))))
    }
}
