//! In-process stub of the storefront REST service.
//!
//! Implements just enough of the backend contract for integration tests:
//! in-memory carts and orders, FastAPI-style `{"detail"}` error bodies,
//! float-encoded money, and the `{message, cart}` mutation envelope. Every
//! handler records what it saw so tests can assert on network traffic.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use axum::Router;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::Json;
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;

use shopfront_client::api::types::{
    Cart, CartItem, DiscountCodeInfo, Order, Product, Statistics,
};
use shopfront_core::{CartId, OrderId, ProductId};

/// Behavior knobs for a stub instance.
#[derive(Debug, Clone, Default)]
pub struct StubOptions {
    /// Respond 500 to every quantity update.
    pub fail_quantity_updates: bool,
    /// Respond 500 to every product-list fetch.
    pub fail_products: bool,
    /// Refuse every checkout with this detail message.
    pub checkout_fail_detail: Option<String>,
    /// Artificial latency on the product list, to keep requests in flight.
    pub products_delay: Duration,
}

/// Everything the stub knows, plus traffic counters.
pub struct StubState {
    pub options: StubOptions,
    pub products: Vec<Product>,
    pub carts: HashMap<String, Cart>,
    pub discount_codes: HashMap<String, DiscountCodeInfo>,
    pub orders: Vec<Order>,
    pub nth_order: u64,

    // Traffic observed
    pub products_hits: usize,
    pub cart_fetches: usize,
    pub updates: Vec<(String, u32)>,
    pub deletes: Vec<String>,
    pub checkout_hits: usize,
}

type Shared = Arc<Mutex<StubState>>;

fn lock(state: &Shared) -> MutexGuard<'_, StubState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A running stub backend.
pub struct TestBackend {
    pub base_url: String,
    pub state: Shared,
}

impl TestBackend {
    /// Number of times GET /products reached the network.
    pub fn products_hits(&self) -> usize {
        lock(&self.state).products_hits
    }

    /// Quantity updates observed, in arrival order.
    pub fn updates(&self) -> Vec<(String, u32)> {
        lock(&self.state).updates.clone()
    }

    /// Item removals observed, in arrival order.
    pub fn deletes(&self) -> Vec<String> {
        lock(&self.state).deletes.clone()
    }

    /// Number of GET /cart/{id} fetches observed.
    pub fn cart_fetches(&self) -> usize {
        lock(&self.state).cart_fetches
    }

    /// Server-side view of a cart's line for a product.
    pub fn server_quantity(&self, cart_id: &CartId, product_id: &str) -> Option<u32> {
        lock(&self.state)
            .carts
            .get(cart_id.as_str())
            .and_then(|cart| {
                cart.items
                    .iter()
                    .find(|item| item.product_id.as_str() == product_id)
                    .map(|item| item.quantity)
            })
    }

    /// Register an unused discount code.
    pub fn seed_code(&self, code: &str) {
        let mut state = lock(&self.state);
        let nth_order = state.nth_order;
        state.discount_codes.insert(
            code.to_string(),
            DiscountCodeInfo {
                code: code.to_string(),
                order_number: nth_order,
                is_used: false,
                created_at: Utc::now().naive_utc(),
            },
        );
    }

    /// Flip a knob after startup.
    pub fn set_fail_quantity_updates(&self, fail: bool) {
        lock(&self.state).options.fail_quantity_updates = fail;
    }

    /// Flip the product-list failure knob after startup.
    pub fn set_fail_products(&self, fail: bool) {
        lock(&self.state).options.fail_products = fail;
    }
}

/// Build a product record for seeding.
pub fn product(id: &str, name: &str, price: Decimal) -> Product {
    Product {
        id: ProductId::new(id),
        name: name.to_string(),
        price,
        description: format!("{name} description"),
        image_url: format!("https://example.com/{id}.png"),
    }
}

/// The default two-product catalog used across suites:
/// A at $10.00 and B at $5.00.
pub fn default_catalog() -> Vec<Product> {
    vec![
        product("prod-a", "Product A", Decimal::from(10)),
        product("prod-b", "Product B", Decimal::from(5)),
    ]
}

/// Spawn a stub backend on an ephemeral port.
pub async fn spawn_backend(products: Vec<Product>, options: StubOptions) -> TestBackend {
    let state: Shared = Arc::new(Mutex::new(StubState {
        options,
        products,
        carts: HashMap::new(),
        discount_codes: HashMap::new(),
        orders: Vec::new(),
        nth_order: 5,
        products_hits: 0,
        cart_fetches: 0,
        updates: Vec::new(),
        deletes: Vec::new(),
        checkout_hits: 0,
    }));

    let app = Router::new()
        .route("/products", get(list_products))
        .route("/products/{id}", get(get_product))
        .route("/cart", post(create_cart))
        .route("/cart/{id}", get(get_cart))
        .route("/cart/{id}/items", post(add_item))
        .route(
            "/cart/{id}/items/{product_id}",
            put(update_item).delete(remove_item),
        )
        .route("/checkout", post(checkout))
        .route("/orders", get(list_orders))
        .route("/orders/{id}", get(get_order))
        .route("/admin/statistics", get(statistics))
        .route("/admin/generate-discount", post(generate_discount))
        .with_state(Arc::clone(&state));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind stub listener");
    let addr = listener.local_addr().expect("stub listener addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve stub");
    });

    TestBackend {
        base_url: format!("http://{addr}"),
        state,
    }
}

fn detail(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "detail": message }))).into_response()
}

// =============================================================================
// Handlers
// =============================================================================

async fn list_products(State(state): State<Shared>) -> Response {
    let (delay, failing, products) = {
        let mut state = lock(&state);
        state.products_hits += 1;
        (
            state.options.products_delay,
            state.options.fail_products,
            state.products.clone(),
        )
    };
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
    if failing {
        return detail(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error");
    }
    Json(products).into_response()
}

async fn get_product(State(state): State<Shared>, Path(id): Path<String>) -> Response {
    let state = lock(&state);
    state
        .products
        .iter()
        .find(|product| product.id.as_str() == id)
        .map_or_else(
            || detail(StatusCode::NOT_FOUND, "Product not found"),
            |product| Json(product.clone()).into_response(),
        )
}

async fn create_cart(State(state): State<Shared>) -> Response {
    let cart = Cart {
        id: CartId::new(uuid::Uuid::new_v4().to_string()),
        items: Vec::new(),
        created_at: Utc::now().naive_utc(),
    };
    lock(&state)
        .carts
        .insert(cart.id.as_str().to_string(), cart.clone());
    Json(cart).into_response()
}

async fn get_cart(State(state): State<Shared>, Path(id): Path<String>) -> Response {
    let mut state = lock(&state);
    state.cart_fetches += 1;
    state.carts.get(&id).map_or_else(
        || detail(StatusCode::NOT_FOUND, "Cart not found"),
        |cart| Json(cart.clone()).into_response(),
    )
}

async fn add_item(
    State(state): State<Shared>,
    Path(id): Path<String>,
    Json(item): Json<CartItem>,
) -> Response {
    let mut state = lock(&state);
    if !state
        .products
        .iter()
        .any(|product| product.id == item.product_id)
    {
        return detail(StatusCode::NOT_FOUND, "Product not found");
    }
    let Some(cart) = state.carts.get_mut(&id) else {
        return detail(StatusCode::NOT_FOUND, "Cart not found");
    };

    if let Some(existing) = cart
        .items
        .iter_mut()
        .find(|line| line.product_id == item.product_id)
    {
        existing.quantity += item.quantity;
    } else {
        cart.items.push(item);
    }

    Json(json!({ "message": "Item added to cart", "cart": cart })).into_response()
}

#[derive(Deserialize)]
struct QuantityQuery {
    quantity: i64,
}

async fn update_item(
    State(state): State<Shared>,
    Path((id, product_id)): Path<(String, String)>,
    Query(query): Query<QuantityQuery>,
) -> Response {
    let mut state = lock(&state);
    state
        .updates
        .push((product_id.clone(), u32::try_from(query.quantity.max(0)).unwrap_or(0)));

    if state.options.fail_quantity_updates {
        return detail(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error");
    }

    let Some(cart) = state.carts.get_mut(&id) else {
        return detail(StatusCode::NOT_FOUND, "Cart not found");
    };
    if !cart
        .items
        .iter()
        .any(|line| line.product_id.as_str() == product_id)
    {
        return detail(StatusCode::NOT_FOUND, "Item not found in cart");
    }

    if query.quantity <= 0 {
        cart.items
            .retain(|line| line.product_id.as_str() != product_id);
    } else if let Some(line) = cart
        .items
        .iter_mut()
        .find(|line| line.product_id.as_str() == product_id)
    {
        line.quantity = u32::try_from(query.quantity).unwrap_or(1);
    }

    Json(json!({ "message": "Quantity updated", "cart": cart })).into_response()
}

async fn remove_item(
    State(state): State<Shared>,
    Path((id, product_id)): Path<(String, String)>,
) -> Response {
    let mut state = lock(&state);
    state.deletes.push(product_id.clone());

    let Some(cart) = state.carts.get_mut(&id) else {
        return detail(StatusCode::NOT_FOUND, "Cart not found");
    };
    cart.items
        .retain(|line| line.product_id.as_str() != product_id);

    Json(json!({ "message": "Item removed from cart", "cart": cart })).into_response()
}

#[derive(Deserialize)]
struct CheckoutBody {
    cart_id: String,
    #[serde(default)]
    discount_code: Option<String>,
}

async fn checkout(State(state): State<Shared>, Json(body): Json<CheckoutBody>) -> Response {
    let mut state = lock(&state);
    state.checkout_hits += 1;

    if let Some(message) = state.options.checkout_fail_detail.clone() {
        return detail(StatusCode::BAD_REQUEST, &message);
    }

    let Some(cart) = state.carts.get(&body.cart_id).cloned() else {
        return detail(StatusCode::NOT_FOUND, "Cart not found");
    };
    if cart.items.is_empty() {
        return detail(StatusCode::BAD_REQUEST, "Cart is empty");
    }

    let subtotal: Decimal = cart
        .items
        .iter()
        .filter_map(|item| {
            state
                .products
                .iter()
                .find(|product| product.id == item.product_id)
                .map(|product| product.price * Decimal::from(item.quantity))
        })
        .sum();

    let mut discount_amount = Decimal::ZERO;
    let mut discount_code_used = None;
    if let Some(code) = body.discount_code {
        let Some(record) = state.discount_codes.get_mut(&code) else {
            return detail(StatusCode::BAD_REQUEST, "Invalid discount code");
        };
        if record.is_used {
            return detail(StatusCode::BAD_REQUEST, "Discount code already used");
        }
        record.is_used = true;
        discount_amount = subtotal * Decimal::new(10, 2);
        discount_code_used = Some(code);
    }

    let order = Order {
        id: OrderId::new(uuid::Uuid::new_v4().to_string()),
        cart_id: cart.id.clone(),
        items: cart.items.clone(),
        subtotal,
        discount_amount,
        total: subtotal - discount_amount,
        discount_code_used,
        created_at: Utc::now().naive_utc(),
    };
    state.orders.push(order.clone());
    state.carts.remove(&body.cart_id);

    Json(order).into_response()
}

async fn list_orders(State(state): State<Shared>) -> Response {
    Json(lock(&state).orders.clone()).into_response()
}

async fn get_order(State(state): State<Shared>, Path(id): Path<String>) -> Response {
    let state = lock(&state);
    state
        .orders
        .iter()
        .find(|order| order.id.as_str() == id)
        .map_or_else(
            || detail(StatusCode::NOT_FOUND, "Order not found"),
            |order| Json(order.clone()).into_response(),
        )
}

async fn statistics(State(state): State<Shared>) -> Response {
    let state = lock(&state);
    let stats = Statistics {
        total_orders: state.orders.len() as u64,
        total_items_purchased: state
            .orders
            .iter()
            .flat_map(|order| order.items.iter())
            .map(|item| u64::from(item.quantity))
            .sum(),
        total_purchase_amount: state.orders.iter().map(|order| order.total).sum(),
        total_discount_amount: state.orders.iter().map(|order| order.discount_amount).sum(),
        nth_order_value: state.nth_order,
        discount_codes: state.discount_codes.values().cloned().collect(),
    };
    Json(stats).into_response()
}

async fn generate_discount(State(state): State<Shared>) -> Response {
    let mut state = lock(&state);
    let order_count = state.orders.len() as u64;
    if order_count > 0 && order_count % state.nth_order == 0 {
        let code = DiscountCodeInfo {
            code: format!("SAVE10-{:08}", state.discount_codes.len() + 1),
            order_number: order_count,
            is_used: false,
            created_at: Utc::now().naive_utc(),
        };
        state.discount_codes.insert(code.code.clone(), code.clone());
        Json(json!({ "message": "Discount code generated", "discount_code": code }))
            .into_response()
    } else {
        let remaining = state.nth_order - (order_count % state.nth_order);
        Json(json!({
            "message": format!("Discount not available yet. {remaining} more orders needed."),
            "orders_until_next": remaining,
        }))
        .into_response()
    }
}
