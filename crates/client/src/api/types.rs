//! Wire types for the storefront REST service.
//!
//! Monetary fields arrive as JSON numbers of unspecified precision and are
//! decoded into `Decimal` via `rust_decimal::serde::float`. Timestamps are
//! naive ISO-8601 strings (the server does not attach a timezone).

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use shopfront_core::{CartId, OrderId, ProductId};

/// A catalog product. Immutable from the client's perspective.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub description: String,
    pub image_url: String,
}

/// A single cart line. Quantity is always at least 1; reducing a line to
/// zero removes it instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// A shopping cart, unique per session. Superseded (never deleted) by a
/// fresh cart after checkout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    pub id: CartId,
    pub items: Vec<CartItem>,
    pub created_at: NaiveDateTime,
}

impl Cart {
    /// Total number of items across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }

    /// Find a line by product.
    #[must_use]
    pub fn item(&self, product_id: &ProductId) -> Option<&CartItem> {
        self.items
            .iter()
            .find(|item| &item.product_id == product_id)
    }
}

/// Envelope returned by every cart mutation endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct CartMutation {
    pub message: String,
    pub cart: Cart,
}

/// Request body for `POST /checkout`.
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutRequest {
    pub cart_id: CartId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount_code: Option<String>,
}

/// A completed order. Immutable once created; `total` is the authoritative
/// amount, regardless of any client-side estimate shown before checkout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub cart_id: CartId,
    pub items: Vec<CartItem>,
    #[serde(with = "rust_decimal::serde::float")]
    pub subtotal: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub discount_amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
    pub discount_code_used: Option<String>,
    pub created_at: NaiveDateTime,
}

/// A discount code as reported by the admin statistics endpoint. Owned by
/// the backend; the client only ever holds a read-only snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscountCodeInfo {
    pub code: String,
    pub order_number: u64,
    pub is_used: bool,
    pub created_at: NaiveDateTime,
}

/// Aggregate statistics from `GET /admin/statistics`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    pub total_orders: u64,
    pub total_items_purchased: u64,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_purchase_amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_discount_amount: Decimal,
    pub nth_order_value: u64,
    pub discount_codes: Vec<DiscountCodeInfo>,
}

/// Response from the manual discount trigger. The backend either minted a
/// code or reports how many orders remain until the next one.
#[derive(Debug, Clone, Deserialize)]
pub struct DiscountTrigger {
    pub message: String,
    #[serde(default)]
    pub discount_code: Option<DiscountCodeInfo>,
    #[serde(default)]
    pub orders_until_next: Option<u64>,
}
