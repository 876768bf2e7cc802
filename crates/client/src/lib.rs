//! Shopfront client - storefront API access and cart state machinery.
//!
//! # Architecture
//!
//! - [`api`] - typed HTTP client for the storefront REST service, with a
//!   5-minute product-list cache and in-flight request de-duplication
//! - [`cart`] - cart session: optimistic local state, debounced quantity
//!   writes, reconciliation against server truth
//! - [`checkout`] - coupon validation and cart-review total estimates
//! - [`config`] - environment-driven configuration
//!
//! The backend service is the source of truth for carts and orders; this
//! crate keeps an optimistic local view and reconciles on failure.
//!
//! # Example
//!
//! ```rust,ignore
//! use shopfront_client::{ApiClient, CartSession, StoreConfig};
//!
//! let config = StoreConfig::from_env()?;
//! let api = ApiClient::new(&config);
//!
//! let session = CartSession::new(api, &config);
//! session.start().await;
//! session.add_item(&product_id).await;
//! session.checkout(Some("SAVE10-AB12CD34")).await;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod cart;
pub mod checkout;
pub mod config;

pub use api::{ApiClient, ApiError};
pub use cart::CartSession;
pub use checkout::{Coupon, CouponError, Totals, compute_totals};
pub use config::{ConfigError, StoreConfig};
