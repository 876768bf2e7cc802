//! Coupon validation and cart-review totals.
//!
//! A [`Coupon`] is seeded from the statistics snapshot fetched when the
//! cart view opens and validates codes against the unused set known at
//! that moment; the server re-validates at checkout. Likewise the
//! discount shown here is a display estimate - the only authoritative
//! total is the one the checkout response reports.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::api::types::{Cart, DiscountCodeInfo, Product, Statistics};

/// Flat discount rate shown during cart review. The server computes the
/// real discount at checkout; this rate only drives the estimate.
pub const DISPLAY_DISCOUNT_RATE: Decimal = Decimal::from_parts(10, 0, 0, false, 2);

/// Reasons a discount code is refused client-side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CouponError {
    /// No code was entered.
    #[error("Please enter a code")]
    Empty,

    /// The code is not among the currently unused codes.
    #[error("Invalid coupon code")]
    Unknown,
}

/// Discount-code state for one cart review.
#[derive(Debug, Clone, Default)]
pub struct Coupon {
    available: Vec<DiscountCodeInfo>,
    applied: Option<String>,
    error: Option<CouponError>,
}

impl Coupon {
    /// Seed the coupon box with the unused codes from a statistics
    /// snapshot.
    #[must_use]
    pub fn from_statistics(statistics: &Statistics) -> Self {
        Self {
            available: statistics
                .discount_codes
                .iter()
                .filter(|code| !code.is_used)
                .cloned()
                .collect(),
            applied: None,
            error: None,
        }
    }

    /// Codes that were unused when the snapshot was taken.
    #[must_use]
    pub fn available(&self) -> &[DiscountCodeInfo] {
        &self.available
    }

    /// The currently applied code, if any.
    #[must_use]
    pub fn applied(&self) -> Option<&str> {
        self.applied.as_deref()
    }

    /// The most recent validation failure, if any.
    #[must_use]
    pub const fn error(&self) -> Option<CouponError> {
        self.error
    }

    /// Validate and apply a code. Whitespace is trimmed first.
    ///
    /// # Errors
    ///
    /// Returns `CouponError::Empty` for a blank code and
    /// `CouponError::Unknown` for one absent from the unused set; either
    /// way any previously applied code is cleared.
    pub fn apply(&mut self, code: &str) -> Result<(), CouponError> {
        let code = code.trim();
        let result = if code.is_empty() {
            Err(CouponError::Empty)
        } else if self.available.iter().any(|c| c.code == code) {
            Ok(())
        } else {
            Err(CouponError::Unknown)
        };

        match result {
            Ok(()) => {
                self.applied = Some(code.to_string());
                self.error = None;
            }
            Err(e) => {
                self.applied = None;
                self.error = Some(e);
            }
        }
        result
    }

    /// Clear any applied code and error state.
    pub fn remove(&mut self) {
        self.applied = None;
        self.error = None;
    }
}

/// Totals shown during cart review.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Totals {
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub total: Decimal,
}

/// Compute cart-review totals.
///
/// The subtotal sums `quantity x price` over items whose product resolves
/// against the catalog; orphaned cart lines contribute zero rather than
/// failing the computation. An applied code discounts the subtotal by
/// [`DISPLAY_DISCOUNT_RATE`].
#[must_use]
pub fn compute_totals(cart: &Cart, products: &[Product], applied_code: Option<&str>) -> Totals {
    let subtotal: Decimal = cart
        .items
        .iter()
        .filter_map(|item| {
            products
                .iter()
                .find(|product| product.id == item.product_id)
                .map(|product| product.price * Decimal::from(item.quantity))
        })
        .sum();

    let discount = if applied_code.is_some() {
        subtotal * DISPLAY_DISCOUNT_RATE
    } else {
        Decimal::ZERO
    };

    Totals {
        subtotal,
        discount,
        total: subtotal - discount,
    }
}
