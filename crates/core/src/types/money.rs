//! Money display helpers.
//!
//! Monetary values arrive on the wire as JSON numbers of unspecified
//! precision and are held as [`rust_decimal::Decimal`] everywhere in the
//! client. Display is always two decimal places; the helpers here exist so
//! every surface (notices, CLI output) formats the same way.

use rust_decimal::Decimal;

/// Format a decimal amount as a US-dollar display string, e.g. `$19.99`.
///
/// Rounds to two decimal places and always pads the fraction, so `22.5`
/// renders as `$22.50`.
#[must_use]
pub fn format_usd(amount: Decimal) -> String {
    format!("${amount:.2}")
}
