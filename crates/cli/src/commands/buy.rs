//! Scripted end-to-end purchase command.
//!
//! Exercises the full cart session: provision a cart, add the product,
//! adjust the quantity (debounced, then flushed), and check out with an
//! optional discount code.

use thiserror::Error;

use shopfront_client::{ApiClient, CartSession, StoreConfig};
use shopfront_core::{NoticeKind, ProductId, format_usd};

/// Errors that can occur during a scripted purchase.
#[derive(Debug, Error)]
pub enum BuyError {
    /// No cart could be provisioned; the backend is unreachable or down.
    #[error("Cart unavailable - is the storefront service running?")]
    CartUnavailable,

    /// The item never made it into the cart.
    #[error("Could not add product to cart: {0}")]
    AddFailed(String),

    /// Checkout was refused or failed.
    #[error("Checkout failed: {0}")]
    CheckoutFailed(String),
}

/// Run a purchase end to end and print the resulting order.
///
/// # Errors
///
/// Returns an error if the cart cannot be provisioned, the product cannot
/// be added, or checkout fails.
pub async fn run(
    api: &ApiClient,
    config: &StoreConfig,
    product: &str,
    quantity: u32,
    code: Option<&str>,
) -> Result<(), BuyError> {
    let product_id = ProductId::new(product);

    let session = CartSession::new(api.clone(), config);
    session.start().await;
    if !session.is_ready() {
        return Err(BuyError::CartUnavailable);
    }

    session.add_item(&product_id).await;
    match session.notice() {
        Some(notice) if notice.kind == NoticeKind::Success => {}
        notice => {
            let reason = notice.map_or_else(|| "no response".to_string(), |n| n.text);
            return Err(BuyError::AddFailed(reason));
        }
    }

    if quantity > 1 {
        session.set_quantity(&product_id, quantity).await;
    }

    let Some(order) = session.checkout(code).await else {
        let reason = session
            .notice()
            .map_or_else(|| "no response".to_string(), |n| n.text);
        return Err(BuyError::CheckoutFailed(reason));
    };

    #[allow(clippy::print_stdout)]
    {
        println!("Order {} placed.", order.id);
        println!("  Subtotal: {}", format_usd(order.subtotal));
        if let Some(code) = &order.discount_code_used {
            println!(
                "  Discount: -{} ({code})",
                format_usd(order.discount_amount)
            );
        }
        println!("  Total:    {}", format_usd(order.total));
    }

    Ok(())
}
