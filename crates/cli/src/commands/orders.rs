//! Order history command.

use shopfront_client::{ApiClient, ApiError};
use shopfront_core::format_usd;

/// Print the order history.
///
/// # Errors
///
/// Returns an error if the history cannot be fetched.
pub async fn list(api: &ApiClient) -> Result<(), ApiError> {
    let orders = api.orders().await?;

    #[allow(clippy::print_stdout)]
    {
        if orders.is_empty() {
            println!("No orders yet.");
            return Ok(());
        }

        for order in &orders {
            let discount = order
                .discount_code_used
                .as_deref()
                .map_or_else(String::new, |code| format!("  ({code})"));
            println!(
                "{}  {}  {} items  {}{discount}",
                order.id,
                order.created_at.format("%Y-%m-%d %H:%M"),
                order.items.iter().map(|item| item.quantity).sum::<u32>(),
                format_usd(order.total),
            );
        }
    }

    Ok(())
}
