//! Admin statistics commands.

use shopfront_client::{ApiClient, ApiError};
use shopfront_core::format_usd;

/// Print aggregate statistics and the discount-code list.
///
/// # Errors
///
/// Returns an error if the statistics cannot be fetched.
pub async fn show(api: &ApiClient) -> Result<(), ApiError> {
    let stats = api.statistics().await?;

    #[allow(clippy::print_stdout)]
    {
        println!("Orders:            {}", stats.total_orders);
        println!("Items purchased:   {}", stats.total_items_purchased);
        println!(
            "Purchase amount:   {}",
            format_usd(stats.total_purchase_amount)
        );
        println!(
            "Discount amount:   {}",
            format_usd(stats.total_discount_amount)
        );
        println!(
            "Code interval:     every {} orders",
            stats.nth_order_value
        );

        if stats.discount_codes.is_empty() {
            println!("No discount codes issued yet.");
        } else {
            println!("Discount codes:");
            for code in &stats.discount_codes {
                let status = if code.is_used { "used" } else { "unused" };
                println!(
                    "  {:<20} order #{:<4} {}",
                    code.code, code.order_number, status
                );
            }
        }
    }

    Ok(())
}

/// Trigger discount-code generation and report the outcome.
///
/// # Errors
///
/// Returns an error if the request fails.
pub async fn generate_discount(api: &ApiClient) -> Result<(), ApiError> {
    let outcome = api.generate_discount().await?;

    #[allow(clippy::print_stdout)]
    {
        println!("{}", outcome.message);
        if let Some(code) = outcome.discount_code {
            println!("  {} (order #{})", code.code, code.order_number);
        }
    }

    Ok(())
}
