//! Catalog listing command.

use shopfront_client::{ApiClient, ApiError};
use shopfront_core::format_usd;

/// Print the product catalog.
///
/// # Errors
///
/// Returns an error if the catalog cannot be fetched.
pub async fn list(api: &ApiClient) -> Result<(), ApiError> {
    let products = api.products().await?;

    #[allow(clippy::print_stdout)]
    {
        if products.is_empty() {
            println!("No products available.");
            return Ok(());
        }

        for product in &products {
            println!(
                "{}  {:<30} {:>10}",
                product.id,
                product.name,
                format_usd(product.price)
            );
            if !product.description.is_empty() {
                println!("    {}", product.description);
            }
        }
        println!("{} products", products.len());
    }

    Ok(())
}
