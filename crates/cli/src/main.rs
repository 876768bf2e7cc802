//! Shopfront CLI - drives the storefront client from the terminal.
//!
//! # Usage
//!
//! ```bash
//! # List the product catalog
//! shopfront products
//!
//! # Show admin statistics and discount codes
//! shopfront stats
//!
//! # List the order history
//! shopfront orders
//!
//! # Manually trigger discount-code generation
//! shopfront discount generate
//!
//! # Buy a product end to end (cart, quantity, optional coupon, checkout)
//! shopfront buy --product <PRODUCT_ID> --quantity 3 --code SAVE10-AB12CD34
//! ```
//!
//! # Environment Variables
//!
//! - `SHOPFRONT_API_URL` - Base URL of the storefront REST service

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

use shopfront_client::{ApiClient, StoreConfig};

mod commands;

#[derive(Parser)]
#[command(name = "shopfront")]
#[command(author, version, about = "Shopfront storefront CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the product catalog
    Products,
    /// Show admin statistics and the discount-code list
    Stats,
    /// List the order history
    Orders,
    /// Discount-code administration
    Discount {
        #[command(subcommand)]
        action: DiscountAction,
    },
    /// Run a scripted purchase end to end
    Buy {
        /// Product to buy
        #[arg(short, long)]
        product: String,

        /// Final quantity to purchase
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,

        /// Discount code to redeem at checkout
        #[arg(short, long)]
        code: Option<String>,
    },
}

#[derive(Subcommand)]
enum DiscountAction {
    /// Ask the backend to mint a discount code if one is due
    Generate,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = StoreConfig::from_env()?;
    let api = ApiClient::new(&config);

    match cli.command {
        Commands::Products => commands::products::list(&api).await?,
        Commands::Stats => commands::stats::show(&api).await?,
        Commands::Orders => commands::orders::list(&api).await?,
        Commands::Discount { action } => match action {
            DiscountAction::Generate => commands::stats::generate_discount(&api).await?,
        },
        Commands::Buy {
            product,
            quantity,
            code,
        } => commands::buy::run(&api, &config, &product, quantity, code.as_deref()).await?,
    }
    Ok(())
}
