//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `SHOPFRONT_API_URL` - Base URL of the storefront REST service
//!   (e.g., <http://localhost:8000/api>)
//!
//! ## Optional
//! - `SHOPFRONT_HTTP_TIMEOUT_SECS` - Network timeout in seconds (default: 10)
//! - `SHOPFRONT_DEBOUNCE_MS` - Quantity-write debounce in milliseconds
//!   (default: 300)
//! - `SHOPFRONT_CACHE_TTL_SECS` - Product-list cache freshness window in
//!   seconds (default: 300)

use std::time::Duration;

use thiserror::Error;
use url::Url;

/// Default network timeout for every API call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default delay before a quantity change is written to the server.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

/// Default freshness window for cached product-list responses.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Client configuration.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Base URL of the storefront REST service, without trailing slash.
    pub base_url: String,
    /// Network timeout applied to every request.
    pub timeout: Duration,
    /// Delay before a quantity change is committed to the server.
    pub debounce: Duration,
    /// Freshness window for the product-list cache.
    pub cache_ttl: Duration,
}

impl StoreConfig {
    /// Create a configuration with default tunables for the given base URL.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if `base_url` is not a valid URL.
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        let validated = validate_base_url("SHOPFRONT_API_URL", base_url)?;
        Ok(Self {
            base_url: validated,
            timeout: DEFAULT_TIMEOUT,
            debounce: DEFAULT_DEBOUNCE,
            cache_ttl: DEFAULT_CACHE_TTL,
        })
    }

    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let base_url = get_required_env("SHOPFRONT_API_URL")?;
        let mut config = Self::new(&base_url)?;

        config.timeout = Duration::from_secs(parse_env_or_default(
            "SHOPFRONT_HTTP_TIMEOUT_SECS",
            DEFAULT_TIMEOUT.as_secs(),
        )?);
        config.debounce = Duration::from_millis(parse_env_or_default(
            "SHOPFRONT_DEBOUNCE_MS",
            u64::try_from(DEFAULT_DEBOUNCE.as_millis()).unwrap_or(300),
        )?);
        config.cache_ttl = Duration::from_secs(parse_env_or_default(
            "SHOPFRONT_CACHE_TTL_SECS",
            DEFAULT_CACHE_TTL.as_secs(),
        )?);

        Ok(config)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Parse an optional numeric environment variable, falling back to a default.
fn parse_env_or_default(key: &str, default: u64) -> Result<u64, ConfigError> {
    match std::env::var(key) {
        Ok(value) => value
            .parse::<u64>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string())),
        Err(_) => Ok(default),
    }
}

/// Validate a base URL and strip any trailing slash.
fn validate_base_url(key: &str, value: &str) -> Result<String, ConfigError> {
    Url::parse(value).map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    Ok(value.trim_end_matches('/').to_string())
}
