//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `STOREFRONT_BASE_URL` - Public URL for the storefront
//! - `PIX_KEY` - Pix key (email, phone, CPF/CNPJ or random key) receiving payments
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `CHECKOUT_SHIPPING_BASE_PRICE` - Shipping fee (default: 15)
//! - `CHECKOUT_FREE_SHIPPING_THRESHOLD` - Free shipping above this subtotal (default: 200)
//! - `CHECKOUT_PIX_DISCOUNT_PERCENT` - Pix discount in percent (default: 5)
//! - `PIX_MERCHANT_NAME` - Merchant name in the Pix payload (default: Vitrine)
//! - `PIX_MERCHANT_CITY` - Merchant city in the Pix payload (default: SAO PAULO)
//! - `PIX_QR_IMAGE_BASE_URL` - URL prefix that renders a payload as a QR image
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::net::{IpAddr, SocketAddr};

use secrecy::SecretString;
use thiserror::Error;
use url::Url;
use vitrine_core::PricingConfig;

const DEFAULT_PIX_MERCHANT_NAME: &str = "Vitrine";
const DEFAULT_PIX_MERCHANT_CITY: &str = "SAO PAULO";
const DEFAULT_PIX_QR_IMAGE_BASE_URL: &str =
    "https://api.qrserver.com/v1/create-qr-code/?size=300x300&data=";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Shipping and discount policy
    pub pricing: PricingConfig,
    /// Pix receiver details
    pub pix: PixConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name (e.g. production, staging)
    pub sentry_environment: Option<String>,
}

/// Pix receiver configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixConfig {
    /// Pix key receiving the payments
    pub key: String,
    /// Merchant name printed by banking apps
    pub merchant_name: String,
    /// Merchant city
    pub merchant_city: String,
    /// Prefix that turns a URL-encoded payload into a QR image URL
    pub qr_image_base_url: String,
}

impl PixConfig {
    /// Image URL rendering `payload` as a QR code.
    #[must_use]
    pub fn qr_image_url(&self, payload: &str) -> String {
        let encoded: String = url::form_urlencoded::byte_serialize(payload.as_bytes()).collect();
        format!("{}{encoded}", self.qr_image_base_url)
    }

    fn from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let qr_image_base_url =
            get_or_default(lookup, "PIX_QR_IMAGE_BASE_URL", DEFAULT_PIX_QR_IMAGE_BASE_URL);
        Url::parse(&qr_image_base_url).map_err(|e| {
            ConfigError::InvalidEnvVar("PIX_QR_IMAGE_BASE_URL".to_string(), e.to_string())
        })?;

        Ok(Self {
            key: get_required(lookup, "PIX_KEY")?,
            merchant_name: get_or_default(lookup, "PIX_MERCHANT_NAME", DEFAULT_PIX_MERCHANT_NAME),
            merchant_city: get_or_default(lookup, "PIX_MERCHANT_CITY", DEFAULT_PIX_MERCHANT_CITY),
            qr_image_base_url,
        })
    }
}

impl StorefrontConfig {
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

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database_url = get_database_url(&lookup, "STOREFRONT_DATABASE_URL")?;
        let host = get_or_default(&lookup, "STOREFRONT_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_HOST".to_string(), e.to_string())
            })?;
        let port = get_or_default(&lookup, "STOREFRONT_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_PORT".to_string(), e.to_string())
            })?;
        let base_url = get_required(&lookup, "STOREFRONT_BASE_URL")?;

        // Bad pricing values fall back to defaults with a warning instead of
        // refusing to start.
        let pricing = PricingConfig::from_lookup(&lookup);
        let pix = PixConfig::from_lookup(&lookup)?;

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            pricing,
            pix,
            sentry_dsn: lookup("SENTRY_DSN"),
            sentry_environment: lookup("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required variable.
fn get_required(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<String, ConfigError> {
    lookup(key).ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(
    lookup: &impl Fn(&str) -> Option<String>,
    primary_key: &str,
) -> Result<SecretString, ConfigError> {
    lookup(primary_key)
        .or_else(|| lookup("DATABASE_URL"))
        .map(SecretString::from)
        .ok_or_else(|| ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get a variable with a default value.
fn get_or_default(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: &str) -> String {
    lookup(key).unwrap_or_else(|| default.to_string())
}
