//! CLI command implementations.

pub mod coupon;
pub mod migrate;
pub mod seed;

use secrecy::SecretString;

/// Database URL from `var`, falling back to `DATABASE_URL`.
pub(crate) fn database_url(var: &'static str) -> Result<SecretString, MissingDatabaseUrl> {
    dotenvy::dotenv().ok();

    std::env::var(var)
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| MissingDatabaseUrl(var))
}

#[derive(Debug, thiserror::Error)]
#[error("Missing environment variable: {0} (or DATABASE_URL)")]
pub struct MissingDatabaseUrl(pub &'static str);
