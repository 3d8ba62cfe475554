//! End-to-end tests for Vitrine.
//!
//! # Running Tests
//!
//! ```bash
//! # Database with migrations applied
//! cargo run -p vitrine-cli -- migrate
//!
//! # Both servers
//! cargo run -p vitrine-storefront &
//! cargo run -p vitrine-admin &
//!
//! # Ignored tests need the running servers
//! cargo test -p vitrine-integration-tests -- --ignored
//! ```
//!
//! # Environment
//!
//! - `STOREFRONT_URL` (default `http://localhost:3000`)
//! - `ADMIN_URL` (default `http://localhost:3001`)
//! - `ADMIN_API_TOKEN` - same token the admin server runs with
//! - `DATABASE_URL` - used to insert fixtures directly

#![allow(clippy::expect_used, clippy::missing_panics_doc)]

use reqwest::Client;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;
use vitrine_core::ProductId;

/// Base URL of the running storefront.
#[must_use]
pub fn storefront_url() -> String {
    std::env::var("STOREFRONT_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

/// Base URL of the running admin API.
#[must_use]
pub fn admin_url() -> String {
    std::env::var("ADMIN_URL").unwrap_or_else(|_| "http://localhost:3001".to_string())
}

/// Bearer token for the admin API.
#[must_use]
pub fn admin_token() -> String {
    std::env::var("ADMIN_API_TOKEN").expect("ADMIN_API_TOKEN must be set")
}

/// HTTP client that keeps the storefront session cookie.
#[must_use]
pub fn session_client() -> Client {
    Client::builder()
        .cookie_store(true)
        .build()
        .expect("Failed to create HTTP client")
}

/// Connect to the shared database for fixtures.
pub async fn database() -> PgPool {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    PgPool::connect(&url)
        .await
        .expect("Failed to connect to database")
}

/// A coupon code no other test run uses.
#[must_use]
pub fn unique_code(prefix: &str) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{prefix}{}", &suffix[..8]).to_uppercase()
}

/// Insert an active product.
pub async fn insert_product(pool: &PgPool, name: &str, price: Decimal) -> ProductId {
    let id: i32 = sqlx::query_scalar(
        "INSERT INTO shop.products (name, price) VALUES ($1, $2) RETURNING id",
    )
    .bind(name)
    .bind(price)
    .fetch_one(pool)
    .await
    .expect("Failed to insert product");
    ProductId::new(id)
}

/// Insert a percent coupon.
pub async fn insert_percent_coupon(
    pool: &PgPool,
    code: &str,
    percent: Decimal,
    min_subtotal: Option<Decimal>,
) {
    sqlx::query(
        r"
        INSERT INTO shop.coupons (code, kind, percent, min_subtotal)
        VALUES ($1, 'percent', $2, $3)
        ",
    )
    .bind(code)
    .bind(percent)
    .bind(min_subtotal)
    .execute(pool)
    .await
    .expect("Failed to insert coupon");
}

/// Current usage count of a coupon.
pub async fn coupon_usage(pool: &PgPool, code: &str) -> i32 {
    sqlx::query_scalar("SELECT usage_count FROM shop.coupons WHERE code = $1")
        .bind(code)
        .fetch_one(pool)
        .await
        .expect("Failed to read coupon usage")
}
