//! Coupon management commands.
//!
//! ```bash
//! vitrine-cli coupon create BEMVINDO10 --kind percent --percent 10 --min-subtotal 80
//! vitrine-cli coupon create FRETEGRATIS --kind free-shipping --expires-in-days 30
//! vitrine-cli coupon list
//! vitrine-cli coupon deactivate BEMVINDO10
//! ```
//!
//! Uses `ADMIN_DATABASE_URL` (or `DATABASE_URL`).

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use thiserror::Error;
use vitrine_admin::db::{self, CouponRepository, RepositoryError};
use vitrine_admin::models::NewCoupon;
use vitrine_core::{CouponCode, CouponCodeError, CouponEffectError, CouponKind, format_brl};

use super::{MissingDatabaseUrl, database_url};

#[derive(Debug, Error)]
pub enum CouponError {
    #[error(transparent)]
    MissingEnvVar(#[from] MissingDatabaseUrl),

    #[error("Invalid coupon code: {0}")]
    InvalidCode(#[from] CouponCodeError),

    #[error("Invalid coupon: {0}")]
    InvalidEffect(#[from] CouponEffectError),

    #[error("Invalid coupon: {0}")]
    Invalid(&'static str),

    #[error("Database connection error: {0}")]
    Connection(#[from] sqlx::Error),

    #[error("Coupon not found: {0}")]
    NotFound(CouponCode),

    #[error(transparent)]
    Repository(RepositoryError),
}

/// Arguments of `coupon create`.
#[derive(Debug, Clone)]
pub struct CreateArgs {
    pub code: String,
    pub kind: CouponKind,
    pub percent: Option<Decimal>,
    pub amount: Option<Decimal>,
    pub min_subtotal: Option<Decimal>,
    pub expires_in_days: Option<i64>,
}

impl CreateArgs {
    /// Build the coupon to insert, checking it before any connection is made.
    fn into_new_coupon(self) -> Result<NewCoupon, CouponError> {
        if self.min_subtotal.is_some_and(|min| min < Decimal::ZERO) {
            return Err(CouponError::Invalid("min subtotal cannot be negative"));
        }
        if self.expires_in_days.is_some_and(|days| days <= 0) {
            return Err(CouponError::Invalid("expiry must be at least one day away"));
        }

        let coupon = NewCoupon {
            code: CouponCode::parse(&self.code)?,
            kind: self.kind,
            percent: self.percent,
            amount: self.amount,
            min_subtotal: self.min_subtotal,
            expires_at: self
                .expires_in_days
                .map(|days| Utc::now() + Duration::days(days)),
        };
        coupon.effect()?;
        Ok(coupon)
    }
}

/// Create a coupon.
///
/// # Errors
///
/// Returns `CouponError` if the arguments are invalid, the code already
/// exists, or the database is unreachable.
pub async fn create(args: CreateArgs) -> Result<(), CouponError> {
    let coupon = args.into_new_coupon()?;
    let effect = coupon.effect()?;

    let pool = db::create_pool(&database_url("ADMIN_DATABASE_URL")?).await?;
    let record = CouponRepository::new(&pool)
        .create(&coupon, effect)
        .await
        .map_err(CouponError::Repository)?;

    tracing::info!(
        "Coupon created! ID: {}, Code: {}, Type: {:?}",
        record.id,
        record.code,
        record.effect.kind()
    );
    Ok(())
}

/// List all coupons.
///
/// # Errors
///
/// Returns `CouponError` if the database is unreachable.
pub async fn list() -> Result<(), CouponError> {
    let pool = db::create_pool(&database_url("ADMIN_DATABASE_URL")?).await?;
    let coupons = CouponRepository::new(&pool)
        .list()
        .await
        .map_err(CouponError::Repository)?;

    if coupons.is_empty() {
        tracing::info!("No coupons");
        return Ok(());
    }

    for coupon in &coupons {
        let value = match (coupon.effect.percent(), coupon.effect.amount()) {
            (Some(percent), _) => format!("{percent}%"),
            (_, Some(amount)) => format_brl(amount),
            _ => "frete grátis".to_string(),
        };
        let min = coupon
            .min_subtotal
            .map_or_else(|| "-".to_string(), format_brl);
        let expires = coupon
            .expires_at
            .map_or_else(|| "-".to_string(), |at| at.format("%Y-%m-%d").to_string());

        tracing::info!(
            "{:<16} {:<8} {:>12}  min {:>12}  expires {:<10}  used {:>4}",
            coupon.code.as_str(),
            if coupon.active { "active" } else { "inactive" },
            value,
            min,
            expires,
            coupon.usage_count
        );
    }
    Ok(())
}

/// Deactivate a coupon by code.
///
/// # Errors
///
/// Returns `CouponError::NotFound` if no coupon has this code.
pub async fn deactivate(code: &str) -> Result<(), CouponError> {
    let code = CouponCode::parse(code)?;
    let pool = db::create_pool(&database_url("ADMIN_DATABASE_URL")?).await?;

    match CouponRepository::new(&pool).deactivate(&code).await {
        Ok(record) => {
            tracing::info!("Coupon {} deactivated", record.code);
            Ok(())
        }
        Err(RepositoryError::NotFound) => Err(CouponError::NotFound(code)),
        Err(e) => Err(CouponError::Repository(e)),
    }
}
