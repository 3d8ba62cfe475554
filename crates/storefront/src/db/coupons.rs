//! Coupon lookups. The storefront never writes coupons.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::instrument;
use vitrine_core::{Coupon, CouponCode, CouponEffect, CouponKind};

use super::RepositoryError;

#[derive(sqlx::FromRow)]
struct CouponRow {
    code: String,
    kind: CouponKind,
    percent: Option<Decimal>,
    amount: Option<Decimal>,
    min_subtotal: Option<Decimal>,
    active: bool,
    expires_at: Option<DateTime<Utc>>,
}

impl TryFrom<CouponRow> for Coupon {
    type Error = RepositoryError;

    fn try_from(row: CouponRow) -> Result<Self, Self::Error> {
        let code = CouponCode::parse(&row.code).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid coupon code in database: {e}"))
        })?;
        let effect = CouponEffect::from_parts(row.kind, row.percent, row.amount).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid coupon {code} in database: {e}"))
        })?;

        Ok(Self {
            code,
            effect,
            min_subtotal: row.min_subtotal,
            active: row.active,
            expires_at: row.expires_at,
        })
    }
}

/// Repository for coupon reads.
pub struct CouponRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CouponRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Find a coupon by its normalized code, active or not.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored row is invalid.
    #[instrument(skip(self), fields(code = %code))]
    pub async fn find_by_code(&self, code: &CouponCode) -> Result<Option<Coupon>, RepositoryError> {
        let row = sqlx::query_as::<_, CouponRow>(
            r"
            SELECT code, kind, percent, amount, min_subtotal, active, expires_at
            FROM shop.coupons
            WHERE code = $1
            ",
        )
        .bind(code.as_str())
        .fetch_optional(self.pool)
        .await?;

        row.map(Coupon::try_from).transpose()
    }
}
