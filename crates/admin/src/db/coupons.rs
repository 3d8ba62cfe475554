//! Coupon administration.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::instrument;
use vitrine_core::{CouponCode, CouponEffect, CouponId, CouponKind};

use super::RepositoryError;
use crate::models::{CouponRecord, NewCoupon};

#[derive(sqlx::FromRow)]
struct CouponRow {
    id: CouponId,
    code: String,
    kind: CouponKind,
    percent: Option<Decimal>,
    amount: Option<Decimal>,
    min_subtotal: Option<Decimal>,
    active: bool,
    expires_at: Option<DateTime<Utc>>,
    usage_count: i32,
    created_at: DateTime<Utc>,
}

impl TryFrom<CouponRow> for CouponRecord {
    type Error = RepositoryError;

    fn try_from(row: CouponRow) -> Result<Self, Self::Error> {
        let code = CouponCode::parse(&row.code).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid coupon code {}: {e}", row.id))
        })?;
        let effect = CouponEffect::from_parts(row.kind, row.percent, row.amount).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid coupon {code}: {e}"))
        })?;

        Ok(Self {
            id: row.id,
            code,
            effect,
            min_subtotal: row.min_subtotal,
            active: row.active,
            expires_at: row.expires_at,
            usage_count: row.usage_count,
            created_at: row.created_at,
        })
    }
}

const COUPON_COLUMNS: &str = r"
    id, code, kind, percent, amount, min_subtotal, active, expires_at, usage_count, created_at
";

/// Repository for coupon administration.
pub struct CouponRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CouponRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List all coupons, active first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored row is invalid.
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<CouponRecord>, RepositoryError> {
        let rows = sqlx::query_as::<_, CouponRow>(&format!(
            "SELECT {COUPON_COLUMNS} FROM shop.coupons ORDER BY active DESC, code"
        ))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(CouponRecord::try_from).collect()
    }

    /// Create a coupon.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the code already exists.
    /// Returns `RepositoryError::Database` if the insert fails.
    #[instrument(skip(self, coupon, effect), fields(code = %coupon.code))]
    pub async fn create(
        &self,
        coupon: &NewCoupon,
        effect: CouponEffect,
    ) -> Result<CouponRecord, RepositoryError> {
        let row = sqlx::query_as::<_, CouponRow>(&format!(
            r"
            INSERT INTO shop.coupons (code, kind, percent, amount, min_subtotal, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {COUPON_COLUMNS}
            "
        ))
        .bind(coupon.code.as_str())
        .bind(effect.kind())
        .bind(effect.percent())
        .bind(effect.amount())
        .bind(coupon.min_subtotal)
        .bind(coupon.expires_at)
        .fetch_one(self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                RepositoryError::Conflict(format!("coupon {} already exists", coupon.code))
            }
            other => RepositoryError::Database(other),
        })?;

        tracing::info!("Coupon created");
        CouponRecord::try_from(row)
    }

    /// Deactivate a coupon. Deactivating an inactive coupon is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no coupon has this code.
    /// Returns `RepositoryError::Database` if the update fails.
    #[instrument(skip(self, code), fields(code = %code))]
    pub async fn deactivate(&self, code: &CouponCode) -> Result<CouponRecord, RepositoryError> {
        let row = sqlx::query_as::<_, CouponRow>(&format!(
            r"
            UPDATE shop.coupons
            SET active = FALSE, updated_at = NOW()
            WHERE code = $1
            RETURNING {COUPON_COLUMNS}
            "
        ))
        .bind(code.as_str())
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        CouponRecord::try_from(row)
    }
}
