//! Coupon administration types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use vitrine_core::{CouponCode, CouponEffect, CouponEffectError, CouponId, CouponKind};

/// A stored coupon with its bookkeeping columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CouponRecord {
    pub id: CouponId,
    pub code: CouponCode,
    #[serde(flatten)]
    pub effect: CouponEffect,
    #[serde(serialize_with = "rust_decimal::serde::float_option::serialize")]
    pub min_subtotal: Option<Decimal>,
    pub active: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub usage_count: i32,
    pub created_at: DateTime<Utc>,
}

/// Body of `POST /api/coupons`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewCoupon {
    pub code: CouponCode,
    #[serde(rename = "type")]
    pub kind: CouponKind,
    #[serde(default)]
    pub percent: Option<Decimal>,
    #[serde(default)]
    pub amount: Option<Decimal>,
    #[serde(default, rename = "minSubtotal", alias = "min_subtotal")]
    pub min_subtotal: Option<Decimal>,
    #[serde(default, rename = "expiresAt", alias = "expires_at")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl NewCoupon {
    /// The effect described by `kind` and its values.
    ///
    /// # Errors
    ///
    /// Returns [`CouponEffectError`] when the value required by `kind` is
    /// missing or out of range.
    pub fn effect(&self) -> Result<CouponEffect, CouponEffectError> {
        CouponEffect::from_parts(self.kind, self.percent, self.amount)
    }
}
