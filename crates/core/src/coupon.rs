//! Coupons and the validity predicate shared by the storefront and clients.
//!
//! A coupon is stored with a string discriminator (`kind`) and two optional
//! numeric columns. In Rust it is a [`CouponEffect`] sum type so every
//! consumer has to handle all three effects explicitly.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`CouponCode`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CouponCodeError {
    #[error("coupon code cannot be empty")]
    Empty,
    #[error("coupon code must be at most {max} characters")]
    TooLong { max: usize },
    #[error("coupon code contains invalid character {0:?}")]
    InvalidCharacter(char),
}

/// A normalized (upper-case) coupon code.
///
/// Matching is case-insensitive because every code is upper-cased before it
/// is stored or looked up.
///
/// ```
/// use vitrine_core::CouponCode;
///
/// let code = CouponCode::parse(" bemvindo10 ").unwrap();
/// assert_eq!(code.as_str(), "BEMVINDO10");
/// assert!(CouponCode::parse("").is_err());
/// assert!(CouponCode::parse("10% OFF").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CouponCode(String);

impl CouponCode {
    pub const MAX_LENGTH: usize = 64;

    /// Parse and upper-case a coupon code.
    ///
    /// # Errors
    ///
    /// Returns [`CouponCodeError`] if the code is empty, too long, or contains
    /// anything other than ASCII letters, digits, `-` and `_`.
    pub fn parse(s: &str) -> Result<Self, CouponCodeError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(CouponCodeError::Empty);
        }
        if s.len() > Self::MAX_LENGTH {
            return Err(CouponCodeError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }
        if let Some(bad) = s
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'))
        {
            return Err(CouponCodeError::InvalidCharacter(bad));
        }
        Ok(Self(s.to_ascii_uppercase()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CouponCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for CouponCode {
    type Error = CouponCodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CouponCode> for String {
    fn from(code: CouponCode) -> Self {
        code.0
    }
}

/// The stored discriminator of a coupon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "shop.coupon_kind", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum CouponKind {
    Percent,
    FixedAmount,
    FreeShipping,
}

/// Error building a [`CouponEffect`] from stored or submitted parts.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CouponEffectError {
    #[error("percent coupon requires a percent value")]
    MissingPercent,
    #[error("percent must be between 0 and 100 (got {0})")]
    PercentOutOfRange(Decimal),
    #[error("fixed amount coupon requires an amount")]
    MissingAmount,
    #[error("amount cannot be negative (got {0})")]
    NegativeAmount(Decimal),
}

/// What a valid coupon does to the checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CouponEffect {
    /// Percentage off the subtotal (0–100).
    Percent {
        #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
        percent: Decimal,
    },
    /// Fixed amount off the subtotal, never more than the subtotal itself.
    FixedAmount {
        #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
        amount: Decimal,
    },
    /// Waives the shipping fee.
    FreeShipping,
}

impl CouponEffect {
    /// Build an effect from the discriminator and its optional values.
    ///
    /// # Errors
    ///
    /// Returns [`CouponEffectError`] when the value required by `kind` is
    /// missing or out of range.
    pub fn from_parts(
        kind: CouponKind,
        percent: Option<Decimal>,
        amount: Option<Decimal>,
    ) -> Result<Self, CouponEffectError> {
        match kind {
            CouponKind::Percent => {
                let percent = percent.ok_or(CouponEffectError::MissingPercent)?;
                if percent < Decimal::ZERO || percent > Decimal::ONE_HUNDRED {
                    return Err(CouponEffectError::PercentOutOfRange(percent));
                }
                Ok(Self::Percent { percent })
            }
            CouponKind::FixedAmount => {
                let amount = amount.ok_or(CouponEffectError::MissingAmount)?;
                if amount < Decimal::ZERO {
                    return Err(CouponEffectError::NegativeAmount(amount));
                }
                Ok(Self::FixedAmount { amount })
            }
            CouponKind::FreeShipping => Ok(Self::FreeShipping),
        }
    }

    #[must_use]
    pub const fn kind(&self) -> CouponKind {
        match self {
            Self::Percent { .. } => CouponKind::Percent,
            Self::FixedAmount { .. } => CouponKind::FixedAmount,
            Self::FreeShipping => CouponKind::FreeShipping,
        }
    }

    #[must_use]
    pub const fn percent(&self) -> Option<Decimal> {
        match self {
            Self::Percent { percent } => Some(*percent),
            _ => None,
        }
    }

    #[must_use]
    pub const fn amount(&self) -> Option<Decimal> {
        match self {
            Self::FixedAmount { amount } => Some(*amount),
            _ => None,
        }
    }
}

/// A coupon as the checkout sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Coupon {
    pub code: CouponCode,
    pub effect: CouponEffect,
    pub min_subtotal: Option<Decimal>,
    pub active: bool,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Coupon {
    /// Check whether this coupon applies to `subtotal` at `now`.
    ///
    /// Inactive coupons are reported as `not_found`, the same as unknown
    /// codes. Validation has no side effects.
    #[must_use]
    pub fn validate(&self, subtotal: Decimal, now: DateTime<Utc>) -> CouponValidation {
        if !self.active {
            return CouponValidation::not_found();
        }

        let mut result = CouponValidation {
            valid: true,
            reason: None,
            kind: Some(self.effect.kind()),
            percent: self.effect.percent(),
            amount: self.effect.amount(),
            min_subtotal: self.min_subtotal,
        };

        if self.expires_at.is_some_and(|expires_at| expires_at <= now) {
            result.valid = false;
            result.reason = Some(RejectionReason::Expired);
        } else if self.min_subtotal.is_some_and(|min| subtotal < min) {
            result.valid = false;
            result.reason = Some(RejectionReason::MinSubtotal);
        }

        result
    }
}

/// Why a coupon was not accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionReason {
    NotFound,
    MinSubtotal,
    Expired,
}

impl RejectionReason {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::MinSubtotal => "min_subtotal",
            Self::Expired => "expired",
        }
    }
}

impl std::fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Response body of `POST /api/coupons/validate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CouponValidation {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<RejectionReason>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<CouponKind>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "rust_decimal::serde::float_option::serialize"
    )]
    pub percent: Option<Decimal>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "rust_decimal::serde::float_option::serialize"
    )]
    pub amount: Option<Decimal>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "rust_decimal::serde::float_option::serialize"
    )]
    pub min_subtotal: Option<Decimal>,
}

impl CouponValidation {
    /// Result for a code that matches no active coupon.
    #[must_use]
    pub const fn not_found() -> Self {
        Self {
            valid: false,
            reason: Some(RejectionReason::NotFound),
            kind: None,
            percent: None,
            amount: None,
            min_subtotal: None,
        }
    }

    /// The effect to apply, if the coupon was accepted and is well-formed.
    #[must_use]
    pub fn effect(&self) -> Option<CouponEffect> {
        if !self.valid {
            return None;
        }
        CouponEffect::from_parts(self.kind?, self.percent, self.amount).ok()
    }
}

/// Body of `POST /api/coupons/validate`.
///
/// `code` stays a plain string so a malformed code is reported as a
/// validation error instead of a deserialization failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CouponValidateRequest {
    pub code: String,
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub subtotal: Decimal,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Duration;
    use rust_decimal_macros::dec;

    use super::*;

    fn coupon(effect: CouponEffect) -> Coupon {
        Coupon {
            code: CouponCode::parse("PROMO").unwrap(),
            effect,
            min_subtotal: None,
            active: true,
            expires_at: None,
        }
    }

    #[test]
    fn test_code_is_case_insensitive() {
        assert_eq!(
            CouponCode::parse("Frete-Gratis").unwrap(),
            CouponCode::parse("FRETE-GRATIS").unwrap()
        );
    }

    #[test]
    fn test_code_errors() {
        assert_eq!(CouponCode::parse("  "), Err(CouponCodeError::Empty));
        assert_eq!(
            CouponCode::parse("DEZ%"),
            Err(CouponCodeError::InvalidCharacter('%'))
        );
        assert!(matches!(
            CouponCode::parse(&"A".repeat(65)),
            Err(CouponCodeError::TooLong { max: 64 })
        ));
    }

    #[test]
    fn test_effect_from_parts() {
        assert_eq!(
            CouponEffect::from_parts(CouponKind::Percent, Some(dec!(10)), None),
            Ok(CouponEffect::Percent { percent: dec!(10) })
        );
        assert_eq!(
            CouponEffect::from_parts(CouponKind::Percent, None, Some(dec!(5))),
            Err(CouponEffectError::MissingPercent)
        );
        assert_eq!(
            CouponEffect::from_parts(CouponKind::Percent, Some(dec!(120)), None),
            Err(CouponEffectError::PercentOutOfRange(dec!(120)))
        );
        assert_eq!(
            CouponEffect::from_parts(CouponKind::FixedAmount, None, Some(dec!(-1))),
            Err(CouponEffectError::NegativeAmount(dec!(-1)))
        );
        assert_eq!(
            CouponEffect::from_parts(CouponKind::FreeShipping, None, None),
            Ok(CouponEffect::FreeShipping)
        );
    }

    #[test]
    fn test_validate_valid_coupon() {
        let result = coupon(CouponEffect::Percent { percent: dec!(10) })
            .validate(dec!(100), Utc::now());
        assert!(result.valid);
        assert_eq!(result.reason, None);
        assert_eq!(result.kind, Some(CouponKind::Percent));
        assert_eq!(result.percent, Some(dec!(10)));
        assert_eq!(
            result.effect(),
            Some(CouponEffect::Percent { percent: dec!(10) })
        );
    }

    #[test]
    fn test_validate_below_min_subtotal() {
        let mut c = coupon(CouponEffect::FixedAmount { amount: dec!(20) });
        c.min_subtotal = Some(dec!(150));

        let result = c.validate(dec!(149.99), Utc::now());
        assert!(!result.valid);
        assert_eq!(result.reason, Some(RejectionReason::MinSubtotal));
        assert_eq!(result.min_subtotal, Some(dec!(150)));
        assert_eq!(result.effect(), None);

        assert!(c.validate(dec!(150), Utc::now()).valid);
    }

    #[test]
    fn test_validate_inactive_is_not_found() {
        let mut c = coupon(CouponEffect::FreeShipping);
        c.active = false;
        assert_eq!(c.validate(dec!(10), Utc::now()), CouponValidation::not_found());
    }

    #[test]
    fn test_validate_expired() {
        let now = Utc::now();
        let mut c = coupon(CouponEffect::FreeShipping);
        c.expires_at = Some(now - Duration::minutes(1));
        let result = c.validate(dec!(10), now);
        assert!(!result.valid);
        assert_eq!(result.reason, Some(RejectionReason::Expired));

        c.expires_at = Some(now + Duration::days(1));
        assert!(c.validate(dec!(10), now).valid);
    }

    #[test]
    fn test_validation_wire_format() {
        let mut c = coupon(CouponEffect::FixedAmount { amount: dec!(25) });
        c.min_subtotal = Some(dec!(100));
        let json = serde_json::to_value(c.validate(dec!(50), Utc::now())).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "valid": false,
                "reason": "min_subtotal",
                "type": "fixed_amount",
                "amount": 25.0,
                "minSubtotal": 100.0
            })
        );

        let json = serde_json::to_value(CouponValidation::not_found()).unwrap();
        assert_eq!(json, serde_json::json!({"valid": false, "reason": "not_found"}));
    }

    #[test]
    fn test_validation_parses_numeric_fields() {
        let parsed: CouponValidation =
            serde_json::from_str(r#"{"valid":true,"type":"percent","percent":10}"#).unwrap();
        assert_eq!(
            parsed.effect(),
            Some(CouponEffect::Percent { percent: dec!(10) })
        );
    }
}
