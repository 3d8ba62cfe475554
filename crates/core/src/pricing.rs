//! Checkout pricing: shipping, coupon discount, Pix discount and total.
//!
//! [`compute_totals`] is the single place where a payable total is derived.
//! The storefront uses it to price orders and quotes; clients use it to show
//! totals before submitting.
//!
//! # Rules
//!
//! 1. Shipping is free when the subtotal is strictly above the free shipping
//!    threshold, otherwise the base price applies.
//! 2. A valid coupon applies one effect: percent of the subtotal, a fixed
//!    amount capped at the subtotal, or free shipping.
//! 3. Pix payments get `pix_discount_percent` of the subtotal off. This
//!    stacks with the coupon.
//! 4. The total never goes below zero.
//!
//! The returned [`CheckoutTotals`] always satisfy
//! `total = subtotal + shipping_fee - discount_amount - payment_method_discount`.
//! If the Pix discount would push the total below zero it is reduced to
//! exactly what remains payable.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::coupon::CouponEffect;
use crate::types::{PaymentMethod, round_money};

/// Environment key for the shipping base price.
pub const SHIPPING_BASE_PRICE_VAR: &str = "CHECKOUT_SHIPPING_BASE_PRICE";
/// Environment key for the free shipping threshold.
pub const FREE_SHIPPING_THRESHOLD_VAR: &str = "CHECKOUT_FREE_SHIPPING_THRESHOLD";
/// Environment key for the Pix discount, in percent.
pub const PIX_DISCOUNT_PERCENT_VAR: &str = "CHECKOUT_PIX_DISCOUNT_PERCENT";

/// Pricing policy values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingConfig {
    /// Shipping fee charged at or below the threshold.
    pub shipping_base_price: Decimal,
    /// Subtotal above which shipping is free.
    pub free_shipping_threshold: Decimal,
    /// Pix discount in percent (5 means 5%).
    pub pix_discount_percent: Decimal,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            shipping_base_price: Decimal::from(15),
            free_shipping_threshold: Decimal::from(200),
            pix_discount_percent: Decimal::from(5),
        }
    }
}

impl PricingConfig {
    /// Read the pricing policy through `lookup` (usually `std::env::var`).
    ///
    /// Missing values use the defaults. Values that do not parse, are
    /// negative, or (for the Pix percentage) exceed 100 also fall back to the
    /// defaults and are logged.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            shipping_base_price: read_amount(
                &lookup,
                SHIPPING_BASE_PRICE_VAR,
                defaults.shipping_base_price,
                None,
            ),
            free_shipping_threshold: read_amount(
                &lookup,
                FREE_SHIPPING_THRESHOLD_VAR,
                defaults.free_shipping_threshold,
                None,
            ),
            pix_discount_percent: read_amount(
                &lookup,
                PIX_DISCOUNT_PERCENT_VAR,
                defaults.pix_discount_percent,
                Some(Decimal::ONE_HUNDRED),
            ),
        }
    }

    /// Shipping fee for `subtotal` before any coupon.
    #[must_use]
    pub fn shipping_fee(&self, subtotal: Decimal) -> Decimal {
        if subtotal > self.free_shipping_threshold {
            Decimal::ZERO
        } else {
            self.shipping_base_price
        }
    }

    /// Pix discount for `subtotal`.
    #[must_use]
    pub fn pix_discount(&self, subtotal: Decimal) -> Decimal {
        round_money(subtotal * self.pix_discount_percent / Decimal::ONE_HUNDRED)
    }
}

fn read_amount(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: Decimal,
    max: Option<Decimal>,
) -> Decimal {
    let Some(raw) = lookup(key) else {
        return default;
    };
    match raw.trim().parse::<Decimal>() {
        Ok(value) if value >= Decimal::ZERO && max.is_none_or(|max| value <= max) => value,
        Ok(value) => {
            tracing::warn!(%key, %value, %default, "pricing value out of range, using default");
            default
        }
        Err(e) => {
            tracing::warn!(%key, raw = %raw, error = %e, %default, "invalid pricing value, using default");
            default
        }
    }
}

/// Derived checkout amounts. Never stored on their own, only as part of an
/// order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutTotals {
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub subtotal: Decimal,
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub shipping_fee: Decimal,
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub discount_amount: Decimal,
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub payment_method_discount: Decimal,
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub total: Decimal,
}

/// Compute the payable totals for a subtotal.
///
/// `coupon` must already have been validated against `subtotal`; pass
/// `None` when there is no coupon or it was rejected. A negative subtotal is
/// treated as zero.
///
/// ```
/// use rust_decimal::Decimal;
/// use vitrine_core::{CouponEffect, PaymentMethod, PricingConfig, compute_totals};
///
/// let coupon = CouponEffect::Percent { percent: Decimal::from(10) };
/// let totals = compute_totals(
///     Decimal::from(100),
///     PaymentMethod::Card,
///     Some(&coupon),
///     &PricingConfig::default(),
/// );
/// assert_eq!(totals.discount_amount, Decimal::from(10));
/// assert_eq!(totals.shipping_fee, Decimal::from(15));
/// assert_eq!(totals.total, Decimal::from(105));
/// ```
#[must_use]
pub fn compute_totals(
    subtotal: Decimal,
    payment_method: PaymentMethod,
    coupon: Option<&CouponEffect>,
    config: &PricingConfig,
) -> CheckoutTotals {
    let subtotal = round_money(subtotal.max(Decimal::ZERO));
    let mut shipping_fee = config.shipping_fee(subtotal);

    let discount_amount = match coupon {
        None => Decimal::ZERO,
        Some(CouponEffect::Percent { percent }) => {
            let percent = (*percent).clamp(Decimal::ZERO, Decimal::ONE_HUNDRED);
            round_money(subtotal * percent / Decimal::ONE_HUNDRED)
        }
        Some(CouponEffect::FixedAmount { amount }) => {
            round_money((*amount).max(Decimal::ZERO).min(subtotal))
        }
        Some(CouponEffect::FreeShipping) => {
            shipping_fee = Decimal::ZERO;
            Decimal::ZERO
        }
    };

    let payable = subtotal + shipping_fee - discount_amount;
    let payment_method_discount = match payment_method {
        PaymentMethod::Pix => config.pix_discount(subtotal).min(payable),
        PaymentMethod::Card => Decimal::ZERO,
    };

    CheckoutTotals {
        subtotal,
        shipping_fee,
        discount_amount,
        payment_method_discount,
        total: (payable - payment_method_discount).max(Decimal::ZERO),
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    use super::*;

    fn defaults() -> PricingConfig {
        PricingConfig::default()
    }

    #[test]
    fn test_above_threshold_ships_free() {
        let totals = compute_totals(dec!(250), PaymentMethod::Card, None, &defaults());
        assert_eq!(totals.shipping_fee, Decimal::ZERO);
        assert_eq!(totals.total, dec!(250));
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let totals = compute_totals(dec!(200), PaymentMethod::Card, None, &defaults());
        assert_eq!(totals.shipping_fee, dec!(15));
        assert_eq!(totals.total, dec!(215));
    }

    #[test]
    fn test_percent_coupon_below_threshold() {
        let coupon = CouponEffect::Percent { percent: dec!(10) };
        let totals = compute_totals(dec!(100), PaymentMethod::Card, Some(&coupon), &defaults());
        assert_eq!(totals.discount_amount, dec!(10));
        assert_eq!(totals.shipping_fee, dec!(15));
        assert_eq!(totals.total, dec!(105));
    }

    #[test]
    fn test_fixed_coupon_capped_at_subtotal() {
        let coupon = CouponEffect::FixedAmount { amount: dec!(80) };
        let totals = compute_totals(dec!(50), PaymentMethod::Card, Some(&coupon), &defaults());
        assert_eq!(totals.discount_amount, dec!(50));
        assert_eq!(totals.total, totals.shipping_fee);

        let coupon = CouponEffect::FixedAmount { amount: dec!(50) };
        let totals = compute_totals(dec!(10), PaymentMethod::Card, Some(&coupon), &defaults());
        assert_eq!(totals.discount_amount, dec!(10));
        assert!(totals.total >= Decimal::ZERO);
    }

    #[test]
    fn test_free_shipping_coupon() {
        let coupon = CouponEffect::FreeShipping;
        let totals = compute_totals(dec!(30), PaymentMethod::Card, Some(&coupon), &defaults());
        assert_eq!(totals.shipping_fee, Decimal::ZERO);
        assert_eq!(totals.discount_amount, Decimal::ZERO);
        assert_eq!(totals.total, dec!(30));
    }

    #[test]
    fn test_pix_stacks_with_coupon() {
        let coupon = CouponEffect::Percent { percent: dec!(10) };
        let card = compute_totals(dec!(100), PaymentMethod::Card, Some(&coupon), &defaults());
        let pix = compute_totals(dec!(100), PaymentMethod::Pix, Some(&coupon), &defaults());
        assert_eq!(pix.payment_method_discount, dec!(5));
        assert_eq!(card.total - pix.total, dec!(5));
        assert_eq!(pix.total, dec!(100));
    }

    #[test]
    fn test_pix_discount_reduced_when_total_would_go_negative() {
        let coupon = CouponEffect::Percent { percent: dec!(100) };
        let totals = compute_totals(dec!(250), PaymentMethod::Pix, Some(&coupon), &defaults());
        assert_eq!(totals.discount_amount, dec!(250));
        assert_eq!(totals.payment_method_discount, Decimal::ZERO);
        assert_eq!(totals.total, Decimal::ZERO);
    }

    #[test]
    fn test_discounts_are_rounded_to_centavos() {
        let coupon = CouponEffect::Percent { percent: dec!(12.5) };
        let totals = compute_totals(dec!(99.99), PaymentMethod::Pix, Some(&coupon), &defaults());
        assert_eq!(totals.discount_amount, dec!(12.50));
        assert_eq!(totals.payment_method_discount, dec!(5.00));
        assert_eq!(totals.total, dec!(97.49));
    }

    #[test]
    fn test_negative_subtotal_treated_as_zero() {
        let totals = compute_totals(dec!(-10), PaymentMethod::Card, None, &defaults());
        assert_eq!(totals.subtotal, Decimal::ZERO);
        assert_eq!(totals.total, dec!(15));
    }

    #[test]
    fn test_config_from_lookup() {
        let config = PricingConfig::from_lookup(|key| match key {
            SHIPPING_BASE_PRICE_VAR => Some("19.90".to_string()),
            FREE_SHIPPING_THRESHOLD_VAR => Some("not-a-number".to_string()),
            PIX_DISCOUNT_PERCENT_VAR => Some("150".to_string()),
            _ => None,
        });
        assert_eq!(config.shipping_base_price, dec!(19.90));
        assert_eq!(config.free_shipping_threshold, dec!(200));
        assert_eq!(config.pix_discount_percent, dec!(5));

        let config = PricingConfig::from_lookup(|key| {
            (key == SHIPPING_BASE_PRICE_VAR).then(|| "-1".to_string())
        });
        assert_eq!(config, PricingConfig::default());
    }

    #[test]
    fn test_totals_wire_format() {
        let totals = compute_totals(dec!(100), PaymentMethod::Pix, None, &defaults());
        let json = serde_json::to_value(totals).unwrap_or_default();
        assert_eq!(
            json,
            serde_json::json!({
                "subtotal": 100.0,
                "shippingFee": 15.0,
                "discountAmount": 0.0,
                "paymentMethodDiscount": 5.0,
                "total": 110.0
            })
        );
    }

    fn money() -> impl Strategy<Value = Decimal> {
        (0i64..1_000_000).prop_map(|cents| Decimal::new(cents, 2))
    }

    fn coupon_strategy() -> impl Strategy<Value = Option<CouponEffect>> {
        prop_oneof![
            Just(None),
            (0i64..=10_000).prop_map(|p| Some(CouponEffect::Percent {
                percent: Decimal::new(p, 2)
            })),
            money().prop_map(|amount| Some(CouponEffect::FixedAmount { amount })),
            Just(Some(CouponEffect::FreeShipping)),
        ]
    }

    proptest! {
        #[test]
        fn totals_identity_holds(
            subtotal in money(),
            coupon in coupon_strategy(),
            pix in any::<bool>(),
        ) {
            let method = if pix { PaymentMethod::Pix } else { PaymentMethod::Card };
            let t = compute_totals(subtotal, method, coupon.as_ref(), &defaults());
            prop_assert!(t.total >= Decimal::ZERO);
            prop_assert!(t.discount_amount <= t.subtotal);
            prop_assert_eq!(
                t.total,
                t.subtotal + t.shipping_fee - t.discount_amount - t.payment_method_discount
            );
        }

        #[test]
        fn no_coupon_total_matches_formula(subtotal in money(), pix in any::<bool>()) {
            let method = if pix { PaymentMethod::Pix } else { PaymentMethod::Card };
            let config = defaults();
            let t = compute_totals(subtotal, method, None, &config);
            let expected_pix = if pix { config.pix_discount(subtotal) } else { Decimal::ZERO };
            prop_assert_eq!(t.payment_method_discount, expected_pix);
            prop_assert_eq!(t.total, subtotal + config.shipping_fee(subtotal) - expected_pix);
        }

        #[test]
        fn pix_reduces_total_by_its_discount(subtotal in money(), coupon in coupon_strategy()) {
            let config = defaults();
            let card = compute_totals(subtotal, PaymentMethod::Card, coupon.as_ref(), &config);
            let pix = compute_totals(subtotal, PaymentMethod::Pix, coupon.as_ref(), &config);
            if card.total >= config.pix_discount(subtotal) {
                prop_assert_eq!(card.total - pix.total, config.pix_discount(subtotal));
            } else {
                prop_assert_eq!(pix.total, Decimal::ZERO);
            }
        }
    }
}
