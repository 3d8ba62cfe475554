//! Money helpers.
//!
//! Amounts are plain [`Decimal`] values in BRL. Every derived amount
//! (discounts, shipping, totals) is rounded to centavos with
//! [`round_money`] as soon as it is computed.

use rust_decimal::{Decimal, RoundingStrategy};

/// Number of decimal places kept for BRL amounts.
pub const MONEY_SCALE: u32 = 2;

/// Round an amount to centavos, half away from zero.
#[must_use]
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Format an amount the way Brazilian receipts show it (`R$ 1.234,56`).
#[must_use]
pub fn format_brl(amount: Decimal) -> String {
    let rounded = round_money(amount);
    let digits = format!("{:.2}", rounded.abs());
    let (int_part, frac_part) = digits.split_once('.').unwrap_or((&digits, "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    format!("{sign}R$ {grouped},{frac_part}")
}
