//! Session-scoped shopping cart.
//!
//! A [`Cart`] is a plain value. Whoever owns the session decides where it
//! lives (a tower-sessions record on the server, a JSON file for the client)
//! and loads/saves it explicitly around each mutation.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{ProductId, round_money};

/// Errors returned by cart mutations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CartError {
    #[error("quantity must be at least 1")]
    ZeroQuantity,
    #[error("quantity must be at most {max}")]
    QuantityTooLarge { max: u32 },
    #[error("unit price cannot be negative")]
    NegativePrice,
    #[error("product {0} is not in the cart")]
    NotInCart(ProductId),
}

/// One product in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: ProductId,
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub unit_price: Decimal,
    pub quantity: u32,
}

impl CartLine {
    /// `unit_price × quantity`, rounded to centavos.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        round_money(self.unit_price * Decimal::from(self.quantity))
    }
}

/// The active cart of a session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    /// Upper bound on the quantity of a single line.
    pub const MAX_LINE_QUANTITY: u32 = 999;

    #[must_use]
    pub const fn new() -> Self {
        Self { lines: Vec::new() }
    }

    /// Build a cart from already-priced lines (e.g. an order request).
    ///
    /// Lines for the same product are merged.
    ///
    /// # Errors
    ///
    /// Returns [`CartError`] if any line is invalid.
    pub fn from_lines(lines: impl IntoIterator<Item = CartLine>) -> Result<Self, CartError> {
        let mut cart = Self::new();
        for line in lines {
            cart.add(line.product_id, line.unit_price, line.quantity)?;
        }
        Ok(cart)
    }

    /// Add `quantity` units of a product.
    ///
    /// If the product is already in the cart the quantities are summed and the
    /// unit price is refreshed to `unit_price`.
    ///
    /// # Errors
    ///
    /// Returns [`CartError`] for a zero quantity, a negative price, or when the
    /// merged quantity would exceed [`Self::MAX_LINE_QUANTITY`].
    pub fn add(
        &mut self,
        product_id: ProductId,
        unit_price: Decimal,
        quantity: u32,
    ) -> Result<(), CartError> {
        if quantity == 0 {
            return Err(CartError::ZeroQuantity);
        }
        if unit_price < Decimal::ZERO {
            return Err(CartError::NegativePrice);
        }

        let existing = self
            .lines
            .iter()
            .position(|line| line.product_id == product_id);
        let merged = existing
            .and_then(|idx| self.lines.get(idx))
            .map_or(quantity, |line| line.quantity.saturating_add(quantity));
        if merged > Self::MAX_LINE_QUANTITY {
            return Err(CartError::QuantityTooLarge {
                max: Self::MAX_LINE_QUANTITY,
            });
        }

        match existing.and_then(|idx| self.lines.get_mut(idx)) {
            Some(line) => {
                line.quantity = merged;
                line.unit_price = unit_price;
            }
            None => self.lines.push(CartLine {
                product_id,
                unit_price,
                quantity,
            }),
        }
        Ok(())
    }

    /// Replace the quantity of a line. A quantity of zero removes it.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::NotInCart`] if the product has no line, or
    /// [`CartError::QuantityTooLarge`].
    pub fn set_quantity(&mut self, product_id: ProductId, quantity: u32) -> Result<(), CartError> {
        if quantity > Self::MAX_LINE_QUANTITY {
            return Err(CartError::QuantityTooLarge {
                max: Self::MAX_LINE_QUANTITY,
            });
        }
        if quantity == 0 {
            return if self.remove(product_id) {
                Ok(())
            } else {
                Err(CartError::NotInCart(product_id))
            };
        }

        let line = self
            .lines
            .iter_mut()
            .find(|line| line.product_id == product_id)
            .ok_or(CartError::NotInCart(product_id))?;
        line.quantity = quantity;
        Ok(())
    }

    /// Remove a product. Returns whether a line was removed.
    pub fn remove(&mut self, product_id: ProductId) -> bool {
        let before = self.lines.len();
        self.lines.retain(|line| line.product_id != product_id);
        self.lines.len() != before
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.lines
            .iter()
            .fold(0u32, |acc, line| acc.saturating_add(line.quantity))
    }

    /// Sum of line totals.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.lines.iter().map(CartLine::line_total).sum()
    }
}
