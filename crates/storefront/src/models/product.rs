//! Catalog product.

use rust_decimal::Decimal;
use serde::Serialize;
use vitrine_core::ProductId;

/// A catalog product. Its `price` is the unit price used at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: Option<String>,
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub price: Decimal,
    pub active: bool,
}
