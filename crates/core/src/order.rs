//! Order submission wire types.
//!
//! The request body keeps the field names the storefront has always accepted
//! (`metodoPagamento`, `nome`, `telefone`, `endereco`); the Rust side uses
//! English names throughout.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::coupon::{CouponCode, CouponCodeError, RejectionReason};
use crate::pricing::CheckoutTotals;
use crate::types::{
    CustomerId, Email, EmailError, OrderId, OrderStatus, PaymentMethod, ProductId, round_money,
};

const MAX_NAME_LENGTH: usize = 200;
const MAX_PHONE_LENGTH: usize = 32;
const MAX_ADDRESS_LENGTH: usize = 500;

/// Errors found while checking an [`OrderRequest`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OrderRequestError {
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("{field} must be at most {max} characters")]
    FieldTooLong { field: &'static str, max: usize },
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),
    #[error("invalid coupon code: {0}")]
    InvalidCouponCode(#[from] CouponCodeError),
    #[error("discount_amount cannot be negative")]
    NegativeDiscount,
    #[error("item quantity must be at least 1")]
    ZeroQuantity,
}

/// A business rule that blocks checkout. Serialized as its `reason` code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CheckoutRejection {
    #[error("cart is empty")]
    EmptyCart,
    #[error("coupon rejected: {0}")]
    Coupon(RejectionReason),
    #[error("product {0} is not available")]
    ProductUnavailable(ProductId),
}

impl CheckoutRejection {
    /// Machine-readable reason code.
    #[must_use]
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::EmptyCart => "empty_cart",
            Self::Coupon(reason) => reason.as_str(),
            Self::ProductUnavailable(_) => "product_unavailable",
        }
    }
}

/// Contact details captured at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerDetails {
    pub name: String,
    pub email: Email,
    pub phone: String,
    pub address: String,
}

/// One requested line when the order does not come from the session cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItemRequest {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Body of `POST /api/orders`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRequest {
    #[serde(rename = "metodoPagamento")]
    pub payment_method: PaymentMethod,
    #[serde(rename = "nome")]
    pub name: String,
    pub email: String,
    #[serde(rename = "telefone")]
    pub phone: String,
    #[serde(rename = "endereco")]
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<CustomerId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coupon_code: Option<String>,
    /// Discount the client computed. Advisory only.
    #[serde(default, serialize_with = "rust_decimal::serde::float::serialize")]
    pub discount_amount: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<OrderItemRequest>>,
}

impl OrderRequest {
    /// Validate and normalize the customer fields.
    ///
    /// # Errors
    ///
    /// Returns [`OrderRequestError`] for a blank or oversized field or an
    /// invalid email address.
    pub fn customer(&self) -> Result<CustomerDetails, OrderRequestError> {
        Ok(CustomerDetails {
            name: required("nome", &self.name, MAX_NAME_LENGTH)?,
            email: Email::parse(&self.email)?,
            phone: required("telefone", &self.phone, MAX_PHONE_LENGTH)?,
            address: required("endereco", &self.address, MAX_ADDRESS_LENGTH)?,
        })
    }

    /// The coupon code, if one was sent. A blank code counts as none.
    ///
    /// # Errors
    ///
    /// Returns [`OrderRequestError::InvalidCouponCode`] for a malformed code.
    pub fn coupon_code(&self) -> Result<Option<CouponCode>, OrderRequestError> {
        match self.coupon_code.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(code) => Ok(Some(CouponCode::parse(code)?)),
        }
    }

    /// Check everything that does not need the database.
    ///
    /// # Errors
    ///
    /// Returns the first [`OrderRequestError`] found.
    pub fn validate(&self) -> Result<(CustomerDetails, Option<CouponCode>), OrderRequestError> {
        if self.discount_amount < Decimal::ZERO {
            return Err(OrderRequestError::NegativeDiscount);
        }
        if self
            .items
            .as_ref()
            .is_some_and(|items| items.iter().any(|item| item.quantity == 0))
        {
            return Err(OrderRequestError::ZeroQuantity);
        }
        Ok((self.customer()?, self.coupon_code()?))
    }
}

fn required(field: &'static str, value: &str, max: usize) -> Result<String, OrderRequestError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(OrderRequestError::MissingField(field));
    }
    if value.chars().count() > max {
        return Err(OrderRequestError::FieldTooLong { field, max });
    }
    Ok(value.to_string())
}

/// A priced line of a stored order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub product_id: ProductId,
    pub product_name: String,
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub unit_price: Decimal,
    pub quantity: u32,
}

impl OrderLine {
    /// `unit_price × quantity`, rounded to centavos.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        round_money(self.unit_price * Decimal::from(self.quantity))
    }
}

/// A stored order as returned by the storefront and admin APIs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub customer_id: Option<CustomerId>,
    pub customer: CustomerDetails,
    pub items: Vec<OrderLine>,
    pub payment_method: PaymentMethod,
    pub coupon_code: Option<CouponCode>,
    #[serde(flatten)]
    pub totals: CheckoutTotals,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Whether the stored amounts satisfy
    /// `total = subtotal + shipping - discount - payment discount`.
    #[must_use]
    pub fn totals_consistent(&self) -> bool {
        let t = &self.totals;
        t.total >= Decimal::ZERO
            && t.total
                == t.subtotal + t.shipping_fee - t.discount_amount - t.payment_method_discount
    }
}
