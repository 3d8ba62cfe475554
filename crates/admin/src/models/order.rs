//! Order listing and status change types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use vitrine_core::{OrderId, OrderStatus, PaymentMethod};

/// Default page size for order listings.
pub const DEFAULT_ORDER_LIMIT: i64 = 50;
/// Largest page size accepted from the query string.
pub const MAX_ORDER_LIMIT: i64 = 200;

/// One row of the order listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummary {
    pub id: OrderId,
    pub customer_name: String,
    pub customer_email: String,
    pub payment_method: PaymentMethod,
    pub coupon_code: Option<String>,
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub total: Decimal,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

/// Query string of `GET /api/orders`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderListQuery {
    pub status: Option<OrderStatus>,
    pub limit: Option<i64>,
}

impl OrderListQuery {
    /// Page size clamped to `1..=MAX_ORDER_LIMIT`.
    #[must_use]
    pub fn limit(&self) -> i64 {
        self.limit
            .unwrap_or(DEFAULT_ORDER_LIMIT)
            .clamp(1, MAX_ORDER_LIMIT)
    }
}

/// Body of `POST /api/orders/{id}/status`.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct StatusUpdate {
    pub status: OrderStatus,
}
