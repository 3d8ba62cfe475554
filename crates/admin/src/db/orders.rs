//! Order reads and status transitions.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::instrument;
use vitrine_core::{
    CheckoutTotals, CouponCode, CustomerDetails, CustomerId, Email, Order, OrderId, OrderLine,
    OrderStatus, PaymentMethod, ProductId,
};

use super::RepositoryError;
use crate::models::OrderSummary;

#[derive(sqlx::FromRow)]
struct OrderSummaryRow {
    id: OrderId,
    customer_name: String,
    customer_email: String,
    payment_method: PaymentMethod,
    coupon_code: Option<String>,
    total: Decimal,
    status: OrderStatus,
    created_at: DateTime<Utc>,
}

impl From<OrderSummaryRow> for OrderSummary {
    fn from(row: OrderSummaryRow) -> Self {
        Self {
            id: row.id,
            customer_name: row.customer_name,
            customer_email: row.customer_email,
            payment_method: row.payment_method,
            coupon_code: row.coupon_code,
            total: row.total,
            status: row.status,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    customer_id: Option<CustomerId>,
    customer_name: String,
    customer_email: String,
    customer_phone: String,
    shipping_address: String,
    payment_method: PaymentMethod,
    coupon_code: Option<String>,
    subtotal: Decimal,
    shipping_fee: Decimal,
    discount_amount: Decimal,
    payment_method_discount: Decimal,
    total: Decimal,
    status: OrderStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct OrderItemRow {
    product_id: ProductId,
    product_name: String,
    unit_price: Decimal,
    quantity: i32,
}

#[derive(sqlx::FromRow)]
struct StatusRow {
    status: OrderStatus,
    coupon_code: Option<String>,
}

fn corrupt(order: OrderId, what: &str, detail: impl std::fmt::Display) -> RepositoryError {
    RepositoryError::DataCorruption(format!("invalid {what} on order {order}: {detail}"))
}

impl OrderRow {
    fn into_order(self, items: Vec<OrderItemRow>) -> Result<Order, RepositoryError> {
        let id = self.id;
        let email = Email::parse(&self.customer_email).map_err(|e| corrupt(id, "email", e))?;
        let coupon_code = self
            .coupon_code
            .as_deref()
            .map(CouponCode::parse)
            .transpose()
            .map_err(|e| corrupt(id, "coupon code", e))?;

        let mut lines = Vec::with_capacity(items.len());
        for item in items {
            let quantity =
                u32::try_from(item.quantity).map_err(|e| corrupt(id, "quantity", e))?;
            lines.push(OrderLine {
                product_id: item.product_id,
                product_name: item.product_name,
                unit_price: item.unit_price,
                quantity,
            });
        }

        Ok(Order {
            id,
            customer_id: self.customer_id,
            customer: CustomerDetails {
                name: self.customer_name,
                email,
                phone: self.customer_phone,
                address: self.shipping_address,
            },
            items: lines,
            payment_method: self.payment_method,
            coupon_code,
            totals: CheckoutTotals {
                subtotal: self.subtotal,
                shipping_fee: self.shipping_fee,
                discount_amount: self.discount_amount,
                payment_method_discount: self.payment_method_discount,
                total: self.total,
            },
            status: self.status,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Repository for order administration.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List orders, newest first, optionally filtered by status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn list(
        &self,
        status: Option<OrderStatus>,
        limit: i64,
    ) -> Result<Vec<OrderSummary>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderSummaryRow>(
            r"
            SELECT id, customer_name, customer_email, payment_method, coupon_code,
                   total, status, created_at
            FROM shop.orders
            WHERE ($1::shop.order_status IS NULL OR status = $1)
            ORDER BY created_at DESC, id DESC
            LIMIT $2
            ",
        )
        .bind(status)
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(OrderSummary::from).collect())
    }

    /// Get an order with its items.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored value is invalid.
    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(
            r"
            SELECT id, customer_id, customer_name, customer_email, customer_phone,
                   shipping_address, payment_method, coupon_code, subtotal, shipping_fee,
                   discount_amount, payment_method_discount, total, status, created_at, updated_at
            FROM shop.orders
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let items = sqlx::query_as::<_, OrderItemRow>(
            r"
            SELECT product_id, product_name, unit_price, quantity
            FROM shop.order_items
            WHERE order_id = $1
            ORDER BY id
            ",
        )
        .bind(id)
        .fetch_all(self.pool)
        .await?;

        row.into_order(items).map(Some)
    }

    /// Move an order to `to`.
    ///
    /// The update only applies while the order still has the status that was
    /// read, so two concurrent transitions cannot both succeed. Confirming an
    /// order increments its coupon's usage count in the same transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` for an unknown order,
    /// `RepositoryError::Conflict` when the lifecycle forbids the move or the
    /// status changed concurrently, and `RepositoryError::Database` on failure.
    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn transition(&self, id: OrderId, to: OrderStatus) -> Result<Order, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_as::<_, StatusRow>(
            "SELECT status, coupon_code FROM shop.orders WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        current
            .status
            .transition_to(to)
            .map_err(|e| RepositoryError::Conflict(e.to_string()))?;

        let updated = sqlx::query(
            r"
            UPDATE shop.orders
            SET status = $3, updated_at = NOW()
            WHERE id = $1 AND status = $2
            ",
        )
        .bind(id)
        .bind(current.status)
        .bind(to)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(RepositoryError::Conflict(format!(
                "order {id} is no longer {}",
                current.status
            )));
        }

        if to == OrderStatus::Confirmed
            && let Some(code) = current.coupon_code.as_deref()
        {
            sqlx::query(
                r"
                UPDATE shop.coupons
                SET usage_count = usage_count + 1, updated_at = NOW()
                WHERE code = $1
                ",
            )
            .bind(code)
            .execute(&mut *tx)
            .await?;
            tracing::info!(coupon = code, "Coupon usage recorded");
        }

        tx.commit().await?;
        tracing::info!(from = %current.status, "Order status changed");

        self.get(id).await?.ok_or(RepositoryError::NotFound)
    }
}
