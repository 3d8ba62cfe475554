//! Order persistence.
//!
//! An order and its items are written in one transaction. Submissions that
//! carry an idempotency key insert with `ON CONFLICT DO NOTHING`, so a
//! concurrent or repeated submission resolves to the order that won.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;
use vitrine_core::{
    CheckoutTotals, CouponCode, CustomerDetails, CustomerId, Email, Order, OrderId, OrderLine,
    OrderStatus, PaymentMethod, ProductId,
};

use super::RepositoryError;

/// An order ready to be stored.
#[derive(Debug)]
pub struct NewOrder<'a> {
    pub customer_id: Option<CustomerId>,
    pub customer: &'a CustomerDetails,
    pub payment_method: PaymentMethod,
    pub coupon_code: Option<&'a CouponCode>,
    pub totals: CheckoutTotals,
    pub lines: &'a [OrderLine],
    pub idempotency_key: Option<Uuid>,
}

/// Result of storing an order.
#[derive(Debug)]
pub enum SubmitOutcome {
    /// A new order was stored.
    Created(Order),
    /// An order with the same idempotency key already existed.
    Replayed(Order),
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

const ORDER_COLUMNS: &str = r"
    id, customer_id, customer_name, customer_email, customer_phone,
    shipping_address, payment_method, coupon_code, subtotal, shipping_fee,
    discount_amount, payment_method_discount, total, status, created_at, updated_at
";

fn into_order(row: OrderRow, items: Vec<OrderItemRow>) -> Result<Order, RepositoryError> {
    let email = Email::parse(&row.customer_email).map_err(|e| {
        RepositoryError::DataCorruption(format!("invalid email on order {}: {e}", row.id))
    })?;
    let coupon_code = row
        .coupon_code
        .as_deref()
        .map(CouponCode::parse)
        .transpose()
        .map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid coupon code on order {}: {e}", row.id))
        })?;
    let items = items
        .into_iter()
        .map(|item| {
            let quantity = u32::try_from(item.quantity).map_err(|_| {
                RepositoryError::DataCorruption(format!(
                    "negative quantity on order {}: {}",
                    row.id, item.quantity
                ))
            })?;
            Ok(OrderLine {
                product_id: item.product_id,
                product_name: item.product_name,
                unit_price: item.unit_price,
                quantity,
            })
        })
        .collect::<Result<Vec<_>, RepositoryError>>()?;

    Ok(Order {
        id: row.id,
        customer_id: row.customer_id,
        customer: CustomerDetails {
            name: row.customer_name,
            email,
            phone: row.customer_phone,
            address: row.shipping_address,
        },
        items,
        payment_method: row.payment_method,
        coupon_code,
        totals: CheckoutTotals {
            subtotal: row.subtotal,
            shipping_fee: row.shipping_fee,
            discount_amount: row.discount_amount,
            payment_method_discount: row.payment_method_discount,
            total: row.total,
        },
        status: row.status,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

/// Repository for order writes and reads.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Store an order and its items.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a statement fails; nothing is
    /// stored in that case.
    #[instrument(skip(self, order), fields(total = %order.totals.total, items = order.lines.len()))]
    pub async fn create(&self, order: &NewOrder<'_>) -> Result<SubmitOutcome, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query_scalar::<_, OrderId>(
            r"
            INSERT INTO shop.orders (
                customer_id, customer_name, customer_email, customer_phone,
                shipping_address, payment_method, coupon_code, subtotal,
                shipping_fee, discount_amount, payment_method_discount, total,
                idempotency_key
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            ON CONFLICT (idempotency_key) DO NOTHING
            RETURNING id
            ",
        )
        .bind(order.customer_id)
        .bind(&order.customer.name)
        .bind(order.customer.email.as_str())
        .bind(&order.customer.phone)
        .bind(&order.customer.address)
        .bind(order.payment_method)
        .bind(order.coupon_code.map(CouponCode::as_str))
        .bind(order.totals.subtotal)
        .bind(order.totals.shipping_fee)
        .bind(order.totals.discount_amount)
        .bind(order.totals.payment_method_discount)
        .bind(order.totals.total)
        .bind(order.idempotency_key)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(id) = inserted else {
            tx.rollback().await?;
            let key = order.idempotency_key.ok_or_else(|| {
                RepositoryError::Conflict("order insert returned no row".to_string())
            })?;
            let existing = self
                .find_by_idempotency_key(key)
                .await?
                .ok_or(RepositoryError::NotFound)?;
            tracing::info!(order_id = %existing.id, "Idempotent order replay");
            return Ok(SubmitOutcome::Replayed(existing));
        };

        for line in order.lines {
            let quantity = i32::try_from(line.quantity).map_err(|_| {
                RepositoryError::Conflict(format!("quantity {} out of range", line.quantity))
            })?;
            sqlx::query(
                r"
                INSERT INTO shop.order_items (order_id, product_id, product_name, unit_price, quantity)
                VALUES ($1, $2, $3, $4, $5)
                ",
            )
            .bind(id)
            .bind(line.product_id)
            .bind(&line.product_name)
            .bind(line.unit_price)
            .bind(quantity)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        tracing::info!(order_id = %id, "Order created");

        let created = self.get(id).await?.ok_or(RepositoryError::NotFound)?;
        Ok(SubmitOutcome::Created(created))
    }

    /// Get an order with its items.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored value is invalid.
    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM shop.orders WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        match row {
            Some(row) => self.with_items(row).await.map(Some),
            None => Ok(None),
        }
    }

    /// Find the order stored under an idempotency key.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored value is invalid.
    #[instrument(skip(self))]
    pub async fn find_by_idempotency_key(&self, key: Uuid) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM shop.orders WHERE idempotency_key = $1"
        ))
        .bind(key)
        .fetch_optional(self.pool)
        .await?;

        match row {
            Some(row) => self.with_items(row).await.map(Some),
            None => Ok(None),
        }
    }

    async fn with_items(&self, row: OrderRow) -> Result<Order, RepositoryError> {
        let items = sqlx::query_as::<_, OrderItemRow>(
            r"
            SELECT product_id, product_name, unit_price, quantity
            FROM shop.order_items
            WHERE order_id = $1
            ORDER BY id
            ",
        )
        .bind(row.id)
        .fetch_all(self.pool)
        .await?;

        into_order(row, items)
    }
}
