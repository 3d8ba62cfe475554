//! Checkout: pricing lines, applying coupons and storing orders.
//!
//! Prices always come from the catalog, never from the client or the session
//! cart. The client's `discount_amount` is compared against the server value
//! and only logged when it differs.

use std::collections::HashMap;

use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::PgPool;
use thiserror::Error;
use tracing::instrument;
use uuid::Uuid;
use vitrine_core::{
    Cart, CartError, CheckoutRejection, CheckoutTotals, CouponCode, CouponEffect,
    CouponValidation, OrderItemRequest, OrderLine, OrderRequest, OrderRequestError,
    PaymentMethod, ProductId, RejectionReason, compute_totals,
};

use crate::db::{CouponRepository, NewOrder, OrderRepository, RepositoryError, SubmitOutcome};
use crate::models::Product;
use crate::state::AppState;

/// Errors from the checkout service.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error(transparent)]
    Rejected(#[from] CheckoutRejection),
    #[error(transparent)]
    Cart(#[from] CartError),
    #[error(transparent)]
    Request(#[from] OrderRequestError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Priced lines and their totals.
#[derive(Debug, Clone)]
pub struct Quote {
    pub lines: Vec<OrderLine>,
    pub totals: CheckoutTotals,
}

/// Turn requested items into priced order lines.
///
/// Duplicate products are merged. Every product must exist and be active.
///
/// # Errors
///
/// Returns [`CheckoutRejection::EmptyCart`] for no items,
/// [`CheckoutRejection::ProductUnavailable`] for unknown or inactive products,
/// or a [`CartError`] for an invalid quantity.
pub fn build_lines(
    requested: &[OrderItemRequest],
    products: &HashMap<ProductId, Product>,
) -> Result<Vec<OrderLine>, CheckoutError> {
    if requested.is_empty() {
        return Err(CheckoutRejection::EmptyCart.into());
    }

    let mut cart = Cart::new();
    for item in requested {
        let product = products
            .get(&item.product_id)
            .filter(|product| product.active)
            .ok_or(CheckoutRejection::ProductUnavailable(item.product_id))?;
        cart.add(product.id, product.price, item.quantity)?;
    }

    let mut lines = Vec::with_capacity(cart.lines().len());
    for line in cart.lines() {
        let product = products
            .get(&line.product_id)
            .ok_or(CheckoutRejection::ProductUnavailable(line.product_id))?;
        lines.push(OrderLine {
            product_id: line.product_id,
            product_name: product.name.clone(),
            unit_price: line.unit_price,
            quantity: line.quantity,
        });
    }
    Ok(lines)
}

/// The effect of an accepted coupon.
///
/// # Errors
///
/// Returns the rejection reason when the coupon was not accepted.
pub fn accepted_effect(validation: &CouponValidation) -> Result<CouponEffect, CheckoutRejection> {
    validation.effect().ok_or_else(|| {
        CheckoutRejection::Coupon(validation.reason.unwrap_or(RejectionReason::NotFound))
    })
}

/// Items of the session cart as order items.
#[must_use]
pub fn cart_items(cart: &Cart) -> Vec<OrderItemRequest> {
    cart.lines()
        .iter()
        .map(|line| OrderItemRequest {
            product_id: line.product_id,
            quantity: line.quantity,
        })
        .collect()
}

/// Validate a coupon against a subtotal. Has no side effects.
///
/// # Errors
///
/// Returns `RepositoryError` if the lookup fails.
#[instrument(skip(pool), fields(code = %code))]
pub async fn validate_coupon(
    pool: &PgPool,
    code: &CouponCode,
    subtotal: Decimal,
) -> Result<CouponValidation, RepositoryError> {
    let coupon = CouponRepository::new(pool).find_by_code(code).await?;
    let validation = coupon.map_or_else(CouponValidation::not_found, |coupon| {
        coupon.validate(subtotal, Utc::now())
    });

    tracing::debug!(valid = validation.valid, reason = ?validation.reason, "Coupon validated");
    Ok(validation)
}

/// Price `requested` and compute the totals.
///
/// # Errors
///
/// Returns `CheckoutError` if the items are empty or unavailable, the coupon
/// is rejected, or a lookup fails.
#[instrument(skip(state, requested), fields(items = requested.len()))]
pub async fn quote(
    state: &AppState,
    requested: &[OrderItemRequest],
    payment_method: PaymentMethod,
    coupon_code: Option<&CouponCode>,
) -> Result<Quote, CheckoutError> {
    if requested.is_empty() {
        return Err(CheckoutRejection::EmptyCart.into());
    }

    let ids: Vec<ProductId> = requested.iter().map(|item| item.product_id).collect();
    let products = state.catalog().get_many(state.pool(), &ids).await?;
    let lines = build_lines(requested, &products)?;
    let subtotal: Decimal = lines.iter().map(OrderLine::line_total).sum();

    let effect = match coupon_code {
        Some(code) => {
            let validation = validate_coupon(state.pool(), code, subtotal).await?;
            Some(accepted_effect(&validation)?)
        }
        None => None,
    };

    let totals = compute_totals(
        subtotal,
        payment_method,
        effect.as_ref(),
        &state.config().pricing,
    );
    Ok(Quote { lines, totals })
}

/// Submit an order.
///
/// Items come from `request.items` when present, otherwise from
/// `session_cart`. A request carrying an idempotency key that was already
/// used returns the stored order instead of creating another one.
///
/// # Errors
///
/// Returns `CheckoutError` for invalid requests, an empty cart, unavailable
/// products, a rejected coupon, or a database failure.
#[instrument(
    skip(state, request, session_cart),
    fields(payment_method = %request.payment_method)
)]
pub async fn submit(
    state: &AppState,
    request: &OrderRequest,
    session_cart: &Cart,
    idempotency_key: Option<Uuid>,
) -> Result<SubmitOutcome, CheckoutError> {
    let (customer, coupon_code) = request.validate()?;
    let requested = request
        .items
        .clone()
        .unwrap_or_else(|| cart_items(session_cart));

    // Without a key there is nothing to replay, so an empty cart is
    // rejected before any query.
    if requested.is_empty() && idempotency_key.is_none() {
        return Err(CheckoutRejection::EmptyCart.into());
    }

    let orders = OrderRepository::new(state.pool());
    if let Some(key) = idempotency_key
        && let Some(existing) = orders.find_by_idempotency_key(key).await?
    {
        tracing::info!(order_id = %existing.id, "Returning previously submitted order");
        return Ok(SubmitOutcome::Replayed(existing));
    }

    let priced = quote(
        state,
        &requested,
        request.payment_method,
        coupon_code.as_ref(),
    )
    .await?;

    if request.discount_amount != priced.totals.discount_amount {
        tracing::warn!(
            client_discount = %request.discount_amount,
            server_discount = %priced.totals.discount_amount,
            "Client discount differs from server computation; storing server value"
        );
    }

    let new_order = NewOrder {
        customer_id: request.user_id,
        customer: &customer,
        payment_method: request.payment_method,
        coupon_code: coupon_code.as_ref(),
        totals: priced.totals,
        lines: &priced.lines,
        idempotency_key,
    };
    Ok(orders.create(&new_order).await?)
}
