//! Cart route handlers.
//!
//! The cart lives in the session. Every handler loads it, mutates the value
//! and saves it back before responding.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;
use vitrine_core::{Cart, CartLine, CheckoutTotals, CouponCode, PaymentMethod, ProductId};

use crate::error::{AppError, Result};
use crate::models::session::{load_cart, save_cart};
use crate::services::checkout;
use crate::state::AppState;

/// Cart as returned to the browser.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub lines: Vec<CartLine>,
    pub item_count: u32,
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub subtotal: Decimal,
}

impl From<&Cart> for CartView {
    fn from(cart: &Cart) -> Self {
        Self {
            lines: cart.lines().to_vec(),
            item_count: cart.item_count(),
            subtotal: cart.subtotal(),
        }
    }
}

/// Body of `POST /api/cart/items`.
#[derive(Debug, Deserialize)]
pub struct AddItemForm {
    pub product_id: ProductId,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

const fn default_quantity() -> u32 {
    1
}

/// Body of `PUT /api/cart/items/{product_id}`.
#[derive(Debug, Deserialize)]
pub struct UpdateItemForm {
    pub quantity: u32,
}

/// Body of `POST /api/cart/totals`.
#[derive(Debug, Deserialize)]
pub struct TotalsForm {
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub coupon_code: Option<String>,
}

/// Show the session cart.
#[instrument(skip(session))]
pub async fn show(session: Session) -> Result<Json<CartView>> {
    let cart = load_cart(&session).await?;
    Ok(Json(CartView::from(&cart)))
}

/// Add a product to the cart at its catalog price.
#[instrument(skip(state, session, form), fields(product_id = %form.product_id, quantity = form.quantity))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    Json(form): Json<AddItemForm>,
) -> Result<Json<CartView>> {
    let product = state
        .catalog()
        .get(state.pool(), form.product_id)
        .await?
        .filter(|product| product.active)
        .ok_or_else(|| AppError::NotFound(format!("product {}", form.product_id)))?;

    let mut cart = load_cart(&session).await?;
    cart.add(product.id, product.price, form.quantity)?;
    save_cart(&session, &cart).await?;

    tracing::debug!(item_count = cart.item_count(), "Item added to cart");
    Ok(Json(CartView::from(&cart)))
}

/// Set the quantity of a cart line. Zero removes it.
#[instrument(skip(session, form), fields(product_id = %product_id, quantity = form.quantity))]
pub async fn update(
    session: Session,
    Path(product_id): Path<ProductId>,
    Json(form): Json<UpdateItemForm>,
) -> Result<Json<CartView>> {
    let mut cart = load_cart(&session).await?;
    cart.set_quantity(product_id, form.quantity)?;
    save_cart(&session, &cart).await?;
    Ok(Json(CartView::from(&cart)))
}

/// Remove a product from the cart.
#[instrument(skip(session), fields(product_id = %product_id))]
pub async fn remove(
    session: Session,
    Path(product_id): Path<ProductId>,
) -> Result<Json<CartView>> {
    let mut cart = load_cart(&session).await?;
    if !cart.remove(product_id) {
        return Err(AppError::NotFound(format!(
            "product {product_id} is not in the cart"
        )));
    }
    save_cart(&session, &cart).await?;
    Ok(Json(CartView::from(&cart)))
}

/// Empty the cart.
#[instrument(skip(session))]
pub async fn clear(session: Session) -> Result<StatusCode> {
    save_cart(&session, &Cart::new()).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Quote the session cart with current catalog prices.
#[instrument(skip(state, session, form), fields(payment_method = %form.payment_method))]
pub async fn totals(
    State(state): State<AppState>,
    session: Session,
    Json(form): Json<TotalsForm>,
) -> Result<Json<CheckoutTotals>> {
    let coupon_code = match form.coupon_code.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(code) => Some(CouponCode::parse(code)?),
    };

    let cart = load_cart(&session).await?;
    let priced = checkout::quote(
        &state,
        &checkout::cart_items(&cart),
        form.payment_method,
        coupon_code.as_ref(),
    )
    .await?;
    Ok(Json(priced.totals))
}
