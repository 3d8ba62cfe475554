//! Order administration handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use tracing::instrument;
use vitrine_core::{Order, OrderId};

use crate::db::OrderRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAdminToken;
use crate::models::{OrderListQuery, OrderSummary, StatusUpdate};
use crate::state::AppState;

/// List recent orders.
#[instrument(skip(_auth, state))]
pub async fn index(
    _auth: RequireAdminToken,
    State(state): State<AppState>,
    Query(query): Query<OrderListQuery>,
) -> Result<Json<Vec<OrderSummary>>> {
    let orders = OrderRepository::new(state.pool())
        .list(query.status, query.limit())
        .await?;
    Ok(Json(orders))
}

/// Show an order with its items.
#[instrument(skip(_auth, state), fields(order_id = %id))]
pub async fn show(
    _auth: RequireAdminToken,
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
) -> Result<Json<Order>> {
    OrderRepository::new(state.pool())
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("order {id}")))
}

/// Move an order along its lifecycle.
#[instrument(skip(_auth, state, update), fields(order_id = %id, to = %update.status))]
pub async fn update_status(
    _auth: RequireAdminToken,
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
    Json(update): Json<StatusUpdate>,
) -> Result<Json<Order>> {
    let order = OrderRepository::new(state.pool())
        .transition(id, update.status)
        .await?;
    Ok(Json(order))
}
