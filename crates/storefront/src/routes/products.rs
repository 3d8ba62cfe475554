//! Product route handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use tracing::instrument;
use vitrine_core::ProductId;

use crate::db::ProductRepository;
use crate::error::{AppError, Result};
use crate::models::Product;
use crate::state::AppState;

/// List active products.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<Product>>> {
    let products = ProductRepository::new(state.pool()).list_active().await?;
    Ok(Json(products))
}

/// Show a single active product.
#[instrument(skip(state), fields(product_id = %id))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<Product>> {
    state
        .catalog()
        .get(state.pool(), id)
        .await?
        .filter(|product| product.active)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))
}
