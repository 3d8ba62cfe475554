//! Coupon administration handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use rust_decimal::Decimal;
use tracing::instrument;
use vitrine_core::CouponCode;

use crate::db::{CouponRepository, RepositoryError};
use crate::error::{AppError, Result};
use crate::middleware::RequireAdminToken;
use crate::models::{CouponRecord, NewCoupon};
use crate::state::AppState;

/// List all coupons.
#[instrument(skip(_auth, state))]
pub async fn index(
    _auth: RequireAdminToken,
    State(state): State<AppState>,
) -> Result<Json<Vec<CouponRecord>>> {
    let coupons = CouponRepository::new(state.pool()).list().await?;
    Ok(Json(coupons))
}

/// Create a coupon.
#[instrument(skip(_auth, state, coupon), fields(code = %coupon.code))]
pub async fn create(
    _auth: RequireAdminToken,
    State(state): State<AppState>,
    Json(coupon): Json<NewCoupon>,
) -> Result<(StatusCode, Json<CouponRecord>)> {
    let effect = coupon
        .effect()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    if coupon.min_subtotal.is_some_and(|min| min < Decimal::ZERO) {
        return Err(AppError::BadRequest(
            "minSubtotal cannot be negative".to_string(),
        ));
    }

    let record = CouponRepository::new(state.pool())
        .create(&coupon, effect)
        .await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// Deactivate a coupon so it is no longer accepted at checkout.
#[instrument(skip(_auth, state))]
pub async fn deactivate(
    _auth: RequireAdminToken,
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<CouponRecord>> {
    let code =
        CouponCode::parse(&code).map_err(|e| AppError::BadRequest(format!("invalid code: {e}")))?;
    let record = CouponRepository::new(state.pool())
        .deactivate(&code)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => AppError::NotFound(format!("coupon {code}")),
            other => other.into(),
        })?;
    Ok(Json(record))
}
