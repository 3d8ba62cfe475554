//! Coupon validation route.

use axum::{Json, extract::State};
use rust_decimal::Decimal;
use tracing::instrument;
use vitrine_core::{CouponCode, CouponValidateRequest, CouponValidation};

use crate::error::{AppError, Result};
use crate::services::checkout;
use crate::state::AppState;

/// Check a coupon code against a subtotal.
///
/// Unknown codes are not an error: they answer `200` with
/// `{"valid": false, "reason": "not_found"}`.
#[instrument(skip(state, request), fields(subtotal = %request.subtotal))]
pub async fn validate(
    State(state): State<AppState>,
    Json(request): Json<CouponValidateRequest>,
) -> Result<Json<CouponValidation>> {
    let code = CouponCode::parse(&request.code)?;
    if request.subtotal < Decimal::ZERO {
        return Err(AppError::Validation(
            "subtotal cannot be negative".to_string(),
        ));
    }

    let validation = checkout::validate_coupon(state.pool(), &code, request.subtotal).await?;
    Ok(Json(validation))
}
