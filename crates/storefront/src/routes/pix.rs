//! Pix "copia e cola" route.

use axum::{Json, extract::State};
use tracing::instrument;
use vitrine_core::{PixCharge, PixQrRequest, PixQrResponse, round_money};

use crate::error::Result;
use crate::state::AppState;

/// Build the BR Code payload for a cart total.
#[instrument(skip(state, request), fields(total = %request.total))]
pub async fn qr_code(
    State(state): State<AppState>,
    Json(request): Json<PixQrRequest>,
) -> Result<Json<PixQrResponse>> {
    let pix = &state.config().pix;
    let amount = round_money(request.total);
    let charge = PixCharge {
        key: pix.key.clone(),
        merchant_name: pix.merchant_name.clone(),
        merchant_city: pix.merchant_city.clone(),
        amount,
        txid: None,
    };
    let payload = charge.payload()?;

    Ok(Json(PixQrResponse {
        qr_code_url: pix.qr_image_url(&payload),
        qr_code: payload,
        amount,
        merchant_name: pix.merchant_name.clone(),
        pix_key: pix.key.clone(),
    }))
}
