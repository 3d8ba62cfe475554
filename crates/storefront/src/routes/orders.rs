//! Order submission route.

use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
};
use tower_sessions::Session;
use tracing::instrument;
use uuid::Uuid;
use vitrine_core::{Cart, Order, OrderRequest};

use crate::db::SubmitOutcome;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::models::session::{load_cart, save_cart};
use crate::services::checkout;
use crate::state::AppState;

/// Header carrying the client's idempotency key.
pub const IDEMPOTENCY_KEY_HEADER: &str = "idempotency-key";

/// Parse the optional `Idempotency-Key` header.
///
/// # Errors
///
/// Returns `AppError::Validation` if the header is present but not a UUID.
pub fn idempotency_key(headers: &HeaderMap) -> Result<Option<Uuid>> {
    let Some(value) = headers.get(IDEMPOTENCY_KEY_HEADER) else {
        return Ok(None);
    };
    value
        .to_str()
        .ok()
        .and_then(|s| Uuid::parse_str(s.trim()).ok())
        .map(Some)
        .ok_or_else(|| AppError::Validation("Idempotency-Key must be a UUID".to_string()))
}

/// Whether the order is priced from the session cart rather than from
/// explicit request items.
#[must_use]
pub const fn uses_session_cart(request: &OrderRequest) -> bool {
    request.items.is_none()
}

/// `201` for a new order, `200` for an idempotent replay.
#[must_use]
pub const fn response_status(outcome: &SubmitOutcome) -> StatusCode {
    match outcome {
        SubmitOutcome::Created(_) => StatusCode::CREATED,
        SubmitOutcome::Replayed(_) => StatusCode::OK,
    }
}

/// Submit an order from the request items or the session cart.
///
/// Answers `201` for a new order and `200` when the idempotency key matches
/// an order that already exists. The session cart is emptied only when it
/// was the source of the order.
#[instrument(skip(state, session, headers, request))]
pub async fn submit(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Json(request): Json<OrderRequest>,
) -> Result<(StatusCode, Json<Order>)> {
    let key = idempotency_key(&headers)?;
    let cart = load_cart(&session).await?;

    let payment_method = request.payment_method.to_string();
    add_breadcrumb(
        "checkout",
        "Order submitted",
        Some(&[("payment_method", payment_method.as_str())]),
    );

    let outcome = checkout::submit(&state, &request, &cart, key).await?;
    if uses_session_cart(&request) {
        save_cart(&session, &Cart::new()).await?;
    }

    let status = response_status(&outcome);
    let order = match outcome {
        SubmitOutcome::Created(order) => {
            tracing::info!(order_id = %order.id, total = %order.totals.total, "Order created");
            order
        }
        SubmitOutcome::Replayed(order) => order,
    };
    Ok((status, Json(order)))
}
