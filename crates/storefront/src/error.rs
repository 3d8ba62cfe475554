//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.
//!
//! Error bodies are JSON: `{"error": "...", "reason": "..."}`, where `reason`
//! is only present for business rule rejections.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use vitrine_core::{
    CartError, CheckoutRejection, CouponCodeError, OrderRequestError, PixError,
};

use crate::db::RepositoryError;
use crate::services::checkout::CheckoutError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Session store operation failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Malformed input from the client.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Checkout blocked by a business rule.
    #[error("{0}")]
    BusinessRule(CheckoutRejection),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<&'static str>,
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Database(_) | Self::Session(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::BusinessRule(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if matches!(
            self,
            Self::Database(_) | Self::Session(_) | Self::Internal(_)
        ) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        // Don't expose internal error details to clients
        let body = match &self {
            Self::Database(_) | Self::Session(_) | Self::Internal(_) => ErrorBody {
                error: "Internal server error".to_string(),
                reason: None,
            },
            Self::BusinessRule(rejection) => ErrorBody {
                error: rejection.to_string(),
                reason: Some(rejection.reason()),
            },
            Self::Validation(message) | Self::NotFound(message) => ErrorBody {
                error: message.clone(),
                reason: None,
            },
        };

        (self.status(), Json(body)).into_response()
    }
}

impl From<CheckoutRejection> for AppError {
    fn from(rejection: CheckoutRejection) -> Self {
        Self::BusinessRule(rejection)
    }
}

impl From<CheckoutError> for AppError {
    fn from(err: CheckoutError) -> Self {
        match err {
            CheckoutError::Rejected(rejection) => Self::BusinessRule(rejection),
            CheckoutError::Cart(err) => err.into(),
            CheckoutError::Request(err) => err.into(),
            CheckoutError::Repository(err) => Self::Database(err),
        }
    }
}

impl From<CartError> for AppError {
    fn from(err: CartError) -> Self {
        match err {
            CartError::NotInCart(_) => Self::NotFound(err.to_string()),
            _ => Self::Validation(err.to_string()),
        }
    }
}

impl From<OrderRequestError> for AppError {
    fn from(err: OrderRequestError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<CouponCodeError> for AppError {
    fn from(err: CouponCodeError) -> Self {
        Self::Validation(format!("invalid coupon code: {err}"))
    }
}

impl From<PixError> for AppError {
    fn from(err: PixError) -> Self {
        match err {
            PixError::NonPositiveAmount | PixError::AmountTooLarge(_) => {
                Self::Validation(err.to_string())
            }
            // Everything else comes from server configuration.
            _ => Self::Internal(format!("pix payload: {err}")),
        }
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Add a breadcrumb for checkout steps.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of actions
/// leading up to an error.
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
