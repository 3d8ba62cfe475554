//! Client error taxonomy.

use thiserror::Error;

/// Errors returned by the storefront client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Input rejected locally or by the server (`400`).
    #[error("validation error: {0}")]
    Validation(String),

    /// Transport failure: connection, timeout, or an undecodable body.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The server answered with an unexpected non-2xx status.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// A checkout rule blocked the request (`422`, or checked locally).
    #[error("{message} ({reason})")]
    BusinessRule { reason: String, message: String },

    /// The persisted cart could not be read or written.
    #[error("cart storage error: {0}")]
    Storage(String),
}

impl ClientError {
    pub(crate) fn business_rule(reason: &str, message: impl Into<String>) -> Self {
        Self::BusinessRule {
            reason: reason.to_string(),
            message: message.into(),
        }
    }

    /// Machine-readable reason of a business rule rejection.
    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::BusinessRule { reason, .. } => Some(reason),
            _ => None,
        }
    }

    /// Whether retrying the same request may succeed.
    ///
    /// Only transport failures and server errors qualify. Order submissions
    /// can be retried safely because they reuse their idempotency key.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::Status { status, .. } => *status >= 500 || *status == 429,
            Self::Validation(_) | Self::BusinessRule { .. } | Self::Storage(_) => false,
        }
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable() {
        assert!(
            ClientError::Status {
                status: 503,
                body: String::new()
            }
            .is_retryable()
        );
        assert!(
            !ClientError::Status {
                status: 404,
                body: String::new()
            }
            .is_retryable()
        );
        assert!(!ClientError::business_rule("empty_cart", "cart is empty").is_retryable());
    }

    #[test]
    fn test_reason() {
        let err = ClientError::business_rule("min_subtotal", "coupon rejected");
        assert_eq!(err.reason(), Some("min_subtotal"));
        assert_eq!(err.to_string(), "coupon rejected (min_subtotal)");
        assert_eq!(ClientError::Validation("x".to_string()).reason(), None);
    }
}
