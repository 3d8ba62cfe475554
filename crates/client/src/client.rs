//! HTTP client for the storefront checkout endpoints.

use std::sync::Arc;

use reqwest::StatusCode;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::instrument;
use url::Url;
use uuid::Uuid;
use vitrine_core::{
    CouponCode, CouponValidateRequest, CouponValidation, Order, OrderRequest, PixQrRequest,
    PixQrResponse,
};

use crate::error::ClientError;

/// Header carrying the idempotency key of an order submission.
const IDEMPOTENCY_KEY_HEADER: &str = "Idempotency-Key";

/// Longest error body kept in [`ClientError::Status`].
const MAX_ERROR_BODY_CHARS: usize = 500;

/// Client for the storefront API.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Clone)]
pub struct StorefrontClient {
    inner: Arc<StorefrontClientInner>,
}

struct StorefrontClientInner {
    client: reqwest::Client,
    base_url: Url,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
    #[serde(default)]
    reason: Option<String>,
}

impl StorefrontClient {
    /// Create a client for the storefront at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Validation`] if `base_url` is not a valid URL.
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        Self::with_http_client(reqwest::Client::new(), base_url)
    }

    /// Create a client that reuses an existing `reqwest::Client`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Validation`] if `base_url` is not a valid URL.
    pub fn with_http_client(client: reqwest::Client, base_url: &str) -> Result<Self, ClientError> {
        let mut base_url = Url::parse(base_url)
            .map_err(|e| ClientError::Validation(format!("invalid base URL: {e}")))?;
        // Url::join drops the last path segment unless it ends with '/'
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            inner: Arc::new(StorefrontClientInner { client, base_url }),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        self.inner
            .base_url
            .join(path)
            .map_err(|e| ClientError::Validation(format!("invalid endpoint {path}: {e}")))
    }

    /// Validate a coupon against a subtotal.
    ///
    /// The code is trimmed and upper-cased before it is sent. An unknown code
    /// is not an error: the result has `valid == false` and a reason.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Validation`] for an empty or malformed code, or
    /// a network error.
    #[instrument(skip(self))]
    pub async fn validate_coupon(
        &self,
        code: &str,
        subtotal: Decimal,
    ) -> Result<CouponValidation, ClientError> {
        let code = CouponCode::parse(code).map_err(|e| ClientError::Validation(e.to_string()))?;
        let body = CouponValidateRequest {
            code: code.into(),
            subtotal,
        };

        let response = self
            .inner
            .client
            .post(self.endpoint("api/coupons/validate")?)
            .json(&body)
            .send()
            .await?;
        decode(response).await
    }

    /// Submit an order.
    ///
    /// Send the same `idempotency_key` when retrying a failed attempt; the
    /// server then returns the order it already stored.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::BusinessRule`] when checkout is blocked (empty
    /// cart, rejected coupon, unavailable product), [`ClientError::Validation`]
    /// for malformed input, or a network error.
    #[instrument(skip(self, request), fields(payment_method = %request.payment_method))]
    pub async fn submit_order(
        &self,
        request: &OrderRequest,
        idempotency_key: Uuid,
    ) -> Result<Order, ClientError> {
        let response = self
            .inner
            .client
            .post(self.endpoint("api/orders")?)
            .header(IDEMPOTENCY_KEY_HEADER, idempotency_key.to_string())
            .json(request)
            .send()
            .await?;
        let order: Order = decode(response).await?;

        tracing::info!(order_id = %order.id, "Order submitted");
        Ok(order)
    }

    /// Fetch the Pix "copia e cola" payload for a total.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Validation`] for a non-positive total, or a
    /// network error.
    #[instrument(skip(self))]
    pub async fn pix_qr(&self, total: Decimal) -> Result<PixQrResponse, ClientError> {
        if total <= Decimal::ZERO {
            return Err(ClientError::Validation(
                "Pix total must be positive".to_string(),
            ));
        }

        let response = self
            .inner
            .client
            .post(self.endpoint("api/cart/pix-qr")?)
            .json(&PixQrRequest { total })
            .send()
            .await?;
        decode(response).await
    }
}

/// Decode a success body, or map an error response onto [`ClientError`].
async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json::<T>().await?);
    }

    let body = response.text().await.unwrap_or_default();
    match (status, serde_json::from_str::<ErrorBody>(&body).ok()) {
        (StatusCode::BAD_REQUEST, Some(err)) => Err(ClientError::Validation(err.error)),
        (
            StatusCode::UNPROCESSABLE_ENTITY,
            Some(ErrorBody {
                error,
                reason: Some(reason),
            }),
        ) => Err(ClientError::BusinessRule {
            reason,
            message: error,
        }),
        _ => {
            tracing::warn!(status = %status, "Storefront returned an error status");
            Err(ClientError::Status {
                status: status.as_u16(),
                body: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
            })
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use rust_decimal_macros::dec;
    use vitrine_core::{PaymentMethod, RejectionReason};
    use wiremock::matchers::{body_partial_json, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    /// An order body as the storefront returns it.
    pub(crate) fn order_json() -> serde_json::Value {
        serde_json::json!({
            "id": 42,
            "customerId": null,
            "customer": {
                "name": "Maria Souza",
                "email": "maria@example.com",
                "phone": "11999990000",
                "address": "Rua das Flores, 10"
            },
            "items": [
                { "productId": 1, "productName": "Camiseta", "unitPrice": 50.0, "quantity": 2 }
            ],
            "paymentMethod": "card",
            "couponCode": "BEMVINDO10",
            "subtotal": 100.0,
            "shippingFee": 15.0,
            "discountAmount": 10.0,
            "paymentMethodDiscount": 0.0,
            "total": 105.0,
            "status": "pending",
            "createdAt": "2026-03-01T12:00:00Z",
            "updatedAt": "2026-03-01T12:00:00Z"
        })
    }

    fn order_request() -> OrderRequest {
        serde_json::from_value(serde_json::json!({
            "metodoPagamento": "card",
            "nome": "Maria Souza",
            "email": "maria@example.com",
            "telefone": "11999990000",
            "endereco": "Rua das Flores, 10",
            "coupon_code": "BEMVINDO10",
            "discount_amount": 10,
            "items": [{ "product_id": 1, "quantity": 2 }]
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_validate_coupon_sends_upper_case_code() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/coupons/validate"))
            .and(body_partial_json(serde_json::json!({ "code": "BEMVINDO10" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "valid": true,
                "type": "percent",
                "percent": 10
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = StorefrontClient::new(&server.uri()).unwrap();
        let validation = client.validate_coupon(" bemvindo10 ", dec!(100)).await.unwrap();
        assert!(validation.valid);
        assert_eq!(validation.percent, Some(dec!(10)));
    }

    #[tokio::test]
    async fn test_validate_coupon_not_found_is_not_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/coupons/validate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "valid": false,
                "reason": "not_found"
            })))
            .mount(&server)
            .await;

        let client = StorefrontClient::new(&server.uri()).unwrap();
        let validation = client.validate_coupon("NOPE", dec!(100)).await.unwrap();
        assert!(!validation.valid);
        assert_eq!(validation.reason, Some(RejectionReason::NotFound));
    }

    #[tokio::test]
    async fn test_empty_coupon_code_never_reaches_server() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let client = StorefrontClient::new(&server.uri()).unwrap();
        let err = client.validate_coupon("   ", dec!(100)).await.unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));
    }

    #[tokio::test]
    async fn test_submit_order_sends_idempotency_key() {
        let server = MockServer::start().await;
        let key = Uuid::new_v4();
        Mock::given(method("POST"))
            .and(path("/api/orders"))
            .and(header_exists("idempotency-key"))
            .respond_with(ResponseTemplate::new(201).set_body_json(order_json()))
            .expect(1)
            .mount(&server)
            .await;

        let client = StorefrontClient::new(&server.uri()).unwrap();
        let order = client.submit_order(&order_request(), key).await.unwrap();
        assert_eq!(order.id.as_i32(), 42);
        assert_eq!(order.payment_method, PaymentMethod::Card);
        assert_eq!(order.totals.total, dec!(105));
        assert!(order.totals_consistent());

        let requests = server.received_requests().await.unwrap();
        let sent = requests
            .first()
            .and_then(|r| r.headers.get("idempotency-key"))
            .and_then(|v| v.to_str().ok())
            .unwrap()
            .to_string();
        assert_eq!(sent, key.to_string());
    }

    #[tokio::test]
    async fn test_business_rule_rejection() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/orders"))
            .respond_with(ResponseTemplate::new(422).set_body_json(serde_json::json!({
                "error": "coupon rejected: min_subtotal",
                "reason": "min_subtotal"
            })))
            .mount(&server)
            .await;

        let client = StorefrontClient::new(&server.uri()).unwrap();
        let err = client
            .submit_order(&order_request(), Uuid::new_v4())
            .await
            .unwrap_err();
        assert_eq!(err.reason(), Some("min_subtotal"));
    }

    #[tokio::test]
    async fn test_server_error_maps_to_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/cart/pix-qr"))
            .respond_with(ResponseTemplate::new(503).set_body_string("upstream unavailable"))
            .mount(&server)
            .await;

        let client = StorefrontClient::new(&server.uri()).unwrap();
        let err = client.pix_qr(dec!(105)).await.unwrap_err();
        match err {
            ClientError::Status { status, body } => {
                assert_eq!(status, 503);
                assert_eq!(body, "upstream unavailable");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_base_url_with_path_prefix() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/loja/api/cart/pix-qr"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "qr_code": "000201",
                "qr_code_url": "https://qr.example.test/?data=000201",
                "amount": 105.0,
                "merchant_name": "Vitrine",
                "pix_key": "loja@vitrine.com.br"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = StorefrontClient::new(&format!("{}/loja", server.uri())).unwrap();
        let pix = client.pix_qr(dec!(105)).await.unwrap();
        assert_eq!(pix.amount, dec!(105));
        assert_eq!(pix.pix_key, "loja@vitrine.com.br");
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            StorefrontClient::new("not a url"),
            Err(ClientError::Validation(_))
        ));
    }
}
