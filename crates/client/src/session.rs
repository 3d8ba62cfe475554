//! Client-side checkout flow.
//!
//! [`CheckoutSession`] owns the local cart and the applied coupon, computes
//! totals with the same calculator the server uses, and submits the order
//! with an idempotency key that survives retries of the same attempt.

use rust_decimal::Decimal;
use uuid::Uuid;
use vitrine_core::{
    Cart, CheckoutTotals, CouponCode, CouponEffect, CouponValidation, CustomerId, Order,
    OrderItemRequest, OrderRequest, PaymentMethod, PixQrResponse, PricingConfig, ProductId,
    compute_totals,
};

use crate::client::StorefrontClient;
use crate::error::ClientError;
use crate::store::CartStore;

/// Customer details entered at checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerInput {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub user_id: Option<CustomerId>,
}

/// A coupon accepted by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedCoupon {
    pub code: CouponCode,
    pub effect: CouponEffect,
    pub min_subtotal: Option<Decimal>,
}

impl AppliedCoupon {
    /// Whether the coupon still holds for `subtotal`.
    #[must_use]
    pub fn applies_to(&self, subtotal: Decimal) -> bool {
        self.min_subtotal.is_none_or(|min| subtotal >= min)
    }
}

/// Checkout state of one shopper.
pub struct CheckoutSession {
    client: StorefrontClient,
    store: CartStore,
    pricing: PricingConfig,
    cart: Cart,
    coupon: Option<AppliedCoupon>,
    idempotency_key: Option<Uuid>,
}

impl CheckoutSession {
    /// Open a session with the cart found in `store`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Storage`] if the stored cart cannot be read.
    pub async fn open(
        client: StorefrontClient,
        store: CartStore,
        pricing: PricingConfig,
    ) -> Result<Self, ClientError> {
        let cart = store.load().await?;
        Ok(Self {
            client,
            store,
            pricing,
            cart,
            coupon: None,
            idempotency_key: None,
        })
    }

    #[must_use]
    pub const fn cart(&self) -> &Cart {
        &self.cart
    }

    #[must_use]
    pub const fn coupon(&self) -> Option<&AppliedCoupon> {
        self.coupon.as_ref()
    }

    /// Idempotency key of the pending submission attempt, if any.
    #[must_use]
    pub const fn pending_idempotency_key(&self) -> Option<Uuid> {
        self.idempotency_key
    }

    /// Add a product to the cart and persist it.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Validation`] for a zero quantity or an invalid
    /// price, or [`ClientError::Storage`] if the cart cannot be saved.
    pub async fn add_item(
        &mut self,
        product_id: ProductId,
        unit_price: Decimal,
        quantity: u32,
    ) -> Result<(), ClientError> {
        self.cart
            .add(product_id, unit_price, quantity)
            .map_err(|e| ClientError::Validation(e.to_string()))?;
        self.cart_changed().await
    }

    /// Set the quantity of a line. Zero removes it.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Validation`] if the product is not in the cart,
    /// or [`ClientError::Storage`] if the cart cannot be saved.
    pub async fn set_quantity(
        &mut self,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<(), ClientError> {
        self.cart
            .set_quantity(product_id, quantity)
            .map_err(|e| ClientError::Validation(e.to_string()))?;
        self.cart_changed().await
    }

    /// Remove a product. Returns whether it was in the cart.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Storage`] if the cart cannot be saved.
    pub async fn remove_item(&mut self, product_id: ProductId) -> Result<bool, ClientError> {
        if !self.cart.remove(product_id) {
            return Ok(false);
        }
        self.cart_changed().await?;
        Ok(true)
    }

    /// Empty the cart and forget the coupon.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Storage`] if the stored cart cannot be removed.
    pub async fn clear(&mut self) -> Result<(), ClientError> {
        self.cart.clear();
        self.coupon = None;
        self.idempotency_key = None;
        self.store.clear().await
    }

    // A changed cart is a new checkout attempt.
    async fn cart_changed(&mut self) -> Result<(), ClientError> {
        self.idempotency_key = None;
        self.store.save(&self.cart).await
    }

    /// Validate `code` against the current subtotal and apply it.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::BusinessRule`] carrying the rejection reason
    /// (`not_found`, `min_subtotal`, `expired`) when the server refuses the
    /// coupon, [`ClientError::Validation`] for an empty code, or a network
    /// error. A refused coupon replaces any previously applied one.
    pub async fn apply_coupon(&mut self, code: &str) -> Result<CouponValidation, ClientError> {
        let code = CouponCode::parse(code).map_err(|e| ClientError::Validation(e.to_string()))?;
        let validation = self
            .client
            .validate_coupon(code.as_str(), self.cart.subtotal())
            .await?;
        self.idempotency_key = None;

        let Some(effect) = validation.effect() else {
            self.coupon = None;
            let reason = validation
                .reason
                .map_or("not_found", |reason| reason.as_str());
            return Err(ClientError::business_rule(
                reason,
                format!("coupon {code} rejected"),
            ));
        };

        tracing::debug!(code = %code, kind = ?effect.kind(), "Coupon applied");
        self.coupon = Some(AppliedCoupon {
            code,
            effect,
            min_subtotal: validation.min_subtotal,
        });
        Ok(validation)
    }

    pub fn remove_coupon(&mut self) {
        if self.coupon.take().is_some() {
            self.idempotency_key = None;
        }
    }

    /// Totals of the current cart, computed locally.
    ///
    /// A coupon whose minimum subtotal is no longer met is left out.
    #[must_use]
    pub fn totals(&self, payment_method: PaymentMethod) -> CheckoutTotals {
        let effect = self.effective_coupon().map(|coupon| &coupon.effect);
        compute_totals(self.cart.subtotal(), payment_method, effect, &self.pricing)
    }

    /// The applied coupon, if the current subtotal still meets its minimum.
    fn effective_coupon(&self) -> Option<&AppliedCoupon> {
        let subtotal = self.cart.subtotal();
        self.coupon
            .as_ref()
            .filter(|coupon| coupon.applies_to(subtotal))
    }

    /// Fetch the Pix payload for the current Pix total.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::BusinessRule`] (`empty_cart`) for an empty cart,
    /// or any error of [`StorefrontClient::pix_qr`].
    pub async fn pix_qr(&self) -> Result<PixQrResponse, ClientError> {
        if self.cart.is_empty() {
            return Err(ClientError::business_rule("empty_cart", "cart is empty"));
        }
        self.client
            .pix_qr(self.totals(PaymentMethod::Pix).total)
            .await
    }

    /// Submit the order.
    ///
    /// An empty cart is rejected before any request is made. A coupon left
    /// out of [`Self::totals`] is not sent either. A failed attempt
    /// keeps its idempotency key, so calling `submit` again after a network
    /// error cannot create a second order. On success the cart, the coupon
    /// and the stored cart file are cleared.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::BusinessRule`] for an empty cart or a rule the
    /// server enforces, [`ClientError::Validation`] for invalid customer
    /// details, or a network error.
    pub async fn submit(
        &mut self,
        customer: &CustomerInput,
        payment_method: PaymentMethod,
    ) -> Result<Order, ClientError> {
        if self.cart.is_empty() {
            return Err(ClientError::business_rule("empty_cart", "cart is empty"));
        }

        let totals = self.totals(payment_method);
        let request = OrderRequest {
            payment_method,
            name: customer.name.clone(),
            email: customer.email.clone(),
            phone: customer.phone.clone(),
            address: customer.address.clone(),
            user_id: customer.user_id,
            coupon_code: self.effective_coupon().map(|c| c.code.to_string()),
            discount_amount: totals.discount_amount,
            items: Some(
                self.cart
                    .lines()
                    .iter()
                    .map(|line| OrderItemRequest {
                        product_id: line.product_id,
                        quantity: line.quantity,
                    })
                    .collect(),
            ),
        };
        request
            .validate()
            .map_err(|e| ClientError::Validation(e.to_string()))?;

        let key = *self.idempotency_key.get_or_insert_with(Uuid::new_v4);
        let order = self.client.submit_order(&request, key).await?;

        if order.totals.total != totals.total {
            tracing::info!(
                order_id = %order.id,
                local_total = %totals.total,
                server_total = %order.totals.total,
                "Server total differs from local quote"
            );
        }

        self.cart.clear();
        self.coupon = None;
        self.idempotency_key = None;
        if let Err(e) = self.store.clear().await {
            // The order exists; a stale cart file is the lesser problem.
            tracing::warn!(error = %e, "Failed to clear stored cart");
        }

        Ok(order)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal_macros::dec;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::client::tests::order_json;

    fn customer() -> CustomerInput {
        CustomerInput {
            name: "Maria Souza".to_string(),
            email: "maria@example.com".to_string(),
            phone: "11999990000".to_string(),
            address: "Rua das Flores, 10".to_string(),
            user_id: None,
        }
    }

    async fn open_session(server: &MockServer, dir: &tempfile::TempDir) -> CheckoutSession {
        let client = StorefrontClient::new(&server.uri()).unwrap();
        let store = CartStore::new(dir.path().join("cart.json"));
        CheckoutSession::open(client, store, PricingConfig::default())
            .await
            .unwrap()
    }

    async fn mount_percent_coupon(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/api/coupons/validate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "valid": true,
                "type": "percent",
                "percent": 10,
                "minSubtotal": 80
            })))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_empty_cart_submit_makes_no_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(201))
            .expect(0)
            .mount(&server)
            .await;
        let dir = tempfile::tempdir().unwrap();
        let mut session = open_session(&server, &dir).await;

        let err = session
            .submit(&customer(), PaymentMethod::Card)
            .await
            .unwrap_err();
        assert_eq!(err.reason(), Some("empty_cart"));
        assert!(session.pending_idempotency_key().is_none());
    }

    #[tokio::test]
    async fn test_invalid_email_makes_no_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(201))
            .expect(0)
            .mount(&server)
            .await;
        let dir = tempfile::tempdir().unwrap();
        let mut session = open_session(&server, &dir).await;
        session
            .add_item(ProductId::new(1), dec!(50), 2)
            .await
            .unwrap();

        let mut bad = customer();
        bad.email = "maria".to_string();
        let err = session.submit(&bad, PaymentMethod::Card).await.unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));
    }

    #[tokio::test]
    async fn test_local_totals_with_coupon() {
        let server = MockServer::start().await;
        mount_percent_coupon(&server).await;
        let dir = tempfile::tempdir().unwrap();
        let mut session = open_session(&server, &dir).await;

        session
            .add_item(ProductId::new(1), dec!(50), 2)
            .await
            .unwrap();
        session.apply_coupon("bemvindo10").await.unwrap();
        assert_eq!(session.coupon().unwrap().code.as_str(), "BEMVINDO10");

        let totals = session.totals(PaymentMethod::Card);
        assert_eq!(totals.subtotal, dec!(100));
        assert_eq!(totals.discount_amount, dec!(10));
        assert_eq!(totals.shipping_fee, dec!(15));
        assert_eq!(totals.total, dec!(105));

        // Dropping below the minimum leaves the coupon out of the quote.
        session.set_quantity(ProductId::new(1), 1).await.unwrap();
        let totals = session.totals(PaymentMethod::Card);
        assert_eq!(totals.discount_amount, dec!(0));
        assert_eq!(totals.total, dec!(65));
    }

    #[tokio::test]
    async fn test_rejected_coupon_is_business_rule() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/coupons/validate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "valid": false,
                "reason": "min_subtotal",
                "minSubtotal": 200
            })))
            .mount(&server)
            .await;
        let dir = tempfile::tempdir().unwrap();
        let mut session = open_session(&server, &dir).await;
        session
            .add_item(ProductId::new(1), dec!(50), 1)
            .await
            .unwrap();

        let err = session.apply_coupon("GRANDE20").await.unwrap_err();
        assert_eq!(err.reason(), Some("min_subtotal"));
        assert!(session.coupon().is_none());
    }

    #[tokio::test]
    async fn test_successful_submit_clears_cart() {
        let server = MockServer::start().await;
        mount_percent_coupon(&server).await;
        Mock::given(method("POST"))
            .and(path("/api/orders"))
            .respond_with(ResponseTemplate::new(201).set_body_json(order_json()))
            .expect(1)
            .mount(&server)
            .await;
        let dir = tempfile::tempdir().unwrap();
        let mut session = open_session(&server, &dir).await;
        session
            .add_item(ProductId::new(1), dec!(50), 2)
            .await
            .unwrap();
        session.apply_coupon("BEMVINDO10").await.unwrap();
        assert!(dir.path().join("cart.json").exists());

        let order = session
            .submit(&customer(), PaymentMethod::Card)
            .await
            .unwrap();
        assert_eq!(order.totals.total, dec!(105));
        assert!(session.cart().is_empty());
        assert!(session.coupon().is_none());
        assert!(!dir.path().join("cart.json").exists());

        let requests = server.received_requests().await.unwrap();
        let submitted: serde_json::Value = requests
            .iter()
            .find(|r| r.url.path() == "/api/orders")
            .map(|r| serde_json::from_slice(&r.body).unwrap())
            .unwrap();
        assert_eq!(submitted["metodoPagamento"], "card");
        assert_eq!(submitted["coupon_code"], "BEMVINDO10");
        assert_eq!(submitted["discount_amount"], 10.0);
        assert_eq!(submitted["items"][0]["quantity"], 2);
    }

    #[tokio::test]
    async fn test_coupon_below_minimum_is_not_submitted() {
        let server = MockServer::start().await;
        mount_percent_coupon(&server).await;
        Mock::given(method("POST"))
            .and(path("/api/orders"))
            .respond_with(ResponseTemplate::new(201).set_body_json(order_json()))
            .expect(1)
            .mount(&server)
            .await;
        let dir = tempfile::tempdir().unwrap();
        let mut session = open_session(&server, &dir).await;
        session
            .add_item(ProductId::new(1), dec!(50), 2)
            .await
            .unwrap();
        session.apply_coupon("BEMVINDO10").await.unwrap();
        session.set_quantity(ProductId::new(1), 1).await.unwrap();
        assert!(session.coupon().is_some());
        assert_eq!(session.totals(PaymentMethod::Card).discount_amount, dec!(0));

        session
            .submit(&customer(), PaymentMethod::Card)
            .await
            .unwrap();

        let requests = server.received_requests().await.unwrap();
        let submitted: serde_json::Value = requests
            .iter()
            .find(|r| r.url.path() == "/api/orders")
            .map(|r| serde_json::from_slice(&r.body).unwrap())
            .unwrap();
        assert!(submitted["coupon_code"].is_null());
        assert_eq!(submitted["discount_amount"], 0.0);
    }

    #[tokio::test]
    async fn test_retry_reuses_idempotency_key() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/orders"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/orders"))
            .respond_with(ResponseTemplate::new(200).set_body_json(order_json()))
            .mount(&server)
            .await;
        let dir = tempfile::tempdir().unwrap();
        let mut session = open_session(&server, &dir).await;
        session
            .add_item(ProductId::new(1), dec!(50), 2)
            .await
            .unwrap();

        let err = session
            .submit(&customer(), PaymentMethod::Card)
            .await
            .unwrap_err();
        assert!(err.is_retryable());
        assert!(session.pending_idempotency_key().is_some());
        assert!(!session.cart().is_empty());

        session
            .submit(&customer(), PaymentMethod::Card)
            .await
            .unwrap();

        let keys: Vec<String> = server
            .received_requests()
            .await
            .unwrap()
            .iter()
            .filter_map(|r| r.headers.get("idempotency-key"))
            .map(|v| v.to_str().unwrap().to_string())
            .collect();
        assert_eq!(keys.len(), 2);
        assert_eq!(keys[0], keys[1]);
    }

    #[tokio::test]
    async fn test_cart_change_starts_new_attempt() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/orders"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;
        let dir = tempfile::tempdir().unwrap();
        let mut session = open_session(&server, &dir).await;
        session
            .add_item(ProductId::new(1), dec!(50), 2)
            .await
            .unwrap();

        session
            .submit(&customer(), PaymentMethod::Pix)
            .await
            .unwrap_err();
        assert!(session.pending_idempotency_key().is_some());

        session
            .add_item(ProductId::new(2), dec!(10), 1)
            .await
            .unwrap();
        assert!(session.pending_idempotency_key().is_none());
    }

    #[tokio::test]
    async fn test_remove_item_and_coupon() {
        let server = MockServer::start().await;
        mount_percent_coupon(&server).await;
        let dir = tempfile::tempdir().unwrap();
        let mut session = open_session(&server, &dir).await;
        session
            .add_item(ProductId::new(1), dec!(90), 1)
            .await
            .unwrap();
        session.apply_coupon("BEMVINDO10").await.unwrap();

        session.remove_coupon();
        assert!(session.coupon().is_none());
        assert_eq!(session.totals(PaymentMethod::Card).discount_amount, dec!(0));

        assert!(!session.remove_item(ProductId::new(2)).await.unwrap());
        assert!(session.remove_item(ProductId::new(1)).await.unwrap());
        assert!(session.cart().is_empty());
        assert!(!dir.path().join("cart.json").exists());
    }

    #[tokio::test]
    async fn test_cart_survives_reopen() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        {
            let mut session = open_session(&server, &dir).await;
            session
                .add_item(ProductId::new(3), dec!(19.90), 3)
                .await
                .unwrap();
        }
        let session = open_session(&server, &dir).await;
        assert_eq!(session.cart().item_count(), 3);
        assert_eq!(session.cart().subtotal(), dec!(59.70));
    }
}
