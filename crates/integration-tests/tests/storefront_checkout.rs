//! End-to-end checkout against a running storefront.
//!
//! These tests require:
//! - A migrated `PostgreSQL` database (`DATABASE_URL`)
//! - The storefront running with default pricing (shipping 15, free above
//!   200, Pix 5%)

use reqwest::StatusCode;
use rust_decimal_macros::dec;
use serde_json::{Value, json};
use uuid::Uuid;
use vitrine_integration_tests::{
    database, insert_percent_coupon, insert_product, session_client, storefront_url, unique_code,
};

fn customer_body(payment_method: &str) -> Value {
    json!({
        "metodoPagamento": payment_method,
        "nome": "Maria Souza",
        "email": "maria@example.com",
        "telefone": "11999990000",
        "endereco": "Rua das Flores, 10",
        "discount_amount": 0
    })
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_health() {
    let resp = reqwest::get(format!("{}/health", storefront_url()))
        .await
        .expect("Failed to reach storefront");
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_coupon_validation_rules() {
    let pool = database().await;
    let code = unique_code("DEZ");
    insert_percent_coupon(&pool, &code, dec!(10), Some(dec!(80))).await;

    let client = session_client();
    let url = format!("{}/api/coupons/validate", storefront_url());

    // Lookup ignores case
    let body: Value = client
        .post(&url)
        .json(&json!({ "code": code.to_lowercase(), "subtotal": 100 }))
        .send()
        .await
        .expect("validate request failed")
        .json()
        .await
        .expect("invalid body");
    assert_eq!(body["valid"], true);
    assert_eq!(body["type"], "percent");
    assert_eq!(body["percent"], 10.0);

    let body: Value = client
        .post(&url)
        .json(&json!({ "code": code, "subtotal": 50 }))
        .send()
        .await
        .expect("validate request failed")
        .json()
        .await
        .expect("invalid body");
    assert_eq!(body["valid"], false);
    assert_eq!(body["reason"], "min_subtotal");

    let body: Value = client
        .post(&url)
        .json(&json!({ "code": unique_code("NADA"), "subtotal": 50 }))
        .send()
        .await
        .expect("validate request failed")
        .json()
        .await
        .expect("invalid body");
    assert_eq!(body["valid"], false);
    assert_eq!(body["reason"], "not_found");
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_session_cart_checkout_is_idempotent() {
    let pool = database().await;
    let product = insert_product(&pool, "Camiseta E2E", dec!(50)).await;
    let code = unique_code("BEM");
    insert_percent_coupon(&pool, &code, dec!(10), None).await;

    let client = session_client();
    let base = storefront_url();

    let cart: Value = client
        .post(format!("{base}/api/cart/items"))
        .json(&json!({ "product_id": product.as_i32(), "quantity": 2 }))
        .send()
        .await
        .expect("add to cart failed")
        .json()
        .await
        .expect("invalid cart body");
    assert_eq!(cart["itemCount"], 2);
    assert_eq!(cart["subtotal"], 100.0);

    let totals: Value = client
        .post(format!("{base}/api/cart/totals"))
        .json(&json!({ "payment_method": "card", "coupon_code": code }))
        .send()
        .await
        .expect("totals request failed")
        .json()
        .await
        .expect("invalid totals body");
    assert_eq!(totals["discountAmount"], 10.0);
    assert_eq!(totals["shippingFee"], 15.0);
    assert_eq!(totals["total"], 105.0);

    let key = Uuid::new_v4().to_string();
    let mut order = customer_body("card");
    order["coupon_code"] = json!(code);
    order["discount_amount"] = json!(10);

    let resp = client
        .post(format!("{base}/api/orders"))
        .header("Idempotency-Key", &key)
        .json(&order)
        .send()
        .await
        .expect("order request failed");
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Value = resp.json().await.expect("invalid order body");
    assert_eq!(created["total"], 105.0);
    assert_eq!(created["status"], "pending");
    assert_eq!(created["couponCode"], code);

    // The session cart is gone, but the replay still finds the order
    let cart: Value = client
        .get(format!("{base}/api/cart"))
        .send()
        .await
        .expect("cart request failed")
        .json()
        .await
        .expect("invalid cart body");
    assert_eq!(cart["itemCount"], 0);

    let resp = client
        .post(format!("{base}/api/orders"))
        .header("Idempotency-Key", &key)
        .json(&order)
        .send()
        .await
        .expect("replay request failed");
    assert_eq!(resp.status(), StatusCode::OK);
    let replayed: Value = resp.json().await.expect("invalid order body");
    assert_eq!(replayed["id"], created["id"]);
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_pix_order_with_explicit_items() {
    let pool = database().await;
    let product = insert_product(&pool, "Caneca E2E", dec!(250)).await;

    let mut order = customer_body("pix");
    order["items"] = json!([{ "product_id": product.as_i32(), "quantity": 1 }]);

    let resp = session_client()
        .post(format!("{}/api/orders", storefront_url()))
        .json(&order)
        .send()
        .await
        .expect("order request failed");
    assert_eq!(resp.status(), StatusCode::CREATED);

    let created: Value = resp.json().await.expect("invalid order body");
    assert_eq!(created["shippingFee"], 0.0);
    assert_eq!(created["paymentMethodDiscount"], 12.5);
    assert_eq!(created["total"], 237.5);
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_empty_cart_is_rejected() {
    let resp = session_client()
        .post(format!("{}/api/orders", storefront_url()))
        .json(&customer_body("card"))
        .send()
        .await
        .expect("order request failed");
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body: Value = resp.json().await.expect("invalid error body");
    assert_eq!(body["reason"], "empty_cart");
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_pix_qr() {
    let resp = session_client()
        .post(format!("{}/api/cart/pix-qr", storefront_url()))
        .json(&json!({ "total": 237.5 }))
        .send()
        .await
        .expect("pix request failed");
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = resp.json().await.expect("invalid pix body");
    assert_eq!(body["amount"], 237.5);
    let payload = body["qr_code"].as_str().expect("qr_code missing");
    assert!(payload.starts_with("000201"));
    assert!(payload.contains("5406237.50"));
}
