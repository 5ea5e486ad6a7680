//! Checkout: summary, shipping, billing ownership and payment outcomes.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use serde_json::{Value, json};

use smilepet_integration_tests::{MockUpstream, PASSWORD, TestContext, config_for};

fn billing() -> Value {
    json!({
        "email": "ana@example.com",
        "name": "Ana Souza",
        "document": "123.456.789-09",
        "phone": "(11) 99999-0000",
        "postalCode": "01310-100",
        "street": "Av. Paulista",
        "number": "1000",
        "district": "Bela Vista",
        "city": "São Paulo",
        "state": "SP"
    })
}

/// A visitor with two bags of food, PAC shipping and billing filled in.
async fn ready_to_pay(upstream: &MockUpstream) -> TestContext {
    let ctx = TestContext::start(config_for(upstream)).await;
    ctx.post_json(
        "/api/cart/add",
        &json!({"id": "1", "variant": "15kg", "price": "29.90", "quantity": 2}),
    )
    .await;
    ctx.put_json(
        "/api/checkout/shipping",
        &json!({"service": "PAC", "price": "20.00", "deliveryDays": 5}),
    )
    .await;
    let (status, _) = ctx.put_json("/api/checkout/billing", &billing()).await;
    assert_eq!(status, StatusCode::OK);
    ctx
}

#[tokio::test]
async fn test_summary_totals() {
    let upstream = MockUpstream::start().await;
    let ctx = ready_to_pay(&upstream).await;

    let (status, view) = ctx.get_json("/api/checkout/summary").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["summary"]["itemCount"], 2);
    assert_eq!(view["summary"]["subtotal"], "59.80");
    assert_eq!(view["summary"]["shipping"], "20.00");
    assert_eq!(view["summary"]["total"], "79.80");
    assert!(
        view["summary"]["shippingLabel"]
            .as_str()
            .unwrap()
            .starts_with("PAC")
    );
    assert_eq!(view["billing"]["city"], "São Paulo");
    assert_eq!(view["email"], "ana@example.com");
}

#[tokio::test]
async fn test_invalid_shipping_is_rejected() {
    let upstream = MockUpstream::start().await;
    let ctx = TestContext::start(config_for(&upstream)).await;

    let (status, _) = ctx
        .put_json("/api/checkout/shipping", &json!({"service": " ", "price": "10"}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = ctx
        .put_json("/api/checkout/shipping", &json!({"service": "SEDEX", "price": "-1"}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_submit_requires_cart_and_billing() {
    let upstream = MockUpstream::start().await;
    let ctx = TestContext::start(config_for(&upstream)).await;

    let payment = json!({"payment": {"token": "approved"}, "email": "ana@example.com"});
    let (status, body) = ctx.post_json("/api/checkout", &payment).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("Carrinho vazio"));

    ctx.post_json("/api/cart/add", &json!({"id": "2", "price": "24.90"}))
        .await;
    let (status, _) = ctx.post_json("/api/checkout", &payment).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert!(upstream.recorded().checkouts.is_empty());
}

#[tokio::test]
async fn test_approved_payment_clears_cart_keeps_billing() {
    let upstream = MockUpstream::start().await;
    let ctx = ready_to_pay(&upstream).await;

    let (status, result) = ctx
        .post_json("/api/checkout", &json!({"payment": {"token": "approved", "installments": 1}}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(result["orderId"], "991");
    assert_eq!(result["status"], "approved");
    assert_eq!(result["message"], Value::Null);

    let order = upstream.recorded().checkouts.first().cloned().unwrap();
    assert_eq!(order["email"], "ana@example.com");
    assert_eq!(order["total"], "79.80");
    assert_eq!(order["shippingPrice"], "20.00");
    assert_eq!(order["items"][0]["quantity"], 2);
    assert_eq!(order["billing"]["postalCode"], "01310-100");
    assert_eq!(order["payment"]["installments"], 1);

    let (_, count) = ctx.get_json("/api/cart/count").await;
    assert_eq!(count["count"], 0);

    let (_, view) = ctx.get_json("/api/checkout/summary").await;
    assert_eq!(view["summary"]["shipping"], "0");
    assert_eq!(view["summary"]["shippingLabel"], Value::Null);
    assert_eq!(view["billing"]["name"], "Ana Souza");
}

#[tokio::test]
async fn test_pending_payment_keeps_cart() {
    let upstream = MockUpstream::start().await;
    let ctx = ready_to_pay(&upstream).await;

    let (status, result) = ctx
        .post_json("/api/checkout", &json!({"payment": {"token": "pix"}}))
        .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(result["status"], "pending");
    assert!(result["instructions"]["transaction_data"]["qr_code"].is_string());

    let (_, count) = ctx.get_json("/api/cart/count").await;
    assert_eq!(count["count"], 2);
}

#[tokio::test]
async fn test_rejected_payment_explains_reason() {
    let upstream = MockUpstream::start().await;
    let ctx = ready_to_pay(&upstream).await;

    let (status, body) = ctx
        .post_json("/api/checkout", &json!({"payment": {"token": "insufficient"}}))
        .await;
    assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
    assert!(
        body["error"]
            .as_str()
            .unwrap()
            .contains("Saldo ou limite insuficiente")
    );

    let (status, body) = ctx
        .post_json("/api/checkout", &json!({"payment": {"token": "declined"}}))
        .await;
    assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
    assert!(body["error"].as_str().unwrap().contains("Pagamento recusado"));

    let (_, count) = ctx.get_json("/api/cart/count").await;
    assert_eq!(count["count"], 2);
}

#[tokio::test]
async fn test_billing_is_not_shown_to_another_account() {
    let upstream = MockUpstream::start().await;
    let ctx = ready_to_pay(&upstream).await;

    // Saved anonymously under the email; now user 7 owns the session.
    ctx.post_json(
        "/api/auth/login",
        &json!({"email": "ana@example.com", "password": PASSWORD}),
    )
    .await;

    let (_, view) = ctx.get_json("/api/checkout/summary").await;
    assert_eq!(view["billing"], Value::Null);

    let (status, _) = ctx
        .post_json("/api/checkout", &json!({"payment": {"token": "approved"}}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
