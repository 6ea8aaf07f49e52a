//! Integration tests for the Razorpay Orders API client.

#![allow(clippy::unwrap_used)]

use maison_integration_tests::{TEST_RAZORPAY_KEY_ID, TEST_RAZORPAY_SECRET, razorpay_config};
use maison_storefront::razorpay::{RazorpayClient, RazorpayError, sign_payment};
use wiremock::matchers::{basic_auth, body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn client() -> (MockServer, RazorpayClient) {
    let server = MockServer::start().await;
    let client = RazorpayClient::new(&razorpay_config(&server));
    (server, client)
}

#[tokio::test]
async fn test_create_order_sends_amount_in_paise() {
    let (server, client) = client().await;

    Mock::given(method("POST"))
        .and(path("/v1/orders"))
        .and(basic_auth(TEST_RAZORPAY_KEY_ID, TEST_RAZORPAY_SECRET))
        .and(body_partial_json(serde_json::json!({
            "amount": 121_200,
            "currency": "INR",
            "receipt": "MSN-3F9A0C12"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "order_Rzp123",
            "entity": "order",
            "amount": 121_200,
            "currency": "INR",
            "receipt": "MSN-3F9A0C12",
            "status": "created"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let order = client
        .create_order(
            121_200,
            "INR",
            "MSN-3F9A0C12",
            &serde_json::json!({ "order_number": "MSN-3F9A0C12" }),
        )
        .await
        .unwrap();

    assert_eq!(order.id, "order_Rzp123");
    assert_eq!(order.amount, 121_200);
    assert_eq!(order.status, "created");
}

#[tokio::test]
async fn test_create_order_error_description() {
    let (server, client) = client().await;

    Mock::given(method("POST"))
        .and(path("/v1/orders"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error": {
                "code": "BAD_REQUEST_ERROR",
                "description": "The amount must be atleast INR 1.00"
            }
        })))
        .mount(&server)
        .await;

    match client.create_order(0, "INR", "MSN-1", &serde_json::json!({})).await {
        Err(RazorpayError::Api { status, message }) => {
            assert_eq!(status, 400);
            assert_eq!(message, "The amount must be atleast INR 1.00");
        }
        other => panic!("expected API error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_signature_verification() {
    let (_server, client) = client().await;
    let signature = sign_payment(TEST_RAZORPAY_SECRET, "order_Rzp123", "pay_Rzp456");

    assert!(
        client
            .verify_payment_signature("order_Rzp123", "pay_Rzp456", &signature)
            .is_ok()
    );
    assert!(matches!(
        client.verify_payment_signature("order_Rzp123", "pay_Other", &signature),
        Err(RazorpayError::InvalidSignature)
    ));
    assert!(matches!(
        client.verify_payment_signature("order_Rzp123", "pay_Rzp456", "not-hex"),
        Err(RazorpayError::InvalidSignature)
    ));
}
