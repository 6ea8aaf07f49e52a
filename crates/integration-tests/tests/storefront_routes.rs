//! Cart, Ledger and checkout flows through the full storefront router.
//!
//! Shopper state lives in an in-memory session store; the session cookie is
//! carried between requests by hand.

#![allow(clippy::unwrap_used)]

use axum::http::{StatusCode, header};
use maison_integration_tests::{
    TestContext, body_text, get, hx_trigger, post_form, product_json, session_cookie,
};
use tower::ServiceExt;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mock_product(server: &MockServer, handle: &str, title: &str, variants: &[(&str, &str, i64)]) {
    Mock::given(method("GET"))
        .and(path("/store/products"))
        .and(query_param("handle", handle))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "products": [product_json(handle, title, variants)]
        })))
        .mount(server)
        .await;
}

/// Add one product to a fresh session's cart and return the session cookie.
async fn cart_with_candle(ctx: &TestContext, quantity: u32) -> String {
    mock_product(&ctx.medusa, "oud-candle", "Oud Candle", &[("variant_oud", "Default", 1200)]).await;

    let response = ctx
        .app
        .clone()
        .oneshot(post_form(
            "/cart/add",
            &format!("handle=oud-candle&quantity={quantity}"),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    session_cookie(&response).unwrap()
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_health_and_security_headers() {
    let ctx = TestContext::new().await;

    let response = ctx.app.clone().oneshot(get("/health", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("content-security-policy"));
    assert!(response.headers().contains_key("x-request-id"));
    assert_eq!(body_text(response).await, "ok");
}

// =============================================================================
// Cart
// =============================================================================

#[tokio::test]
async fn test_add_to_cart_updates_count() {
    let ctx = TestContext::new().await;
    mock_product(&ctx.medusa, "oud-candle", "Oud Candle", &[("variant_oud", "Default", 1200)]).await;

    let response = ctx
        .app
        .clone()
        .oneshot(post_form("/cart/add", "handle=oud-candle&quantity=2", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let triggers = hx_trigger(&response).unwrap();
    assert!(triggers.get("cart-updated").is_some());
    assert_eq!(triggers["showToast"]["level"], "success");
    assert_eq!(triggers["showToast"]["message"], "Oud Candle added to your bag");

    let cookie = session_cookie(&response).unwrap();
    assert!(body_text(response).await.contains(">2<"));

    let count = ctx
        .app
        .clone()
        .oneshot(get("/cart/count", Some(&cookie)))
        .await
        .unwrap();
    assert!(body_text(count).await.contains(">2<"));
}

#[tokio::test]
async fn test_add_unknown_variant_is_rejected() {
    let ctx = TestContext::new().await;
    mock_product(&ctx.medusa, "oud-candle", "Oud Candle", &[("variant_oud", "Default", 1200)]).await;

    let response = ctx
        .app
        .clone()
        .oneshot(post_form(
            "/cart/add",
            "handle=oud-candle&variant_id=variant_gone",
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(hx_trigger(&response).unwrap()["showToast"]["level"], "error");
}

#[tokio::test]
async fn test_update_quantity_and_remove_by_zero() {
    let ctx = TestContext::new().await;
    let cookie = cart_with_candle(&ctx, 1).await;

    let response = ctx
        .app
        .clone()
        .oneshot(post_form(
            "/cart/update",
            "line_id=variant_oud&quantity=3",
            Some(&cookie),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("₹3,600.00"), "line total reflects new quantity");

    let response = ctx
        .app
        .clone()
        .oneshot(post_form(
            "/cart/update",
            "line_id=variant_oud&quantity=0",
            Some(&cookie),
        ))
        .await
        .unwrap();
    assert_eq!(
        hx_trigger(&response).unwrap()["showToast"]["message"],
        "Removed from your bag"
    );

    let count = ctx
        .app
        .clone()
        .oneshot(get("/cart/count", Some(&cookie)))
        .await
        .unwrap();
    assert!(!body_text(count).await.contains("badge"));
}

#[tokio::test]
async fn test_update_missing_line_reports_error() {
    let ctx = TestContext::new().await;
    let cookie = cart_with_candle(&ctx, 1).await;

    let response = ctx
        .app
        .clone()
        .oneshot(post_form(
            "/cart/update",
            "line_id=variant_unknown&quantity=2",
            Some(&cookie),
        ))
        .await
        .unwrap();
    let triggers = hx_trigger(&response).unwrap();
    assert_eq!(triggers["showToast"]["level"], "error");
    assert!(triggers.get("cart-updated").is_none());
}

// =============================================================================
// Ledger
// =============================================================================

#[tokio::test]
async fn test_ledger_toggle_saves_then_removes() {
    let ctx = TestContext::new().await;
    mock_product(&ctx.medusa, "fig-diffuser", "Fig Diffuser", &[("variant_fig", "Default", 2400)]).await;

    let response = ctx
        .app
        .clone()
        .oneshot(post_form(
            "/ledger/toggle",
            "product_id=prod_fig-diffuser&handle=fig-diffuser",
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(hx_trigger(&response).unwrap().get("ledger-updated").is_some());
    let cookie = session_cookie(&response).unwrap();
    assert!(body_text(response).await.contains("Saved to Ledger"));

    let count = ctx
        .app
        .clone()
        .oneshot(get("/ledger/count", Some(&cookie)))
        .await
        .unwrap();
    assert!(body_text(count).await.contains(">1<"));

    let response = ctx
        .app
        .clone()
        .oneshot(post_form(
            "/ledger/toggle",
            "product_id=prod_fig-diffuser&handle=fig-diffuser",
            Some(&cookie),
        ))
        .await
        .unwrap();
    assert!(body_text(response).await.contains("Save to Ledger"));
}

// =============================================================================
// Checkout
// =============================================================================

#[tokio::test]
async fn test_checkout_with_empty_cart_redirects_to_cart() {
    let ctx = TestContext::new().await;

    for uri in ["/checkout", "/checkout/shipping", "/checkout/review"] {
        let response = ctx.app.clone().oneshot(get(uri, None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "{uri}");
        assert_eq!(response.headers()[header::LOCATION], "/cart");
    }
}

#[tokio::test]
async fn test_place_order_with_empty_cart_is_rejected() {
    let ctx = TestContext::new().await;

    let response = ctx
        .app
        .clone()
        .oneshot(post_form("/checkout/place", "", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_later_step_redirects_to_current_step() {
    let ctx = TestContext::new().await;
    let cookie = cart_with_candle(&ctx, 1).await;

    let response = ctx
        .app
        .clone()
        .oneshot(get("/checkout/review", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/checkout/shipping");
}

#[tokio::test]
async fn test_apply_and_reject_coupons() {
    let ctx = TestContext::new().await;
    let cookie = cart_with_candle(&ctx, 1).await;

    let response = ctx
        .app
        .clone()
        .oneshot(post_form("/checkout/coupon", "code=welcome10", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(hx_trigger(&response).unwrap()["showToast"]["level"], "success");
    let html = body_text(response).await;
    assert!(html.contains("WELCOME10"));
    assert!(html.contains("₹120.00"), "10% of ₹1,200.00");

    let response = ctx
        .app
        .clone()
        .oneshot(post_form("/checkout/coupon", "code=bogus", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(hx_trigger(&response).unwrap()["showToast"]["level"], "error");
    assert!(body_text(response).await.contains("Invalid coupon code: BOGUS"));
}

#[tokio::test]
async fn test_shipping_validation_then_payment_and_review() {
    let ctx = TestContext::new().await;
    let cookie = cart_with_candle(&ctx, 1).await;

    // Missing fields re-render the step with inline errors
    let response = ctx
        .app
        .clone()
        .oneshot(post_form(
            "/checkout/shipping",
            "email=asha%40example.com&name=Asha+Rao",
            Some(&cookie),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(hx_trigger(&response).unwrap()["showToast"]["level"], "error");

    let response = ctx
        .app
        .clone()
        .oneshot(post_form(
            "/checkout/shipping",
            "email=asha%40example.com&address_id=new&name=Asha+Rao&address_line1=12+MG+Road\
             &city=Bengaluru&state=Karnataka&pincode=560001&phone=9876543210&label=Home&billing_same=on",
            Some(&cookie),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/checkout/payment");

    let response = ctx
        .app
        .clone()
        .oneshot(post_form("/checkout/payment", "payment_method=cod", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/checkout/review");

    let response = ctx
        .app
        .clone()
        .oneshot(get("/checkout/review", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("Cash on Delivery"));
    assert!(html.contains("12 MG Road, Bengaluru, Karnataka - 560001"));
    // ₹1,200 + ₹150 shipping + ₹216 GST, plus the ₹50 COD fee
    assert!(html.contains("₹1,616.00"));
}
