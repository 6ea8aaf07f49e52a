//! Integration tests for the Medusa Store API client.
//!
//! Each test runs against its own mock backend.

#![allow(clippy::unwrap_used)]

use maison_integration_tests::{medusa_config, product_json};
use maison_storefront::medusa::{MedusaClient, MedusaError};
use rust_decimal::Decimal;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn dec(amount: i64) -> Decimal {
    Decimal::from(amount)
}

async fn client() -> (MockServer, MedusaClient) {
    let server = MockServer::start().await;
    let client = MedusaClient::new(&medusa_config(&server));
    (server, client)
}

// =============================================================================
// Products
// =============================================================================

#[tokio::test]
async fn test_get_product_by_handle_converts_and_caches() {
    let (server, client) = client().await;

    Mock::given(method("GET"))
        .and(path("/store/products"))
        .and(query_param("handle", "oud-candle"))
        .and(query_param("region_id", "reg_in"))
        .and(header("x-publishable-api-key", "pk_test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "products": [product_json(
                "oud-candle",
                "Oud Candle",
                &[("variant_small", "200g", 1200), ("variant_large", "400g", 1900)],
            )],
            "count": 1,
            "offset": 0,
            "limit": 1
        })))
        .expect(1)
        .mount(&server)
        .await;

    let product = client.get_product_by_handle("oud-candle").await.unwrap();
    assert_eq!(product.title, "Oud Candle");
    assert_eq!(product.variants.len(), 2);
    assert!(product.has_variants());
    assert_eq!(product.price().unwrap().amount, dec(1200));
    assert_eq!(
        product.image(),
        Some("https://cdn.maison.example/oud-candle.jpg")
    );

    // Served from cache; the mock expects exactly one request
    let cached = client.get_product_by_handle("oud-candle").await.unwrap();
    assert_eq!(cached.id, product.id);
}

#[tokio::test]
async fn test_get_product_by_handle_not_found() {
    let (server, client) = client().await;

    Mock::given(method("GET"))
        .and(path("/store/products"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "products": [],
            "count": 0,
            "offset": 0,
            "limit": 1
        })))
        .mount(&server)
        .await;

    let result = client.get_product_by_handle("no-such-candle").await;
    assert!(matches!(result, Err(MedusaError::NotFound(_))));
}

#[tokio::test]
async fn test_list_products_in_category_passes_filter() {
    let (server, client) = client().await;

    Mock::given(method("GET"))
        .and(path("/store/products"))
        .and(query_param("category_id[]", "pcat_candles"))
        .and(query_param("limit", "12"))
        .and(query_param("offset", "12"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "products": [product_json("amber-candle", "Amber Candle", &[("variant_amber", "Default", 1500)])],
            "count": 13,
            "offset": 12,
            "limit": 12
        })))
        .mount(&server)
        .await;

    let page = client
        .list_products_in_category("pcat_candles", 12, 12)
        .await
        .unwrap();
    assert_eq!(page.products.len(), 1);
    assert_eq!(page.count, 13);
    assert!(!page.has_more());
}

#[tokio::test]
async fn test_get_products_by_handles_skips_failures() {
    let (server, client) = client().await;

    Mock::given(method("GET"))
        .and(path("/store/products"))
        .and(query_param("handle", "fig-diffuser"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "products": [product_json("fig-diffuser", "Fig Diffuser", &[("variant_fig", "Default", 2400)])]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/store/products"))
        .and(query_param("handle", "retired"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "products": [] })))
        .mount(&server)
        .await;

    let products = client
        .get_products_by_handles(&["retired".to_string(), "fig-diffuser".to_string()])
        .await;
    assert_eq!(products.len(), 1);
    assert_eq!(products.first().unwrap().handle, "fig-diffuser");
}

#[tokio::test]
async fn test_category_by_handle() {
    let (server, client) = client().await;

    Mock::given(method("GET"))
        .and(path("/store/product-categories"))
        .and(query_param("handle", "candles"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "product_categories": [{
                "id": "pcat_candles",
                "handle": "candles",
                "name": "Candles",
                "description": ""
            }]
        })))
        .mount(&server)
        .await;

    let category = client.get_category_by_handle("candles").await.unwrap();
    assert_eq!(category.id, "pcat_candles");
    assert_eq!(category.name, "Candles");
    assert!(category.description.is_none());
}

// =============================================================================
// Errors
// =============================================================================

#[tokio::test]
async fn test_rate_limited_reads_retry_after() {
    let (server, client) = client().await;

    Mock::given(method("GET"))
        .and(path("/store/product-categories"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "30"))
        .mount(&server)
        .await;

    let result = client.get_category_by_handle("candles").await;
    assert!(matches!(result, Err(MedusaError::RateLimited(30))));
}

#[tokio::test]
async fn test_api_error_message_is_extracted() {
    let (server, client) = client().await;

    Mock::given(method("POST"))
        .and(path("/store/carts"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "type": "invalid_data",
            "message": "Region reg_in not found"
        })))
        .mount(&server)
        .await;

    match client.create_cart(Some("asha@example.com")).await {
        Err(MedusaError::Api { status, message }) => {
            assert_eq!(status, 400);
            assert_eq!(message, "Region reg_in not found");
        }
        other => panic!("expected API error, got {other:?}"),
    }
}

// =============================================================================
// Cart and order completion
// =============================================================================

#[tokio::test]
async fn test_create_cart_and_add_line_item() {
    let (server, client) = client().await;

    Mock::given(method("POST"))
        .and(path("/store/carts"))
        .and(body_partial_json(serde_json::json!({
            "region_id": "reg_in",
            "email": "asha@example.com"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "cart": { "id": "cart_01", "email": "asha@example.com", "region_id": "reg_in", "items": [] }
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/store/carts/cart_01/line-items"))
        .and(body_partial_json(serde_json::json!({
            "variant_id": "variant_small",
            "quantity": 2
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "cart": {
                "id": "cart_01",
                "items": [{ "id": "item_01", "variant_id": "variant_small", "quantity": 2 }],
                "total": 2400
            }
        })))
        .mount(&server)
        .await;

    let cart = client.create_cart(Some("asha@example.com")).await.unwrap();
    assert_eq!(cart.id, "cart_01");

    let cart = client
        .add_line_item(&cart.id, "variant_small", 2)
        .await
        .unwrap();
    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.total, Some(dec(2400)));
}

#[tokio::test]
async fn test_complete_cart_returns_order() {
    let (server, client) = client().await;

    Mock::given(method("POST"))
        .and(path("/store/carts/cart_01/complete"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "type": "order",
            "order": { "id": "order_01", "display_id": 1042 }
        })))
        .mount(&server)
        .await;

    let order = client.complete_cart("cart_01").await.unwrap();
    assert_eq!(order.id, "order_01");
    assert_eq!(order.display_id, Some(1042));
}

#[tokio::test]
async fn test_complete_cart_reports_incomplete_cart() {
    let (server, client) = client().await;

    Mock::given(method("POST"))
        .and(path("/store/carts/cart_01/complete"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "type": "cart",
            "cart": { "id": "cart_01" },
            "error": { "message": "Payment authorization failed", "type": "payment_authorization_error" }
        })))
        .mount(&server)
        .await;

    match client.complete_cart("cart_01").await {
        Err(MedusaError::CartNotCompleted(message)) => {
            assert_eq!(message, "Payment authorization failed");
        }
        other => panic!("expected incomplete cart, got {other:?}"),
    }
}
