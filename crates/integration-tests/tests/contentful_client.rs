//! Integration tests for the Contentful Delivery API client.

#![allow(clippy::unwrap_used)]

use maison_integration_tests::contentful_config;
use maison_storefront::contentful::{ContentfulClient, ContentfulError};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ENTRIES_PATH: &str = "/spaces/space/environments/master/entries";

async fn client() -> (MockServer, ContentfulClient) {
    let server = MockServer::start().await;
    let client = ContentfulClient::new(&contentful_config(&server));
    (server, client)
}

fn paragraph(text: &str) -> serde_json::Value {
    serde_json::json!({
        "nodeType": "document",
        "data": {},
        "content": [{
            "nodeType": "paragraph",
            "data": {},
            "content": [{ "nodeType": "text", "value": text, "marks": [], "data": {} }]
        }]
    })
}

#[tokio::test]
async fn test_hero_slides_resolve_assets_and_sort() {
    let (server, client) = client().await;

    Mock::given(method("GET"))
        .and(path(ENTRIES_PATH))
        .and(query_param("content_type", "heroSlide"))
        .and(query_param("fields.active", "true"))
        .and(header("authorization", "Bearer cda-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "items": [
                {
                    "sys": { "id": "slide_2" },
                    "fields": { "title": "Monsoon Edit", "order": 2 }
                },
                {
                    "sys": { "id": "slide_1" },
                    "fields": {
                        "title": "The Winter Collection",
                        "subtitle": "Warm woods and spice",
                        "ctaLabel": "Shop candles",
                        "ctaUrl": "/collections/candles",
                        "order": 1,
                        "image": { "sys": { "type": "Link", "linkType": "Asset", "id": "asset_winter" } }
                    }
                },
                {
                    "sys": { "id": "slide_untitled" },
                    "fields": { "order": 0 }
                }
            ],
            "includes": {
                "Asset": [{
                    "sys": { "id": "asset_winter" },
                    "fields": {
                        "title": "Winter",
                        "file": { "url": "//images.ctfassets.net/space/winter.jpg" }
                    }
                }]
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let slides = client.hero_slides().await.unwrap();
    assert_eq!(slides.len(), 2, "entries without a title are dropped");

    let first = slides.first().unwrap();
    assert_eq!(first.title, "The Winter Collection");
    assert_eq!(
        first.image_url.as_deref(),
        Some("https://images.ctfassets.net/space/winter.jpg")
    );
    assert_eq!(first.cta_url.as_deref(), Some("/collections/candles"));

    // Second call is served from cache
    let again = client.hero_slides().await.unwrap();
    assert_eq!(again.len(), 2);
}

#[tokio::test]
async fn test_faqs_render_rich_text_in_order() {
    let (server, client) = client().await;

    Mock::given(method("GET"))
        .and(path(ENTRIES_PATH))
        .and(query_param("content_type", "faq"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "items": [
                {
                    "sys": { "id": "faq_2" },
                    "fields": {
                        "question": "Do you ship outside India?",
                        "answer": "Not yet.",
                        "category": "Shipping",
                        "order": 2
                    }
                },
                {
                    "sys": { "id": "faq_1" },
                    "fields": {
                        "question": "How long does a candle burn?",
                        "answer": paragraph("Around 45 hours."),
                        "category": "Care",
                        "order": 1
                    }
                }
            ]
        })))
        .mount(&server)
        .await;

    let faqs = client.faqs().await.unwrap();
    assert_eq!(faqs.len(), 2);

    let first = faqs.first().unwrap();
    assert_eq!(first.question, "How long does a candle burn?");
    assert_eq!(first.answer_html, "<p>Around 45 hours.</p>");

    // Plain strings are escaped into a paragraph
    assert_eq!(faqs.get(1).unwrap().answer_html, "<p>Not yet.</p>");
}

#[tokio::test]
async fn test_page_by_slug_missing_is_none() {
    let (server, client) = client().await;

    Mock::given(method("GET"))
        .and(path(ENTRIES_PATH))
        .and(query_param("content_type", "page"))
        .and(query_param("fields.slug", "no-such-page"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "items": [] })))
        .mount(&server)
        .await;

    assert!(client.page("no-such-page").await.unwrap().is_none());
}

#[tokio::test]
async fn test_api_error_is_reported() {
    let (server, client) = client().await;

    Mock::given(method("GET"))
        .and(path(ENTRIES_PATH))
        .respond_with(
            ResponseTemplate::new(401).set_body_string("The access token you sent could not be found"),
        )
        .mount(&server)
        .await;

    match client.job_openings().await {
        Err(ContentfulError::Api { status, message }) => {
            assert_eq!(status, 401);
            assert!(message.contains("access token"));
        }
        other => panic!("expected API error, got {other:?}"),
    }
}
