//! Raw Medusa Store API response shapes and their conversions.

use maison_core::{CurrencyCode, Price, ProductId, VariantId};
use rust_decimal::Decimal;
use serde::Deserialize;

use super::types::{
    Category, CompletedOrder, PaymentCollection, Product, ProductOption, ProductVariant,
    SelectedOption, ShippingOption, StoreCart, StoreLineItem,
};

// =============================================================================
// Envelopes
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct ProductsResponse {
    #[serde(default)]
    pub products: Vec<ApiProduct>,
    #[serde(default)]
    pub count: u32,
    #[serde(default)]
    pub offset: u32,
    #[serde(default)]
    pub limit: u32,
}

#[derive(Debug, Deserialize)]
pub struct CategoriesResponse {
    #[serde(default)]
    pub product_categories: Vec<ApiCategory>,
}

#[derive(Debug, Deserialize)]
pub struct CartResponse {
    pub cart: ApiCart,
}

#[derive(Debug, Deserialize)]
pub struct ShippingOptionsResponse {
    #[serde(default)]
    pub shipping_options: Vec<ApiShippingOption>,
}

#[derive(Debug, Deserialize)]
pub struct PaymentCollectionResponse {
    pub payment_collection: ApiPaymentCollection,
}

/// `POST /store/carts/{id}/complete` answers with either an order or the cart
/// plus the reason it could not be completed.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CompleteCartResponse {
    Order { order: ApiOrder },
    Cart { error: Option<ApiError> },
}

/// Error body returned by the backend on non-2xx responses.
#[derive(Debug, Default, Deserialize)]
pub struct ApiError {
    #[serde(default)]
    pub message: String,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

// =============================================================================
// Products
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct ApiProduct {
    pub id: String,
    pub handle: String,
    pub title: String,
    pub subtitle: Option<String>,
    pub description: Option<String>,
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub images: Option<Vec<ApiImage>>,
    #[serde(default)]
    pub options: Option<Vec<ApiProductOption>>,
    #[serde(default)]
    pub variants: Option<Vec<ApiVariant>>,
    #[serde(default)]
    pub categories: Option<Vec<ApiCategory>>,
}

#[derive(Debug, Deserialize)]
pub struct ApiImage {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct ApiProductOption {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub values: Vec<ApiOptionValue>,
}

#[derive(Debug, Deserialize)]
pub struct ApiOptionValue {
    pub value: String,
    pub option_id: Option<String>,
    pub option: Option<ApiOptionRef>,
}

#[derive(Debug, Deserialize)]
pub struct ApiOptionRef {
    pub title: String,
}

#[derive(Debug, Deserialize)]
pub struct ApiVariant {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    pub sku: Option<String>,
    #[serde(default)]
    pub options: Option<Vec<ApiOptionValue>>,
    pub calculated_price: Option<ApiCalculatedPrice>,
}

#[derive(Debug, Deserialize)]
pub struct ApiCalculatedPrice {
    pub calculated_amount: Option<Decimal>,
    pub currency_code: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ApiCategory {
    pub id: String,
    pub handle: String,
    pub name: String,
    pub description: Option<String>,
}

// =============================================================================
// Cart, shipping, payment, order
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct ApiCart {
    pub id: String,
    pub email: Option<String>,
    pub region_id: Option<String>,
    #[serde(default)]
    pub items: Option<Vec<ApiLineItem>>,
    pub total: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
pub struct ApiLineItem {
    pub id: String,
    pub variant_id: Option<String>,
    pub quantity: u32,
}

#[derive(Debug, Deserialize)]
pub struct ApiShippingOption {
    pub id: String,
    pub name: String,
    pub amount: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
pub struct ApiPaymentCollection {
    pub id: String,
    pub amount: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
pub struct ApiOrder {
    pub id: String,
    pub display_id: Option<i64>,
}

// =============================================================================
// Conversions
// =============================================================================

pub fn convert_product(product: ApiProduct) -> Product {
    let options = product.options.unwrap_or_default();

    // Variant option values reference their option by id; titles come from
    // the product's option list when the value does not embed them.
    let option_title = |value: &ApiOptionValue| -> String {
        value
            .option
            .as_ref()
            .map(|option| option.title.clone())
            .or_else(|| {
                value.option_id.as_ref().and_then(|id| {
                    options
                        .iter()
                        .find(|option| &option.id == id)
                        .map(|option| option.title.clone())
                })
            })
            .unwrap_or_default()
    };

    let variants = product
        .variants
        .unwrap_or_default()
        .into_iter()
        .map(|variant| ProductVariant {
            id: VariantId::new(variant.id),
            title: variant.title.unwrap_or_default(),
            sku: variant.sku,
            options: variant
                .options
                .unwrap_or_default()
                .iter()
                .map(|value| SelectedOption {
                    name: option_title(value),
                    value: value.value.clone(),
                })
                .collect(),
            price: variant.calculated_price.and_then(convert_price),
        })
        .collect();

    Product {
        id: ProductId::new(product.id),
        handle: product.handle,
        title: product.title,
        subtitle: product.subtitle.filter(|s| !s.is_empty()),
        description: product.description.filter(|s| !s.is_empty()),
        thumbnail: product.thumbnail,
        images: product
            .images
            .unwrap_or_default()
            .into_iter()
            .map(|image| image.url)
            .collect(),
        options: options
            .iter()
            .map(|option| ProductOption {
                title: option.title.clone(),
                values: option.values.iter().map(|v| v.value.clone()).collect(),
            })
            .collect(),
        variants,
        category_handles: product
            .categories
            .unwrap_or_default()
            .into_iter()
            .map(|category| category.handle)
            .collect(),
    }
}

fn convert_price(price: ApiCalculatedPrice) -> Option<Price> {
    let amount = price.calculated_amount?;
    let currency = price
        .currency_code
        .as_deref()
        .map_or(CurrencyCode::INR, CurrencyCode::from_code_or_default);
    Some(Price::new(amount, currency))
}

pub fn convert_category(category: ApiCategory) -> Category {
    Category {
        id: category.id,
        handle: category.handle,
        name: category.name,
        description: category.description.filter(|s| !s.is_empty()),
    }
}

pub fn convert_cart(cart: ApiCart) -> StoreCart {
    StoreCart {
        id: cart.id,
        email: cart.email,
        region_id: cart.region_id,
        items: cart
            .items
            .unwrap_or_default()
            .into_iter()
            .map(|item| StoreLineItem {
                id: item.id,
                variant_id: item.variant_id,
                quantity: item.quantity,
            })
            .collect(),
        total: cart.total,
    }
}

pub fn convert_shipping_option(option: ApiShippingOption) -> ShippingOption {
    ShippingOption {
        id: option.id,
        name: option.name,
        amount: option.amount,
    }
}

pub fn convert_payment_collection(collection: ApiPaymentCollection) -> PaymentCollection {
    PaymentCollection {
        id: collection.id,
        amount: collection.amount,
    }
}

pub fn convert_order(order: ApiOrder) -> CompletedOrder {
    CompletedOrder {
        id: order.id,
        display_id: order.display_id,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_product_resolves_option_titles() {
        let raw: ApiProduct = serde_json::from_value(serde_json::json!({
            "id": "prod_1",
            "handle": "vetiver-mist",
            "title": "Vetiver Mist",
            "subtitle": "",
            "description": "Room spray",
            "thumbnail": null,
            "images": [{ "url": "https://cdn.example/vetiver.jpg" }],
            "options": [
                { "id": "opt_size", "title": "Size", "values": [{ "value": "100ml" }, { "value": "200ml" }] }
            ],
            "variants": [
                {
                    "id": "variant_100",
                    "title": "100ml",
                    "sku": "VM-100",
                    "options": [{ "value": "100ml", "option_id": "opt_size" }],
                    "calculated_price": { "calculated_amount": 899, "currency_code": "inr" }
                },
                {
                    "id": "variant_200",
                    "title": "200ml",
                    "options": [{ "value": "200ml", "option": { "title": "Size" } }],
                    "calculated_price": null
                }
            ],
            "categories": [{ "id": "pcat_1", "handle": "room-sprays", "name": "Room Sprays" }]
        }))
        .unwrap();

        let product = convert_product(raw);
        assert_eq!(product.subtitle, None);
        assert_eq!(product.options[0].values, vec!["100ml", "200ml"]);
        assert_eq!(product.variants[0].options[0].name, "Size");
        assert_eq!(product.variants[1].options[0].name, "Size");
        assert_eq!(
            product.variants[0].price.unwrap().amount,
            Decimal::from(899)
        );
        assert_eq!(product.variants[1].price, None);
        assert_eq!(product.category_handles, vec!["room-sprays"]);
        assert_eq!(product.image(), Some("https://cdn.example/vetiver.jpg"));
    }

    #[test]
    fn test_complete_cart_response_variants() {
        let order: CompleteCartResponse = serde_json::from_value(serde_json::json!({
            "type": "order",
            "order": { "id": "order_1", "display_id": 1042 }
        }))
        .unwrap();
        assert!(matches!(order, CompleteCartResponse::Order { .. }));

        let cart: CompleteCartResponse = serde_json::from_value(serde_json::json!({
            "type": "cart",
            "cart": { "id": "cart_1" },
            "error": { "message": "Payment authorization failed", "type": "payment_authorization_error" }
        }))
        .unwrap();
        let CompleteCartResponse::Cart { error } = cart else {
            panic!("expected cart");
        };
        assert_eq!(error.unwrap().message, "Payment authorization failed");
    }
}
