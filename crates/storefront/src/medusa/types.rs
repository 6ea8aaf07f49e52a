//! Domain types for the Medusa Store API.
//!
//! These types are what the rest of the storefront sees. The raw response
//! shapes live in `api.rs` and are converted on the way in.

use maison_core::{Price, ProductId, VariantId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// =============================================================================
// Product Types
// =============================================================================

/// A product option such as "Size" with its possible values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductOption {
    pub title: String,
    pub values: Vec<String>,
}

/// The value a variant has for one product option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedOption {
    /// Option title, e.g. "Size".
    pub name: String,
    /// Option value, e.g. "250ml".
    pub value: String,
}

/// A purchasable SKU of a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductVariant {
    pub id: VariantId,
    pub title: String,
    pub sku: Option<String>,
    pub options: Vec<SelectedOption>,
    /// Calculated price for the configured region, if the backend priced it.
    pub price: Option<Price>,
}

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub handle: String,
    pub title: String,
    pub subtitle: Option<String>,
    pub description: Option<String>,
    pub thumbnail: Option<String>,
    pub images: Vec<String>,
    pub options: Vec<ProductOption>,
    pub variants: Vec<ProductVariant>,
    pub category_handles: Vec<String>,
}

impl Product {
    /// The variant matching `variant_id`, falling back to the first variant.
    #[must_use]
    pub fn select_variant(&self, variant_id: Option<&str>) -> Option<&ProductVariant> {
        variant_id
            .and_then(|id| self.variants.iter().find(|v| v.id.as_str() == id))
            .or_else(|| self.variants.first())
    }

    /// Lowest variant price, shown on listing cards.
    #[must_use]
    pub fn price(&self) -> Option<Price> {
        self.variants
            .iter()
            .filter_map(|variant| variant.price)
            .min_by(|a, b| a.amount.cmp(&b.amount))
    }

    /// Primary image: the thumbnail, else the first gallery image.
    #[must_use]
    pub fn image(&self) -> Option<&str> {
        self.thumbnail
            .as_deref()
            .or_else(|| self.images.first().map(String::as_str))
    }

    /// Whether the product offers more than one size or option combination.
    #[must_use]
    pub fn has_variants(&self) -> bool {
        self.variants.len() > 1
    }
}

/// A page of products.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductPage {
    pub products: Vec<Product>,
    /// Total number of products matching the query.
    pub count: u32,
    pub offset: u32,
    pub limit: u32,
}

impl ProductPage {
    #[must_use]
    pub const fn has_more(&self) -> bool {
        self.offset.saturating_add(self.limit) < self.count
    }

    #[must_use]
    pub const fn has_previous(&self) -> bool {
        self.offset > 0
    }
}

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub handle: String,
    pub name: String,
    pub description: Option<String>,
}

// =============================================================================
// Cart Types
// =============================================================================

/// A line in a backend cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreLineItem {
    pub id: String,
    pub variant_id: Option<String>,
    pub quantity: u32,
}

/// A backend cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreCart {
    pub id: String,
    pub email: Option<String>,
    pub region_id: Option<String>,
    pub items: Vec<StoreLineItem>,
    pub total: Option<Decimal>,
}

/// An address in the shape the backend expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreAddress {
    pub first_name: String,
    pub last_name: String,
    pub address_1: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address_2: Option<String>,
    pub city: String,
    pub province: String,
    pub postal_code: String,
    pub country_code: String,
    pub phone: String,
}

impl From<&maison_core::checkout::ShippingDetails> for StoreAddress {
    fn from(details: &maison_core::checkout::ShippingDetails) -> Self {
        let name = details.name.trim();
        let (first_name, last_name) = name.split_once(' ').unwrap_or((name, ""));
        Self {
            first_name: first_name.to_string(),
            last_name: last_name.trim().to_string(),
            address_1: details.address_line1.clone(),
            address_2: Some(details.address_line2.clone()).filter(|line| !line.is_empty()),
            city: details.city.clone(),
            province: details.state.clone(),
            postal_code: details.pincode.clone(),
            country_code: "in".to_string(),
            phone: details.phone.clone(),
        }
    }
}

/// A shipping option offered for a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingOption {
    pub id: String,
    pub name: String,
    pub amount: Option<Decimal>,
}

/// A payment collection attached to a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentCollection {
    pub id: String,
    pub amount: Option<Decimal>,
}

/// An order produced by completing a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletedOrder {
    pub id: String,
    pub display_id: Option<i64>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use maison_core::checkout::ShippingDetails;

    fn variant(id: &str, amount: i64) -> ProductVariant {
        ProductVariant {
            id: VariantId::new(id),
            title: id.to_string(),
            sku: None,
            options: vec![],
            price: Some(Price::inr(Decimal::from(amount))),
        }
    }

    fn product() -> Product {
        Product {
            id: ProductId::new("prod_oud"),
            handle: "oud-candle".to_string(),
            title: "Oud Candle".to_string(),
            subtitle: None,
            description: None,
            thumbnail: None,
            images: vec!["https://cdn.example/oud.jpg".to_string()],
            options: vec![],
            variants: vec![variant("variant_500", 1800), variant("variant_250", 1100)],
            category_handles: vec![],
        }
    }

    #[test]
    fn test_select_variant_falls_back_to_first() {
        let product = product();
        assert_eq!(
            product.select_variant(Some("variant_250")).unwrap().id.as_str(),
            "variant_250"
        );
        assert_eq!(
            product.select_variant(Some("missing")).unwrap().id.as_str(),
            "variant_500"
        );
        assert_eq!(product.select_variant(None).unwrap().id.as_str(), "variant_500");
    }

    #[test]
    fn test_price_is_lowest_variant_price() {
        assert_eq!(product().price().unwrap().amount, Decimal::from(1100));
    }

    #[test]
    fn test_image_falls_back_to_gallery() {
        assert_eq!(product().image(), Some("https://cdn.example/oud.jpg"));
    }

    #[test]
    fn test_page_navigation() {
        let page = ProductPage {
            products: vec![],
            count: 30,
            offset: 12,
            limit: 12,
        };
        assert!(page.has_more());
        assert!(page.has_previous());
    }

    #[test]
    fn test_store_address_splits_name() {
        let details = ShippingDetails {
            name: "Asha Rao Kulkarni".to_string(),
            address_line1: "12 Residency Road".to_string(),
            address_line2: String::new(),
            city: "Bengaluru".to_string(),
            state: "Karnataka".to_string(),
            pincode: "560025".to_string(),
            phone: "9876543210".to_string(),
        };
        let address = StoreAddress::from(&details);
        assert_eq!(address.first_name, "Asha");
        assert_eq!(address.last_name, "Rao Kulkarni");
        assert_eq!(address.address_2, None);
        assert_eq!(address.country_code, "in");
    }
}
