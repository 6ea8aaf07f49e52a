//! Product route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::contentful::ProductContent;
use crate::error::AppError;
use crate::filters;
use crate::medusa::Product;
use crate::middleware::CspNonce;
use crate::routes::views::{Layout, ProductCardView};
use crate::services::shopper;
use crate::state::AppState;

/// Products per listing page.
pub const PRODUCTS_PER_PAGE: u32 = 12;

/// Pagination query parameters.
#[derive(Debug, Deserialize)]
pub struct PaginationQuery {
    pub page: Option<u32>,
}

/// Variant selection query parameters.
#[derive(Debug, Deserialize)]
pub struct VariantQuery {
    pub variant: Option<String>,
}

/// A size button on the product page.
#[derive(Clone)]
pub struct VariantView {
    pub id: String,
    pub title: String,
    pub price: String,
    pub selected: bool,
}

/// Product detail display data.
#[derive(Clone)]
pub struct ProductView {
    pub id: String,
    pub handle: String,
    pub title: String,
    pub subtitle: Option<String>,
    pub description: Option<String>,
    pub price: String,
    pub image: Option<String>,
    pub gallery: Vec<String>,
    pub selected_variant_id: Option<String>,
    pub purchasable: bool,
}

/// Product listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub layout: Layout,
    pub products: Vec<ProductCardView>,
    pub current_page: u32,
    pub has_previous: bool,
    pub has_more: bool,
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub layout: Layout,
    pub product: ProductView,
    pub variants: Vec<VariantView>,
    pub content: Option<ProductContent>,
    pub in_ledger: bool,
}

/// Display product listing page.
///
/// # Errors
///
/// Returns an error if the product page cannot be loaded.
#[instrument(skip(state, session, nonce))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    CspNonce(nonce): CspNonce,
    Query(query): Query<PaginationQuery>,
) -> Result<impl IntoResponse, AppError> {
    let current_page = query.page.unwrap_or(1).max(1);
    let offset = (current_page - 1).saturating_mul(PRODUCTS_PER_PAGE);

    let page = state
        .medusa()
        .list_products(PRODUCTS_PER_PAGE, offset)
        .await?;
    let ledger = shopper::ledger(&session).await?;

    Ok(ProductsIndexTemplate {
        layout: Layout::new(&state, nonce, "Shop All"),
        products: page
            .products
            .iter()
            .map(|product| ProductCardView::from_product(product, ledger.contains(&product.id)))
            .collect(),
        current_page,
        has_previous: page.has_previous(),
        has_more: page.has_more(),
    })
}

/// Display product detail page.
///
/// `?variant=` selects a size; unknown ids fall back to the first variant.
/// Editorial content is optional and a CMS outage only hides it.
///
/// # Errors
///
/// Returns 404 if no product has this handle.
#[instrument(skip(state, session, nonce))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    CspNonce(nonce): CspNonce,
    Path(handle): Path<String>,
    Query(query): Query<VariantQuery>,
) -> Result<impl IntoResponse, AppError> {
    let (product, content) = tokio::join!(
        state.medusa().get_product_by_handle(&handle),
        state.contentful().product_content(&handle),
    );
    let product = product?;
    let content = content.unwrap_or_else(|e| {
        tracing::warn!(handle = %handle, error = %e, "Product content unavailable");
        None
    });

    let ledger = shopper::ledger(&session).await?;
    let in_ledger = ledger.contains(&product.id);

    let layout = Layout::new(&state, nonce, product.title.clone()).with_description(
        content
            .as_ref()
            .and_then(|c| c.tagline.clone())
            .or_else(|| product.description.clone()),
    );

    Ok(ProductShowTemplate {
        layout,
        product: product_view(&product, content.as_ref(), query.variant.as_deref()),
        variants: variant_views(&product, query.variant.as_deref()),
        content,
        in_ledger,
    })
}

fn product_view(
    product: &Product,
    content: Option<&ProductContent>,
    variant_id: Option<&str>,
) -> ProductView {
    let selected = product.select_variant(variant_id);
    let price = selected
        .and_then(|variant| variant.price)
        .or_else(|| product.price());

    let mut gallery = content.map(|c| c.gallery.clone()).unwrap_or_default();
    if gallery.is_empty() {
        gallery.clone_from(&product.images);
    }

    ProductView {
        id: product.id.to_string(),
        handle: product.handle.clone(),
        title: product.title.clone(),
        subtitle: product.subtitle.clone(),
        description: product.description.clone(),
        price: price.map_or_else(|| "Unavailable".to_string(), |p| p.display()),
        image: product.image().map(String::from),
        gallery,
        selected_variant_id: selected.map(|variant| variant.id.to_string()),
        purchasable: price.is_some(),
    }
}

fn variant_views(product: &Product, variant_id: Option<&str>) -> Vec<VariantView> {
    if !product.has_variants() {
        return Vec::new();
    }

    let selected = product
        .select_variant(variant_id)
        .map(|variant| variant.id.clone());

    product
        .variants
        .iter()
        .map(|variant| VariantView {
            id: variant.id.to_string(),
            title: variant.title.clone(),
            price: variant
                .price
                .map_or_else(|| "Unavailable".to_string(), |p| p.display()),
            selected: selected.as_ref() == Some(&variant.id),
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use maison_core::{Price, ProductId, VariantId};
    use rust_decimal::Decimal;

    use super::*;
    use crate::medusa::ProductVariant;

    fn variant(id: &str, title: &str, price: i64) -> ProductVariant {
        ProductVariant {
            id: VariantId::new(id),
            title: title.to_string(),
            sku: None,
            options: Vec::new(),
            price: Some(Price::inr(Decimal::from(price))),
        }
    }

    fn diffuser() -> Product {
        Product {
            id: ProductId::new("prod_diffuser"),
            handle: "amber-diffuser".to_string(),
            title: "Amber Diffuser".to_string(),
            subtitle: None,
            description: Some("Warm amber".to_string()),
            thumbnail: Some("https://cdn.example.com/amber.jpg".to_string()),
            images: vec!["https://cdn.example.com/amber-2.jpg".to_string()],
            options: Vec::new(),
            variants: vec![
                variant("variant_100", "100ml", 1200),
                variant("variant_250", "250ml", 2400),
            ],
            category_handles: Vec::new(),
        }
    }

    #[test]
    fn test_variant_query_selects_size() {
        let product = diffuser();
        let view = product_view(&product, None, Some("variant_250"));
        assert_eq!(view.price, "₹2,400.00");
        assert_eq!(view.selected_variant_id.as_deref(), Some("variant_250"));

        let sizes = variant_views(&product, Some("variant_250"));
        assert_eq!(sizes.len(), 2);
        assert!(!sizes[0].selected);
        assert!(sizes[1].selected);
    }

    #[test]
    fn test_unknown_variant_falls_back_to_first() {
        let product = diffuser();
        let view = product_view(&product, None, Some("variant_missing"));
        assert_eq!(view.price, "₹1,200.00");
        assert!(variant_views(&product, Some("variant_missing"))[0].selected);
    }

    #[test]
    fn test_single_variant_has_no_size_picker() {
        let mut product = diffuser();
        product.variants.truncate(1);
        assert!(variant_views(&product, None).is_empty());
    }

    #[test]
    fn test_gallery_falls_back_to_product_images() {
        let product = diffuser();
        let view = product_view(&product, None, None);
        assert_eq!(view.gallery, product.images);
        assert!(view.purchasable);
    }
}
