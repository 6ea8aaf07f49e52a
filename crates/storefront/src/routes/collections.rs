//! Collection route handlers.
//!
//! A collection is either curated in Contentful (an ordered list of product
//! handles) or a Medusa product category with the same handle. Curated
//! content wins; the category supplies products when the CMS lists none.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use tower_sessions::Session;
use tracing::instrument;

use crate::contentful::CollectionContent;
use crate::error::AppError;
use crate::filters;
use crate::medusa::{Category, MedusaError, Product};
use crate::middleware::CspNonce;
use crate::routes::products::{PRODUCTS_PER_PAGE, PaginationQuery};
use crate::routes::views::{Layout, ProductCardView};
use crate::services::shopper;
use crate::state::AppState;

/// Collection display data for templates.
#[derive(Clone)]
pub struct CollectionView {
    pub handle: String,
    pub title: String,
    pub description_html: Option<String>,
    pub banner_url: Option<String>,
}

/// Collection detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "collections/show.html")]
pub struct CollectionShowTemplate {
    pub layout: Layout,
    pub collection: CollectionView,
    pub products: Vec<ProductCardView>,
    pub current_page: u32,
    pub has_previous: bool,
    pub has_more: bool,
}

impl CollectionView {
    fn new(handle: &str, content: Option<&CollectionContent>, category: Option<&Category>) -> Self {
        let title = content
            .map(|c| c.title.clone())
            .or_else(|| category.map(|c| c.name.clone()))
            .unwrap_or_else(|| handle.to_string());

        Self {
            handle: handle.to_string(),
            title,
            description_html: content.and_then(|c| c.description_html.clone()).or_else(|| {
                category
                    .and_then(|c| c.description.as_deref())
                    .map(crate::contentful::rich_text::escape_html)
            }),
            banner_url: content.and_then(|c| c.banner_url.clone()),
        }
    }
}

/// Display collection detail page with products.
///
/// # Errors
///
/// Returns 404 when neither the CMS nor the catalog knows the handle.
#[instrument(skip(state, session, nonce))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    CspNonce(nonce): CspNonce,
    Path(handle): Path<String>,
    Query(query): Query<PaginationQuery>,
) -> Result<impl IntoResponse, AppError> {
    let current_page = query.page.unwrap_or(1).max(1);

    let content = state
        .contentful()
        .collection(&handle)
        .await
        .unwrap_or_else(|e| {
            tracing::warn!(handle = %handle, error = %e, "Collection content unavailable");
            None
        });

    let curated = content
        .as_ref()
        .filter(|c| !c.product_handles.is_empty());

    let (category, products, has_previous, has_more): (Option<Category>, Vec<Product>, bool, bool) =
        if let Some(curated) = curated {
            let products = state
                .medusa()
                .get_products_by_handles(&curated.product_handles)
                .await;
            (None, products, false, false)
        } else {
            match state.medusa().get_category_by_handle(&handle).await {
                Ok(category) => {
                    let offset = (current_page - 1).saturating_mul(PRODUCTS_PER_PAGE);
                    let page = state
                        .medusa()
                        .list_products_in_category(&category.id, PRODUCTS_PER_PAGE, offset)
                        .await?;
                    let (has_previous, has_more) = (page.has_previous(), page.has_more());
                    (Some(category), page.products, has_previous, has_more)
                }
                Err(MedusaError::NotFound(_)) if content.is_some() => {
                    tracing::warn!(handle = %handle, "Collection has no products");
                    (None, Vec::new(), false, false)
                }
                Err(e) => return Err(e.into()),
            }
        };

    let ledger = shopper::ledger(&session).await?;
    let collection = CollectionView::new(&handle, content.as_ref(), category.as_ref());

    let layout = Layout::new(&state, nonce, collection.title.clone());

    Ok(CollectionShowTemplate {
        layout,
        collection,
        products: products
            .iter()
            .map(|product| ProductCardView::from_product(product, ledger.contains(&product.id)))
            .collect(),
        current_page,
        has_previous,
        has_more,
    })
}
