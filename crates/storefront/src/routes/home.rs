//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tower_sessions::Session;
use tracing::instrument;

use crate::contentful::{HeroSlide, HomepageSection};
use crate::error::AppError;
use crate::filters;
use crate::middleware::CspNonce;
use crate::routes::views::{Layout, ProductCardView};
use crate::services::shopper;
use crate::state::AppState;

/// Number of products in the featured grid.
const FEATURED_PRODUCT_COUNT: u32 = 8;

/// Homepage section whose product handles fill the featured grid.
const FEATURED_SECTION_KEY: &str = "featured";

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub layout: Layout,
    /// Hero carousel slides, in display order.
    pub hero_slides: Vec<HeroSlide>,
    /// Editorial sections other than the featured grid.
    pub sections: Vec<HomepageSection>,
    pub featured_title: String,
    pub featured_products: Vec<ProductCardView>,
}

/// Display the home page.
///
/// CMS failures degrade to an empty hero and no sections; the featured grid
/// falls back to the newest catalog products.
///
/// # Errors
///
/// Returns an error if the session store fails.
#[instrument(skip(state, session, nonce))]
pub async fn home(
    State(state): State<AppState>,
    session: Session,
    CspNonce(nonce): CspNonce,
) -> Result<impl IntoResponse, AppError> {
    let (hero_slides, sections) = tokio::join!(
        state.contentful().hero_slides(),
        state.contentful().homepage_sections(),
    );

    let hero_slides = hero_slides.unwrap_or_else(|e| {
        tracing::warn!("Failed to fetch hero slides: {e}");
        Vec::new()
    });
    let mut sections = sections.unwrap_or_else(|e| {
        tracing::warn!("Failed to fetch homepage sections: {e}");
        Vec::new()
    });

    let featured = sections
        .iter()
        .position(|section| section.section_key == FEATURED_SECTION_KEY)
        .map(|index| sections.remove(index));

    let featured_title = featured
        .as_ref()
        .map_or_else(|| "Bestsellers".to_string(), |section| section.title.clone());

    let products = match featured.filter(|section| !section.product_handles.is_empty()) {
        Some(section) => {
            state
                .medusa()
                .get_products_by_handles(&section.product_handles)
                .await
        }
        None => state
            .medusa()
            .list_products(FEATURED_PRODUCT_COUNT, 0)
            .await
            .map_or_else(
                |e| {
                    tracing::error!("Failed to fetch featured products: {e}");
                    Vec::new()
                },
                |page| page.products,
            ),
    };

    let ledger = shopper::ledger(&session).await?;

    Ok(HomeTemplate {
        layout: Layout::new(&state, nonce, "Home Fragrance & Self-Care"),
        hero_slides,
        sections,
        featured_title,
        featured_products: products
            .iter()
            .map(|product| ProductCardView::from_product(product, ledger.contains(&product.id)))
            .collect(),
    })
}
