//! Content page route handlers.
//!
//! FAQ, careers and free-form pages (privacy policy, terms, shipping) all
//! come from Contentful.

use std::collections::BTreeMap;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Router,
    extract::{Path, State},
    response::IntoResponse,
    routing::get,
};
use tracing::instrument;

use crate::contentful::{Faq, JobOpening};
use crate::error::AppError;
use crate::filters;
use crate::middleware::CspNonce;
use crate::routes::views::Layout;
use crate::state::AppState;

/// FAQ entries under one heading.
#[derive(Clone)]
pub struct FaqGroup {
    pub title: String,
    pub entries: Vec<Faq>,
}

/// FAQ page template.
#[derive(Template, WebTemplate)]
#[template(path = "pages/faq.html")]
pub struct FaqTemplate {
    pub layout: Layout,
    pub groups: Vec<FaqGroup>,
}

/// Careers page template.
#[derive(Template, WebTemplate)]
#[template(path = "pages/careers.html")]
pub struct CareersTemplate {
    pub layout: Layout,
    pub openings: Vec<JobOpening>,
}

/// Content page template.
#[derive(Template, WebTemplate)]
#[template(path = "pages/content.html")]
pub struct ContentPageTemplate {
    pub layout: Layout,
    pub title: String,
    pub content_html: String,
}

/// Group FAQs by category, keeping each group's entries in display order.
/// Uncategorised entries are listed under "General".
fn group_faqs(faqs: Vec<Faq>) -> Vec<FaqGroup> {
    let mut groups: BTreeMap<String, Vec<Faq>> = BTreeMap::new();
    for faq in faqs {
        let title = faq
            .category
            .clone()
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| "General".to_string());
        groups.entry(title).or_default().push(faq);
    }

    groups
        .into_iter()
        .map(|(title, mut entries)| {
            entries.sort_by_key(|faq| faq.order);
            FaqGroup { title, entries }
        })
        .collect()
}

/// Display the FAQ page.
///
/// # Errors
///
/// Never fails; a CMS outage renders an empty page.
#[instrument(skip(state, nonce))]
pub async fn faq(
    State(state): State<AppState>,
    CspNonce(nonce): CspNonce,
) -> Result<impl IntoResponse, AppError> {
    let faqs = state.contentful().faqs().await.unwrap_or_else(|e| {
        tracing::warn!("Failed to fetch FAQs: {e}");
        Vec::new()
    });

    Ok(FaqTemplate {
        layout: Layout::new(&state, nonce, "Frequently Asked Questions"),
        groups: group_faqs(faqs),
    })
}

/// Display the careers page.
///
/// # Errors
///
/// Never fails; a CMS outage renders an empty page.
#[instrument(skip(state, nonce))]
pub async fn careers(
    State(state): State<AppState>,
    CspNonce(nonce): CspNonce,
) -> Result<impl IntoResponse, AppError> {
    let openings = state.contentful().job_openings().await.unwrap_or_else(|e| {
        tracing::warn!("Failed to fetch job openings: {e}");
        Vec::new()
    });

    Ok(CareersTemplate {
        layout: Layout::new(&state, nonce, "Careers"),
        openings,
    })
}

/// Display a CMS page by slug.
///
/// # Errors
///
/// Returns 404 if the page doesn't exist, or an error if Contentful fails.
#[instrument(skip(state, nonce))]
pub async fn show(
    State(state): State<AppState>,
    CspNonce(nonce): CspNonce,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let page = state
        .contentful()
        .page(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Page {slug}")))?;

    let layout = Layout::new(&state, nonce, page.title.clone()).with_description(page.meta_description);

    Ok(ContentPageTemplate {
        layout,
        title: page.title,
        content_html: page.body_html,
    })
}

/// Create the pages routes router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/faq", get(faq))
        .route("/careers", get(careers))
        .route("/{slug}", get(show))
}
