//! Ledger (saved items) route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Response},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use maison_core::ProductId;
use maison_core::ledger::{LedgerItem, Toggled};

use crate::error::AppError;
use crate::filters;
use crate::htmx::{LEDGER_UPDATED, ToastLevel, Triggers};
use crate::middleware::CspNonce;
use crate::routes::views::{Layout, ProductCardView};
use crate::services::shopper;
use crate::state::AppState;

/// Toggle form data.
#[derive(Debug, Deserialize)]
pub struct ToggleForm {
    pub product_id: String,
    pub handle: String,
}

/// Ledger page template.
#[derive(Template, WebTemplate)]
#[template(path = "ledger/show.html")]
pub struct LedgerShowTemplate {
    pub layout: Layout,
    pub items: Vec<ProductCardView>,
}

/// Save/unsave button fragment (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/ledger_button.html")]
pub struct LedgerButtonTemplate {
    pub product_id: String,
    pub handle: String,
    pub saved: bool,
}

/// Ledger count badge fragment (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/ledger_count.html")]
pub struct LedgerCountTemplate {
    pub count: usize,
}

/// Display the Ledger page.
///
/// # Errors
///
/// Returns an error if the session store fails.
#[instrument(skip(state, session, nonce))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    CspNonce(nonce): CspNonce,
) -> Result<impl IntoResponse, AppError> {
    let ledger = shopper::ledger(&session).await?;

    Ok(LedgerShowTemplate {
        layout: Layout::new(&state, nonce, "Your Ledger"),
        items: ledger
            .items()
            .iter()
            .map(ProductCardView::from_ledger_item)
            .collect(),
    })
}

/// Save or unsave a product (HTMX).
///
/// Unsaving never touches the catalog; saving snapshots the product's
/// current name, price and image.
///
/// # Errors
///
/// Returns `AppError::Medusa` if a product being saved cannot be loaded.
#[instrument(skip(state, session), fields(handle = %form.handle))]
pub async fn toggle(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<ToggleForm>,
) -> Result<Response, AppError> {
    let mut ledger = shopper::ledger(&session).await?;
    let product_id = ProductId::new(form.product_id);

    let (toggled, name) = if ledger.contains(&product_id) {
        let name = ledger
            .items()
            .iter()
            .find(|item| item.id == product_id)
            .map_or_else(|| form.handle.clone(), |item| item.name.clone());
        ledger.remove(&product_id);
        (Toggled::Removed, name)
    } else {
        let product = state.medusa().get_product_by_handle(&form.handle).await?;
        let item = LedgerItem {
            id: product.id.clone(),
            handle: product.handle.clone(),
            name: product.title.clone(),
            price: product.price().map_or(Decimal::ZERO, |price| price.amount),
            image: product.image().map(String::from),
        };
        (ledger.toggle(item), product.title)
    };
    shopper::save_ledger(&session, &ledger).await?;

    tracing::info!(saved = toggled.is_saved(), count = ledger.len(), "Ledger toggled");

    let message = if toggled.is_saved() {
        format!("{name} saved to your Ledger")
    } else {
        format!("{name} removed from your Ledger")
    };
    let triggers = Triggers::new()
        .event(LEDGER_UPDATED)
        .toast(ToastLevel::Success, message);

    Ok((
        triggers,
        LedgerButtonTemplate {
            product_id: product_id.into_inner(),
            handle: form.handle,
            saved: toggled.is_saved(),
        },
    )
        .into_response())
}

/// Get Ledger count badge (HTMX).
///
/// # Errors
///
/// Returns an error if the session store fails.
#[instrument(skip(session))]
pub async fn count(session: Session) -> Result<impl IntoResponse, AppError> {
    let ledger = shopper::ledger(&session).await?;
    Ok(LedgerCountTemplate {
        count: ledger.len(),
    })
}
