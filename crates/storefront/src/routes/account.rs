//! Account route handlers.
//!
//! There are no shopper accounts; the session is the identity, so order
//! history lists the orders this session placed.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tower_sessions::Session;
use tracing::instrument;

use crate::db::OrderRepository;
use crate::error::AppError;
use crate::filters;
use crate::middleware::CspNonce;
use crate::routes::views::{Layout, OrderView};
use crate::services::shopper;
use crate::state::AppState;

/// Order history page template.
#[derive(Template, WebTemplate)]
#[template(path = "account/orders.html")]
pub struct OrdersTemplate {
    pub layout: Layout,
    pub orders: Vec<OrderView>,
}

/// Display order history for this session.
///
/// # Errors
///
/// Returns an error if the session store or database fails.
#[instrument(skip(state, session, nonce))]
pub async fn orders(
    State(state): State<AppState>,
    session: Session,
    CspNonce(nonce): CspNonce,
) -> Result<impl IntoResponse, AppError> {
    let history = shopper::order_history(&session).await?;
    let orders = OrderRepository::new(state.pool())
        .list_by_numbers(&history)
        .await?;

    Ok(OrdersTemplate {
        layout: Layout::new(&state, nonce, "Your Orders"),
        orders: orders.iter().map(OrderView::from).collect(),
    })
}
