//! Cart route handlers.
//!
//! Cart operations use HTMX for dynamic updates without full page reloads.
//! The cart lives in the session; prices are snapshotted from the cached
//! Medusa product when a line is added.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use maison_core::cart::{CartItem, QuantityChange, clamp_quantity};

use crate::error::AppError;
use crate::filters;
use crate::htmx::{CART_UPDATED, ToastLevel, Triggers};
use crate::middleware::CspNonce;
use crate::routes::views::{CartView, Layout};
use crate::services::shopper;
use crate::state::AppState;

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub handle: String,
    pub variant_id: Option<String>,
    pub quantity: Option<i64>,
}

/// Update cart form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub line_id: String,
    pub quantity: i64,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub line_id: String,
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub layout: Layout,
    pub cart: CartView,
}

/// Cart items fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_items.html")]
pub struct CartItemsTemplate {
    pub cart: CartView,
}

/// Cart count badge fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u32,
}

/// Current cart with the coupon the shopper applied at checkout, if any.
async fn cart_view(session: &Session) -> Result<CartView, AppError> {
    let cart = shopper::cart(session).await?;
    let checkout = shopper::checkout(session).await?;
    Ok(CartView::new(&cart, checkout.coupon.as_ref()))
}

/// Display cart page.
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
    Ok(CartShowTemplate {
        layout: Layout::new(&state, nonce, "Your Bag"),
        cart: cart_view(&session).await?,
    })
}

/// Add item to cart (HTMX).
///
/// The quantity is clamped to `[1, 10]` and merged into an existing line for
/// the same variant. Returns the updated count badge and triggers
/// `cart-updated` plus a toast.
///
/// # Errors
///
/// Returns `AppError::Medusa` for an unknown product and
/// `AppError::BadRequest` for an unknown or unpriced variant.
#[instrument(skip(state, session), fields(handle = %form.handle))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<AddToCartForm>,
) -> Result<Response, AppError> {
    let product = state.medusa().get_product_by_handle(&form.handle).await?;

    let requested_variant = form.variant_id.as_deref().filter(|id| !id.is_empty());
    let variant = match requested_variant {
        Some(id) => Some(
            product
                .variants
                .iter()
                .find(|variant| variant.id.as_str() == id)
                .ok_or_else(|| AppError::BadRequest("That size is no longer available".to_string()))?,
        ),
        None => product.select_variant(None),
    };

    let price = variant
        .and_then(|variant| variant.price)
        .or_else(|| product.price())
        .ok_or_else(|| {
            AppError::BadRequest(format!("{} is not available right now", product.title))
        })?;

    let quantity = clamp_quantity(form.quantity.unwrap_or(1)).max(1);

    let item = CartItem {
        id: product.id.clone(),
        variant_id: variant.map(|v| v.id.clone()),
        handle: product.handle.clone(),
        name: product.title.clone(),
        variant_title: variant
            .filter(|_| product.has_variants())
            .map(|v| v.title.clone()),
        price: price.amount,
        quantity,
        image: product.image().map(String::from),
    };

    let mut cart = shopper::cart(&session).await?;
    cart.add(item);
    shopper::save_cart(&session, &cart).await?;

    tracing::info!(
        product = %product.handle,
        quantity,
        item_count = cart.item_count(),
        "Added to cart"
    );

    let triggers = Triggers::new()
        .event(CART_UPDATED)
        .toast(ToastLevel::Success, format!("{} added to your bag", product.title));

    Ok((
        triggers,
        CartCountTemplate {
            count: cart.item_count(),
        },
    )
        .into_response())
}

/// Update cart item quantity (HTMX).
///
/// Quantities are clamped to `[0, 10]`; zero removes the line.
///
/// # Errors
///
/// Returns an error if the session store fails.
#[instrument(skip(session))]
pub async fn update(session: Session, Form(form): Form<UpdateCartForm>) -> Result<Response, AppError> {
    let mut cart = shopper::cart(&session).await?;

    let triggers = match cart.set_quantity(&form.line_id, form.quantity) {
        QuantityChange::Updated(_) => Triggers::new().event(CART_UPDATED),
        QuantityChange::Removed => Triggers::new()
            .event(CART_UPDATED)
            .toast(ToastLevel::Info, "Removed from your bag"),
        QuantityChange::Missing => {
            Triggers::new().toast(ToastLevel::Error, "That item is no longer in your bag")
        }
    };
    shopper::save_cart(&session, &cart).await?;

    Ok((
        triggers,
        CartItemsTemplate {
            cart: cart_view(&session).await?,
        },
    )
        .into_response())
}

/// Remove item from cart (HTMX).
///
/// # Errors
///
/// Returns an error if the session store fails.
#[instrument(skip(session))]
pub async fn remove(
    session: Session,
    Form(form): Form<RemoveFromCartForm>,
) -> Result<Response, AppError> {
    let mut cart = shopper::cart(&session).await?;
    let removed = cart.remove(&form.line_id);
    shopper::save_cart(&session, &cart).await?;

    let triggers = if removed {
        Triggers::new()
            .event(CART_UPDATED)
            .toast(ToastLevel::Info, "Removed from your bag")
    } else {
        Triggers::new()
    };

    Ok((
        triggers,
        CartItemsTemplate {
            cart: cart_view(&session).await?,
        },
    )
        .into_response())
}

/// Get cart count badge (HTMX).
///
/// # Errors
///
/// Returns an error if the session store fails.
#[instrument(skip(session))]
pub async fn count(session: Session) -> Result<impl IntoResponse, AppError> {
    let cart = shopper::cart(&session).await?;
    Ok(CartCountTemplate {
        count: cart.item_count(),
    })
}
