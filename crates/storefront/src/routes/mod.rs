//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Home page
//! GET  /health                 - Health check
//! GET  /health/ready           - Readiness check (database)
//!
//! # Catalog
//! GET  /products               - Product listing (?page=)
//! GET  /products/{handle}      - Product detail (?variant=)
//! GET  /collections/{handle}   - Collection detail (?page=)
//!
//! # Cart (HTMX fragments)
//! GET  /cart                   - Cart page
//! POST /cart/add               - Add to cart (returns count, triggers cart-updated)
//! POST /cart/update            - Update quantity (returns cart_items fragment)
//! POST /cart/remove            - Remove item (returns cart_items fragment)
//! GET  /cart/count             - Cart count badge (fragment)
//!
//! # Ledger (HTMX fragments)
//! GET  /ledger                 - Saved items page
//! POST /ledger/toggle          - Save/unsave (returns button, triggers ledger-updated)
//! GET  /ledger/count           - Ledger count badge (fragment)
//!
//! # Checkout
//! GET  /checkout                         - Redirect to the current step
//! GET  /checkout/shipping                - Step 1
//! POST /checkout/shipping                - Submit step 1
//! POST /checkout/addresses/{id}/select   - Use a saved address
//! POST /checkout/addresses/{id}/default  - Make an address the default
//! POST /checkout/addresses/{id}/delete   - Delete a saved address
//! GET  /checkout/payment                 - Step 2
//! POST /checkout/payment                 - Submit step 2
//! GET  /checkout/review                  - Step 3
//! POST /checkout/back                    - Previous step
//! POST /checkout/coupon                  - Apply coupon (returns summary fragment)
//! POST /checkout/coupon/remove           - Remove coupon (returns summary fragment)
//! POST /checkout/place                   - Place order (JSON)
//! POST /checkout/verify                  - Verify Razorpay payment (JSON)
//! GET  /checkout/confirmation/{number}   - Order confirmation
//!
//! # Account
//! GET  /account/orders         - Orders placed from this session
//!
//! # Pages (Contentful)
//! GET  /pages/faq              - FAQ
//! GET  /pages/careers          - Careers
//! GET  /pages/{slug}           - Any other CMS page
//! ```

pub mod account;
pub mod cart;
pub mod checkout;
pub mod collections;
pub mod home;
pub mod ledger;
pub mod pages;
pub mod products;
pub mod views;

use axum::{
    Router,
    routing::{get, post},
};

use crate::middleware::{cart_rate_limiter, checkout_rate_limiter};
use crate::state::AppState;

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{handle}", get(products::show))
}

/// Create the collection routes router.
pub fn collection_routes() -> Router<AppState> {
    Router::new().route("/{handle}", get(collections::show))
}

/// Create the cart routes router.
///
/// Mutations share one rate limit bucket per client.
pub fn cart_routes() -> Router<AppState> {
    let mutations = Router::new()
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .layer(cart_rate_limiter());

    Router::new()
        .route("/", get(cart::show))
        .route("/count", get(cart::count))
        .merge(mutations)
}

/// Create the Ledger routes router.
pub fn ledger_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(ledger::show))
        .route("/count", get(ledger::count))
        .route("/toggle", post(ledger::toggle).layer(cart_rate_limiter()))
}

/// Create the checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    let placement = Router::new()
        .route("/place", post(checkout::place))
        .route("/verify", post(checkout::verify))
        .layer(checkout_rate_limiter());

    Router::new()
        .route("/", get(checkout::index))
        .route(
            "/shipping",
            get(checkout::shipping).post(checkout::submit_shipping),
        )
        .route(
            "/addresses/{id}/select",
            post(checkout::select_address),
        )
        .route(
            "/addresses/{id}/default",
            post(checkout::default_address),
        )
        .route(
            "/addresses/{id}/delete",
            post(checkout::delete_address),
        )
        .route(
            "/payment",
            get(checkout::payment).post(checkout::submit_payment),
        )
        .route("/review", get(checkout::review))
        .route("/back", post(checkout::back))
        .route("/coupon", post(checkout::apply_coupon))
        .route("/coupon/remove", post(checkout::remove_coupon))
        .route("/confirmation/{number}", get(checkout::confirmation))
        .merge(placement)
}

/// Create the account routes router.
pub fn account_routes() -> Router<AppState> {
    Router::new().route("/orders", get(account::orders))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Home page
        .route("/", get(home::home))
        // Catalog
        .nest("/products", product_routes())
        .nest("/collections", collection_routes())
        // Shopper state
        .nest("/cart", cart_routes())
        .nest("/ledger", ledger_routes())
        .nest("/checkout", checkout_routes())
        .nest("/account", account_routes())
        // CMS pages
        .nest("/pages", pages::router())
}
