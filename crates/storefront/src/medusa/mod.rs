//! Medusa commerce backend client.
//!
//! # Architecture
//!
//! - Medusa is the source of truth for the catalog, carts and orders
//! - The shopper's working cart lives in the session; a backend cart is only
//!   built from it when an order is placed
//! - In-memory caching via `moka` for catalog responses (5 minute TTL)
//!
//! # Example
//!
//! ```rust,ignore
//! use maison_storefront::medusa::MedusaClient;
//!
//! let client = MedusaClient::new(&config.medusa);
//! let product = client.get_product_by_handle("oud-candle").await?;
//!
//! let cart = client.create_cart(Some("asha@example.com")).await?;
//! let cart = client.add_line_item(&cart.id, product.variants[0].id.as_str(), 1).await?;
//! let order = client.complete_cart(&cart.id).await?;
//! ```

mod api;
mod cache;
mod client;
pub mod types;

pub use client::MedusaClient;
pub use types::*;

use thiserror::Error;

/// Errors that can occur when talking to the Medusa Store API.
#[derive(Debug, Error)]
pub enum MedusaError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The backend rejected the request.
    #[error("Medusa API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Rate limited by the backend.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Completing the cart did not produce an order.
    #[error("Cart not completed: {0}")]
    CartNotCompleted(String),

    /// The backend offered no way to ship the cart.
    #[error("No shipping options available for cart {0}")]
    NoShippingOptions(String),
}
