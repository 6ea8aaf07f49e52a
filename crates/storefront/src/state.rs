//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::StorefrontConfig;
use crate::contentful::ContentfulClient;
use crate::medusa::MedusaClient;
use crate::razorpay::RazorpayClient;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and API clients.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: PgPool,
    medusa: MedusaClient,
    contentful: ContentfulClient,
    razorpay: RazorpayClient,
}

impl AppState {
    /// Create a new application state, building the API clients from `config`.
    #[must_use]
    pub fn new(config: StorefrontConfig, pool: PgPool) -> Self {
        let medusa = MedusaClient::new(&config.medusa);
        let contentful = ContentfulClient::new(&config.contentful);
        let razorpay = RazorpayClient::new(&config.razorpay);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                medusa,
                contentful,
                razorpay,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the Medusa Store API client.
    #[must_use]
    pub fn medusa(&self) -> &MedusaClient {
        &self.inner.medusa
    }

    /// Get a reference to the Contentful Delivery API client.
    #[must_use]
    pub fn contentful(&self) -> &ContentfulClient {
        &self.inner.contentful
    }

    /// Get a reference to the Razorpay client.
    #[must_use]
    pub fn razorpay(&self) -> &RazorpayClient {
        &self.inner.razorpay
    }
}
