//! Medusa Store API client implementation.
//!
//! Plain JSON over `reqwest`. Catalog reads (products, categories) are cached
//! with `moka` for 5 minutes; cart, payment and order calls never are.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use moka::future::Cache;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};

use crate::config::MedusaConfig;

use super::MedusaError;
use super::api::{
    self, ApiError, CartResponse, CategoriesResponse, CompleteCartResponse,
    PaymentCollectionResponse, ProductsResponse, ShippingOptionsResponse,
};
use super::cache::CacheValue;
use super::types::{
    Category, CompletedOrder, PaymentCollection, Product, ProductPage, ShippingOption,
    StoreAddress, StoreCart,
};

/// Fields requested for every product read so variants carry region prices.
const PRODUCT_FIELDS: &str = "*variants.calculated_price,*variants.options,*options,*images,*categories";

// =============================================================================
// MedusaClient
// =============================================================================

/// Client for the Medusa Store API.
///
/// Cheap to clone; all clones share one connection pool and cache.
#[derive(Clone)]
pub struct MedusaClient {
    inner: Arc<MedusaClientInner>,
}

struct MedusaClientInner {
    client: reqwest::Client,
    base_url: String,
    publishable_key: String,
    region_id: String,
    payment_provider: String,
    cache: Cache<String, CacheValue>,
}

/// Request body for `PUT`-style cart updates.
#[derive(Debug, Serialize)]
struct UpdateCartBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    email: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    shipping_address: Option<&'a StoreAddress>,
    #[serde(skip_serializing_if = "Option::is_none")]
    billing_address: Option<&'a StoreAddress>,
}

impl MedusaClient {
    /// Create a new Store API client.
    #[must_use]
    pub fn new(config: &MedusaConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .connect_timeout(Duration::from_secs(5))
            .build()
            .unwrap_or_default();

        Self {
            inner: Arc::new(MedusaClientInner {
                client,
                base_url: config.backend_url.clone(),
                publishable_key: config.publishable_key.clone(),
                region_id: config.region_id.clone(),
                payment_provider: config.payment_provider.clone(),
                cache,
            }),
        }
    }

    /// Region new carts are created in.
    #[must_use]
    pub fn region_id(&self) -> &str {
        &self.inner.region_id
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.inner.base_url)
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, MedusaError> {
        let response = self
            .inner
            .client
            .get(self.url(path))
            .header("x-publishable-api-key", &self.inner.publishable_key)
            .query(query)
            .send()
            .await?;
        Self::parse(response).await
    }

    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, MedusaError> {
        let response = self
            .inner
            .client
            .post(self.url(path))
            .header("x-publishable-api-key", &self.inner.publishable_key)
            .json(body)
            .send()
            .await?;
        Self::parse(response).await
    }

    /// Map status codes to errors and decode the body.
    async fn parse<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, MedusaError> {
        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(MedusaError::RateLimited(retry_after));
        }

        let response_text = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ApiError>(&response_text)
                .map(|e| e.message)
                .ok()
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| response_text.chars().take(200).collect());

            if status == reqwest::StatusCode::NOT_FOUND {
                return Err(MedusaError::NotFound(message));
            }

            tracing::error!(
                status = %status,
                body = %response_text.chars().take(500).collect::<String>(),
                "Medusa API returned non-success status"
            );
            return Err(MedusaError::Api {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&response_text).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %response_text.chars().take(500).collect::<String>(),
                "Failed to parse Medusa response"
            );
            MedusaError::Parse(e)
        })
    }

    // =========================================================================
    // Product Methods
    // =========================================================================

    /// Get a product by its handle.
    ///
    /// # Errors
    ///
    /// Returns `MedusaError::NotFound` if no product has that handle, or an
    /// error if the API request fails.
    #[instrument(skip(self), fields(handle = %handle))]
    pub async fn get_product_by_handle(&self, handle: &str) -> Result<Product, MedusaError> {
        let cache_key = format!("product:{handle}");

        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let data: ProductsResponse = self
            .get(
                "/store/products",
                &[
                    ("handle", handle),
                    ("region_id", &self.inner.region_id),
                    ("fields", PRODUCT_FIELDS),
                ],
            )
            .await?;

        let product = data
            .products
            .into_iter()
            .next()
            .map(api::convert_product)
            .ok_or_else(|| MedusaError::NotFound(format!("Product not found: {handle}")))?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Product(Box::new(product.clone())))
            .await;

        Ok(product)
    }

    /// Get a page of products.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn list_products(&self, limit: u32, offset: u32) -> Result<ProductPage, MedusaError> {
        self.list_products_filtered(None, limit, offset).await
    }

    /// Get a page of products in one category.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn list_products_in_category(
        &self,
        category_id: &str,
        limit: u32,
        offset: u32,
    ) -> Result<ProductPage, MedusaError> {
        self.list_products_filtered(Some(category_id), limit, offset)
            .await
    }

    async fn list_products_filtered(
        &self,
        category_id: Option<&str>,
        limit: u32,
        offset: u32,
    ) -> Result<ProductPage, MedusaError> {
        let cache_key = format!("products:{}:{limit}:{offset}", category_id.unwrap_or(""));

        if let Some(CacheValue::Products(page)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for products");
            return Ok(page);
        }

        let limit_param = limit.to_string();
        let offset_param = offset.to_string();
        let mut query = vec![
            ("limit", limit_param.as_str()),
            ("offset", offset_param.as_str()),
            ("region_id", self.inner.region_id.as_str()),
            ("fields", PRODUCT_FIELDS),
        ];
        if let Some(category_id) = category_id {
            query.push(("category_id[]", category_id));
        }

        let data: ProductsResponse = self.get("/store/products", &query).await?;

        let page = ProductPage {
            products: data.products.into_iter().map(api::convert_product).collect(),
            count: data.count,
            offset: data.offset,
            limit: if data.limit == 0 { limit } else { data.limit },
        };

        self.inner
            .cache
            .insert(cache_key, CacheValue::Products(page.clone()))
            .await;

        Ok(page)
    }

    /// Fetch several products concurrently, keeping the input order.
    ///
    /// Lookups that fail are logged and skipped so one missing product does
    /// not empty the whole list.
    #[instrument(skip(self, handles), fields(count = handles.len()))]
    pub async fn get_products_by_handles(&self, handles: &[String]) -> Vec<Product> {
        let lookups = handles
            .iter()
            .map(|handle| self.get_product_by_handle(handle));

        join_all(lookups)
            .await
            .into_iter()
            .zip(handles)
            .filter_map(|(result, handle)| match result {
                Ok(product) => Some(product),
                Err(e) => {
                    warn!(handle = %handle, error = %e, "Skipping product that failed to load");
                    None
                }
            })
            .collect()
    }

    // =========================================================================
    // Category Methods
    // =========================================================================

    /// Get a product category by its handle.
    ///
    /// # Errors
    ///
    /// Returns `MedusaError::NotFound` if no category has that handle, or an
    /// error if the API request fails.
    #[instrument(skip(self), fields(handle = %handle))]
    pub async fn get_category_by_handle(&self, handle: &str) -> Result<Category, MedusaError> {
        let cache_key = format!("category:{handle}");

        if let Some(CacheValue::Category(category)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for category");
            return Ok(*category);
        }

        let data: CategoriesResponse = self
            .get("/store/product-categories", &[("handle", handle)])
            .await?;

        let category = data
            .product_categories
            .into_iter()
            .next()
            .map(api::convert_category)
            .ok_or_else(|| MedusaError::NotFound(format!("Category not found: {handle}")))?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Category(Box::new(category.clone())))
            .await;

        Ok(category)
    }

    // =========================================================================
    // Cart Methods
    // =========================================================================

    /// Create a cart in the configured region.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, email))]
    pub async fn create_cart(&self, email: Option<&str>) -> Result<StoreCart, MedusaError> {
        let body = serde_json::json!({
            "region_id": self.inner.region_id,
            "email": email,
        });
        let data: CartResponse = self.post("/store/carts", &body).await?;
        Ok(api::convert_cart(data.cart))
    }

    /// Add a line item to a cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn add_line_item(
        &self,
        cart_id: &str,
        variant_id: &str,
        quantity: u32,
    ) -> Result<StoreCart, MedusaError> {
        let body = serde_json::json!({
            "variant_id": variant_id,
            "quantity": quantity,
        });
        let data: CartResponse = self
            .post(&format!("/store/carts/{cart_id}/line-items"), &body)
            .await?;
        Ok(api::convert_cart(data.cart))
    }

    /// Set the contact email and addresses on a cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, email, shipping_address, billing_address))]
    pub async fn update_cart(
        &self,
        cart_id: &str,
        email: Option<&str>,
        shipping_address: Option<&StoreAddress>,
        billing_address: Option<&StoreAddress>,
    ) -> Result<StoreCart, MedusaError> {
        let body = UpdateCartBody {
            email,
            shipping_address,
            billing_address,
        };
        let data: CartResponse = self
            .post(&format!("/store/carts/{cart_id}"), &body)
            .await?;
        Ok(api::convert_cart(data.cart))
    }

    /// Shipping options available for a cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn list_shipping_options(
        &self,
        cart_id: &str,
    ) -> Result<Vec<ShippingOption>, MedusaError> {
        let data: ShippingOptionsResponse = self
            .get("/store/shipping-options", &[("cart_id", cart_id)])
            .await?;
        Ok(data
            .shipping_options
            .into_iter()
            .map(api::convert_shipping_option)
            .collect())
    }

    /// Attach a shipping method to a cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn add_shipping_method(
        &self,
        cart_id: &str,
        option_id: &str,
    ) -> Result<StoreCart, MedusaError> {
        let body = serde_json::json!({ "option_id": option_id });
        let data: CartResponse = self
            .post(&format!("/store/carts/{cart_id}/shipping-methods"), &body)
            .await?;
        Ok(api::convert_cart(data.cart))
    }

    // =========================================================================
    // Payment and Order Methods
    // =========================================================================

    /// Create the payment collection for a cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn create_payment_collection(
        &self,
        cart_id: &str,
    ) -> Result<PaymentCollection, MedusaError> {
        let body = serde_json::json!({ "cart_id": cart_id });
        let data: PaymentCollectionResponse =
            self.post("/store/payment-collections", &body).await?;
        Ok(api::convert_payment_collection(data.payment_collection))
    }

    /// Initialize a payment session with the configured provider.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn create_payment_session(
        &self,
        collection_id: &str,
    ) -> Result<PaymentCollection, MedusaError> {
        let body = serde_json::json!({ "provider_id": self.inner.payment_provider });
        let data: PaymentCollectionResponse = self
            .post(
                &format!("/store/payment-collections/{collection_id}/payment-sessions"),
                &body,
            )
            .await?;
        Ok(api::convert_payment_collection(data.payment_collection))
    }

    /// Complete a cart, turning it into an order.
    ///
    /// # Errors
    ///
    /// Returns `MedusaError::CartNotCompleted` when the backend returns the
    /// cart instead of an order, or an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn complete_cart(&self, cart_id: &str) -> Result<CompletedOrder, MedusaError> {
        let data: CompleteCartResponse = self
            .post(
                &format!("/store/carts/{cart_id}/complete"),
                &serde_json::json!({}),
            )
            .await?;

        match data {
            CompleteCartResponse::Order { order } => Ok(api::convert_order(order)),
            CompleteCartResponse::Cart { error } => Err(MedusaError::CartNotCompleted(
                error
                    .map(|e| e.message)
                    .filter(|m| !m.is_empty())
                    .unwrap_or_else(|| "Cart could not be completed".to_string()),
            )),
        }
    }
}
