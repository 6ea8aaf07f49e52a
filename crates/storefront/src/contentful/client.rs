//! Contentful Delivery API client.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use secrecy::ExposeSecret;
use tracing::{debug, instrument};

use crate::config::ContentfulConfig;

use super::ContentfulError;
use super::types::{
    CollectionContent, ContentPage, EntryCollection, Faq, Fields, HeroSlide, HomepageSection,
    JobOpening, ProductContent,
};

/// Client for the Contentful Delivery API.
///
/// Entry queries are cached for 5 minutes, keyed by content type and filters.
#[derive(Clone)]
pub struct ContentfulClient {
    inner: Arc<ContentfulClientInner>,
}

struct ContentfulClientInner {
    client: reqwest::Client,
    entries_url: String,
    access_token: String,
    cache: Cache<String, Arc<EntryCollection>>,
}

impl ContentfulClient {
    /// Create a new Delivery API client.
    #[must_use]
    pub fn new(config: &ContentfulConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(500)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();

        let entries_url = format!(
            "{}/spaces/{}/environments/{}/entries",
            config.cdn_url, config.space_id, config.environment
        );

        Self {
            inner: Arc::new(ContentfulClientInner {
                client,
                entries_url,
                access_token: config.access_token.expose_secret().to_string(),
                cache,
            }),
        }
    }

    /// Query entries of one content type with `fields.*` filters.
    async fn entries(
        &self,
        content_type: &str,
        filters: &[(&str, &str)],
        limit: u32,
    ) -> Result<Arc<EntryCollection>, ContentfulError> {
        let cache_key = format!("{content_type}:{filters:?}:{limit}");

        if let Some(entries) = self.inner.cache.get(&cache_key).await {
            debug!(content_type, "Cache hit for entries");
            return Ok(entries);
        }

        let limit_param = limit.to_string();
        let mut query: Vec<(String, &str)> = vec![
            ("content_type".to_string(), content_type),
            ("include".to_string(), "2"),
            ("limit".to_string(), limit_param.as_str()),
        ];
        query.extend(
            filters
                .iter()
                .map(|(field, value)| (format!("fields.{field}"), *value)),
        );

        let response = self
            .inner
            .client
            .get(&self.inner.entries_url)
            .bearer_auth(&self.inner.access_token)
            .query(&query)
            .send()
            .await?;

        let status = response.status();
        let response_text = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                content_type,
                body = %response_text.chars().take(500).collect::<String>(),
                "Contentful returned non-success status"
            );
            return Err(ContentfulError::Api {
                status: status.as_u16(),
                message: response_text.chars().take(200).collect(),
            });
        }

        let entries: EntryCollection = serde_json::from_str(&response_text)?;
        let entries = Arc::new(entries);

        self.inner
            .cache
            .insert(cache_key, Arc::clone(&entries))
            .await;

        Ok(entries)
    }

    /// Map each entry with `convert`, dropping entries missing required fields.
    async fn collect<T>(
        &self,
        content_type: &str,
        filters: &[(&str, &str)],
        limit: u32,
        convert: impl Fn(&Fields<'_>) -> Option<T>,
    ) -> Result<Vec<T>, ContentfulError> {
        let entries = self.entries(content_type, filters, limit).await?;
        Ok(entries
            .items
            .iter()
            .filter_map(|entry| convert(&Fields::new(entry, &entries.includes.assets)))
            .collect())
    }

    /// Active homepage hero slides, in display order.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn hero_slides(&self) -> Result<Vec<HeroSlide>, ContentfulError> {
        let mut slides = self
            .collect("heroSlide", &[("active", "true")], 10, HeroSlide::from_fields)
            .await?;
        slides.sort_by_key(|slide| slide.order);
        Ok(slides)
    }

    /// Active homepage sections, in display order.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn homepage_sections(&self) -> Result<Vec<HomepageSection>, ContentfulError> {
        let mut sections = self
            .collect(
                "homepageSection",
                &[("isActive", "true")],
                20,
                HomepageSection::from_fields,
            )
            .await?;
        sections.sort_by_key(|section| section.order);
        Ok(sections)
    }

    /// One active homepage section by key.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn homepage_section(
        &self,
        section_key: &str,
    ) -> Result<Option<HomepageSection>, ContentfulError> {
        let sections = self
            .collect(
                "homepageSection",
                &[("sectionKey", section_key), ("isActive", "true")],
                1,
                HomepageSection::from_fields,
            )
            .await?;
        Ok(sections.into_iter().next())
    }

    /// Editorial content for a product.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn product_content(
        &self,
        product_handle: &str,
    ) -> Result<Option<ProductContent>, ContentfulError> {
        let content = self
            .collect(
                "productContent",
                &[("productHandle", product_handle)],
                1,
                ProductContent::from_fields,
            )
            .await?;
        Ok(content.into_iter().next())
    }

    /// A curated collection by handle.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn collection(
        &self,
        handle: &str,
    ) -> Result<Option<CollectionContent>, ContentfulError> {
        let collections = self
            .collect(
                "collection",
                &[("handle", handle)],
                1,
                CollectionContent::from_fields,
            )
            .await?;
        Ok(collections.into_iter().next())
    }

    /// All FAQ entries, in display order.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn faqs(&self) -> Result<Vec<Faq>, ContentfulError> {
        let mut faqs = self.collect("faq", &[], 100, Faq::from_fields).await?;
        faqs.sort_by_key(|faq| faq.order);
        Ok(faqs)
    }

    /// Active job openings.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn job_openings(&self) -> Result<Vec<JobOpening>, ContentfulError> {
        self.collect(
            "jobOpening",
            &[("isActive", "true")],
            50,
            JobOpening::from_fields,
        )
        .await
    }

    /// A CMS page by slug.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn page(&self, slug: &str) -> Result<Option<ContentPage>, ContentfulError> {
        let pages = self
            .collect("page", &[("slug", slug)], 1, ContentPage::from_fields)
            .await?;
        Ok(pages.into_iter().next())
    }
}
