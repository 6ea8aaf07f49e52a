//! Contentful CMS client.
//!
//! Read-only. Entries are queried by content type and `fields.*` filters and
//! mapped into the DTOs the page templates render. Entries missing a required
//! field are dropped rather than failing the page.

mod client;
pub mod rich_text;
pub mod types;

pub use client::ContentfulClient;
pub use types::{
    CollectionContent, ContentPage, Faq, HeroSlide, HomepageSection, JobOpening, ProductContent,
};

use thiserror::Error;

/// Errors that can occur when talking to the Delivery API.
#[derive(Debug, Error)]
pub enum ContentfulError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The API rejected the request.
    #[error("Contentful API error ({status}): {message}")]
    Api { status: u16, message: String },
}
