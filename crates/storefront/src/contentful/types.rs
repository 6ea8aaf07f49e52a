//! Contentful entry envelopes and the page DTOs built from them.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::rich_text;

// =============================================================================
// Delivery API envelopes
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EntryCollection {
    #[serde(default)]
    pub items: Vec<Entry>,
    #[serde(default)]
    pub includes: Includes,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Includes {
    #[serde(default, rename = "Asset")]
    pub assets: Vec<Asset>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Sys {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Entry {
    pub sys: Sys,
    #[serde(default)]
    pub fields: HashMap<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Asset {
    pub sys: Sys,
    #[serde(default)]
    pub fields: AssetFields,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AssetFields {
    pub title: Option<String>,
    pub file: Option<AssetFile>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssetFile {
    pub url: String,
}

/// An entry paired with the assets included alongside it.
pub struct Fields<'a> {
    entry: &'a Entry,
    assets: &'a [Asset],
}

impl<'a> Fields<'a> {
    pub const fn new(entry: &'a Entry, assets: &'a [Asset]) -> Self {
        Self { entry, assets }
    }

    fn get(&self, name: &str) -> Option<&'a Value> {
        self.entry.fields.get(name)
    }

    pub fn string(&self, name: &str) -> Option<String> {
        self.get(name)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
    }

    pub fn bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(Value::as_bool)
    }

    pub fn int(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(Value::as_i64)
    }

    pub fn strings(&self, name: &str) -> Vec<String> {
        self.get(name)
            .and_then(Value::as_array)
            .map(|values| {
                values
                    .iter()
                    .filter_map(Value::as_str)
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Rich text field rendered to HTML. Plain strings are escaped as a paragraph.
    pub fn rich_text(&self, name: &str) -> Option<String> {
        let value = self.get(name)?;
        let html = match value {
            Value::String(text) => format!("<p>{}</p>", rich_text::escape_html(text)),
            _ => rich_text::render(value),
        };
        Some(html).filter(|html| !html.is_empty())
    }

    /// URL of a linked asset, resolved from the response includes.
    pub fn asset_url(&self, name: &str) -> Option<String> {
        let id = self.get(name)?.get("sys")?.get("id")?.as_str()?;
        self.assets
            .iter()
            .find(|asset| asset.sys.id == id)
            .and_then(|asset| asset.fields.file.as_ref())
            .map(|file| absolute_url(&file.url))
    }

    /// URLs of an array of linked assets, skipping unresolved links.
    pub fn asset_urls(&self, name: &str) -> Vec<String> {
        let Some(links) = self.get(name).and_then(Value::as_array) else {
            return Vec::new();
        };
        links
            .iter()
            .filter_map(|link| link.get("sys")?.get("id")?.as_str())
            .filter_map(|id| {
                self.assets
                    .iter()
                    .find(|asset| asset.sys.id == id)
                    .and_then(|asset| asset.fields.file.as_ref())
                    .map(|file| absolute_url(&file.url))
            })
            .collect()
    }
}

/// Asset URLs come protocol-relative (`//images.ctfassets.net/...`).
fn absolute_url(url: &str) -> String {
    if url.starts_with("//") {
        format!("https:{url}")
    } else {
        url.to_string()
    }
}

// =============================================================================
// Page DTOs
// =============================================================================

/// A homepage carousel slide (`heroSlide`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeroSlide {
    pub title: String,
    pub subtitle: Option<String>,
    pub image_url: Option<String>,
    pub cta_label: Option<String>,
    pub cta_url: Option<String>,
    pub order: i64,
}

impl HeroSlide {
    pub(crate) fn from_fields(fields: &Fields<'_>) -> Option<Self> {
        Some(Self {
            title: fields.string("title")?,
            subtitle: fields.string("subtitle"),
            image_url: fields.asset_url("image"),
            cta_label: fields.string("ctaLabel"),
            cta_url: fields.string("ctaUrl"),
            order: fields.int("order").unwrap_or(0),
        })
    }
}

/// A titled block on the homepage (`homepageSection`), keyed by `sectionKey`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HomepageSection {
    pub section_key: String,
    pub title: String,
    pub subtitle: Option<String>,
    pub body_html: Option<String>,
    pub image_url: Option<String>,
    /// Products featured in the section, by handle.
    pub product_handles: Vec<String>,
    pub order: i64,
}

impl HomepageSection {
    pub(crate) fn from_fields(fields: &Fields<'_>) -> Option<Self> {
        Some(Self {
            section_key: fields.string("sectionKey")?,
            title: fields.string("title").unwrap_or_default(),
            subtitle: fields.string("subtitle"),
            body_html: fields.rich_text("body"),
            image_url: fields.asset_url("image"),
            product_handles: fields.strings("productHandles"),
            order: fields.int("order").unwrap_or(0),
        })
    }
}

/// Editorial content for a product page (`productContent`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductContent {
    pub product_handle: String,
    pub tagline: Option<String>,
    pub description_html: Option<String>,
    pub top_notes: Vec<String>,
    pub heart_notes: Vec<String>,
    pub base_notes: Vec<String>,
    pub ingredients_html: Option<String>,
    pub how_to_use_html: Option<String>,
    pub gallery: Vec<String>,
}

impl ProductContent {
    pub(crate) fn from_fields(fields: &Fields<'_>) -> Option<Self> {
        Some(Self {
            product_handle: fields.string("productHandle")?,
            tagline: fields.string("tagline"),
            description_html: fields.rich_text("description"),
            top_notes: fields.strings("topNotes"),
            heart_notes: fields.strings("heartNotes"),
            base_notes: fields.strings("baseNotes"),
            ingredients_html: fields.rich_text("ingredients"),
            how_to_use_html: fields.rich_text("howToUse"),
            gallery: fields.asset_urls("gallery"),
        })
    }

    #[must_use]
    pub fn has_notes(&self) -> bool {
        !(self.top_notes.is_empty() && self.heart_notes.is_empty() && self.base_notes.is_empty())
    }
}

/// A curated collection (`collection`) listing product handles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionContent {
    pub handle: String,
    pub title: String,
    pub description_html: Option<String>,
    pub banner_url: Option<String>,
    pub product_handles: Vec<String>,
}

impl CollectionContent {
    pub(crate) fn from_fields(fields: &Fields<'_>) -> Option<Self> {
        let handle = fields.string("handle")?;
        Some(Self {
            title: fields.string("title").unwrap_or_else(|| handle.clone()),
            handle,
            description_html: fields.rich_text("description"),
            banner_url: fields.asset_url("banner"),
            product_handles: fields.strings("productHandles"),
        })
    }
}

/// A question on the FAQ page (`faq`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Faq {
    pub question: String,
    pub answer_html: String,
    pub category: Option<String>,
    pub order: i64,
}

impl Faq {
    pub(crate) fn from_fields(fields: &Fields<'_>) -> Option<Self> {
        Some(Self {
            question: fields.string("question")?,
            answer_html: fields.rich_text("answer").unwrap_or_default(),
            category: fields.string("category"),
            order: fields.int("order").unwrap_or(0),
        })
    }
}

/// An open position on the careers page (`jobOpening`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobOpening {
    pub title: String,
    pub department: Option<String>,
    pub location: Option<String>,
    pub employment_type: Option<String>,
    pub description_html: Option<String>,
    pub apply_url: Option<String>,
}

impl JobOpening {
    pub(crate) fn from_fields(fields: &Fields<'_>) -> Option<Self> {
        Some(Self {
            title: fields.string("title")?,
            department: fields.string("department"),
            location: fields.string("location"),
            employment_type: fields.string("employmentType"),
            description_html: fields.rich_text("description"),
            apply_url: fields.string("applyUrl"),
        })
    }
}

/// A standalone CMS page (`page`) such as the privacy policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentPage {
    pub slug: String,
    pub title: String,
    pub body_html: String,
    pub meta_description: Option<String>,
}

impl ContentPage {
    pub(crate) fn from_fields(fields: &Fields<'_>) -> Option<Self> {
        Some(Self {
            slug: fields.string("slug")?,
            title: fields.string("title")?,
            body_html: fields.rich_text("body").unwrap_or_default(),
            meta_description: fields.string("metaDescription"),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn collection() -> EntryCollection {
        serde_json::from_value(json!({
            "items": [{
                "sys": { "id": "entry_1" },
                "fields": {
                    "title": "  Winter Glow ",
                    "subtitle": "",
                    "image": { "sys": { "type": "Link", "linkType": "Asset", "id": "asset_1" } },
                    "gallery": [
                        { "sys": { "id": "asset_1" } },
                        { "sys": { "id": "asset_missing" } }
                    ],
                    "order": 2,
                    "productHandles": ["oud-candle", "amber-diffuser"]
                }
            }],
            "includes": {
                "Asset": [{
                    "sys": { "id": "asset_1" },
                    "fields": { "title": "Hero", "file": { "url": "//images.ctfassets.net/hero.jpg" } }
                }]
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_fields_accessors() {
        let data = collection();
        let fields = Fields::new(&data.items[0], &data.includes.assets);

        assert_eq!(fields.string("title").as_deref(), Some("Winter Glow"));
        assert_eq!(fields.string("subtitle"), None);
        assert_eq!(fields.int("order"), Some(2));
        assert_eq!(
            fields.asset_url("image").as_deref(),
            Some("https://images.ctfassets.net/hero.jpg")
        );
        assert_eq!(fields.asset_urls("gallery").len(), 1);
        assert_eq!(fields.strings("productHandles").len(), 2);
    }

    #[test]
    fn test_hero_slide_requires_title() {
        let data = collection();
        let fields = Fields::new(&data.items[0], &data.includes.assets);
        let slide = HeroSlide::from_fields(&fields).unwrap();
        assert_eq!(slide.order, 2);

        let empty = Entry {
            sys: Sys {
                id: "entry_2".to_string(),
            },
            fields: HashMap::new(),
        };
        assert!(HeroSlide::from_fields(&Fields::new(&empty, &[])).is_none());
    }

    #[test]
    fn test_plain_string_rich_text_is_escaped() {
        let entry = Entry {
            sys: Sys {
                id: "faq_1".to_string(),
            },
            fields: HashMap::from([
                ("question".to_string(), json!("Do you ship?")),
                ("answer".to_string(), json!("Yes & fast")),
            ]),
        };
        let faq = Faq::from_fields(&Fields::new(&entry, &[])).unwrap();
        assert_eq!(faq.answer_html, "<p>Yes &amp; fast</p>");
    }
}
