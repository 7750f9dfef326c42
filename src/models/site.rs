// src/models/site.rs

//! Per-site adapter profiles.
//!
//! Each manufacturer site is described by data, not code: where its product
//! links live, which CSS selectors pick out each field, and the keyword
//! tables used to classify product type and target species.

use serde::{Deserialize, Serialize};

/// Selector-driven site profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteProfile {
    /// Manufacturer display name
    pub manufacturer: String,

    /// Manufacturer identifier, also the adapter name
    pub slug: String,

    /// Listing pages that link to product pages
    #[serde(default)]
    pub listing_urls: Vec<String>,

    /// Selector for product links on a listing page
    #[serde(default = "default_product_link")]
    pub product_link_selector: String,

    /// Products whose link text or URL contains one of these are skipped
    #[serde(default)]
    pub exclude_keywords: Vec<String>,

    /// Prices on the site exclude consumption tax
    #[serde(default)]
    pub price_excludes_tax: bool,

    /// Maximum description length in characters
    #[serde(default = "default_description_limit")]
    pub description_limit: usize,

    /// Field selectors for product pages
    #[serde(default)]
    pub selectors: SiteSelectors,

    /// Keyword to product type mapping, first match wins
    #[serde(default)]
    pub type_keywords: Vec<KeywordRule>,

    /// Keyword to species tag mapping, all matches apply
    #[serde(default)]
    pub species_keywords: Vec<KeywordRule>,
}

fn default_product_link() -> String {
    "a[href*='/product']".to_string()
}

fn default_description_limit() -> usize {
    500
}

/// CSS selectors for scraping a product page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteSelectors {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_kana: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,

    /// Selector for each color item
    pub color_item: String,

    /// Selector for the color name within an item (item text if absent)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_name: Option<String>,

    /// Selector for the swatch image within an item
    #[serde(default = "default_color_image")]
    pub color_image: String,

    /// HTML attribute holding the image URL
    #[serde(default = "default_image_attr")]
    pub image_attr: String,

    /// Selector for elements whose text lists weights
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<String>,

    /// Selector for elements whose text gives the length
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_image: Option<String>,
}

fn default_color_image() -> String {
    "img".to_string()
}

fn default_image_attr() -> String {
    "src".to_string()
}

impl Default for SiteSelectors {
    fn default() -> Self {
        Self {
            name: "h1".to_string(),
            name_kana: None,
            description: None,
            price: None,
            color_item: ".color-list li".to_string(),
            color_name: None,
            color_image: default_color_image(),
            image_attr: default_image_attr(),
            weight: None,
            length: None,
            main_image: Some("meta[property='og:image']".to_string()),
        }
    }
}

/// Mapping from a keyword to a normalized tag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordRule {
    /// Keyword to search for in name and description
    pub keyword: String,

    /// Tag applied when the keyword matches
    pub tag: String,
}

impl KeywordRule {
    pub fn new(keyword: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            tag: tag.into(),
        }
    }
}

/// JSON feed source profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedProfile {
    /// Manufacturer display name
    pub manufacturer: String,

    /// Manufacturer identifier, also the adapter name
    pub slug: String,

    /// Local path or http(s) URL of a JSON array of products
    pub location: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_defaults_from_minimal_toml() {
        let toml = r#"
            manufacturer = "Acme"
            slug = "acme"
            listing_urls = ["https://acme.example/lures/"]

            [selectors]
            name = "h1.product-title"
            color_item = "ul.colors li"
        "#;
        let profile: SiteProfile = toml::from_str(toml).unwrap();
        assert_eq!(profile.product_link_selector, "a[href*='/product']");
        assert_eq!(profile.description_limit, 500);
        assert_eq!(profile.selectors.image_attr, "src");
        assert!(profile.selectors.main_image.is_none());
        assert!(!profile.price_excludes_tax);
    }
}
