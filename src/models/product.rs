//! Scraped product data structure.

use serde::{Deserialize, Serialize};

/// A product as returned by a source adapter.
///
/// Serialized with camelCase keys, which is also the JSON feed format.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScrapedProduct {
    /// Product display name
    #[serde(default)]
    pub name: String,

    /// Phonetic reading of the name
    #[serde(default)]
    pub name_kana: String,

    /// Stable per-product identifier
    #[serde(default)]
    pub slug: String,

    /// Manufacturer display name
    #[serde(default)]
    pub manufacturer: String,

    /// Manufacturer identifier
    #[serde(default)]
    pub manufacturer_slug: String,

    /// Free-text category (e.g., "minnow")
    #[serde(default, rename = "type")]
    pub product_type: String,

    /// Target species tags
    #[serde(default)]
    pub target_fish: Vec<String>,

    /// Truncated free-text description
    #[serde(default)]
    pub description: String,

    /// Tax-included price, 0 when unknown
    #[serde(default)]
    pub price: u32,

    /// Color variants in page order
    #[serde(default)]
    pub colors: Vec<ColorOption>,

    /// Weights in grams
    #[serde(default)]
    pub weights: Vec<f64>,

    /// Length in millimeters
    #[serde(default)]
    pub length: Option<f64>,

    /// Fallback image for colors without their own
    #[serde(default)]
    pub main_image: String,

    /// Provenance URL
    #[serde(default)]
    pub source_url: String,

    /// Size models, used to resolve color restrictions
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub models: Vec<SizeModel>,

    #[serde(default)]
    pub discontinued: bool,

    #[serde(default)]
    pub limited: bool,
}

impl ScrapedProduct {
    /// Weight of a named size model, if the product lists one.
    pub fn model_weight(&self, model: &str) -> Option<f64> {
        self.models
            .iter()
            .find(|m| m.name.eq_ignore_ascii_case(model.trim()))
            .and_then(|m| m.weight)
    }
}

/// One color option of a product.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ColorOption {
    /// Color display name
    pub name: String,

    /// Swatch image, empty if the page has none
    #[serde(default)]
    pub image_url: String,

    /// Size models this color is sold in (empty = all)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub models: Vec<String>,
}

impl ColorOption {
    pub fn new(name: impl Into<String>, image_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            image_url: image_url.into(),
            models: Vec::new(),
        }
    }
}

/// A named size model (e.g., "90F") with its weight.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SizeModel {
    pub name: String,
    #[serde(default)]
    pub weight: Option<f64>,
}
