//! Variant and catalog row structures.

use serde::{Deserialize, Serialize};

use crate::models::ScrapedProduct;

/// Natural key of one persisted catalog row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantKey {
    pub manufacturer_slug: String,
    pub slug: String,
    pub color_name: String,
    pub weight: Option<f64>,
}

impl VariantKey {
    /// Whether two keys address the same row, comparing weights at 0.1g.
    pub fn matches(&self, other: &VariantKey) -> bool {
        self.manufacturer_slug == other.manufacturer_slug
            && self.slug == other.slug
            && self.color_name == other.color_name
            && match (self.weight, other.weight) {
                (None, None) => true,
                (Some(a), Some(b)) => (a * 10.0).round() == (b * 10.0).round(),
                _ => false,
            }
    }
}

/// One `(color, weight)` combination of a product.
#[derive(Debug, Clone, PartialEq)]
pub struct Variant {
    /// Position of the color in the product's color list
    pub color_index: usize,

    pub color_name: String,

    pub weight: Option<f64>,

    /// Source image to process, if any
    pub image_source: Option<String>,
}

impl Variant {
    /// Build the natural key for this variant of `product`.
    pub fn key(&self, product: &ScrapedProduct) -> VariantKey {
        VariantKey {
            manufacturer_slug: product.manufacturer_slug.clone(),
            slug: product.slug.clone(),
            color_name: self.color_name.clone(),
            weight: self.weight,
        }
    }
}

/// Row inserted into the relational catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogRow {
    pub manufacturer: String,
    pub manufacturer_slug: String,
    pub name: String,
    pub name_kana: String,
    pub slug: String,
    #[serde(rename = "type")]
    pub product_type: String,
    pub target_fish: Vec<String>,
    pub description: String,
    pub price: u32,
    pub color_name: String,
    pub weight: Option<f64>,
    pub length: Option<f64>,
    pub image_url: Option<String>,
    pub source_url: String,
    pub is_discontinued: bool,
    pub is_limited: bool,
}

impl CatalogRow {
    /// Natural key of this row.
    pub fn key(&self) -> VariantKey {
        VariantKey {
            manufacturer_slug: self.manufacturer_slug.clone(),
            slug: self.slug.clone(),
            color_name: self.color_name.clone(),
            weight: self.weight,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(weight: Option<f64>) -> VariantKey {
        VariantKey {
            manufacturer_slug: "acme".into(),
            slug: "minnow".into(),
            color_name: "Red".into(),
            weight,
        }
    }

    #[test]
    fn test_key_matches_at_tenth_of_gram() {
        assert!(key(Some(10.0)).matches(&key(Some(10.04))));
        assert!(!key(Some(10.0)).matches(&key(Some(10.2))));
    }

    #[test]
    fn test_null_weight_only_matches_null() {
        assert!(key(None).matches(&key(None)));
        assert!(!key(None).matches(&key(Some(0.0))));
    }

    #[test]
    fn test_row_serializes_type_column() {
        let row = CatalogRow {
            manufacturer: "Acme".into(),
            manufacturer_slug: "acme".into(),
            name: "Minnow".into(),
            name_kana: String::new(),
            slug: "minnow".into(),
            product_type: "minnow".into(),
            target_fish: vec!["seabass".into()],
            description: String::new(),
            price: 1980,
            color_name: "Red".into(),
            weight: None,
            length: Some(90.0),
            image_url: None,
            source_url: "https://acme.example/p/1".into(),
            is_discontinued: false,
            is_limited: false,
        };
        let value = serde_json::to_value(&row).unwrap();
        assert_eq!(value["type"], "minnow");
        assert!(value["weight"].is_null());
        assert!(value["image_url"].is_null());
    }
}
