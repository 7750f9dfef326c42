// src/pipeline/expand.rs

//! Variant expansion: one product into its `(color, weight)` rows.

use crate::adapters::normalize::round1;
use crate::models::{ColorOption, ScrapedProduct, Variant};

/// Expand a product into the variants to persist, colors outer and
/// weights inner.
///
/// No colors means nothing to persist. No weights yields one variant per
/// color with a null weight. A color restricted to size models keeps only
/// the weights of those models; when none match it falls back to every
/// weight and logs a warning.
pub fn expand(product: &ScrapedProduct) -> Vec<Variant> {
    if product.colors.is_empty() {
        return Vec::new();
    }

    let weights = normalized_weights(&product.weights);
    let mut variants = Vec::new();

    for (color_index, color) in product.colors.iter().enumerate() {
        let image_source = resolve_image(color, &product.main_image);
        for weight in color_weights(product, color, &weights) {
            variants.push(Variant {
                color_index,
                color_name: color.name.clone(),
                weight,
                image_source: image_source.clone(),
            });
        }
    }
    variants
}

/// Weights at 0.1g, duplicates dropped, `[None]` when there are none.
fn normalized_weights(raw: &[f64]) -> Vec<Option<f64>> {
    let mut weights: Vec<Option<f64>> = Vec::new();
    for w in raw.iter().copied().map(round1) {
        if !weights.contains(&Some(w)) {
            weights.push(Some(w));
        }
    }
    if weights.is_empty() {
        weights.push(None);
    }
    weights
}

fn color_weights(
    product: &ScrapedProduct,
    color: &ColorOption,
    weights: &[Option<f64>],
) -> Vec<Option<f64>> {
    if color.models.is_empty() || weights.iter().all(Option::is_none) {
        return weights.to_vec();
    }

    let allowed: Vec<f64> = color
        .models
        .iter()
        .filter_map(|m| product.model_weight(m))
        .map(round1)
        .collect();
    let restricted: Vec<Option<f64>> = weights
        .iter()
        .copied()
        .filter(|w| w.is_some_and(|w| allowed.contains(&w)))
        .collect();

    if restricted.is_empty() {
        log::warn!(
            "{}: color '{}' lists models {:?} but none match a weight, using all weights",
            product.slug,
            color.name,
            color.models
        );
        return weights.to_vec();
    }
    restricted
}

/// Color image, else the product's main image, else none.
fn resolve_image(color: &ColorOption, main_image: &str) -> Option<String> {
    [color.image_url.trim(), main_image.trim()]
        .into_iter()
        .find(|url| !url.is_empty())
        .map(str::to_string)
}
