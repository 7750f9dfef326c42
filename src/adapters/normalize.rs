//! Field normalization shared by adapters.
//!
//! Prices become tax-included integers, weights become grams rounded to
//! 0.1g, lengths become millimeters.

use std::sync::LazyLock;

use regex::Regex;
use sha2::{Digest, Sha256};
use unicode_segmentation::UnicodeSegmentation;
use url::Url;

use crate::models::KeywordRule;

/// Consumption tax multiplier.
pub const TAX_RATE: f64 = 1.1;

/// Grams per avoirdupois ounce.
pub const GRAMS_PER_OUNCE: f64 = 28.3495;

static PRICE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{1,3}(?:,\d{3})+|\d+)").expect("valid price regex"));

static WEIGHT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+(?:\.\d+)?(?:/\d+(?:\.\d+)?)*)\s*(oz|g)(?-u:\b)")
        .expect("valid weight regex")
});

static LENGTH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*(mm|cm|inch|in)(?-u:\b)").expect("valid length regex")
});

/// Round to one decimal place.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Convert a tax-excluded price to tax-included.
pub fn tax_included(price: u32) -> u32 {
    (f64::from(price) * TAX_RATE).round() as u32
}

/// Convert ounces to grams at 0.1g precision.
pub fn ounces_to_grams(ounces: f64) -> f64 {
    round1(ounces * GRAMS_PER_OUNCE)
}

/// Parse a price label like "¥1,980（税込）" into a tax-included integer.
///
/// Labels marked as tax-excluded ("税抜", "+税") are converted; otherwise
/// `excludes_tax` decides. Returns 0 when no number is present.
pub fn parse_price(text: &str, excludes_tax: bool) -> u32 {
    let Some(m) = PRICE_RE.find(text) else {
        return 0;
    };
    let Ok(value) = m.as_str().replace(',', "").parse::<u32>() else {
        return 0;
    };

    let marked_excluded =
        text.contains("税抜") || text.contains("+税") || text.contains("＋税");
    let marked_included = text.contains("税込");
    if marked_excluded || (excludes_tax && !marked_included) {
        tax_included(value)
    } else {
        value
    }
}

/// Parse every weight in a label like "7g / 10g / 1/4oz" into grams.
///
/// Order is preserved and duplicates are dropped.
pub fn parse_weights(text: &str) -> Vec<f64> {
    let mut weights: Vec<f64> = Vec::new();
    let mut push = |grams: f64| {
        if grams > 0.0 && !weights.contains(&grams) {
            weights.push(grams);
        }
    };

    for caps in WEIGHT_RE.captures_iter(text) {
        let raw = &caps[1];
        if caps[2].eq_ignore_ascii_case("oz") {
            if let Some(value) = parse_number(raw) {
                push(ounces_to_grams(value));
            }
        } else {
            // "7/10/14g" lists several gram weights, not a fraction
            for part in raw.split('/') {
                if let Ok(value) = part.parse::<f64>() {
                    push(round1(value));
                }
            }
        }
    }
    weights
}

/// Parse the first length in a label into millimeters.
pub fn parse_length(text: &str) -> Option<f64> {
    let caps = LENGTH_RE.captures(text)?;
    let value: f64 = caps[1].parse().ok()?;
    let mm = match caps[2].to_ascii_lowercase().as_str() {
        "cm" => value * 10.0,
        "inch" | "in" => value * 25.4,
        _ => value,
    };
    Some(round1(mm))
}

/// Parse "1.5" or a fraction like "1/4".
fn parse_number(raw: &str) -> Option<f64> {
    match raw.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.parse().ok()?;
            let den: f64 = den.parse().ok()?;
            (den != 0.0).then(|| num / den)
        }
        None => raw.parse().ok(),
    }
}

/// Lowercase ASCII slug; runs of anything else collapse to `-`.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.trim_matches('-').to_string()
}

/// Stable product slug from its URL, falling back to its name.
///
/// Names without any ASCII content get a short hash so the slug stays
/// stable across runs.
pub fn product_slug(url: &str, name: &str) -> String {
    if let Some(slug) = slug_from_url(url) {
        return slug;
    }
    let slug = slugify(name);
    if !slug.is_empty() {
        return slug;
    }
    let digest = Sha256::digest(name.trim().as_bytes());
    format!("p-{}", &hex::encode(digest)[..12])
}

fn slug_from_url(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let segment = parsed
        .path_segments()?
        .filter(|s| !s.is_empty())
        .next_back()?;
    let stem = segment
        .rsplit_once('.')
        .map_or(segment, |(stem, _ext)| stem);
    if stem.eq_ignore_ascii_case("index") {
        return None;
    }
    let slug = slugify(stem);
    (!slug.is_empty()).then_some(slug)
}

/// Collapse whitespace and cut to `limit` graphemes.
pub fn truncate_description(text: &str, limit: usize) -> String {
    let normalized = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if normalized.graphemes(true).count() <= limit {
        return normalized;
    }
    let mut cut: String = normalized.graphemes(true).take(limit).collect();
    cut.push('…');
    cut
}

/// First matching type tag, or an empty string.
pub fn classify_type(text: &str, rules: &[KeywordRule]) -> String {
    let lower = text.to_lowercase();
    rules
        .iter()
        .find(|r| lower.contains(&r.keyword.to_lowercase()))
        .map(|r| r.tag.clone())
        .unwrap_or_default()
}

/// Every matching species tag, in rule order without duplicates.
pub fn classify_species(text: &str, rules: &[KeywordRule]) -> Vec<String> {
    let lower = text.to_lowercase();
    let mut tags: Vec<String> = Vec::new();
    for rule in rules {
        if lower.contains(&rule.keyword.to_lowercase()) && !tags.contains(&rule.tag) {
            tags.push(rule.tag.clone());
        }
    }
    tags
}
