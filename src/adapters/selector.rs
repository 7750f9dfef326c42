// src/adapters/selector.rs

//! Selector-driven HTML adapter.
//!
//! Scrapes product pages using the CSS selectors of a [`SiteProfile`].
//! Selectors are validated once at construction and compiled per page.

use std::collections::HashSet;

use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::adapters::normalize::{
    classify_species, classify_type, parse_length, parse_price, parse_weights, product_slug,
    truncate_description,
};
use crate::adapters::{Manufacturer, ScrapeContext, SourceAdapter};
use crate::error::{AppError, Result};
use crate::models::{ColorOption, ScrapedProduct, SiteProfile};
use crate::utils::{get_domain, resolve_url};

/// Page titles that mark a soft 404.
const NOT_FOUND_MARKERS: &[&str] = &["404", "not found", "見つかりません"];

/// Adapter for one HTML site described by a profile.
pub struct SelectorAdapter {
    manufacturer: Manufacturer,
    profile: SiteProfile,
}

impl SelectorAdapter {
    /// Create an adapter, rejecting invalid selectors up front.
    pub fn new(profile: SiteProfile) -> Result<Self> {
        let s = &profile.selectors;
        let all = [
            Some(&profile.product_link_selector),
            Some(&s.name),
            s.name_kana.as_ref(),
            s.description.as_ref(),
            s.price.as_ref(),
            Some(&s.color_item),
            s.color_name.as_ref(),
            Some(&s.color_image),
            s.weight.as_ref(),
            s.length.as_ref(),
            s.main_image.as_ref(),
        ];
        for selector in all.into_iter().flatten() {
            parse_selector(selector)?;
        }

        Ok(Self {
            manufacturer: Manufacturer {
                name: profile.manufacturer.clone(),
                slug: profile.slug.clone(),
            },
            profile,
        })
    }

    /// Extract product links from a listing page, in page order.
    fn extract_links(&self, listing_url: &str, html: &str) -> Result<Vec<String>> {
        let document = Html::parse_document(html);
        let link_sel = parse_selector(&self.profile.product_link_selector)?;
        let base = Url::parse(listing_url)?;
        let base_domain = get_domain(listing_url);

        let mut seen = HashSet::new();
        let mut links = Vec::new();
        for element in document.select(&link_sel) {
            let Some(href) = element.value().attr("href") else {
                continue;
            };
            if href.starts_with('#') || href.starts_with("javascript") {
                continue;
            }

            let text = collect_text(element);
            if self.is_excluded(&text, href) {
                log::debug!("Excluded by keyword: {} ({})", text, href);
                continue;
            }

            let full_url = resolve_url(&base, href);
            if get_domain(&full_url) != base_domain {
                continue;
            }
            if seen.insert(full_url.clone()) {
                links.push(full_url);
            }
        }
        Ok(links)
    }

    fn is_excluded(&self, text: &str, href: &str) -> bool {
        self.profile
            .exclude_keywords
            .iter()
            .any(|k| text.contains(k.as_str()) || href.contains(k.as_str()))
    }

    /// Parse a product page.
    fn parse_product(&self, url: &str, html: &str) -> Result<ScrapedProduct> {
        let document = Html::parse_document(html);
        let s = &self.profile.selectors;
        let base = Url::parse(url)?;

        let name = select_text(&document, &s.name)?.unwrap_or_default();
        if name.is_empty() {
            if is_soft_not_found(&document) {
                return Err(AppError::NotFound(url.to_string()));
            }
            return Err(AppError::parse(url, format!("no product name at '{}'", s.name)));
        }

        let name_kana = optional_text(&document, s.name_kana.as_deref())?;
        let raw_description = optional_text(&document, s.description.as_deref())?;
        let description = truncate_description(&raw_description, self.profile.description_limit);

        let price = optional_text(&document, s.price.as_deref())
            .map(|t| parse_price(&t, self.profile.price_excludes_tax))?;

        let weights = parse_weights(&all_text(&document, s.weight.as_deref())?);
        let length = parse_length(&all_text(&document, s.length.as_deref())?);

        let main_image = match s.main_image.as_deref() {
            Some(sel) => {
                let sel = parse_selector(sel)?;
                document
                    .select(&sel)
                    .find_map(|e| image_source(e, &s.image_attr))
                    .map(|src| resolve_url(&base, &src))
                    .unwrap_or_default()
            }
            None => String::new(),
        };

        let colors = self.parse_colors(&document, &base)?;

        let classify_text = format!("{name} {raw_description}");
        Ok(ScrapedProduct {
            slug: product_slug(url, &name),
            product_type: classify_type(&classify_text, &self.profile.type_keywords),
            target_fish: classify_species(&classify_text, &self.profile.species_keywords),
            name,
            name_kana,
            manufacturer: self.manufacturer.name.clone(),
            manufacturer_slug: self.manufacturer.slug.clone(),
            description,
            price,
            colors,
            weights,
            length,
            main_image,
            source_url: url.to_string(),
            ..Default::default()
        })
    }

    fn parse_colors(&self, document: &Html, base: &Url) -> Result<Vec<ColorOption>> {
        let s = &self.profile.selectors;
        let item_sel = parse_selector(&s.color_item)?;
        let name_sel = s.color_name.as_deref().map(parse_selector).transpose()?;
        let image_sel = parse_selector(&s.color_image)?;

        let mut seen = HashSet::new();
        let mut colors = Vec::new();
        for item in document.select(&item_sel) {
            let name = match &name_sel {
                Some(sel) => item.select(sel).next().map(collect_text),
                None => Some(collect_text(item)),
            }
            .unwrap_or_default();
            if name.is_empty() || !seen.insert(name.clone()) {
                continue;
            }

            let image_url = item
                .select(&image_sel)
                .find_map(|e| image_source(e, &s.image_attr))
                .map(|src| resolve_url(base, &src))
                .unwrap_or_default();

            colors.push(ColorOption::new(name, image_url));
        }
        Ok(colors)
    }
}

#[async_trait]
impl SourceAdapter for SelectorAdapter {
    fn manufacturer(&self) -> &Manufacturer {
        &self.manufacturer
    }

    async fn discover(&self, ctx: &ScrapeContext) -> Result<Vec<String>> {
        let mut seen = HashSet::new();
        let mut urls = Vec::new();

        for listing_url in &self.profile.listing_urls {
            let html = ctx.fetch_text(listing_url).await?;
            let links = self.extract_links(listing_url, &html)?;
            log::debug!("{}: {} product links", listing_url, links.len());

            for link in links {
                if seen.insert(link.clone()) {
                    urls.push(link);
                }
            }
        }
        Ok(urls)
    }

    async fn scrape(&self, ctx: &ScrapeContext, url: &str) -> Result<ScrapedProduct> {
        let html = ctx.fetch_text(url).await?;
        self.parse_product(url, &html)
    }
}

fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}

fn collect_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Text of the first match, `None` when nothing matches.
fn select_text(document: &Html, selector: &str) -> Result<Option<String>> {
    let sel = parse_selector(selector)?;
    Ok(document.select(&sel).next().map(collect_text))
}

fn optional_text(document: &Html, selector: Option<&str>) -> Result<String> {
    match selector {
        Some(sel) => Ok(select_text(document, sel)?.unwrap_or_default()),
        None => Ok(String::new()),
    }
}

/// Texts of all matches joined by spaces.
fn all_text(document: &Html, selector: Option<&str>) -> Result<String> {
    let Some(selector) = selector else {
        return Ok(String::new());
    };
    let sel = parse_selector(selector)?;
    Ok(document
        .select(&sel)
        .map(collect_text)
        .collect::<Vec<_>>()
        .join(" "))
}

/// Image URL of an element: `content` for meta tags, else the configured
/// attribute with a `data-src` fallback for lazy-loaded images.
fn image_source(element: ElementRef<'_>, attr: &str) -> Option<String> {
    let value = element.value();
    let src = if value.name() == "meta" {
        value.attr("content")
    } else {
        value.attr(attr).or_else(|| value.attr("data-src"))
    }?;
    let src = src.trim();
    (!src.is_empty()).then(|| src.to_string())
}

fn is_soft_not_found(document: &Html) -> bool {
    let Ok(title_sel) = Selector::parse("title") else {
        return false;
    };
    document
        .select(&title_sel)
        .next()
        .map(|t| collect_text(t).to_lowercase())
        .is_some_and(|title| NOT_FOUND_MARKERS.iter().any(|m| title.contains(m)))
}
