//! JSON feed adapter.
//!
//! A feed is a JSON array of products in the camelCase product format,
//! read from a local file or fetched over HTTP once per run.

use async_trait::async_trait;
use tokio::sync::OnceCell;

use crate::adapters::normalize::{product_slug, round1};
use crate::adapters::{Manufacturer, ScrapeContext, SourceAdapter};
use crate::error::{AppError, Result};
use crate::models::{FeedProfile, ScrapedProduct};
use crate::utils::is_remote;

pub struct FeedAdapter {
    manufacturer: Manufacturer,
    location: String,
    entries: OnceCell<Vec<ScrapedProduct>>,
}

impl FeedAdapter {
    pub fn new(profile: FeedProfile) -> Self {
        Self {
            manufacturer: Manufacturer {
                name: profile.manufacturer,
                slug: profile.slug,
            },
            location: profile.location,
            entries: OnceCell::new(),
        }
    }

    async fn entries(&self, ctx: &ScrapeContext) -> Result<&[ScrapedProduct]> {
        let entries = self
            .entries
            .get_or_try_init(|| self.load(ctx))
            .await?;
        Ok(entries.as_slice())
    }

    async fn load(&self, ctx: &ScrapeContext) -> Result<Vec<ScrapedProduct>> {
        let body = if is_remote(&self.location) {
            ctx.fetch_text(&self.location).await?
        } else {
            tokio::fs::read_to_string(&self.location).await?
        };

        let mut products: Vec<ScrapedProduct> = serde_json::from_str(&body)
            .map_err(|e| AppError::parse(&self.location, e.to_string()))?;
        for product in &mut products {
            self.fill_defaults(product);
        }
        log::info!("Loaded {} feed entries from {}", products.len(), self.location);
        Ok(products)
    }

    fn fill_defaults(&self, product: &mut ScrapedProduct) {
        if product.manufacturer.is_empty() {
            product.manufacturer = self.manufacturer.name.clone();
        }
        if product.manufacturer_slug.is_empty() {
            product.manufacturer_slug = self.manufacturer.slug.clone();
        }
        if product.slug.trim().is_empty() {
            product.slug = product_slug(&product.source_url, &product.name);
        }
        for weight in &mut product.weights {
            *weight = round1(*weight);
        }
        for model in &mut product.models {
            model.weight = model.weight.map(round1);
        }
    }
}

/// Id of a feed entry: its source URL, else its slug.
fn entry_id(product: &ScrapedProduct) -> &str {
    if product.source_url.is_empty() {
        &product.slug
    } else {
        &product.source_url
    }
}

#[async_trait]
impl SourceAdapter for FeedAdapter {
    fn manufacturer(&self) -> &Manufacturer {
        &self.manufacturer
    }

    async fn discover(&self, ctx: &ScrapeContext) -> Result<Vec<String>> {
        let entries = self.entries(ctx).await?;
        Ok(entries.iter().map(|p| entry_id(p).to_string()).collect())
    }

    async fn scrape(&self, ctx: &ScrapeContext, url: &str) -> Result<ScrapedProduct> {
        let entries = self.entries(ctx).await?;
        let product = entries
            .iter()
            .find(|p| entry_id(p) == url || p.slug == url)
            .ok_or_else(|| AppError::NotFound(url.to_string()))?;
        if product.name.trim().is_empty() {
            return Err(AppError::parse(url, "feed entry has no name"));
        }
        Ok(product.clone())
    }
}
