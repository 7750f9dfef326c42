// src/adapters/mod.rs

//! Source adapters.
//!
//! An adapter turns one manufacturer's product pages into [`ScrapedProduct`]s.
//! Every adapter satisfies [`SourceAdapter`]; the pipeline is written once
//! against that contract.
//!
//! - `SelectorAdapter`: HTML sites described by a `[[sites]]` profile
//! - `FeedAdapter`: JSON arrays of products from a file or URL

mod feed;
pub mod normalize;
mod retry;
mod selector;

use async_trait::async_trait;
use reqwest::Client;

use crate::error::{AppError, Result};
use crate::models::{Config, ScrapedProduct};
use crate::utils::http;

pub use feed::FeedAdapter;
pub use retry::RetryPolicy;
pub use selector::SelectorAdapter;

/// Manufacturer an adapter scrapes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manufacturer {
    pub name: String,
    pub slug: String,
}

/// Shared scraping session for one run.
///
/// Created once by the entry point and passed by reference to every adapter
/// call; dropped when the run ends.
#[derive(Clone)]
pub struct ScrapeContext {
    client: Client,
    retry: RetryPolicy,
}

impl ScrapeContext {
    pub fn new(client: Client, retry: RetryPolicy) -> Self {
        Self { client, retry }
    }

    /// Build a context from the crawler settings.
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = http::create_async_client(&config.crawler)?;
        Ok(Self::new(client, RetryPolicy::from_config(&config.crawler)))
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn retry(&self) -> RetryPolicy {
        self.retry
    }

    /// Fetch text under the retry policy.
    pub async fn fetch_text(&self, url: &str) -> Result<String> {
        self.retry
            .run(url, || http::fetch_text(&self.client, url))
            .await
    }

    /// Fetch raw bytes under the retry policy.
    pub async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>> {
        self.retry
            .run(url, || http::fetch_bytes(&self.client, url))
            .await
    }
}

/// Contract every source adapter satisfies.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Manufacturer this adapter scrapes.
    fn manufacturer(&self) -> &Manufacturer;

    /// List product URLs (or feed entry ids) for this run.
    async fn discover(&self, ctx: &ScrapeContext) -> Result<Vec<String>>;

    /// Scrape one product.
    ///
    /// Fails with `Fetch`/`Http`, `Parse` or `NotFound`; never writes anything.
    async fn scrape(&self, ctx: &ScrapeContext, url: &str) -> Result<ScrapedProduct>;
}

/// Build the adapter configured under `slug`.
pub fn build_adapter(config: &Config, slug: &str) -> Result<Box<dyn SourceAdapter>> {
    if let Some(profile) = config.sites.iter().find(|s| s.slug == slug) {
        return Ok(Box::new(SelectorAdapter::new(profile.clone())?));
    }
    if let Some(profile) = config.feeds.iter().find(|f| f.slug == slug) {
        return Ok(Box::new(FeedAdapter::new(profile.clone())));
    }
    Err(AppError::config(format!("no site or feed named '{slug}'")))
}

/// Slugs of every configured source.
pub fn source_slugs(config: &Config) -> Vec<&str> {
    config
        .sites
        .iter()
        .map(|s| s.slug.as_str())
        .chain(config.feeds.iter().map(|f| f.slug.as_str()))
        .collect()
}
