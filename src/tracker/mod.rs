// src/tracker/mod.rs

//! External ingestion tracker.
//!
//! Keeps one maker record per manufacturer (`registering` while a run is
//! in progress, `registered` after it) and an append-only log of product
//! outcomes. Tracker failures never affect the catalog.

mod airtable;

use async_trait::async_trait;

use crate::error::Result;

pub use airtable::AirtableTracker;

/// Outcome of one product, recorded once per run.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductRecord {
    pub product_name: String,
    pub source_url: String,
    pub maker_id: String,
    /// Human-readable counts of colors, weights and rows written
    pub note: String,
}

/// Trait for tracker backends.
#[async_trait]
pub trait Tracker: Send + Sync {
    /// Find the maker by slug, creating it in the registering state if absent.
    async fn find_or_create_maker(&self, manufacturer_slug: &str, name: &str) -> Result<String>;

    /// Append a product outcome. Every call creates a new entry.
    async fn record_product(&self, record: &ProductRecord) -> Result<()>;

    /// Mark the maker as registered.
    async fn finalize_maker(&self, maker_id: &str) -> Result<()>;
}

/// Tracker that only logs, for dry runs.
#[derive(Debug, Default)]
pub struct LogTracker;

#[async_trait]
impl Tracker for LogTracker {
    async fn find_or_create_maker(&self, manufacturer_slug: &str, name: &str) -> Result<String> {
        log::info!("[dry-run] tracker maker {} ({})", name, manufacturer_slug);
        Ok(format!("dry-run-{manufacturer_slug}"))
    }

    async fn record_product(&self, record: &ProductRecord) -> Result<()> {
        log::info!(
            "[dry-run] tracker product {}: {}",
            record.product_name,
            record.note
        );
        Ok(())
    }

    async fn finalize_maker(&self, maker_id: &str) -> Result<()> {
        log::info!("[dry-run] tracker finalize {}", maker_id);
        Ok(())
    }
}
