// src/models/mod.rs

//! Domain models for the ingestion pipeline.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
mod product;
mod site;
mod summary;
mod variant;

// Re-export all public types
pub use config::{CatalogConfig, Config, CrawlerConfig, ImageConfig, TrackerConfig};
pub use product::{ColorOption, ScrapedProduct, SizeModel};
pub use site::{FeedProfile, KeywordRule, SiteProfile, SiteSelectors};
pub use summary::RunSummary;
pub use variant::{CatalogRow, Variant, VariantKey};
