// src/catalog/mod.rs

//! Relational product catalog.
//!
//! One row per `(manufacturer_slug, slug, color_name, weight)` key. The
//! pipeline only ever asks whether a key exists and inserts new rows.

mod memory;
mod rest;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{CatalogRow, VariantKey};

pub use memory::MemoryCatalog;
pub use rest::RestCatalog;

/// Trait for catalog backends.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Whether a row with this natural key is already stored.
    async fn exists(&self, key: &VariantKey) -> Result<bool>;

    /// Insert one row. Not transactional across rows.
    async fn insert(&self, row: &CatalogRow) -> Result<()>;
}
