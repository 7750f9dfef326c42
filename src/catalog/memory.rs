//! In-memory catalog for dry runs and tests.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::catalog::CatalogStore;
use crate::error::{AppError, Result};
use crate::models::{CatalogRow, VariantKey};

/// Catalog held in memory, enforcing the natural-key constraint.
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    rows: Mutex<Vec<CatalogRow>>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every stored row, in insertion order.
    pub fn rows(&self) -> Vec<CatalogRow> {
        self.rows.lock().map(|rows| rows.clone()).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.rows.lock().map(|rows| rows.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl CatalogStore for MemoryCatalog {
    async fn exists(&self, key: &VariantKey) -> Result<bool> {
        let rows = self
            .rows
            .lock()
            .map_err(|_| AppError::persistence("catalog lock poisoned"))?;
        Ok(rows.iter().any(|row| row.key().matches(key)))
    }

    async fn insert(&self, row: &CatalogRow) -> Result<()> {
        let mut rows = self
            .rows
            .lock()
            .map_err(|_| AppError::persistence("catalog lock poisoned"))?;
        let key = row.key();
        if rows.iter().any(|existing| existing.key().matches(&key)) {
            return Err(AppError::persistence(format!(
                "duplicate key {}/{}/{}/{:?}",
                key.manufacturer_slug, key.slug, key.color_name, key.weight
            )));
        }
        rows.push(row.clone());
        Ok(())
    }
}
