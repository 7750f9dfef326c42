//! Dedup guard over the catalog's natural key.

use std::sync::Arc;

use crate::adapters::normalize::round1;
use crate::catalog::CatalogStore;
use crate::error::Result;
use crate::models::VariantKey;

/// Point lookup run once per variant right before it is written.
#[derive(Clone)]
pub struct DedupGuard {
    catalog: Arc<dyn CatalogStore>,
}

impl DedupGuard {
    pub fn new(catalog: Arc<dyn CatalogStore>) -> Self {
        Self { catalog }
    }

    /// Whether the variant is already stored. Weights compare at 0.1g.
    pub async fn exists(&self, key: &VariantKey) -> Result<bool> {
        let key = VariantKey {
            weight: key.weight.map(round1),
            ..key.clone()
        };
        self.catalog.exists(&key).await
    }
}
