//! Persistence writer: one catalog row per new variant.

use std::sync::Arc;

use crate::catalog::CatalogStore;
use crate::error::Result;
use crate::models::{CatalogRow, ScrapedProduct, Variant};

/// Build the catalog row for one variant of a product.
pub fn build_row(
    product: &ScrapedProduct,
    variant: &Variant,
    image_url: Option<String>,
) -> CatalogRow {
    CatalogRow {
        manufacturer: product.manufacturer.clone(),
        manufacturer_slug: product.manufacturer_slug.clone(),
        name: product.name.clone(),
        name_kana: product.name_kana.clone(),
        slug: product.slug.clone(),
        product_type: product.product_type.clone(),
        target_fish: product.target_fish.clone(),
        description: product.description.clone(),
        price: product.price,
        color_name: variant.color_name.clone(),
        weight: variant.weight,
        length: product.length,
        image_url,
        source_url: product.source_url.clone(),
        is_discontinued: product.discontinued,
        is_limited: product.limited,
    }
}

/// Single-row, non-transactional writer.
#[derive(Clone)]
pub struct PersistenceWriter {
    catalog: Arc<dyn CatalogStore>,
}

impl PersistenceWriter {
    pub fn new(catalog: Arc<dyn CatalogStore>) -> Self {
        Self { catalog }
    }

    pub async fn insert(&self, row: &CatalogRow) -> Result<()> {
        self.catalog.insert(row).await?;
        log::debug!(
            "Inserted {}/{} {} {:?}",
            row.manufacturer_slug,
            row.slug,
            row.color_name,
            row.weight
        );
        Ok(())
    }
}
