// src/pipeline/orchestrator.rs

//! Pipeline orchestrator.
//!
//! Runs one adapter end to end, one product and one variant at a time:
//!
//! ```text
//! discover → scrape → expand → (dedup → image → insert)* → record → finalize
//! ```
//!
//! Failures are isolated per product and per variant and end up as
//! counters in the [`RunSummary`].

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use reqwest::Client;

use crate::adapters::{RetryPolicy, ScrapeContext, SourceAdapter};
use crate::catalog::{CatalogStore, MemoryCatalog};
use crate::error::AppError;
use crate::models::{Config, RunSummary, ScrapedProduct, Variant};
use crate::pipeline::dedup::DedupGuard;
use crate::pipeline::expand::expand;
use crate::pipeline::image::{ImagePipeline, ImageProcessor, image_key};
use crate::pipeline::writer::{PersistenceWriter, build_row};
use crate::storage::LocalBlobStore;
use crate::tracker::{LogTracker, ProductRecord, Tracker};

/// Per-run options.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Process only the first N product URLs
    pub limit: Option<usize>,
    /// Product URLs to process instead of running discovery
    pub urls: Vec<String>,
}

/// Per-product counts used for the tracker note.
#[derive(Debug, Default)]
struct ProductOutcome {
    inserted: usize,
    existing: usize,
    failed: usize,
}

/// Sequential ingestion pipeline over pluggable backends.
pub struct Pipeline {
    config: Arc<Config>,
    dedup: DedupGuard,
    writer: PersistenceWriter,
    images: Arc<dyn ImageProcessor>,
    tracker: Arc<dyn Tracker>,
}

impl Pipeline {
    pub fn new(
        config: Arc<Config>,
        catalog: Arc<dyn CatalogStore>,
        images: Arc<dyn ImageProcessor>,
        tracker: Arc<dyn Tracker>,
    ) -> Self {
        Self {
            config,
            dedup: DedupGuard::new(Arc::clone(&catalog)),
            writer: PersistenceWriter::new(catalog),
            images,
            tracker,
        }
    }

    /// Pipeline with no external writes: an in-memory catalog, images in
    /// `blob_dir`, and a tracker that only logs.
    pub fn dry_run(config: Arc<Config>, client: Client, blob_dir: impl Into<PathBuf>) -> Self {
        let blobs = Arc::new(LocalBlobStore::new(blob_dir));
        let images = ImagePipeline::new(client, blobs, &config.images)
            .with_retry(RetryPolicy::from_config(&config.crawler));
        Self::new(
            config,
            Arc::new(MemoryCatalog::new()),
            Arc::new(images),
            Arc::new(LogTracker),
        )
    }

    /// Pipeline writing to the S3 bucket, REST catalog and tracker named in
    /// the environment.
    #[cfg(feature = "s3")]
    pub async fn live(
        config: Arc<Config>,
        client: Client,
        env: &crate::config::ServiceEnv,
    ) -> Self {
        use crate::catalog::RestCatalog;
        use crate::storage::S3BlobStore;
        use crate::tracker::AirtableTracker;

        let blobs = Arc::new(S3BlobStore::connect(&env.s3).await);
        let images = ImagePipeline::new(client.clone(), blobs, &config.images)
            .with_retry(RetryPolicy::from_config(&config.crawler));
        let catalog = RestCatalog::new(client.clone(), &env.catalog, &config.catalog.table);
        let tracker = AirtableTracker::new(client, env.tracker.clone(), config.tracker.clone());

        Self::new(
            config,
            Arc::new(catalog),
            Arc::new(images),
            Arc::new(tracker),
        )
    }

    /// Run one adapter to completion and summarize.
    pub async fn run(
        &self,
        adapter: &dyn SourceAdapter,
        ctx: &ScrapeContext,
        options: &RunOptions,
    ) -> RunSummary {
        let maker = adapter.manufacturer();
        let mut summary = RunSummary::new(&maker.slug);
        log::info!("Ingesting {} ({})", maker.name, maker.slug);

        let mut urls = if options.urls.is_empty() {
            match adapter.discover(ctx).await {
                Ok(urls) => urls,
                Err(e) => {
                    log::error!("Discovery failed for {}: {}", maker.slug, e);
                    summary.errors += 1;
                    summary.finish();
                    return summary;
                }
            }
        } else {
            options.urls.clone()
        };
        if let Some(limit) = options.limit {
            urls.truncate(limit);
        }
        summary.discovered = urls.len();
        log::info!("{} product URLs to process", urls.len());

        let maker_id = match self.tracker.find_or_create_maker(&maker.slug, &maker.name).await {
            Ok(id) => Some(id),
            Err(e) => {
                log::warn!("Tracker maker lookup failed: {}", e);
                summary.tracker_errors += 1;
                None
            }
        };

        let delay = self.config.crawler.product_delay();
        for (i, url) in urls.iter().enumerate() {
            if i > 0 && !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            log::info!("[{}/{}] {}", i + 1, urls.len(), url);
            self.process_product(adapter, ctx, url, maker_id.as_deref(), &mut summary)
                .await;
        }

        if let Some(id) = &maker_id {
            if let Err(e) = self.tracker.finalize_maker(id).await {
                log::warn!("Tracker finalize failed for {}: {}", maker.slug, e);
                summary.tracker_errors += 1;
            }
        }

        summary.finish();
        log::info!(
            "Finished {}: {} inserted, {} existing, {} errors",
            summary.source,
            summary.inserted,
            summary.skipped_existing,
            summary.errors
        );
        summary
    }

    async fn process_product(
        &self,
        adapter: &dyn SourceAdapter,
        ctx: &ScrapeContext,
        url: &str,
        maker_id: Option<&str>,
        summary: &mut RunSummary,
    ) {
        let product = match adapter.scrape(ctx, url).await {
            Ok(product) => product,
            Err(AppError::NotFound(_)) => {
                log::warn!("Not found: {}", url);
                summary.not_found += 1;
                return;
            }
            Err(e) => {
                log::error!("Scrape failed for {}: {}", url, e);
                summary.errors += 1;
                return;
            }
        };
        summary.scraped += 1;

        let variants = expand(&product);
        if variants.is_empty() {
            log::info!("Skipping {}: no colors", product.name);
            summary.skipped += 1;
            return;
        }
        log::debug!("{}: {} variants", product.slug, variants.len());

        let mut outcome = ProductOutcome::default();
        let mut image_cache: HashMap<usize, Option<String>> = HashMap::new();

        for variant in &variants {
            summary.variants += 1;
            self.process_variant(&product, variant, &mut image_cache, &mut outcome, summary)
                .await;
        }

        let Some(maker_id) = maker_id else {
            return;
        };
        let record = ProductRecord {
            product_name: product.name.clone(),
            source_url: product.source_url.clone(),
            maker_id: maker_id.to_string(),
            note: outcome_note(&product, &variants, &outcome),
        };
        if let Err(e) = self.tracker.record_product(&record).await {
            log::warn!("Tracker record failed for {}: {}", product.name, e);
            summary.tracker_errors += 1;
        }
    }

    async fn process_variant(
        &self,
        product: &ScrapedProduct,
        variant: &Variant,
        image_cache: &mut HashMap<usize, Option<String>>,
        outcome: &mut ProductOutcome,
        summary: &mut RunSummary,
    ) {
        let key = variant.key(product);
        match self.dedup.exists(&key).await {
            Ok(true) => {
                log::debug!("Exists: {} {:?}", key.color_name, key.weight);
                summary.skipped_existing += 1;
                outcome.existing += 1;
                return;
            }
            Ok(false) => {}
            Err(e) => {
                log::error!(
                    "Dedup lookup failed for {}/{}: {}",
                    product.slug,
                    key.color_name,
                    e
                );
                summary.errors += 1;
                outcome.failed += 1;
                return;
            }
        }

        let image_url = match image_cache.get(&variant.color_index) {
            Some(cached) => cached.clone(),
            None => {
                let url = self.color_image(product, variant, summary).await;
                image_cache.insert(variant.color_index, url.clone());
                url
            }
        };

        let row = build_row(product, variant, image_url);
        match self.writer.insert(&row).await {
            Ok(()) => {
                summary.inserted += 1;
                outcome.inserted += 1;
            }
            Err(e) => {
                log::error!(
                    "Insert failed for {}/{} {:?}: {}",
                    product.slug,
                    row.color_name,
                    row.weight,
                    e
                );
                summary.errors += 1;
                outcome.failed += 1;
            }
        }
    }

    /// Process a color's image once; failures yield no image.
    async fn color_image(
        &self,
        product: &ScrapedProduct,
        variant: &Variant,
        summary: &mut RunSummary,
    ) -> Option<String> {
        let source = variant.image_source.as_deref()?;
        let key = image_key(&product.manufacturer_slug, &product.slug, variant.color_index);
        match self.images.process(source, &key).await {
            Ok(url) => {
                summary.images_uploaded += 1;
                Some(url)
            }
            Err(e) => {
                log::warn!("{}", e);
                summary.errors += 1;
                None
            }
        }
    }
}

fn outcome_note(
    product: &ScrapedProduct,
    variants: &[Variant],
    outcome: &ProductOutcome,
) -> String {
    let mut weights: Vec<Option<f64>> = Vec::new();
    for variant in variants {
        if !weights.contains(&variant.weight) {
            weights.push(variant.weight);
        }
    }
    format!(
        "{} colors x {} weights: {} inserted, {} existing, {} failed",
        product.colors.len(),
        weights.len(),
        outcome.inserted,
        outcome.existing,
        outcome.failed
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::Manufacturer;
    use crate::error::Result;
    use crate::models::{CatalogRow, ColorOption, VariantKey};
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct StubAdapter {
        manufacturer: Manufacturer,
        products: Vec<ScrapedProduct>,
    }

    #[async_trait]
    impl SourceAdapter for StubAdapter {
        fn manufacturer(&self) -> &Manufacturer {
            &self.manufacturer
        }

        async fn discover(&self, _ctx: &ScrapeContext) -> Result<Vec<String>> {
            let mut urls: Vec<String> =
                self.products.iter().map(|p| p.source_url.clone()).collect();
            urls.push("https://acme.example/gone".into());
            urls.push("https://acme.example/broken".into());
            Ok(urls)
        }

        async fn scrape(&self, _ctx: &ScrapeContext, url: &str) -> Result<ScrapedProduct> {
            match url {
                "https://acme.example/gone" => Err(AppError::NotFound(url.into())),
                "https://acme.example/broken" => Err(AppError::parse(url, "no name")),
                _ => self
                    .products
                    .iter()
                    .find(|p| p.source_url == url)
                    .cloned()
                    .ok_or_else(|| AppError::NotFound(url.into())),
            }
        }
    }

    /// Fails for sources containing "fail", counts calls.
    #[derive(Default)]
    struct StubImages {
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ImageProcessor for StubImages {
        async fn process(&self, source_url: &str, key: &str) -> Result<String> {
            self.calls.lock().unwrap().push(source_url.to_string());
            if source_url.contains("fail") {
                return Err(AppError::image(source_url, "upload rejected"));
            }
            Ok(format!("https://cdn.example/{key}"))
        }
    }

    /// Memory catalog that fails the lookup or insert of one variant.
    #[derive(Default)]
    struct FlakyCatalog {
        inner: MemoryCatalog,
        fail_lookup: Option<(&'static str, f64)>,
        reject_insert: Option<(&'static str, f64)>,
    }

    fn targets(target: Option<(&str, f64)>, color: &str, weight: Option<f64>) -> bool {
        target.is_some_and(|(c, w)| c == color && weight == Some(w))
    }

    #[async_trait]
    impl CatalogStore for FlakyCatalog {
        async fn exists(&self, key: &VariantKey) -> Result<bool> {
            if targets(self.fail_lookup, &key.color_name, key.weight) {
                return Err(AppError::persistence("lookup timed out"));
            }
            self.inner.exists(key).await
        }

        async fn insert(&self, row: &CatalogRow) -> Result<()> {
            if targets(self.reject_insert, &row.color_name, row.weight) {
                return Err(AppError::persistence("check constraint violated"));
            }
            self.inner.insert(row).await
        }
    }

    #[derive(Default)]
    struct StubTracker {
        fail: bool,
        events: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Tracker for StubTracker {
        async fn find_or_create_maker(&self, slug: &str, _name: &str) -> Result<String> {
            if self.fail {
                return Err(AppError::tracker("offline"));
            }
            self.events.lock().unwrap().push(format!("maker:{slug}"));
            Ok("rec1".into())
        }

        async fn record_product(&self, record: &ProductRecord) -> Result<()> {
            self.events
                .lock()
                .unwrap()
                .push(format!("product:{}:{}", record.product_name, record.note));
            Ok(())
        }

        async fn finalize_maker(&self, maker_id: &str) -> Result<()> {
            self.events.lock().unwrap().push(format!("finalize:{maker_id}"));
            Ok(())
        }
    }

    fn minnow(red_image: &str) -> ScrapedProduct {
        ScrapedProduct {
            name: "Minnow".into(),
            slug: "minnow".into(),
            manufacturer: "Acme".into(),
            manufacturer_slug: "acme".into(),
            colors: vec![ColorOption::new("Red", red_image), ColorOption::new("Blue", "")],
            weights: vec![10.0, 14.0],
            main_image: "https://acme.example/main.jpg".into(),
            source_url: "https://acme.example/minnow".into(),
            ..Default::default()
        }
    }

    fn colorless() -> ScrapedProduct {
        ScrapedProduct {
            name: "Hook Set".into(),
            slug: "hook-set".into(),
            manufacturer_slug: "acme".into(),
            source_url: "https://acme.example/hooks".into(),
            ..Default::default()
        }
    }

    fn adapter(products: Vec<ScrapedProduct>) -> StubAdapter {
        StubAdapter {
            manufacturer: Manufacturer {
                name: "Acme".into(),
                slug: "acme".into(),
            },
            products,
        }
    }

    fn config() -> Arc<Config> {
        let mut config = Config::default();
        config.crawler.product_delay_ms = 0;
        Arc::new(config)
    }

    fn ctx() -> ScrapeContext {
        ScrapeContext::new(Client::new(), RetryPolicy::none())
    }

    #[tokio::test]
    async fn test_full_run_counts_and_isolates_products() {
        let catalog = Arc::new(MemoryCatalog::new());
        let images = Arc::new(StubImages::default());
        let tracker = Arc::new(StubTracker::default());
        let pipeline = Pipeline::new(config(), catalog.clone(), images.clone(), tracker.clone());

        let adapter = adapter(vec![minnow("https://acme.example/a.jpg"), colorless()]);
        let summary = pipeline.run(&adapter, &ctx(), &RunOptions::default()).await;

        assert_eq!(summary.discovered, 4);
        assert_eq!(summary.scraped, 2);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.not_found, 1);
        assert_eq!(summary.errors, 1);
        assert_eq!(summary.variants, 4);
        assert_eq!(summary.inserted, 4);
        assert_eq!(summary.images_uploaded, 2);
        assert_eq!(summary.tracker_errors, 0);

        let cdn = |i: usize| Some(format!("https://cdn.example/acme/minnow/{i}.webp"));
        let rows: Vec<_> = catalog
            .rows()
            .into_iter()
            .map(|r| (r.color_name, r.weight, r.image_url))
            .collect();
        assert_eq!(
            rows,
            vec![
                ("Red".to_string(), Some(10.0), cdn(0)),
                ("Red".to_string(), Some(14.0), cdn(0)),
                ("Blue".to_string(), Some(10.0), cdn(1)),
                ("Blue".to_string(), Some(14.0), cdn(1)),
            ]
        );

        // one download per color
        assert_eq!(
            *images.calls.lock().unwrap(),
            vec!["https://acme.example/a.jpg", "https://acme.example/main.jpg"]
        );
        assert_eq!(
            *tracker.events.lock().unwrap(),
            vec![
                "maker:acme".to_string(),
                "product:Minnow:2 colors x 2 weights: 4 inserted, 0 existing, 0 failed"
                    .to_string(),
                "finalize:rec1".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_rerun_skips_existing_rows() {
        let catalog = Arc::new(MemoryCatalog::new());
        let pipeline = Pipeline::new(
            config(),
            catalog.clone(),
            Arc::new(StubImages::default()),
            Arc::new(StubTracker::default()),
        );
        let adapter = adapter(vec![minnow("https://acme.example/a.jpg")]);
        let options = RunOptions {
            urls: vec!["https://acme.example/minnow".into()],
            ..Default::default()
        };

        let first = pipeline.run(&adapter, &ctx(), &options).await;
        let rows_after_first = catalog.rows();
        let second = pipeline.run(&adapter, &ctx(), &options).await;

        assert_eq!(first.inserted, 4);
        assert_eq!(second.inserted, 0);
        assert_eq!(second.skipped_existing, 4);
        assert_eq!(second.images_uploaded, 0);
        assert_eq!(catalog.rows(), rows_after_first);
    }

    #[tokio::test]
    async fn test_image_failure_keeps_sibling_inserts() {
        let catalog = Arc::new(MemoryCatalog::new());
        let images = Arc::new(StubImages::default());
        let pipeline = Pipeline::new(
            config(),
            catalog.clone(),
            images.clone(),
            Arc::new(StubTracker::default()),
        );
        let adapter = adapter(vec![minnow("https://acme.example/fail.jpg")]);
        let summary = pipeline.run(&adapter, &ctx(), &RunOptions::default()).await;

        assert_eq!(summary.inserted, 4);
        // the failed color is attempted once, not once per weight
        assert_eq!(images.calls.lock().unwrap().len(), 2);
        assert_eq!(summary.images_uploaded, 1);

        let rows = catalog.rows();
        assert!(rows[0].image_url.is_none());
        assert!(rows[1].image_url.is_none());
        assert!(rows[2].image_url.is_some());
    }

    #[tokio::test]
    async fn test_limit_and_tracker_failure() {
        let catalog = Arc::new(MemoryCatalog::new());
        let tracker = Arc::new(StubTracker {
            fail: true,
            ..Default::default()
        });
        let pipeline = Pipeline::new(
            config(),
            catalog.clone(),
            Arc::new(StubImages::default()),
            tracker.clone(),
        );
        let adapter = adapter(vec![minnow("https://acme.example/a.jpg"), colorless()]);
        let options = RunOptions {
            limit: Some(1),
            ..Default::default()
        };
        let summary = pipeline.run(&adapter, &ctx(), &options).await;

        assert_eq!(summary.discovered, 1);
        assert_eq!(summary.inserted, 4);
        assert_eq!(summary.tracker_errors, 1);
        assert_eq!(summary.errors, 0);
        assert!(tracker.events.lock().unwrap().is_empty());
    }

    async fn run_with_catalog(catalog: Arc<FlakyCatalog>) -> (RunSummary, Vec<String>) {
        let tracker = Arc::new(StubTracker::default());
        let pipeline = Pipeline::new(
            config(),
            catalog,
            Arc::new(StubImages::default()),
            tracker.clone(),
        );
        let adapter = adapter(vec![minnow("https://acme.example/a.jpg")]);
        let summary = pipeline.run(&adapter, &ctx(), &RunOptions::default()).await;
        let events = tracker.events.lock().unwrap().clone();
        (summary, events)
    }

    #[tokio::test]
    async fn test_rejected_insert_only_fails_its_variant() {
        let catalog = Arc::new(FlakyCatalog {
            reject_insert: Some(("Red", 14.0)),
            ..Default::default()
        });
        let (summary, events) = run_with_catalog(catalog.clone()).await;

        assert_eq!(summary.inserted, 3);
        assert_eq!(summary.errors, 1);
        let stored: Vec<_> = catalog
            .inner
            .rows()
            .into_iter()
            .map(|r| (r.color_name, r.weight))
            .collect();
        assert_eq!(
            stored,
            vec![
                ("Red".to_string(), Some(10.0)),
                ("Blue".to_string(), Some(10.0)),
                ("Blue".to_string(), Some(14.0)),
            ]
        );
        assert!(events.contains(
            &"product:Minnow:2 colors x 2 weights: 3 inserted, 0 existing, 1 failed".to_string()
        ));
    }

    #[tokio::test]
    async fn test_failed_lookup_only_fails_its_variant() {
        let catalog = Arc::new(FlakyCatalog {
            fail_lookup: Some(("Blue", 10.0)),
            ..Default::default()
        });
        let (summary, events) = run_with_catalog(catalog.clone()).await;

        assert_eq!(summary.inserted, 3);
        assert_eq!(summary.skipped_existing, 0);
        assert_eq!(summary.errors, 1);
        assert_eq!(catalog.inner.len(), 3);
        assert!(events.contains(
            &"product:Minnow:2 colors x 2 weights: 3 inserted, 0 existing, 1 failed".to_string()
        ));
    }

    #[test]
    fn test_outcome_note_counts_distinct_weights() {
        let mut product = minnow("");
        product.weights = vec![10.0, 10.04, 14.0, 14.0];
        let variants = expand(&product);
        let note = outcome_note(
            &product,
            &variants,
            &ProductOutcome {
                inserted: 4,
                ..Default::default()
            },
        );
        assert_eq!(note, "2 colors x 2 weights: 4 inserted, 0 existing, 0 failed");
    }

    #[test]
    fn test_outcome_note_counts_null_weight_as_one() {
        let mut product = minnow("");
        product.weights.clear();
        let variants = expand(&product);
        let note = outcome_note(
            &product,
            &variants,
            &ProductOutcome {
                inserted: 2,
                ..Default::default()
            },
        );
        assert_eq!(note, "2 colors x 1 weights: 2 inserted, 0 existing, 0 failed");
    }
}
