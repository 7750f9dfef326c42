//! End-to-end runs against local backends and a mock manufacturer site.

use std::io::{Cursor, Write};
use std::sync::Arc;

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use reqwest::Client;
use tackle_ingest::adapters::{FeedAdapter, RetryPolicy, ScrapeContext, SelectorAdapter};
use tackle_ingest::catalog::MemoryCatalog;
use tackle_ingest::models::{Config, FeedProfile, SiteProfile};
use tackle_ingest::pipeline::{ImagePipeline, Pipeline, RunOptions};
use tackle_ingest::storage::LocalBlobStore;
use tackle_ingest::tracker::LogTracker;
use tempfile::{NamedTempFile, TempDir};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn jpeg(width: u32, height: u32) -> Vec<u8> {
    let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([20, 90, 160])));
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Jpeg)
        .unwrap();
    buf
}

fn config() -> Arc<Config> {
    let mut config = Config::default();
    config.crawler.product_delay_ms = 0;
    Arc::new(config)
}

fn ctx() -> ScrapeContext {
    ScrapeContext::new(Client::new(), RetryPolicy::none())
}

struct Harness {
    catalog: Arc<MemoryCatalog>,
    blobs: TempDir,
    pipeline: Pipeline,
}

fn harness() -> Harness {
    let catalog = Arc::new(MemoryCatalog::new());
    let blobs = TempDir::new().unwrap();
    let store =
        Arc::new(LocalBlobStore::new(blobs.path()).with_public_base("https://cdn.example"));
    let images = ImagePipeline::new(Client::new(), store, &config().images)
        .with_retry(RetryPolicy::none());
    let pipeline = Pipeline::new(
        config(),
        catalog.clone(),
        Arc::new(images),
        Arc::new(LogTracker),
    );
    Harness {
        catalog,
        blobs,
        pipeline,
    }
}

#[tokio::test]
async fn feed_run_is_idempotent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/img/gold.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(jpeg(900, 300)))
        .mount(&server)
        .await;

    let feed = serde_json::json!([
        {
            "name": "Rolling Bait 77",
            "slug": "rolling-bait-77",
            "manufacturer": "Bolt",
            "manufacturerSlug": "bolt",
            "colors": [
                {"name": "Gold", "imageUrl": format!("{}/img/gold.jpg", server.uri())},
                {"name": "Ghost", "imageUrl": ""}
            ],
            "weights": [7.0, 10.0, 14.0],
            "sourceUrl": "https://bolt.example/rb77"
        }
    ]);
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(feed.to_string().as_bytes()).unwrap();

    let adapter = FeedAdapter::new(FeedProfile {
        manufacturer: "Bolt".to_string(),
        slug: "bolt".to_string(),
        location: file.path().to_string_lossy().into_owned(),
    });
    let h = harness();

    let first = h.pipeline.run(&adapter, &ctx(), &RunOptions::default()).await;
    assert_eq!(first.discovered, 1);
    assert_eq!(first.variants, 6);
    assert_eq!(first.inserted, 6);
    assert_eq!(first.images_uploaded, 1);
    assert_eq!(first.errors, 0);

    let rows = h.catalog.rows();
    let gold: Vec<_> = rows.iter().filter(|r| r.color_name == "Gold").collect();
    let ghost: Vec<_> = rows.iter().filter(|r| r.color_name == "Ghost").collect();
    let gold_url = "https://cdn.example/bolt/rolling-bait-77/0.webp";
    assert_eq!(gold.len(), 3);
    assert!(gold.iter().all(|r| r.image_url.as_deref() == Some(gold_url)));
    // no color image and no main image
    assert!(ghost.iter().all(|r| r.image_url.is_none()));
    assert!(h.blobs.path().join("bolt/rolling-bait-77/0.webp").exists());

    let second = h.pipeline.run(&adapter, &ctx(), &RunOptions::default()).await;
    assert_eq!(second.inserted, 0);
    assert_eq!(second.skipped_existing, 6);
    assert_eq!(h.catalog.len(), 6);
}

#[tokio::test]
async fn selector_site_end_to_end() {
    let server = MockServer::start().await;
    let listing = r#"
        <ul class="items">
          <li><a href="/lure/shallow-90.html">Shallow 90</a></li>
          <li><a href="/lure/missing.html">Discontinued</a></li>
          <li><a href="/lure/rod-x.html">Rod X</a></li>
        </ul>
    "#;
    let product = r#"
        <html><head><meta property="og:image" content="/img/main.jpg"></head>
        <body>
          <h1>Shallow 90</h1>
          <table class="spec"><tr><td class="w">9g</td></tr></table>
          <p class="price">1,600円（税抜）</p>
          <div class="color"><img src="/img/c1.jpg"><p>Pink Back</p></div>
          <div class="color"><img src="/img/broken.jpg"><p>Clear</p></div>
        </body></html>
    "#;
    for (route, body) in [("/lures/", listing), ("/lure/shallow-90.html", product)] {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&server)
            .await;
    }
    Mock::given(method("GET"))
        .and(path("/img/c1.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(jpeg(300, 200)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/img/broken.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not an image"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let profile: SiteProfile = toml::from_str(&format!(
        r#"
        manufacturer = "Acme"
        slug = "acme"
        listing_urls = ["{}/lures/"]
        product_link_selector = "ul.items a"
        exclude_keywords = ["Rod"]
        price_excludes_tax = true

        [selectors]
        name = "h1"
        price = ".price"
        color_item = "div.color"
        color_name = "p"
        weight = ".spec .w"
        main_image = "meta[property='og:image']"
        "#,
        server.uri()
    ))
    .unwrap();
    let adapter = SelectorAdapter::new(profile).unwrap();
    let h = harness();

    let summary = h.pipeline.run(&adapter, &ctx(), &RunOptions::default()).await;
    assert_eq!(summary.discovered, 2);
    assert_eq!(summary.scraped, 1);
    assert_eq!(summary.not_found, 1);
    assert_eq!(summary.inserted, 2);
    assert_eq!(summary.images_uploaded, 1);
    // the undecodable image is counted but does not block its row
    assert_eq!(summary.errors, 1);

    let rows = h.catalog.rows();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].slug, "shallow-90");
    assert_eq!(rows[0].price, 1760);
    assert_eq!(rows[0].weight, Some(9.0));
    assert_eq!(
        rows[0].image_url.as_deref(),
        Some("https://cdn.example/acme/shallow-90/0.webp")
    );
    assert_eq!(rows[1].color_name, "Clear");
    assert!(rows[1].image_url.is_none());
}
