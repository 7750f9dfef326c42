//! Application configuration structures.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::utils::is_remote;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::{FeedProfile, SiteProfile};

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP and scraping behavior settings
    #[serde(default)]
    pub crawler: CrawlerConfig,

    /// Image transcoding settings
    #[serde(default)]
    pub images: ImageConfig,

    /// Relational catalog settings
    #[serde(default)]
    pub catalog: CatalogConfig,

    /// Tracker settings
    #[serde(default)]
    pub tracker: TrackerConfig,

    /// Selector-driven site profiles
    #[serde(default)]
    pub sites: Vec<SiteProfile>,

    /// JSON feed profiles
    #[serde(default)]
    pub feeds: Vec<FeedProfile>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Make relative feed file paths relative to `base` (the storage
    /// directory) instead of the working directory.
    pub fn resolve_feed_paths(&mut self, base: &Path) {
        for feed in &mut self.feeds {
            if is_remote(&feed.location) || Path::new(&feed.location).is_absolute() {
                continue;
            }
            feed.location = base.join(&feed.location).to_string_lossy().into_owned();
        }
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.crawler.user_agent.trim().is_empty() {
            return Err(AppError::validation("crawler.user_agent is empty"));
        }
        if self.crawler.timeout_secs == 0 {
            return Err(AppError::validation("crawler.timeout_secs must be > 0"));
        }
        if self.crawler.retry_attempts == 0 {
            return Err(AppError::validation("crawler.retry_attempts must be > 0"));
        }
        if self.images.width == 0 {
            return Err(AppError::validation("images.width must be > 0"));
        }
        if !(0.0..=100.0).contains(&self.images.quality) {
            return Err(AppError::validation("images.quality must be within 0-100"));
        }
        if self.catalog.table.trim().is_empty() {
            return Err(AppError::validation("catalog.table is empty"));
        }

        let mut seen = HashSet::new();
        let slugs = self
            .sites
            .iter()
            .map(|s| s.slug.as_str())
            .chain(self.feeds.iter().map(|f| f.slug.as_str()));
        for slug in slugs {
            if slug.trim().is_empty() {
                return Err(AppError::validation("source slug is empty"));
            }
            if !seen.insert(slug) {
                return Err(AppError::validation(format!(
                    "duplicate source slug '{slug}'"
                )));
            }
        }
        Ok(())
    }
}

/// HTTP client and scraping behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Delay between products in milliseconds
    #[serde(default = "defaults::product_delay")]
    pub product_delay_ms: u64,

    /// Attempts per page fetch, including the first
    #[serde(default = "defaults::retry_attempts")]
    pub retry_attempts: u32,

    /// Backoff before the second attempt, doubled afterwards
    #[serde(default = "defaults::retry_base_delay")]
    pub retry_base_delay_ms: u64,
}

impl CrawlerConfig {
    pub fn product_delay(&self) -> Duration {
        Duration::from_millis(self.product_delay_ms)
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            product_delay_ms: defaults::product_delay(),
            retry_attempts: defaults::retry_attempts(),
            retry_base_delay_ms: defaults::retry_base_delay(),
        }
    }
}

/// Image transcoding settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageConfig {
    /// Target width in pixels; smaller originals keep their size
    #[serde(default = "defaults::image_width")]
    pub width: u32,

    /// Lossy WebP quality (0-100)
    #[serde(default = "defaults::image_quality")]
    pub quality: f32,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            width: defaults::image_width(),
            quality: defaults::image_quality(),
        }
    }
}

/// Relational catalog settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Table holding one row per variant
    #[serde(default = "defaults::catalog_table")]
    pub table: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            table: defaults::catalog_table(),
        }
    }
}

/// Tracker status values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerConfig {
    #[serde(default = "defaults::status_registering")]
    pub status_registering: String,

    #[serde(default = "defaults::status_registered")]
    pub status_registered: String,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            status_registering: defaults::status_registering(),
            status_registered: defaults::status_registered(),
        }
    }
}

mod defaults {
    // Some manufacturer sites reject non-browser clients.
    pub fn user_agent() -> String {
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) \
         Chrome/124.0.0.0 Safari/537.36"
            .into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn product_delay() -> u64 {
        300
    }
    pub fn retry_attempts() -> u32 {
        3
    }
    pub fn retry_base_delay() -> u64 {
        1000
    }

    pub fn image_width() -> u32 {
        500
    }
    pub fn image_quality() -> f32 {
        80.0
    }

    pub fn catalog_table() -> String {
        "lures".into()
    }

    pub fn status_registering() -> String {
        "registering".into()
    }
    pub fn status_registered() -> String {
        "registered".into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_user_agent() {
        let mut config = Config::default();
        config.crawler.user_agent = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_width() {
        let mut config = Config::default();
        config.images.width = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_duplicate_slugs() {
        let config: Config = toml::from_str(
            r#"
            [[sites]]
            manufacturer = "Acme"
            slug = "acme"
            [sites.selectors]
            name = "h1"
            color_item = "li"

            [[feeds]]
            manufacturer = "Acme"
            slug = "acme"
            location = "acme.json"
            "#,
        )
        .unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_sections_fill_defaults() {
        let config: Config = toml::from_str("[crawler]\nproduct_delay_ms = 500\n").unwrap();
        assert_eq!(config.crawler.product_delay_ms, 500);
        assert_eq!(config.crawler.retry_attempts, 3);
        assert_eq!(config.images.width, 500);
        assert_eq!(config.catalog.table, "lures");
    }

    #[test]
    fn bundled_config_is_valid() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/storage/config.toml");
        let config = Config::load(path).unwrap();
        config.validate().unwrap();
        assert_eq!(config.sites[0].slug, "blue-current");
        assert_eq!(config.sites[0].species_keywords.len(), 2);
        assert_eq!(config.feeds[0].slug, "bolt");
    }

    #[test]
    fn feed_paths_resolve_against_storage_dir() {
        let storage = Path::new(concat!(env!("CARGO_MANIFEST_DIR"), "/storage"));
        let mut config = Config::load(storage.join("config.toml")).unwrap();
        config.feeds.push(FeedProfile {
            manufacturer: "Remote".to_string(),
            slug: "remote".to_string(),
            location: "https://feeds.example/remote.json".to_string(),
        });
        config.resolve_feed_paths(storage);

        assert!(Path::new(&config.feeds[0].location).is_file());
        assert_eq!(config.feeds[1].location, "https://feeds.example/remote.json");
    }
}
