//! Blob storage for transcoded images.
//!
//! Objects are written under deterministic keys and served from a public
//! base URL:
//!
//! ```text
//! {public_base}/
//! └── {manufacturer_slug}/
//!     └── {product_slug}/
//!         ├── 0.webp
//!         └── 1.webp
//! ```

pub mod local;
#[cfg(feature = "s3")]
pub mod s3;

use async_trait::async_trait;

use crate::error::Result;

pub use local::LocalBlobStore;
#[cfg(feature = "s3")]
pub use s3::S3BlobStore;

/// Trait for blob storage backends.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `bytes` under `key`, overwriting any existing object.
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<()>;

    /// Public URL an object is served from.
    fn public_url(&self, key: &str) -> String;
}

/// Join a public base URL and an object key with exactly one slash.
pub fn join_public_url(base: &str, key: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), key.trim_start_matches('/'))
}
