// src/pipeline/image.rs

//! Image pipeline: download, resize, encode to WebP, upload.

use std::sync::Arc;

use async_trait::async_trait;
use image::imageops::FilterType;
use image::DynamicImage;
use reqwest::Client;

use crate::adapters::RetryPolicy;
use crate::error::{AppError, Result};
use crate::models::ImageConfig;
use crate::storage::BlobStore;
use crate::utils::http;

pub const WEBP_CONTENT_TYPE: &str = "image/webp";

/// Blob key of a color's image: `{maker}/{slug}/{color_index}.webp`.
pub fn image_key(manufacturer_slug: &str, product_slug: &str, color_index: usize) -> String {
    format!("{manufacturer_slug}/{product_slug}/{color_index}.webp")
}

/// Turns a source image URL into a public URL under `key`.
#[async_trait]
pub trait ImageProcessor: Send + Sync {
    async fn process(&self, source_url: &str, key: &str) -> Result<String>;
}

/// Resize to at most `width` pixels wide and encode as lossy WebP.
///
/// Height follows the aspect ratio. Narrower images keep their size.
pub fn transcode(bytes: &[u8], width: u32, quality: f32) -> Result<Vec<u8>> {
    let decoded = image::load_from_memory(bytes)?;

    let resized = if decoded.width() > width {
        decoded.resize(width, u32::MAX, FilterType::Lanczos3)
    } else {
        decoded
    };

    // the encoder only accepts 8-bit RGB(A)
    let normalized = if resized.color().has_alpha() {
        DynamicImage::ImageRgba8(resized.to_rgba8())
    } else {
        DynamicImage::ImageRgb8(resized.to_rgb8())
    };

    let encoder = webp::Encoder::from_image(&normalized)
        .map_err(|e| AppError::validation(format!("webp encoder: {e}")))?;
    Ok(encoder.encode(quality).to_vec())
}

/// Image pipeline backed by a blob store.
pub struct ImagePipeline {
    client: Client,
    retry: RetryPolicy,
    blobs: Arc<dyn BlobStore>,
    width: u32,
    quality: f32,
}

impl ImagePipeline {
    pub fn new(client: Client, blobs: Arc<dyn BlobStore>, config: &ImageConfig) -> Self {
        Self {
            client,
            retry: RetryPolicy::default(),
            blobs,
            width: config.width,
            quality: config.quality,
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    async fn download(&self, source_url: &str) -> Result<Vec<u8>> {
        self.retry
            .run(source_url, || http::fetch_bytes(&self.client, source_url))
            .await
    }
}

#[async_trait]
impl ImageProcessor for ImagePipeline {
    async fn process(&self, source_url: &str, key: &str) -> Result<String> {
        let bytes = self
            .download(source_url)
            .await
            .map_err(|e| AppError::image(source_url, e))?;

        let (width, quality) = (self.width, self.quality);
        let webp = tokio::task::spawn_blocking(move || transcode(&bytes, width, quality))
            .await
            .map_err(|e| AppError::image(source_url, e))?
            .map_err(|e| AppError::image(source_url, e))?;
        let size = webp.len();

        self.blobs
            .put(key, webp, WEBP_CONTENT_TYPE)
            .await
            .map_err(|e| AppError::image(source_url, e))?;

        log::debug!("Image {} -> {} ({} bytes)", source_url, key, size);
        Ok(self.blobs.public_url(key))
    }
}
