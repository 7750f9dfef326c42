//! S3-compatible blob store.
//!
//! Works against any S3 API endpoint (R2, MinIO, AWS) using static
//! credentials and path-style addressing.

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::Client;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;

use crate::config::S3Settings;
use crate::error::{AppError, Result};
use crate::storage::{BlobStore, join_public_url};

/// S3-backed blob store.
pub struct S3BlobStore {
    client: Client,
    bucket: String,
    public_base: String,
}

impl S3BlobStore {
    pub fn new(client: Client, bucket: impl Into<String>, public_base: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            public_base: public_base.into(),
        }
    }

    /// Build a client for the configured endpoint.
    pub async fn connect(settings: &S3Settings) -> Self {
        let credentials = Credentials::new(
            &settings.access_key_id,
            &settings.secret_access_key,
            None,
            None,
            "tackle-ingest",
        );
        let shared = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(settings.region.clone()))
            .endpoint_url(&settings.endpoint)
            .credentials_provider(credentials)
            .load()
            .await;
        let config = aws_sdk_s3::config::Builder::from(&shared)
            .force_path_style(true)
            .build();

        Self::new(
            Client::from_conf(config),
            &settings.bucket,
            &settings.public_base_url,
        )
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<()> {
        let size = bytes.len();
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(bytes))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| {
                AppError::Blob(format!(
                    "put s3://{}/{}: {}",
                    self.bucket,
                    key,
                    DisplayErrorContext(&e)
                ))
            })?;

        log::debug!("Uploaded {} bytes to s3://{}/{}", size, self.bucket, key);
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        join_public_url(&self.public_base, key)
    }
}
