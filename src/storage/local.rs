//! Local filesystem blob store.
//!
//! Used for dry runs and development; production deployments upload to an
//! S3-compatible bucket instead.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::storage::{BlobStore, join_public_url};

/// Local filesystem blob store.
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    root_dir: PathBuf,
    public_base: String,
}

impl LocalBlobStore {
    /// Create a store rooted at `root_dir`, served from `file://` URLs.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        let root_dir = root_dir.into();
        let public_base = format!("file://{}", root_dir.display());
        Self {
            root_dir,
            public_base,
        }
    }

    /// Serve objects from a custom base URL instead of `file://`.
    pub fn with_public_base(mut self, public_base: impl Into<String>) -> Self {
        self.public_base = public_base.into();
        self
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    fn path(&self, key: &str) -> Result<PathBuf> {
        if key.is_empty() || key.split('/').any(|part| part == "..") {
            return Err(AppError::Blob(format!("invalid object key '{key}'")));
        }
        Ok(self.root_dir.join(key))
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let tmp = path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<()> {
        self.write_bytes(key, &bytes).await?;
        log::debug!(
            "Stored {} ({} bytes, {}) under {}",
            key,
            bytes.len(),
            content_type,
            self.root_dir.display()
        );
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        join_public_url(&self.public_base, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_put_creates_dirs_and_overwrites() {
        let dir = TempDir::new().unwrap();
        let store = LocalBlobStore::new(dir.path());

        store
            .put("acme/minnow/0.webp", b"first".to_vec(), "image/webp")
            .await
            .unwrap();
        store
            .put("acme/minnow/0.webp", b"second".to_vec(), "image/webp")
            .await
            .unwrap();

        let path = dir.path().join("acme/minnow/0.webp");
        assert_eq!(std::fs::read(&path).unwrap(), b"second");
        assert!(!dir.path().join("acme/minnow/0.tmp").exists());
    }

    #[tokio::test]
    async fn test_rejects_escaping_keys() {
        let dir = TempDir::new().unwrap();
        let store = LocalBlobStore::new(dir.path());
        let err = store
            .put("../outside.webp", Vec::new(), "image/webp")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Blob(_)));
    }

    #[test]
    fn test_public_url() {
        let store = LocalBlobStore::new("/tmp/blobs").with_public_base("http://localhost:8080/");
        assert_eq!(
            store.public_url("acme/minnow/1.webp"),
            "http://localhost:8080/acme/minnow/1.webp"
        );
        assert_eq!(
            LocalBlobStore::new("/tmp/blobs").public_url("a/b/0.webp"),
            "file:///tmp/blobs/a/b/0.webp"
        );
    }
}
