//! Blob storage for accepted uploads.
//!
//! The upload pipeline hands the rendered CSV of accepted rows to a
//! [`BlobStore`] and gets back a URL it can put in the API response.
//! The only backend shipped here is [`LocalBlobStore`], which writes
//! under a local directory served by the HTTP server at `/files`.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::{StorageError, StorageResult};

/// Persist a blob of bytes under a key, returning a client-reachable URL.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn put(&self, key: &str, bytes: &[u8]) -> StorageResult<String>;
}

/// Filesystem-backed store.
pub struct LocalBlobStore {
    root: PathBuf,
    public_prefix: String,
}

impl LocalBlobStore {
    /// Store files under `root`, exposed at `/files/<key>`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            public_prefix: "/files".to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn put(&self, key: &str, bytes: &[u8]) -> StorageResult<String> {
        // keys are generated, never user input, but stay strict anyway
        if key.is_empty() || key.contains('/') || key.contains('\\') || key.contains("..") {
            return Err(StorageError::InvalidKey(key.to_string()));
        }

        tokio::fs::create_dir_all(&self.root).await?;
        tokio::fs::write(self.root.join(key), bytes).await?;

        Ok(format!("{}/{}", self.public_prefix, key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_writes_file_and_returns_url() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path());

        let url = store.put("result.csv", b"a,b\n1,2\n").await.unwrap();
        assert_eq!(url, "/files/result.csv");

        let written = std::fs::read_to_string(dir.path().join("result.csv")).unwrap();
        assert_eq!(written, "a,b\n1,2\n");
    }

    #[tokio::test]
    async fn test_put_creates_missing_directories() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path().join("nested").join("deep"));

        store.put("x.csv", b"x").await.unwrap();
        assert!(store.root().join("x.csv").exists());
    }

    #[tokio::test]
    async fn test_put_rejects_traversal_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path());

        for key in ["", "../evil.csv", "a/b.csv", "a\\b.csv"] {
            let err = store.put(key, b"x").await.unwrap_err();
            assert!(matches!(err, StorageError::InvalidKey(_)), "key {:?}", key);
        }
    }
}
