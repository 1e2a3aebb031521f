//! File storage backend for receipts and ticket photos.

use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid file name: {0}")]
    InvalidName(String),
}

/// Bucket-style blob storage. Implementations return a public URL for the
/// stored object.
#[async_trait]
pub trait FileStorage: Send + Sync {
    async fn store(&self, bucket: &str, name: &str, bytes: &[u8]) -> Result<String, StorageError>;
}

/// Stores files under a local data directory and serves them from
/// `{public_base_url}/files/{bucket}/{name}`.
pub struct LocalFileStorage {
    root: PathBuf,
    public_base_url: String,
}

impl LocalFileStorage {
    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.into(),
        }
    }
}

#[async_trait]
impl FileStorage for LocalFileStorage {
    async fn store(&self, bucket: &str, name: &str, bytes: &[u8]) -> Result<String, StorageError> {
        validate_name(bucket)?;
        validate_name(name)?;

        let dir = self.root.join(bucket);
        tokio::fs::create_dir_all(&dir).await?;
        let path = dir.join(name);
        tokio::fs::write(&path, bytes).await?;

        debug!(bucket = bucket, name = name, size = bytes.len(), "stored file");
        Ok(format!(
            "{}/files/{}/{}",
            self.public_base_url.trim_end_matches('/'),
            bucket,
            name
        ))
    }
}

/// Object names must not traverse outside the storage root.
fn validate_name(name: &str) -> Result<(), StorageError> {
    if name.is_empty() || name.contains('/') || name.contains('\\') || name.contains("..") {
        return Err(StorageError::InvalidName(name.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_store_writes_file_and_returns_url() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalFileStorage::new(dir.path(), "http://localhost:3001/");

        let url = storage.store("recus", "q1.pdf", b"recu").await.unwrap();

        assert_eq!(url, "http://localhost:3001/files/recus/q1.pdf");
        let on_disk = std::fs::read(dir.path().join("recus/q1.pdf")).unwrap();
        assert_eq!(on_disk, b"recu");
    }

    #[tokio::test]
    async fn test_store_rejects_path_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalFileStorage::new(dir.path(), "http://localhost:3001");

        let err = storage.store("recus", "../evil.pdf", b"x").await.unwrap_err();
        assert!(matches!(err, StorageError::InvalidName(_)));
    }
}
