//! Local filesystem blob bucket.
//!
//! Writes fully replace prior content and fsync before returning; the
//! SHA-256 digest is computed from the same bytes in the same pass. Reads
//! stream chunks through `ReaderStream` so large files never sit in memory
//! wholesale.

use std::path::Path;

use bytes::Bytes;
use futures::{Stream, StreamExt};
use sha2::{Digest, Sha256};
use std::pin::Pin;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::{StorageError, StorageResult};

/// Integrity metadata for a completed upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredBlob {
    pub size_bytes: u64,
    pub sha256: String,
}

/// Local filesystem storage rooted at a fixed directory.
#[derive(Debug, Clone)]
pub struct LocalBucket;

impl LocalBucket {
    /// Create a bucket, ensuring the storage root exists.
    pub async fn new(root: impl AsRef<Path>) -> StorageResult<Self> {
        let root = root.as_ref();
        fs::create_dir_all(root).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage root {}: {}",
                root.display(),
                e
            ))
        })?;
        Ok(LocalBucket)
    }

    /// Write `data` to `path`, replacing any prior content, and return the
    /// byte count and SHA-256 hex digest of what was written.
    pub async fn put(&self, path: &Path, data: &[u8]) -> StorageResult<StoredBlob> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let start = std::time::Instant::now();

        let mut file = fs::File::create(path).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to create file {}: {}", path.display(), e))
        })?;
        file.write_all(data).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to write file {}: {}", path.display(), e))
        })?;
        file.sync_all().await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to sync file {}: {}", path.display(), e))
        })?;

        let digest = hex::encode(Sha256::digest(data));
        let blob = StoredBlob {
            size_bytes: data.len() as u64,
            sha256: digest,
        };

        tracing::info!(
            path = %path.display(),
            size_bytes = blob.size_bytes,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local bucket write successful"
        );

        Ok(blob)
    }

    pub async fn exists(&self, path: &Path) -> bool {
        fs::try_exists(path).await.unwrap_or(false)
    }

    /// Size in bytes of the blob at `path`, if present.
    pub async fn content_length(&self, path: &Path) -> StorageResult<u64> {
        let meta = fs::metadata(path)
            .await
            .map_err(|_| StorageError::NotFound(path.display().to_string()))?;
        Ok(meta.len())
    }

    /// Open the blob at `path` as a chunked byte stream.
    pub async fn read_stream(
        &self,
        path: &Path,
    ) -> StorageResult<Pin<Box<dyn Stream<Item = Result<Bytes, StorageError>> + Send>>> {
        if !self.exists(path).await {
            return Err(StorageError::NotFound(path.display().to_string()));
        }

        let file = fs::File::open(path).await.map_err(|e| {
            StorageError::DownloadFailed(format!("Failed to open file {}: {}", path.display(), e))
        })?;

        let stream = tokio_util::io::ReaderStream::new(file).map(|result| {
            result.map_err(|e| StorageError::DownloadFailed(format!("Failed to read chunk: {}", e)))
        });

        Ok(Box::pin(stream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn put_computes_size_and_digest() {
        let dir = tempdir().unwrap();
        let bucket = LocalBucket::new(dir.path()).await.unwrap();
        let path = dir.path().join("a/b/report.txt");

        let data = b"docstore test content";
        let blob = bucket.put(&path, data).await.unwrap();

        assert_eq!(blob.size_bytes, data.len() as u64);
        assert_eq!(blob.sha256, hex::encode(Sha256::digest(data)));
        assert_eq!(fs::read(&path).await.unwrap(), data);
    }

    #[tokio::test]
    async fn put_replaces_prior_content() {
        let dir = tempdir().unwrap();
        let bucket = LocalBucket::new(dir.path()).await.unwrap();
        let path = dir.path().join("doc.bin");

        bucket.put(&path, b"first version, longer").await.unwrap();
        let blob = bucket.put(&path, b"second").await.unwrap();

        assert_eq!(blob.size_bytes, 6);
        assert_eq!(fs::read(&path).await.unwrap(), b"second");
    }

    #[tokio::test]
    async fn read_stream_round_trips() {
        let dir = tempdir().unwrap();
        let bucket = LocalBucket::new(dir.path()).await.unwrap();
        let path = dir.path().join("stream.bin");
        let data: Vec<u8> = (0..=255u8).cycle().take(200_000).collect();

        bucket.put(&path, &data).await.unwrap();

        let mut stream = bucket.read_stream(&path).await.unwrap();
        let mut collected = Vec::new();
        while let Some(chunk) = stream.next().await {
            collected.extend_from_slice(&chunk.unwrap());
        }
        assert_eq!(collected, data);
    }

    #[tokio::test]
    async fn missing_file_is_not_found() {
        let dir = tempdir().unwrap();
        let bucket = LocalBucket::new(dir.path()).await.unwrap();

        let result = bucket.read_stream(&dir.path().join("missing.txt")).await;
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }
}
