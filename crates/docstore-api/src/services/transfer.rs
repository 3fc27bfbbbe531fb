//! Upload/download orchestration.
//!
//! Binds a verified transfer token to the actual byte transfer: tokens are
//! issued against resolved physical paths at document-creation time (or on
//! demand for downloads), and consuming one verifies the MAC, the expiry,
//! and the operation mode before any filesystem access. On upload
//! completion the physical path is translated back to a logical key and the
//! matching document record picks up the size and SHA-256 digest
//! (best-effort: a missing record is not an error).

use std::path::PathBuf;
use std::sync::Arc;

use bytes::Bytes;
use futures::Stream;
use std::pin::Pin;

use docstore_core::models::Document;
use docstore_core::AppError;
use docstore_db::DocumentStore;
use docstore_storage::{BucketPaths, LocalBucket, StorageError, TokenCodec, TransferMode};

/// Result of a consumed upload token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadOutcome {
    pub size_bytes: u64,
}

/// A download ready to stream, with whatever metadata the document record
/// can contribute (absent when no record matches the path).
pub struct DownloadPayload {
    pub document: Option<Document>,
    pub size_bytes: u64,
    pub stream: Pin<Box<dyn Stream<Item = Result<Bytes, StorageError>> + Send>>,
}

impl std::fmt::Debug for DownloadPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DownloadPayload")
            .field("document", &self.document)
            .field("size_bytes", &self.size_bytes)
            .finish_non_exhaustive()
    }
}

#[derive(Clone)]
pub struct TransferService {
    codec: TokenCodec,
    paths: BucketPaths,
    bucket: LocalBucket,
    store: Arc<dyn DocumentStore>,
    ttl_secs: u64,
}

impl TransferService {
    pub fn new(
        codec: TokenCodec,
        paths: BucketPaths,
        bucket: LocalBucket,
        store: Arc<dyn DocumentStore>,
        ttl_secs: u64,
    ) -> Self {
        Self {
            codec,
            paths,
            bucket,
            store,
            ttl_secs,
        }
    }

    /// Issue an upload token for a logical key, pre-creating the parent
    /// directory chain so the later PUT only has to write the file.
    pub async fn issue_upload_token(&self, logical_key: &str) -> Result<String, AppError> {
        let physical = self.paths.resolve(logical_key)?;
        self.paths.ensure_parent_dirs(&physical).await?;
        let path = physical_path_str(&physical)?;
        Ok(self.codec.issue(&path, TransferMode::Upload, self.ttl_secs))
    }

    pub fn issue_download_token(&self, logical_key: &str) -> Result<String, AppError> {
        let physical = self.paths.resolve(logical_key)?;
        let path = physical_path_str(&physical)?;
        Ok(self
            .codec
            .issue(&path, TransferMode::Download, self.ttl_secs))
    }

    /// Consume an upload token: write the body, then reconcile size and
    /// digest onto the matching document record.
    pub async fn handle_upload(&self, token: &str, body: &[u8]) -> Result<UploadOutcome, AppError> {
        let grant = self
            .codec
            .verify(token)
            .filter(|g| g.mode == TransferMode::Upload)
            .ok_or(AppError::InvalidToken)?;

        let physical = PathBuf::from(&grant.file_path);
        let blob = self.bucket.put(&physical, body).await?;

        match self.paths.to_logical_key(&physical) {
            Some(logical_key) => {
                let matched = self
                    .store
                    .record_upload(&logical_key, blob.size_bytes as i64, &blob.sha256)
                    .await?;
                if !matched {
                    tracing::debug!(
                        storage_key = %logical_key,
                        "upload completed with no matching document record"
                    );
                }
            }
            None => {
                // Token was signed by us, so this means the storage root
                // moved between issue and consume.
                tracing::warn!(
                    path = %physical.display(),
                    "uploaded path does not map back to a logical key"
                );
            }
        }

        Ok(UploadOutcome {
            size_bytes: blob.size_bytes,
        })
    }

    /// Consume a download token: open the file as a chunked stream.
    pub async fn handle_download(&self, token: &str) -> Result<DownloadPayload, AppError> {
        let grant = self
            .codec
            .verify(token)
            .filter(|g| g.mode == TransferMode::Download)
            .ok_or(AppError::InvalidToken)?;

        let physical = PathBuf::from(&grant.file_path);
        if !self.bucket.exists(&physical).await {
            return Err(AppError::NotFound(
                "no file for download token".to_string(),
            ));
        }

        let size_bytes = self.bucket.content_length(&physical).await?;
        let stream = self.bucket.read_stream(&physical).await?;

        let document = match self.paths.to_logical_key(&physical) {
            Some(key) => self.store.find_by_storage_key(&key).await?,
            None => None,
        };

        Ok(DownloadPayload {
            document,
            size_bytes,
            stream,
        })
    }
}

fn physical_path_str(physical: &std::path::Path) -> Result<String, AppError> {
    physical
        .to_str()
        .map(str::to_owned)
        .ok_or_else(|| AppError::Internal("storage path is not valid UTF-8".to_string()))
}
