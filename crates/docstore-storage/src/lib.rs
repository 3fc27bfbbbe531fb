//! Docstore Storage Library
//!
//! Local-disk emulation of an object store: logical storage keys are
//! resolved under a fixed root (`paths`), bytes move through `local`, and
//! time-limited signed tokens (`token`) authorize individual upload and
//! download operations without any cloud dependency.
//!
//! Storage keys are caller-chosen slash-separated relative paths
//! (e.g. `companies/{id}/vehicles/{id}/soat.pdf`). Keys must not contain
//! `..` segments or an absolute prefix; the resolver enforces this before
//! any filesystem access.

pub mod local;
pub mod paths;
pub mod token;

use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    /// Logical key escapes the storage root. Security violation, never
    /// silently sanitized.
    #[error("Storage key escapes storage root: {0}")]
    PathTraversal(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

impl From<StorageError> for docstore_core::AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::PathTraversal(key) => docstore_core::AppError::PathTraversal(key),
            StorageError::InvalidKey(key) => {
                docstore_core::AppError::Validation(format!("invalid storage key: {}", key))
            }
            StorageError::NotFound(key) => docstore_core::AppError::NotFound(key),
            other => docstore_core::AppError::Storage(other.to_string()),
        }
    }
}

// Re-export commonly used types
pub use local::{LocalBucket, StoredBlob};
pub use paths::BucketPaths;
pub use token::{TokenCodec, TokenGrant, TransferMode};
