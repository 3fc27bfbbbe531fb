//! Logical key to physical path mapping.
//!
//! A logical storage key is a slash-separated relative path chosen by the
//! document-creation flow. The resolver joins it under a fixed storage root
//! and refuses anything that could escape that root. The traversal check is
//! a security boundary: offending keys fail loudly, they are never cleaned
//! up into something usable.

use std::path::{Component, Path, PathBuf};

use crate::{StorageError, StorageResult};

/// Maps logical storage keys to physical paths under a fixed root, and back.
#[derive(Debug, Clone)]
pub struct BucketPaths {
    root: PathBuf,
}

impl BucketPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a logical key to its physical path.
    ///
    /// Rejects absolute keys and keys containing parent-directory segments
    /// with `PathTraversal` before joining; empty keys are `InvalidKey`.
    pub fn resolve(&self, logical_key: &str) -> StorageResult<PathBuf> {
        if logical_key.starts_with('/') || Path::new(logical_key).is_absolute() {
            return Err(StorageError::PathTraversal(logical_key.to_string()));
        }

        let trimmed = logical_key.trim_matches('/');
        if trimmed.is_empty() {
            return Err(StorageError::InvalidKey(logical_key.to_string()));
        }

        let has_parent_segment = Path::new(trimmed)
            .components()
            .any(|c| matches!(c, Component::ParentDir));
        if has_parent_segment {
            return Err(StorageError::PathTraversal(logical_key.to_string()));
        }

        Ok(self.root.join(trimmed))
    }

    /// Inverse mapping: the logical key for a physical path, or `None` when
    /// the path does not lie under the storage root.
    pub fn to_logical_key(&self, physical: &Path) -> Option<String> {
        let relative = physical.strip_prefix(&self.root).ok()?;
        let mut segments = Vec::new();
        for component in relative.components() {
            match component {
                Component::Normal(part) => segments.push(part.to_str()?.to_string()),
                // Anything but plain segments means the path was not built
                // by resolve(); refuse to guess.
                _ => return None,
            }
        }
        if segments.is_empty() {
            return None;
        }
        Some(segments.join("/"))
    }

    /// Create the parent directory chain for a physical path. Idempotent.
    pub async fn ensure_parent_dirs(&self, physical: &Path) -> StorageResult<()> {
        if let Some(parent) = physical.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(())
    }
}
