//! Disk-backed embedding store.
//!
//! One JSON file per content key under a root directory. The store outlives a
//! single pipeline run, so a long take can be re-processed quickly via cache
//! hits.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{CacheError, CacheResult};
use crate::store::{vectors_equal, EmbeddingStore};

/// On-disk cache entry.
#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry {
    content_key: String,
    dim: usize,
    vector: Vec<f32>,
    created_at: DateTime<Utc>,
}

/// Disk-backed embedding store with a fixed expected dimensionality.
#[derive(Debug, Clone)]
pub struct DiskEmbeddingStore {
    root: PathBuf,
    /// Every stored vector must have this length
    dim: usize,
}

impl DiskEmbeddingStore {
    /// Open (and create if needed) a store rooted at `root`.
    pub async fn open(root: impl AsRef<Path>, dim: usize) -> CacheResult<Self> {
        let root = root.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&root).await?;
        Ok(Self { root, dim })
    }

    fn entry_path(&self, content_key: &str) -> PathBuf {
        self.root.join(format!("{}.json", content_key))
    }
}

#[async_trait]
impl EmbeddingStore for DiskEmbeddingStore {
    async fn get(&self, content_key: &str) -> CacheResult<Option<Vec<f32>>> {
        let path = self.entry_path(content_key);

        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let entry: CacheEntry = serde_json::from_slice(&bytes)?;

        if entry.content_key != content_key {
            return Err(CacheError::InvalidEntry {
                key: content_key.to_string(),
                message: format!("entry claims key {}", entry.content_key),
            });
        }

        if entry.vector.len() != self.dim || entry.dim != self.dim {
            return Err(CacheError::DimensionMismatch {
                key: content_key.to_string(),
                expected: self.dim,
                found: entry.vector.len(),
            });
        }

        debug!(key = %content_key, "Embedding cache hit");
        Ok(Some(entry.vector))
    }

    async fn put(&self, content_key: &str, vector: &[f32]) -> CacheResult<()> {
        if vector.len() != self.dim {
            return Err(CacheError::DimensionMismatch {
                key: content_key.to_string(),
                expected: self.dim,
                found: vector.len(),
            });
        }

        if let Some(existing) = self.get(content_key).await? {
            if vectors_equal(&existing, vector) {
                return Ok(());
            }
            return Err(CacheError::KeyConflict(content_key.to_string()));
        }

        let entry = CacheEntry {
            content_key: content_key.to_string(),
            dim: vector.len(),
            vector: vector.to_vec(),
            created_at: Utc::now(),
        };

        // Write to a temp name then rename so a crashed write never leaves a
        // truncated entry behind.
        let path = self.entry_path(content_key);
        let tmp = self.root.join(format!("{}.json.tmp", content_key));
        tokio::fs::write(&tmp, serde_json::to_vec(&entry)?).await?;
        tokio::fs::rename(&tmp, &path).await?;

        debug!(key = %content_key, dim = entry.dim, "Embedding cached");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = DiskEmbeddingStore::open(dir.path(), 3).await.unwrap();

        assert!(store.get("abc").await.unwrap().is_none());
        store.put("abc", &[1.0, 2.0, 3.0]).await.unwrap();
        assert_eq!(store.get("abc").await.unwrap(), Some(vec![1.0, 2.0, 3.0]));
    }

    #[tokio::test]
    async fn test_put_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = DiskEmbeddingStore::open(dir.path(), 2).await.unwrap();

        store.put("k", &[0.5, -0.5]).await.unwrap();
        store.put("k", &[0.5, -0.5]).await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some(vec![0.5, -0.5]));
    }

    #[tokio::test]
    async fn test_conflicting_put_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = DiskEmbeddingStore::open(dir.path(), 2).await.unwrap();

        store.put("k", &[0.5, -0.5]).await.unwrap();
        let err = store.put("k", &[0.5, 0.5]).await.unwrap_err();
        assert!(matches!(err, CacheError::KeyConflict(_)));
    }

    #[tokio::test]
    async fn test_dimension_mismatch_is_fatal() {
        let dir = tempfile::tempdir().unwrap();

        {
            let store = DiskEmbeddingStore::open(dir.path(), 4).await.unwrap();
            store.put("k", &[1.0, 2.0, 3.0, 4.0]).await.unwrap();
        }

        // Re-open expecting a different dimensionality
        let store = DiskEmbeddingStore::open(dir.path(), 3).await.unwrap();
        let err = store.get("k").await.unwrap_err();
        assert!(matches!(
            err,
            CacheError::DimensionMismatch {
                expected: 3,
                found: 4,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_put_wrong_dimension_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = DiskEmbeddingStore::open(dir.path(), 3).await.unwrap();

        let err = store.put("k", &[1.0]).await.unwrap_err();
        assert!(matches!(err, CacheError::DimensionMismatch { .. }));
    }

    #[tokio::test]
    async fn test_persists_across_opens() {
        let dir = tempfile::tempdir().unwrap();

        {
            let store = DiskEmbeddingStore::open(dir.path(), 2).await.unwrap();
            store.put("k", &[9.0, 8.0]).await.unwrap();
        }

        let store = DiskEmbeddingStore::open(dir.path(), 2).await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some(vec![9.0, 8.0]));
    }
}
