//! In-memory embedding store.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::error::{CacheError, CacheResult};
use crate::store::{vectors_equal, EmbeddingStore};

/// In-memory store with the same write-once semantics as the disk store.
///
/// Useful for tests and for callers that only want caching scoped to one
/// run (the same frame is embedded by the aesthetics scorer, the saliency
/// scorer and the diversity filter).
#[derive(Debug, Default)]
pub struct MemoryEmbeddingStore {
    entries: RwLock<HashMap<String, Vec<f32>>>,
    /// Expected dimensionality, checked lazily from the first insert when
    /// not set explicitly
    dim: Option<usize>,
}

impl MemoryEmbeddingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enforce a fixed dimensionality from the start.
    pub fn with_dim(dim: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            dim: Some(dim),
        }
    }

    /// Number of cached vectors.
    pub fn len(&self) -> usize {
        self.entries.read().expect("cache lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl EmbeddingStore for MemoryEmbeddingStore {
    async fn get(&self, content_key: &str) -> CacheResult<Option<Vec<f32>>> {
        let entries = self.entries.read().expect("cache lock poisoned");

        match entries.get(content_key) {
            Some(vector) => {
                if let Some(dim) = self.dim {
                    if vector.len() != dim {
                        return Err(CacheError::DimensionMismatch {
                            key: content_key.to_string(),
                            expected: dim,
                            found: vector.len(),
                        });
                    }
                }
                Ok(Some(vector.clone()))
            }
            None => Ok(None),
        }
    }

    async fn put(&self, content_key: &str, vector: &[f32]) -> CacheResult<()> {
        if let Some(dim) = self.dim {
            if vector.len() != dim {
                return Err(CacheError::DimensionMismatch {
                    key: content_key.to_string(),
                    expected: dim,
                    found: vector.len(),
                });
            }
        }

        let mut entries = self.entries.write().expect("cache lock poisoned");

        if let Some(existing) = entries.get(content_key) {
            if vectors_equal(existing, vector) {
                return Ok(());
            }
            return Err(CacheError::KeyConflict(content_key.to_string()));
        }

        entries.insert(content_key.to_string(), vector.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_roundtrip() {
        let store = MemoryEmbeddingStore::new();
        assert!(store.get("k").await.unwrap().is_none());
        store.put("k", &[1.0, 2.0]).await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some(vec![1.0, 2.0]));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_conflict() {
        let store = MemoryEmbeddingStore::new();
        store.put("k", &[1.0]).await.unwrap();
        store.put("k", &[1.0]).await.unwrap();
        assert!(matches!(
            store.put("k", &[2.0]).await.unwrap_err(),
            CacheError::KeyConflict(_)
        ));
    }

    #[tokio::test]
    async fn test_fixed_dim() {
        let store = MemoryEmbeddingStore::with_dim(2);
        assert!(matches!(
            store.put("k", &[1.0]).await.unwrap_err(),
            CacheError::DimensionMismatch { .. }
        ));
    }
}
