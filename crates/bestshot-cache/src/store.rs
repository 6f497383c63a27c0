//! Embedding store trait.

use async_trait::async_trait;

use crate::error::CacheResult;

/// Content-addressed store for per-frame embedding vectors.
///
/// Keys are content keys (stable hashes of pixel content); the same key must
/// always map to the same vector. Reads are safe to share across concurrent
/// scorer invocations; concurrent writes for the same key are harmless
/// duplicates because `put` is idempotent.
#[async_trait]
pub trait EmbeddingStore: Send + Sync {
    /// Look up the vector for `content_key`.
    async fn get(&self, content_key: &str) -> CacheResult<Option<Vec<f32>>>;

    /// Store the vector for `content_key`.
    ///
    /// Write-once per key: re-putting an equal vector is a no-op, re-putting
    /// a different vector is an error.
    async fn put(&self, content_key: &str, vector: &[f32]) -> CacheResult<()>;
}

/// Compare two vectors for the idempotent-put check.
pub(crate) fn vectors_equal(a: &[f32], b: &[f32]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.to_bits() == y.to_bits())
}
