//! Cache error types.

use thiserror::Error;

pub type CacheResult<T> = Result<T, CacheError>;

#[derive(Debug, Error)]
pub enum CacheError {
    /// A stored vector does not have the dimensionality this store was
    /// opened with. Treated as fatal rather than recomputed, since silently
    /// overwriting would mask a content-key collision bug.
    #[error("cached vector for key {key} has dimension {found}, expected {expected}")]
    DimensionMismatch {
        key: String,
        expected: usize,
        found: usize,
    },

    /// A second `put` for the same key carried a different vector.
    #[error("conflicting write for key {0}: entry is write-once")]
    KeyConflict(String),

    #[error("invalid cache entry for key {key}: {message}")]
    InvalidEntry { key: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
