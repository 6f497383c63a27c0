//! Engine error types.

use thiserror::Error;

pub type EngineResult<T> = Result<T, EngineError>;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid pipeline setup: {0}")]
    InvalidSetup(String),

    #[error("configuration error: {0}")]
    Config(#[from] bestshot_models::ConfigError),

    #[error("media error: {0}")]
    Media(#[from] bestshot_media::MediaError),

    #[error("cache error: {0}")]
    Cache(#[from] bestshot_cache::CacheError),

    /// The embedding model could not produce a vector while diversity
    /// filtering was enabled. Fatal: skipping the filter silently would risk
    /// returning duplicate clips.
    #[error("embedding model unavailable: {0}")]
    EmbeddingUnavailable(String),

    #[error("pipeline run cancelled")]
    Cancelled,

    #[error("internal error: {0}")]
    Internal(String),
}

impl EngineError {
    pub fn invalid_setup(msg: impl Into<String>) -> Self {
        Self::InvalidSetup(msg.into())
    }

    pub fn embedding_unavailable(msg: impl Into<String>) -> Self {
        Self::EmbeddingUnavailable(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}
