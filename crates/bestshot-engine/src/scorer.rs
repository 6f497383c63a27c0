//! Scoring and embedding capabilities.
//!
//! The pipeline never talks to a concrete model. It talks to these traits,
//! which are injected at construction time. That keeps the orchestration free
//! of globals and makes every stage testable with scripted stand-ins.

use async_trait::async_trait;
use thiserror::Error;

use bestshot_models::Frame;

/// Failure of a single model call on a single frame.
///
/// These are recoverable: one scorer failing on one frame degrades that
/// frame, it does not abort the run.
#[derive(Debug, Error)]
pub enum ModelFailure {
    #[error("model call timed out after {0}s")]
    Timeout(u64),

    #[error("{0}")]
    Failed(String),

    /// Embedding cache failure. Unlike the other variants this one is fatal
    /// to the run: a corrupt or dimension-mismatched cache must not be
    /// papered over by degrading a frame.
    #[error("cache error: {0}")]
    Cache(#[from] bestshot_cache::CacheError),
}

impl ModelFailure {
    pub fn failed(msg: impl Into<String>) -> Self {
        Self::Failed(msg.into())
    }

    /// Whether this failure should abort the whole run instead of degrading
    /// the frame it occurred on.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Cache(_))
    }
}

/// A named per-frame quality signal.
///
/// Raw outputs are only required to be finite and monotone in quality for
/// that signal; the engine min-max normalizes them per run before combining.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FrameScorer: Send + Sync {
    /// Stable name used to look up the scorer's weight in the config.
    fn name(&self) -> &'static str;

    /// Score one frame. Must not panic on odd inputs; return a failure.
    async fn score(&self, frame: &Frame) -> Result<f64, ModelFailure>;
}

/// Produces a fixed-dimensionality embedding vector for a frame.
///
/// Used by embedding-backed scorers (aesthetics, saliency) and by the
/// diversity filter. Vectors from one model must all share `dim()`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmbeddingModel: Send + Sync {
    /// Dimensionality of every vector this model produces.
    fn dim(&self) -> usize;

    async fn embed(&self, frame: &Frame) -> Result<Vec<f32>, ModelFailure>;
}
