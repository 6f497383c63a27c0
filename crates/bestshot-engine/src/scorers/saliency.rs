//! Saliency scoring by similarity to text prompt embeddings.

use async_trait::async_trait;

use bestshot_models::Frame;

use crate::embedding::CachedEmbedder;
use crate::scorer::{FrameScorer, ModelFailure};
use crate::similarity::cosine_similarity;

/// A text prompt with its pre-encoded embedding.
///
/// Prompts are encoded once up front (by whatever model produced the frame
/// embeddings) and reused for every frame.
#[derive(Debug, Clone)]
pub struct PromptEmbedding {
    pub text: String,
    pub vector: Vec<f32>,
}

impl PromptEmbedding {
    pub fn new(text: impl Into<String>, vector: Vec<f32>) -> Self {
        Self {
            text: text.into(),
            vector,
        }
    }
}

/// Scores how well a frame matches any of a set of subject prompts.
///
/// Takes the maximum cosine similarity between the frame embedding and the
/// prompt embeddings, remapped from [-1, 1] to [0, 1].
pub struct SaliencyScorer {
    embedder: CachedEmbedder,
    prompts: Vec<PromptEmbedding>,
}

impl SaliencyScorer {
    pub fn new(embedder: CachedEmbedder, prompts: Vec<PromptEmbedding>) -> Self {
        Self { embedder, prompts }
    }
}

#[async_trait]
impl FrameScorer for SaliencyScorer {
    fn name(&self) -> &'static str {
        "saliency"
    }

    async fn score(&self, frame: &Frame) -> Result<f64, ModelFailure> {
        if self.prompts.is_empty() {
            return Err(ModelFailure::failed("no prompts configured"));
        }

        let embedding = self.embedder.embed(frame).await?;

        let best = self
            .prompts
            .iter()
            .map(|p| cosine_similarity(&embedding, &p.vector))
            .fold(f64::NEG_INFINITY, f64::max);

        Ok(((best + 1.0) / 2.0).clamp(0.0, 1.0))
    }
}
