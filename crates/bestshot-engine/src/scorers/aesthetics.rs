//! Aesthetic scoring from embedding vectors.

use async_trait::async_trait;
use ndarray::ArrayView1;

use bestshot_models::Frame;

use crate::embedding::CachedEmbedder;
use crate::scorer::{FrameScorer, ModelFailure};

/// Linear probe over an embedding space, squashed to (0, 1).
///
/// The weights come from a head trained offline against human aesthetic
/// ratings; this type only evaluates it.
#[derive(Debug, Clone)]
pub struct AestheticHead {
    weights: Vec<f32>,
    bias: f32,
}

impl AestheticHead {
    pub fn new(weights: Vec<f32>, bias: f32) -> Self {
        Self { weights, bias }
    }

    pub fn dim(&self) -> usize {
        self.weights.len()
    }

    /// Evaluate the head on an (unnormalized) embedding.
    pub fn score(&self, embedding: &[f32]) -> Result<f64, ModelFailure> {
        if embedding.len() != self.weights.len() {
            return Err(ModelFailure::failed(format!(
                "embedding has dim {}, head expects {}",
                embedding.len(),
                self.weights.len()
            )));
        }

        let e = ArrayView1::from(embedding);
        let norm = e.dot(&e).sqrt().max(1e-8);
        let logit = e.dot(&ArrayView1::from(&self.weights[..])) / norm + self.bias;
        Ok(sigmoid(logit as f64))
    }
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Scores visual appeal by running a linear aesthetic head over the frame's
/// cached embedding.
pub struct AestheticsScorer {
    embedder: CachedEmbedder,
    head: AestheticHead,
}

impl AestheticsScorer {
    pub fn new(embedder: CachedEmbedder, head: AestheticHead) -> Self {
        Self { embedder, head }
    }
}

#[async_trait]
impl FrameScorer for AestheticsScorer {
    fn name(&self) -> &'static str {
        "aesthetics"
    }

    async fn score(&self, frame: &Frame) -> Result<f64, ModelFailure> {
        let embedding = self.embedder.embed(frame).await?;
        self.head.score(&embedding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_head_output_in_unit_interval() {
        let head = AestheticHead::new(vec![0.5, -0.25, 1.0], 0.1);
        let score = head.score(&[3.0, -2.0, 0.5]).unwrap();
        assert!((0.0..=1.0).contains(&score));
    }

    #[test]
    fn test_head_rejects_wrong_dim() {
        let head = AestheticHead::new(vec![0.5, -0.25], 0.0);
        assert!(head.score(&[1.0, 2.0, 3.0]).is_err());
    }

    #[test]
    fn test_aligned_embedding_scores_higher() {
        let head = AestheticHead::new(vec![1.0, 0.0], 0.0);
        let aligned = head.score(&[1.0, 0.0]).unwrap();
        let opposed = head.score(&[-1.0, 0.0]).unwrap();
        assert!(aligned > opposed);
    }

    #[test]
    fn test_scale_invariant() {
        // Embeddings are normalized before the probe, so magnitude is ignored
        let head = AestheticHead::new(vec![0.7, -0.3], 0.2);
        let a = head.score(&[2.0, 1.0]).unwrap();
        let b = head.score(&[20.0, 10.0]).unwrap();
        assert!((a - b).abs() < 1e-9);
    }
}
