//! Diversity filtering of candidate clips.
//!
//! Near-duplicate highlights (two peaks on the same static scene) are
//! suppressed by comparing the embedding of each candidate's peak frame
//! against already accepted candidates.

use tracing::debug;

use bestshot_models::ClipWindow;

use crate::similarity::cosine_distance;

/// Greedy embedding-based duplicate suppression.
#[derive(Debug, Clone, Copy)]
pub struct DiversityFilter {
    /// Minimum cosine distance an accepted candidate must keep to every
    /// previously accepted one
    similarity_threshold: f64,
}

impl DiversityFilter {
    pub fn new(similarity_threshold: f64) -> Self {
        Self {
            similarity_threshold,
        }
    }

    /// Filter candidates, visiting them in their given order (descending
    /// peak score). `embeddings[i]` is the peak-frame embedding of
    /// `candidates[i]`.
    ///
    /// The first candidate is always kept; each later one is kept only when
    /// its distance to every kept candidate strictly exceeds the threshold.
    pub fn select(
        &self,
        candidates: Vec<ClipWindow>,
        embeddings: &[Vec<f32>],
    ) -> Vec<ClipWindow> {
        debug_assert_eq!(candidates.len(), embeddings.len());

        let mut kept: Vec<ClipWindow> = Vec::new();
        let mut kept_embeddings: Vec<&Vec<f32>> = Vec::new();

        for (candidate, embedding) in candidates.into_iter().zip(embeddings) {
            let distinct = kept_embeddings
                .iter()
                .all(|kept| cosine_distance(embedding, kept) > self.similarity_threshold);

            if distinct {
                kept.push(candidate);
                kept_embeddings.push(embedding);
            } else {
                debug!(
                    peak_timestamp = candidate.peak.timestamp,
                    "Candidate too similar to an accepted clip; dropped"
                );
            }
        }

        kept
    }
}
