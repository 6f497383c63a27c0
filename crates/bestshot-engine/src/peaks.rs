//! Peak detection with non-maximum suppression.

use std::collections::BTreeSet;

use tracing::debug;

use bestshot_models::{CompositeScore, Peak};

/// Selects the best-scoring, temporally separated local maxima of the
/// smoothed series.
///
/// Candidates are strict local maxima; greedy selection in descending score
/// order then rejects any candidate closer than the minimum separation to an
/// already accepted peak, up to `top_k` accepted peaks.
#[derive(Debug, Clone, Copy)]
pub struct PeakDetector {
    min_distance_seconds: f64,
    top_k: usize,
}

impl PeakDetector {
    pub fn new(min_distance_seconds: f64, top_k: usize) -> Self {
        Self {
            min_distance_seconds,
            top_k,
        }
    }

    /// Detect peaks in a series ordered by timestamp ascending.
    ///
    /// Frames in `ineligible` (partially scored ones) can never become peaks
    /// themselves, though they still shaped the smoothed values around them.
    /// Returns accepted peaks ordered by descending smoothed score.
    pub fn detect(&self, smoothed: &[CompositeScore], ineligible: &BTreeSet<usize>) -> Vec<Peak> {
        let mut candidates: Vec<&CompositeScore> = smoothed
            .iter()
            .enumerate()
            .filter(|(i, score)| {
                !ineligible.contains(&score.frame_index) && is_local_maximum(smoothed, *i)
            })
            .map(|(_, score)| score)
            .collect();

        // Best first; ties go to the earlier moment so selection is
        // deterministic.
        candidates.sort_by(|a, b| {
            b.value
                .partial_cmp(&a.value)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(
                    a.timestamp
                        .partial_cmp(&b.timestamp)
                        .unwrap_or(std::cmp::Ordering::Equal),
                )
        });

        let mut accepted: Vec<Peak> = Vec::new();
        for candidate in candidates {
            if accepted.len() >= self.top_k {
                break;
            }
            let far_enough = accepted
                .iter()
                .all(|p| (candidate.timestamp - p.timestamp).abs() >= self.min_distance_seconds);
            if far_enough {
                accepted.push(Peak {
                    frame_index: candidate.frame_index,
                    timestamp: candidate.timestamp,
                    smoothed_score: candidate.value,
                });
            }
        }

        debug!(
            candidates = smoothed.len(),
            accepted = accepted.len(),
            "Peak detection complete"
        );
        accepted
    }
}

/// Strict local maximum test. Boundary samples compare against their single
/// neighbor; a lone sample is trivially a maximum.
fn is_local_maximum(series: &[CompositeScore], i: usize) -> bool {
    let value = series[i].value;
    let above_prev = i == 0 || value > series[i - 1].value;
    let above_next = i == series.len() - 1 || value > series[i + 1].value;
    above_prev && above_next
}
