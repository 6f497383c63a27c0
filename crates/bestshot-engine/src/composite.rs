//! Composite scoring: parallel scorer fan-out, per-run normalization and
//! weighted combination.
//!
//! Raw scorer outputs live on incompatible scales (Laplacian variance is
//! unbounded, penalties sit in [0, 1]), so each scorer's values are min-max
//! rescaled across the run before the weighted sum. A scorer failing on a
//! frame degrades that frame instead of aborting the run; the remaining
//! weights are rescaled so degraded frames stay comparable.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tracing::{debug, warn};

use bestshot_models::{CompositeScore, Frame, ScoreVector, ScorerWeight};

use crate::error::{EngineError, EngineResult};
use crate::scorer::{FrameScorer, ModelFailure};

/// Values closer together than this are treated as a constant signal.
const MIN_SCORE_RANGE: f64 = 1e-12;

struct Binding {
    weight: ScorerWeight,
    scorer: Arc<dyn FrameScorer>,
}

/// Everything the scoring stage produces for one run.
#[derive(Debug)]
pub struct ScoringOutcome {
    /// Per-frame raw and normalized values, keyed by frame index.
    /// Frames where every scorer failed are absent.
    pub vectors: BTreeMap<usize, ScoreVector>,
    /// Composite series ordered by frame index ascending
    pub composite: Vec<CompositeScore>,
    /// Frames where every scorer failed; dropped from the composite series
    pub failed_frames: BTreeSet<usize>,
    /// Frames scored by only a subset of scorers; kept in the series but
    /// excluded from peak candidacy
    pub degraded_frames: BTreeSet<usize>,
}

/// Runs a weighted set of scorers over a frame batch.
pub struct CompositeScorer {
    bindings: Arc<BTreeMap<String, Binding>>,
    timeout: Duration,
    parallelism: usize,
}

impl CompositeScorer {
    /// Pair configured weights with registered scorers.
    ///
    /// Every weight must have a scorer of the same name; extra scorers
    /// without a weight are rejected too, since silently ignoring one is
    /// almost certainly a misconfiguration.
    pub fn new(
        weights: &BTreeMap<String, ScorerWeight>,
        scorers: Vec<Arc<dyn FrameScorer>>,
        timeout: Duration,
        parallelism: usize,
    ) -> EngineResult<Self> {
        let mut by_name: BTreeMap<String, Arc<dyn FrameScorer>> = BTreeMap::new();
        for scorer in scorers {
            let name = scorer.name().to_string();
            if by_name.insert(name.clone(), scorer).is_some() {
                return Err(EngineError::invalid_setup(format!(
                    "duplicate scorer registered: {}",
                    name
                )));
            }
        }

        let mut bindings = BTreeMap::new();
        for (name, weight) in weights {
            let scorer = by_name.remove(name).ok_or_else(|| {
                EngineError::invalid_setup(format!("no scorer registered for weight '{}'", name))
            })?;
            bindings.insert(
                name.clone(),
                Binding {
                    weight: *weight,
                    scorer,
                },
            );
        }
        if let Some(extra) = by_name.keys().next() {
            return Err(EngineError::invalid_setup(format!(
                "scorer '{}' has no configured weight",
                extra
            )));
        }

        Ok(Self {
            bindings: Arc::new(bindings),
            timeout,
            parallelism: parallelism.max(1),
        })
    }

    /// Score every frame and build the composite series.
    pub async fn score_frames(&self, frames: Arc<Vec<Frame>>) -> EngineResult<ScoringOutcome> {
        let semaphore = Arc::new(Semaphore::new(self.parallelism));
        let mut handles = Vec::with_capacity(frames.len());

        for index in 0..frames.len() {
            let frames = Arc::clone(&frames);
            let bindings = Arc::clone(&self.bindings);
            let semaphore = Arc::clone(&semaphore);
            let timeout = self.timeout;

            handles.push(tokio::spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .map_err(|_| EngineError::internal("scoring semaphore closed"))?;
                score_one(&frames[index], &bindings, timeout).await
            }));
        }

        // Awaiting in spawn order keeps results aligned with frame indices.
        let mut raw_by_frame: Vec<BTreeMap<String, f64>> = Vec::with_capacity(frames.len());
        for handle in handles {
            let raw = handle
                .await
                .map_err(|e| EngineError::internal(format!("scoring task panicked: {}", e)))??;
            raw_by_frame.push(raw);
        }

        Ok(self.combine(&frames, raw_by_frame))
    }

    fn combine(
        &self,
        frames: &[Frame],
        raw_by_frame: Vec<BTreeMap<String, f64>>,
    ) -> ScoringOutcome {
        let normalized_by_frame = normalize_per_scorer(&raw_by_frame);

        let total_weight: f64 = self.bindings.values().map(|b| b.weight.weight).sum();

        let mut vectors = BTreeMap::new();
        let mut composite = Vec::new();
        let mut failed_frames = BTreeSet::new();
        let mut degraded_frames = BTreeSet::new();

        for (frame, (raw, normalized)) in frames
            .iter()
            .zip(raw_by_frame.into_iter().zip(normalized_by_frame))
        {
            if raw.is_empty() {
                warn!(
                    frame_index = frame.index,
                    timestamp = frame.timestamp,
                    "All scorers failed on frame; dropping it from the series"
                );
                failed_frames.insert(frame.index);
                continue;
            }

            let surviving_weight: f64 = self
                .bindings
                .iter()
                .filter(|(name, _)| raw.contains_key(*name))
                .map(|(_, b)| b.weight.weight)
                .sum();

            // Rescale so frames missing a scorer stay on the same scale as
            // fully scored ones. With no failures the factor is exactly 1.
            let rescale = total_weight / surviving_weight;

            let value: f64 = self
                .bindings
                .iter()
                .filter_map(|(name, binding)| {
                    normalized
                        .get(name)
                        .map(|n| binding.weight.signed() * n * rescale)
                })
                .sum();

            if raw.len() < self.bindings.len() {
                degraded_frames.insert(frame.index);
            }

            composite.push(CompositeScore {
                frame_index: frame.index,
                timestamp: frame.timestamp,
                value,
            });
            vectors.insert(
                frame.index,
                ScoreVector {
                    frame_index: frame.index,
                    raw,
                    normalized,
                },
            );
        }

        debug!(
            frames = frames.len(),
            failed = failed_frames.len(),
            degraded = degraded_frames.len(),
            "Composite scoring complete"
        );

        ScoringOutcome {
            vectors,
            composite,
            failed_frames,
            degraded_frames,
        }
    }
}

/// Run every scorer on one frame, converting per-call problems into missing
/// entries. Only cache failures propagate.
async fn score_one(
    frame: &Frame,
    bindings: &BTreeMap<String, Binding>,
    timeout: Duration,
) -> EngineResult<BTreeMap<String, f64>> {
    let mut raw = BTreeMap::new();

    for (name, binding) in bindings {
        match tokio::time::timeout(timeout, binding.scorer.score(frame)).await {
            Ok(Ok(value)) if value.is_finite() => {
                raw.insert(name.clone(), value);
            }
            Ok(Ok(value)) => {
                warn!(
                    scorer = %name,
                    frame_index = frame.index,
                    value,
                    "Scorer returned a non-finite value; treating as failed"
                );
            }
            Ok(Err(ModelFailure::Cache(e))) => return Err(EngineError::Cache(e)),
            Ok(Err(failure)) => {
                warn!(
                    scorer = %name,
                    frame_index = frame.index,
                    error = %failure,
                    "Scorer failed on frame"
                );
            }
            Err(_) => {
                warn!(
                    scorer = %name,
                    frame_index = frame.index,
                    timeout_secs = timeout.as_secs(),
                    "Scorer timed out on frame"
                );
            }
        }
    }

    Ok(raw)
}

/// Min-max rescale each scorer's values to [0, 1] across the run.
///
/// A scorer whose values are all (nearly) identical carries no ranking
/// information; every frame gets 0.5 for it.
fn normalize_per_scorer(raw_by_frame: &[BTreeMap<String, f64>]) -> Vec<BTreeMap<String, f64>> {
    let mut ranges: BTreeMap<&str, (f64, f64)> = BTreeMap::new();
    for raw in raw_by_frame {
        for (name, &value) in raw {
            let entry = ranges
                .entry(name.as_str())
                .or_insert((f64::INFINITY, f64::NEG_INFINITY));
            entry.0 = entry.0.min(value);
            entry.1 = entry.1.max(value);
        }
    }

    raw_by_frame
        .iter()
        .map(|raw| {
            raw.iter()
                .map(|(name, &value)| {
                    let (min, max) = ranges[name.as_str()];
                    let normalized = if max - min < MIN_SCORE_RANGE {
                        0.5
                    } else {
                        (value - min) / (max - min)
                    };
                    (name.clone(), normalized)
                })
                .collect()
        })
        .collect()
}
