//! Score series types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Raw and normalized per-scorer values for one frame.
///
/// Every scorer that ran successfully on the frame contributes exactly one
/// raw and one normalized entry. Normalized values are min-max rescaled per
/// scorer across the whole run, never cached across runs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScoreVector {
    /// Frame this vector belongs to
    pub frame_index: usize,
    /// Scorer name -> raw model output
    pub raw: BTreeMap<String, f64>,
    /// Scorer name -> value rescaled to [0, 1] across the run
    pub normalized: BTreeMap<String, f64>,
}

impl ScoreVector {
    pub fn new(frame_index: usize) -> Self {
        Self {
            frame_index,
            raw: BTreeMap::new(),
            normalized: BTreeMap::new(),
        }
    }

    /// Names of the scorers that produced a value for this frame.
    pub fn scorers(&self) -> impl Iterator<Item = &str> {
        self.raw.keys().map(String::as_str)
    }
}

/// Weighted combination of one frame's normalized scores.
///
/// The series is ordered by `frame_index` ascending; smoothing and peak
/// detection depend on that ordering.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CompositeScore {
    pub frame_index: usize,
    /// Timestamp in seconds
    pub timestamp: f64,
    /// Unbounded relative quality value; only comparable within one run
    pub value: f64,
}

/// A selected local maximum in the smoothed score series.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Peak {
    pub frame_index: usize,
    /// Timestamp in seconds
    pub timestamp: f64,
    /// Smoothed composite score at the peak
    pub smoothed_score: f64,
}
