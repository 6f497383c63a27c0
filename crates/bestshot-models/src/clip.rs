//! Clip windows, clip records and the pipeline result.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::score::{CompositeScore, Peak, ScoreVector};

/// A planned extraction window around one peak.
///
/// Invariant: `0 <= start < end <= video_duration`. Windows from distinct
/// peaks may overlap; only the peak-separation constraint limits overlap.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClipWindow {
    /// Start of the window in seconds
    pub start: f64,
    /// End of the window in seconds
    pub end: f64,
    /// The peak this window was planned around
    pub peak: Peak,
    /// Per-scorer breakdown for the peak frame
    pub breakdown: ScoreVector,
}

impl ClipWindow {
    /// Window length in seconds.
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// One accepted clip in the produced artifact.
///
/// This is the contract the rest of the system (reporting, packaging)
/// depends on.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ClipRecord {
    /// Clip start in seconds from the start of the source video
    pub start_seconds: f64,
    /// Clip end in seconds
    pub end_seconds: f64,
    /// Timestamp of the peak that anchored this clip
    pub peak_seconds: f64,
    /// Smoothed composite score at the peak
    pub composite_score: f64,
    /// Scorer name -> normalized value that produced this clip
    pub breakdown: BTreeMap<String, f64>,
    /// Path of the cut clip file, when a clip cutter was attached
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_path: Option<PathBuf>,
}

/// Full output of one pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineResult {
    /// Unique identifier of this run
    pub run_id: String,
    /// Duration of the source video in seconds
    pub video_duration: f64,
    /// Accepted clips, ordered by start time
    pub clips: Vec<ClipRecord>,
    /// Composite score series (diagnostics)
    pub composite: Vec<CompositeScore>,
    /// Smoothed score series (diagnostics)
    pub smoothed: Vec<CompositeScore>,
    /// Frames where every scorer failed; dropped from the series entirely
    pub failed_frames: BTreeSet<usize>,
    /// Frames where some scorers failed; kept in the series but excluded
    /// from peak candidacy
    pub degraded_frames: BTreeSet<usize>,
}
