//! Clip window planning around selected peaks.

use tracing::warn;

use bestshot_models::{ClipWindow, Peak, ScoreVector};

/// Turns peaks into concrete clip windows.
///
/// Each window spans a pre-roll before and a post-roll after the peak,
/// clamped to the bounds of the video. A window clamped down to nothing is
/// dropped rather than emitted as a zero-length clip.
#[derive(Debug, Clone, Copy)]
pub struct ClipWindowPlanner {
    pre_roll_seconds: f64,
    post_roll_seconds: f64,
}

impl ClipWindowPlanner {
    pub fn new(pre_roll_seconds: f64, post_roll_seconds: f64) -> Self {
        Self {
            pre_roll_seconds,
            post_roll_seconds,
        }
    }

    pub fn plan(
        &self,
        peak: Peak,
        breakdown: ScoreVector,
        video_duration: f64,
    ) -> Option<ClipWindow> {
        let start = (peak.timestamp - self.pre_roll_seconds).max(0.0);
        let end = (peak.timestamp + self.post_roll_seconds).min(video_duration);

        if end - start <= 0.0 {
            warn!(
                peak_timestamp = peak.timestamp,
                video_duration, "Clip window clamped to nothing; dropping peak"
            );
            return None;
        }

        Some(ClipWindow {
            start,
            end,
            peak,
            breakdown,
        })
    }
}
