//! Temporal smoothing of the composite score series.

use bestshot_models::CompositeScore;

/// Truncated moving average over a time window.
///
/// Each score is replaced by the mean of all scores whose timestamps lie
/// within half the window on either side. The window is defined in seconds,
/// not samples, so behavior is stable across sampling rates. Near the edges
/// the window simply contains fewer samples.
#[derive(Debug, Clone, Copy)]
pub struct TemporalSmoother {
    window_seconds: f64,
}

impl TemporalSmoother {
    pub fn new(window_seconds: f64) -> Self {
        Self { window_seconds }
    }

    /// Smooth the series. Input must be ordered by timestamp ascending.
    pub fn smooth(&self, series: &[CompositeScore]) -> Vec<CompositeScore> {
        if self.window_seconds <= 0.0 || series.len() < 2 {
            return series.to_vec();
        }

        let half = self.window_seconds / 2.0;
        let mut smoothed = Vec::with_capacity(series.len());

        let mut lo = 0;
        let mut hi = 0;
        for score in series {
            while series[lo].timestamp < score.timestamp - half {
                lo += 1;
            }
            while hi < series.len() && series[hi].timestamp <= score.timestamp + half {
                hi += 1;
            }

            let window = &series[lo..hi];
            let mean = window.iter().map(|s| s.value).sum::<f64>() / window.len() as f64;
            smoothed.push(CompositeScore {
                frame_index: score.frame_index,
                timestamp: score.timestamp,
                value: mean,
            });
        }

        smoothed
    }
}
