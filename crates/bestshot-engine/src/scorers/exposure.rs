//! Exposure penalty scoring via luma histogram analysis.

use async_trait::async_trait;

use bestshot_models::Frame;

use crate::scorer::{FrameScorer, ModelFailure};

/// Scores exposure problems as a penalty in [0, 1].
///
/// 0 means no detected exposure issue, 1 means fully blown out or crushed.
/// Configured with a negative sign so a higher penalty lowers the composite.
#[derive(Debug, Clone, Copy)]
pub struct ExposureScorer {
    /// Fraction of bright pixels above which the frame counts as overexposed
    overexposed_threshold: f64,
    /// Fraction of dark pixels above which the frame counts as underexposed
    underexposed_threshold: f64,
    /// Luma value at or above which a pixel counts as very bright
    bright_pixel_value: u8,
    /// Luma value below which a pixel counts as very dark
    dark_pixel_value: u8,
}

impl Default for ExposureScorer {
    fn default() -> Self {
        Self {
            overexposed_threshold: 0.99,
            underexposed_threshold: 0.01,
            bright_pixel_value: 250,
            dark_pixel_value: 5,
        }
    }
}

impl ExposureScorer {
    pub fn new() -> Self {
        Self::default()
    }

    fn penalty(&self, luma: &[u8]) -> f64 {
        let mut hist = [0.0f64; 256];
        for &v in luma {
            hist[v as usize] += 1.0;
        }
        let total = luma.len() as f64;
        for bin in hist.iter_mut() {
            *bin /= total;
        }

        let bright: f64 = hist[self.bright_pixel_value as usize..].iter().sum();
        let dark: f64 = hist[..self.dark_pixel_value as usize].iter().sum();

        let mut penalty = 0.0f64;
        if bright > self.overexposed_threshold {
            penalty = penalty
                .max((bright - self.overexposed_threshold) / (1.0 - self.overexposed_threshold));
        }
        if dark > self.underexposed_threshold {
            penalty = penalty
                .max((dark - self.underexposed_threshold) / (1.0 - self.underexposed_threshold));
        }

        // Low contrast reads as a milder exposure problem: half weight.
        let mean: f64 = hist
            .iter()
            .enumerate()
            .map(|(value, p)| value as f64 * p)
            .sum();
        let variance: f64 = hist
            .iter()
            .enumerate()
            .map(|(value, p)| (value as f64 - mean).powi(2) * p)
            .sum();
        let std_dev = variance.sqrt();
        if std_dev < 30.0 {
            penalty = penalty.max((30.0 - std_dev) / 30.0 * 0.5);
        }

        penalty
    }
}

#[async_trait]
impl FrameScorer for ExposureScorer {
    fn name(&self) -> &'static str {
        "exposure"
    }

    async fn score(&self, frame: &Frame) -> Result<f64, ModelFailure> {
        if frame.pixels.pixel_count() == 0 {
            return Err(ModelFailure::failed("empty frame"));
        }
        Ok(self.penalty(&frame.pixels.to_luma()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use bestshot_models::FramePixels;

    fn frame_from_luma(luma: Vec<u8>) -> Frame {
        let data: Vec<u8> = luma.iter().flat_map(|&v| [v, v, v]).collect();
        Frame {
            index: 0,
            timestamp: 0.0,
            pixels: FramePixels::new(luma.len() as u32, 1, data).unwrap(),
            content_key: "test".to_string(),
        }
    }

    #[tokio::test]
    async fn test_blown_out_frame_penalized_hard() {
        let frame = frame_from_luma(vec![255u8; 100]);
        let penalty = ExposureScorer::new().score(&frame).await.unwrap();
        assert!((penalty - 1.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_crushed_frame_penalized_hard() {
        let frame = frame_from_luma(vec![0u8; 100]);
        let penalty = ExposureScorer::new().score(&frame).await.unwrap();
        assert!((penalty - 1.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_flat_midtone_gets_only_contrast_penalty() {
        // No clipping at either end, but zero contrast: half-weight penalty
        let frame = frame_from_luma(vec![128u8; 100]);
        let penalty = ExposureScorer::new().score(&frame).await.unwrap();
        assert!((penalty - 0.5).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_wide_histogram_unpenalized() {
        // Spread uniformly over the midrange, away from both clip points
        let luma: Vec<u8> = (0..200).map(|i| (20 + i) as u8).collect();
        let frame = frame_from_luma(luma);
        let penalty = ExposureScorer::new().score(&frame).await.unwrap();
        assert!(penalty.abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_penalty_bounded() {
        for luma in [vec![255u8; 50], vec![0u8; 50], vec![3u8; 50]] {
            let penalty = ExposureScorer::new()
                .score(&frame_from_luma(luma))
                .await
                .unwrap();
            assert!((0.0..=1.0).contains(&penalty));
        }
    }
}
