//! Sharpness scoring via Laplacian variance.

use async_trait::async_trait;

use bestshot_models::Frame;

use crate::scorer::{FrameScorer, ModelFailure};

/// Scores focus quality as the variance of the Laplacian of the luma plane.
///
/// Sharp, in-focus frames have strong local intensity transitions and so a
/// high-variance Laplacian response; motion blur and defocus flatten it. The
/// raw value is unbounded and only meaningful relative to other frames of
/// the same run.
#[derive(Debug, Default, Clone, Copy)]
pub struct SharpnessScorer;

impl SharpnessScorer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl FrameScorer for SharpnessScorer {
    fn name(&self) -> &'static str {
        "sharpness"
    }

    async fn score(&self, frame: &Frame) -> Result<f64, ModelFailure> {
        let width = frame.pixels.width as usize;
        let height = frame.pixels.height as usize;

        if width < 3 || height < 3 {
            return Err(ModelFailure::failed(format!(
                "frame {}x{} too small for a 3x3 Laplacian",
                width, height
            )));
        }

        let luma = frame.pixels.to_luma();
        Ok(laplacian_variance(&luma, width, height))
    }
}

/// Variance of the 4-neighbor Laplacian over the interior of the image.
fn laplacian_variance(luma: &[u8], width: usize, height: usize) -> f64 {
    let at = |x: usize, y: usize| luma[y * width + x] as f64;

    let mut sum = 0.0;
    let mut sum_sq = 0.0;
    let count = ((width - 2) * (height - 2)) as f64;

    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let response =
                4.0 * at(x, y) - at(x - 1, y) - at(x + 1, y) - at(x, y - 1) - at(x, y + 1);
            sum += response;
            sum_sq += response * response;
        }
    }

    let mean = sum / count;
    sum_sq / count - mean * mean
}
