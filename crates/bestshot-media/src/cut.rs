//! Clip cutting.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::info;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};

/// Encoding settings for cut clips.
#[derive(Debug, Clone)]
pub struct EncodingSettings {
    /// Video codec
    pub codec: String,
    /// Constant Rate Factor (lower = better quality)
    pub crf: u8,
    /// Encoder preset
    pub preset: String,
}

impl Default for EncodingSettings {
    fn default() -> Self {
        Self {
            codec: "libx264".to_string(),
            crf: 18,
            preset: "veryfast".to_string(),
        }
    }
}

/// Produces an output video file for a time range of the source video.
#[async_trait]
pub trait ClipCutter: Send + Sync {
    /// Cut `[start_seconds, start_seconds + duration_seconds)` of `video`
    /// into `output`.
    async fn cut(
        &self,
        video: &Path,
        start_seconds: f64,
        duration_seconds: f64,
        output: &Path,
    ) -> MediaResult<PathBuf>;
}

/// FFmpeg-backed clip cutter. Re-encodes video, stream-copies audio.
#[derive(Debug, Clone, Default)]
pub struct FfmpegClipCutter {
    encoding: EncodingSettings,
    timeout_secs: Option<u64>,
}

impl FfmpegClipCutter {
    pub fn new(encoding: EncodingSettings) -> Self {
        Self {
            encoding,
            timeout_secs: None,
        }
    }

    /// Bound each cut FFmpeg call.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }
}

#[async_trait]
impl ClipCutter for FfmpegClipCutter {
    async fn cut(
        &self,
        video: &Path,
        start_seconds: f64,
        duration_seconds: f64,
        output: &Path,
    ) -> MediaResult<PathBuf> {
        if !video.exists() {
            return Err(MediaError::FileNotFound(video.to_path_buf()));
        }
        if duration_seconds <= 0.0 {
            return Err(MediaError::InvalidVideo(format!(
                "Non-positive clip duration: {:.3}s",
                duration_seconds
            )));
        }

        if let Some(parent) = output.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        info!(
            video = %video.display(),
            output = %output.display(),
            start = start_seconds,
            duration = duration_seconds,
            "Cutting clip"
        );

        let cmd = FfmpegCommand::new(video, output)
            .seek(start_seconds)
            .duration(duration_seconds)
            .video_codec(&self.encoding.codec)
            .crf(self.encoding.crf)
            .preset(&self.encoding.preset)
            .audio_copy();

        let mut runner = FfmpegRunner::new();
        if let Some(secs) = self.timeout_secs {
            runner = runner.with_timeout(secs);
        }
        runner.run(&cmd).await?;

        Ok(output.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_cut_rejects_missing_input() {
        let cutter = FfmpegClipCutter::default();
        let err = cutter
            .cut(
                Path::new("/nonexistent/take.mp4"),
                0.0,
                3.0,
                Path::new("/tmp/out.mp4"),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::FileNotFound(_)));
    }

    #[tokio::test]
    async fn test_cut_rejects_non_positive_duration() {
        let cutter = FfmpegClipCutter::default();
        // Input existence is checked first, so point at a file that exists
        let err = cutter
            .cut(Path::new("/dev/null"), 1.0, 0.0, Path::new("/tmp/out.mp4"))
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::InvalidVideo(_)));
    }
}
