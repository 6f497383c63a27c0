//! Frame sampling.
//!
//! Turns a video file into an ordered, timestamped sequence of decoded
//! frames at a configured sample rate and resolution. Frames are sampled to
//! JPEG stills via FFmpeg, decoded in a blocking task, and given stable
//! content keys for cache addressing.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use bestshot_models::{Frame, FrameBatch, FramePixels};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::probe::probe_video;

/// Source of sampled, decoded frames.
///
/// Guarantees: strictly increasing timestamps, stable content keys for
/// identical pixel content.
#[async_trait]
pub trait FrameSource: Send + Sync {
    /// Extract frames from `video` at `sample_fps`, scaled to
    /// `sample_height` pixels tall.
    async fn extract(
        &self,
        video: &Path,
        sample_fps: f64,
        sample_height: u32,
    ) -> MediaResult<FrameBatch>;
}

/// FFmpeg-backed frame source.
///
/// Sampling writes `frame_%06d.jpg` stills into a scratch directory which is
/// removed once the frames are decoded.
#[derive(Debug, Clone, Default)]
pub struct FfmpegFrameSource {
    /// Timeout for the sampling FFmpeg call, seconds
    timeout_secs: Option<u64>,
}

impl FfmpegFrameSource {
    pub fn new() -> Self {
        Self { timeout_secs: None }
    }

    /// Bound the sampling FFmpeg call.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }
}

#[async_trait]
impl FrameSource for FfmpegFrameSource {
    async fn extract(
        &self,
        video: &Path,
        sample_fps: f64,
        sample_height: u32,
    ) -> MediaResult<FrameBatch> {
        if !video.exists() {
            return Err(MediaError::FileNotFound(video.to_path_buf()));
        }

        let info = probe_video(video).await?;

        let scratch = tempfile::tempdir()?;
        let pattern = scratch.path().join("frame_%06d.jpg");

        info!(
            video = %video.display(),
            sample_fps,
            sample_height,
            duration = info.duration,
            "Sampling frames"
        );

        let cmd = FfmpegCommand::new(video, &pattern)
            .video_filter(format!("fps={},scale=-2:{}", sample_fps, sample_height))
            .still_quality(2);

        let mut runner = FfmpegRunner::new();
        if let Some(secs) = self.timeout_secs {
            runner = runner.with_timeout(secs);
        }
        runner.run(&cmd).await?;

        let scratch_path = scratch.path().to_path_buf();
        let video_owned = video.to_path_buf();
        let frames = tokio::task::spawn_blocking(move || {
            decode_frames(&scratch_path, &video_owned, sample_fps)
        })
        .await
        .map_err(|e| std::io::Error::other(e))??;

        if frames.is_empty() {
            return Err(MediaError::NoFramesExtracted(video.to_path_buf()));
        }

        debug!(count = frames.len(), "Decoded sampled frames");

        Ok(FrameBatch {
            video_duration: info.duration,
            frames,
        })
    }
}

/// Decode every sampled still in `dir`, in filename order.
fn decode_frames(dir: &Path, video: &Path, sample_fps: f64) -> MediaResult<Vec<Frame>> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|ext| ext == "jpg"))
        .collect();
    paths.sort();

    let mut frames = Vec::with_capacity(paths.len());
    for (index, path) in paths.iter().enumerate() {
        let decoded = image::open(path)
            .map_err(|e| MediaError::frame_decode(path.clone(), e.to_string()))?
            .to_rgb8();

        let (width, height) = decoded.dimensions();
        let data = decoded.into_raw();
        let content_key = content_key(width, height, &data);

        let pixels = FramePixels::new(width, height, data).ok_or_else(|| {
            MediaError::frame_decode(path.clone(), "pixel buffer size mismatch")
        })?;

        frames.push(Frame {
            index,
            // First still is sampled at t=0; subsequent stills one sample
            // interval apart.
            timestamp: index as f64 / sample_fps,
            pixels,
            content_key,
        });
    }

    if frames.is_empty() {
        return Err(MediaError::NoFramesExtracted(video.to_path_buf()));
    }

    Ok(frames)
}

/// Stable content key: SHA-256 over dimensions and raw RGB bytes.
pub fn content_key(width: u32, height: u32, data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(width.to_le_bytes());
    hasher.update(height.to_le_bytes());
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}
