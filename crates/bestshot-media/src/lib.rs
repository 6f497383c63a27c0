//! FFmpeg CLI wrapper for the best-shot pipeline.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building with timeout and cancellation
//! - Video probing via `ffprobe`
//! - The frame source: sampled, decoded, content-keyed frames
//! - The clip cutter: time-range extraction to an output file

pub mod command;
pub mod cut;
pub mod error;
pub mod frames;
pub mod probe;

pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegRunner};
pub use cut::{ClipCutter, EncodingSettings, FfmpegClipCutter};
pub use error::{MediaError, MediaResult};
pub use frames::{content_key, FfmpegFrameSource, FrameSource};
pub use probe::{probe_video, VideoInfo};
