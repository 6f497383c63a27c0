//! Shared data models for the best-shot extraction pipeline.
//!
//! This crate provides:
//! - Frame and pixel-buffer types produced by the frame source
//! - Per-frame score vectors and the composite score series
//! - Peaks, clip windows and the externally-consumed clip records
//! - The validated pipeline configuration

pub mod clip;
pub mod config;
pub mod frame;
pub mod score;

// Re-export common types
pub use clip::{ClipRecord, ClipWindow, PipelineResult};
pub use config::{ConfigError, PipelineConfig, ScorerWeight, Sign};
pub use frame::{Frame, FrameBatch, FramePixels};
pub use score::{CompositeScore, Peak, ScoreVector};
