//! Built-in frame scorers.
//!
//! Two CPU signals computed directly from pixels (sharpness, exposure) and
//! two embedding-backed signals (aesthetics, saliency). All implement
//! [`crate::FrameScorer`]; callers can mix in their own.

pub mod aesthetics;
pub mod exposure;
pub mod saliency;
pub mod sharpness;

pub use aesthetics::{AestheticHead, AestheticsScorer};
pub use exposure::ExposureScorer;
pub use saliency::{PromptEmbedding, SaliencyScorer};
pub use sharpness::SharpnessScorer;
