//! Best-shot extraction engine.
//!
//! Finds the strongest moments of a video by scoring sampled frames with a
//! weighted set of quality signals, smoothing the series over time, picking
//! separated peaks and planning clip windows around them, with optional
//! embedding-based duplicate suppression.
//!
//! # Architecture
//!
//! Everything external (frame extraction, scoring models, embedding store,
//! clip cutting) enters through traits injected into [`Pipeline::builder`].
//! The engine itself is pure orchestration and math.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use bestshot_engine::{Pipeline, scorers::{ExposureScorer, SharpnessScorer}};
//! use bestshot_media::FfmpegFrameSource;
//! use bestshot_models::{PipelineConfig, ScorerWeight};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let mut config = PipelineConfig::default();
//! config.weights.clear();
//! config.weights.insert("sharpness".into(), ScorerWeight::positive(0.6));
//! config.weights.insert("exposure".into(), ScorerWeight::negative(0.4));
//! config.diversity_enabled = false;
//!
//! let pipeline = Pipeline::builder(config)
//!     .frame_source(Arc::new(FfmpegFrameSource::new()))
//!     .scorer(Arc::new(SharpnessScorer::new()))
//!     .scorer(Arc::new(ExposureScorer::new()))
//!     .build()?;
//!
//! let result = pipeline.run("input.mp4".as_ref()).await?;
//! for clip in &result.clips {
//!     println!("{:.1}s - {:.1}s", clip.start_seconds, clip.end_seconds);
//! }
//! # Ok(())
//! # }
//! ```

pub mod composite;
pub mod diversity;
pub mod embedding;
pub mod error;
pub mod peaks;
pub mod pipeline;
pub mod planner;
pub mod scorer;
pub mod scorers;
pub mod similarity;
pub mod smoothing;

pub use composite::{CompositeScorer, ScoringOutcome};
pub use diversity::DiversityFilter;
pub use embedding::CachedEmbedder;
pub use error::{EngineError, EngineResult};
pub use peaks::PeakDetector;
pub use pipeline::{Pipeline, PipelineBuilder};
pub use planner::ClipWindowPlanner;
pub use scorer::{EmbeddingModel, FrameScorer, ModelFailure};
pub use similarity::{cosine_distance, cosine_similarity};
pub use smoothing::TemporalSmoother;
