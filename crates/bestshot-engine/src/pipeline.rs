//! The end-to-end extraction pipeline.
//!
//! Wires the stages together: frame extraction, composite scoring, temporal
//! smoothing, peak detection, window planning, diversity filtering and
//! (optionally) clip cutting. All capabilities are injected through the
//! builder; the pipeline owns no global state and two pipelines with
//! different configurations can run side by side in one process.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{info, warn};
use uuid::Uuid;

use bestshot_media::{ClipCutter, FrameSource};
use bestshot_models::{ClipRecord, PipelineConfig, PipelineResult, ScoreVector};

use crate::composite::CompositeScorer;
use crate::diversity::DiversityFilter;
use crate::embedding::CachedEmbedder;
use crate::error::{EngineError, EngineResult};
use crate::peaks::PeakDetector;
use crate::planner::ClipWindowPlanner;
use crate::scorer::{FrameScorer, ModelFailure};
use crate::smoothing::TemporalSmoother;

/// Builder for [`Pipeline`].
pub struct PipelineBuilder {
    config: PipelineConfig,
    frame_source: Option<Arc<dyn FrameSource>>,
    scorers: Vec<Arc<dyn FrameScorer>>,
    embedder: Option<CachedEmbedder>,
    cutter: Option<Arc<dyn ClipCutter>>,
    output_dir: Option<PathBuf>,
}

impl PipelineBuilder {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            frame_source: None,
            scorers: Vec::new(),
            embedder: None,
            cutter: None,
            output_dir: None,
        }
    }

    pub fn frame_source(mut self, source: Arc<dyn FrameSource>) -> Self {
        self.frame_source = Some(source);
        self
    }

    /// Register a scorer. One must be registered for every configured weight.
    pub fn scorer(mut self, scorer: Arc<dyn FrameScorer>) -> Self {
        self.scorers.push(scorer);
        self
    }

    /// Attach the embedding front-end used by the diversity filter.
    /// Required when diversity is enabled.
    pub fn embedder(mut self, embedder: CachedEmbedder) -> Self {
        self.embedder = Some(embedder);
        self
    }

    /// Attach a clip cutter; accepted clips get cut into `output_dir`.
    /// Without one the pipeline only reports windows.
    pub fn clip_cutter(mut self, cutter: Arc<dyn ClipCutter>, output_dir: PathBuf) -> Self {
        self.cutter = Some(cutter);
        self.output_dir = Some(output_dir);
        self
    }

    pub fn build(self) -> EngineResult<Pipeline> {
        let config = self.config.validated()?;

        let frame_source = self
            .frame_source
            .ok_or_else(|| EngineError::invalid_setup("no frame source attached"))?;

        let timeout = Duration::from_secs(config.model_timeout_seconds);
        let composite = CompositeScorer::new(
            &config.weights,
            self.scorers,
            timeout,
            config.max_scoring_parallelism,
        )?;

        let diversity = if config.diversity_enabled {
            let embedder = self.embedder.ok_or_else(|| {
                EngineError::invalid_setup("diversity enabled but no embedder attached")
            })?;
            Some((
                DiversityFilter::new(config.similarity_threshold),
                embedder,
            ))
        } else {
            None
        };

        let cutter = match (self.cutter, self.output_dir) {
            (Some(cutter), Some(dir)) => Some((cutter, dir)),
            _ => None,
        };

        Ok(Pipeline {
            smoother: TemporalSmoother::new(config.smooth_window_seconds),
            detector: PeakDetector::new(config.min_peak_distance_seconds, config.top_k),
            planner: ClipWindowPlanner::new(config.pre_roll_seconds, config.post_roll_seconds),
            frame_source,
            composite,
            diversity,
            cutter,
            config,
        })
    }
}

/// A fully wired extraction pipeline. Cheap to keep around and reuse across
/// videos.
pub struct Pipeline {
    config: PipelineConfig,
    frame_source: Arc<dyn FrameSource>,
    composite: CompositeScorer,
    smoother: TemporalSmoother,
    detector: PeakDetector,
    planner: ClipWindowPlanner,
    diversity: Option<(DiversityFilter, CachedEmbedder)>,
    cutter: Option<(Arc<dyn ClipCutter>, PathBuf)>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    pub fn builder(config: PipelineConfig) -> PipelineBuilder {
        PipelineBuilder::new(config)
    }

    /// Run the pipeline on one video.
    pub async fn run(&self, video: &Path) -> EngineResult<PipelineResult> {
        let (_tx, rx) = watch::channel(false);
        self.run_with_cancel(video, rx).await
    }

    /// Run the pipeline, aborting between stages once `cancel` turns true.
    pub async fn run_with_cancel(
        &self,
        video: &Path,
        cancel: watch::Receiver<bool>,
    ) -> EngineResult<PipelineResult> {
        let run_id = Uuid::new_v4().to_string();

        info!(run_id = %run_id, video = %video.display(), "Starting pipeline run");

        check_cancelled(&cancel)?;
        let batch = self
            .frame_source
            .extract(video, self.config.sample_fps, self.config.sample_height)
            .await?;
        let video_duration = batch.video_duration;
        let frames = Arc::new(batch.frames);
        info!(
            run_id = %run_id,
            frames = frames.len(),
            video_duration,
            "Frames extracted"
        );

        check_cancelled(&cancel)?;
        let outcome = self.composite.score_frames(Arc::clone(&frames)).await?;
        if outcome.composite.is_empty() {
            warn!(run_id = %run_id, "Every frame failed scoring; no clips to select");
            return Ok(PipelineResult {
                run_id,
                video_duration,
                clips: Vec::new(),
                composite: Vec::new(),
                smoothed: Vec::new(),
                failed_frames: outcome.failed_frames,
                degraded_frames: outcome.degraded_frames,
            });
        }

        check_cancelled(&cancel)?;
        let smoothed = self.smoother.smooth(&outcome.composite);
        let peaks = self.detector.detect(&smoothed, &outcome.degraded_frames);
        info!(run_id = %run_id, peaks = peaks.len(), "Peaks selected");

        // Peaks arrive in descending score order; window planning and the
        // diversity filter both preserve that order.
        let mut candidates = Vec::new();
        for peak in peaks {
            let breakdown = outcome
                .vectors
                .get(&peak.frame_index)
                .cloned()
                .unwrap_or_else(|| ScoreVector::new(peak.frame_index));
            if let Some(window) = self.planner.plan(peak, breakdown, video_duration) {
                candidates.push(window);
            }
        }

        check_cancelled(&cancel)?;
        let selected = match &self.diversity {
            Some((filter, embedder)) if candidates.len() > 1 => {
                let mut embeddings = Vec::with_capacity(candidates.len());
                for window in &candidates {
                    let index = window.peak.frame_index;
                    let frame = frames
                        .get(index)
                        .filter(|f| f.index == index)
                        .ok_or_else(|| {
                            EngineError::internal(format!("peak frame {} out of range", index))
                        })?;
                    let vector = embedder.embed(frame).await.map_err(|e| match e {
                        ModelFailure::Cache(cache) => EngineError::Cache(cache),
                        other => EngineError::embedding_unavailable(other.to_string()),
                    })?;
                    embeddings.push(vector);
                }
                let kept = filter.select(candidates, &embeddings);
                info!(run_id = %run_id, kept = kept.len(), "Diversity filter applied");
                kept
            }
            _ => candidates,
        };

        // Pixel buffers are no longer needed past this point.
        drop(frames);

        check_cancelled(&cancel)?;
        let mut clips = Vec::with_capacity(selected.len());
        for (i, window) in selected.iter().enumerate() {
            let output_path = match &self.cutter {
                Some((cutter, dir)) => {
                    let path = dir.join(format!("clip_{:03}.mp4", i + 1));
                    Some(
                        cutter
                            .cut(video, window.start, window.duration(), &path)
                            .await?,
                    )
                }
                None => None,
            };

            clips.push(ClipRecord {
                start_seconds: window.start,
                end_seconds: window.end,
                peak_seconds: window.peak.timestamp,
                composite_score: window.peak.smoothed_score,
                breakdown: window.breakdown.normalized.clone(),
                output_path,
            });
        }

        clips.sort_by(|a, b| {
            a.start_seconds
                .partial_cmp(&b.start_seconds)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        info!(run_id = %run_id, clips = clips.len(), "Pipeline run complete");

        Ok(PipelineResult {
            run_id,
            video_duration,
            clips,
            composite: outcome.composite,
            smoothed,
            failed_frames: outcome.failed_frames,
            degraded_frames: outcome.degraded_frames,
        })
    }
}

fn check_cancelled(cancel: &watch::Receiver<bool>) -> EngineResult<()> {
    if *cancel.borrow() {
        return Err(EngineError::Cancelled);
    }
    Ok(())
}
