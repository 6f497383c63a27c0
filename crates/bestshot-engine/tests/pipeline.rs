//! End-to-end pipeline tests with scripted capabilities.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use bestshot_cache::MemoryEmbeddingStore;
use bestshot_engine::{
    CachedEmbedder, EmbeddingModel, EngineError, FrameScorer, ModelFailure, Pipeline,
};
use bestshot_media::{ClipCutter, FrameSource, MediaResult};
use bestshot_models::{Frame, FrameBatch, FramePixels, PipelineConfig, ScorerWeight};

/// Frame source producing synthetic frames at a fixed rate.
struct StubFrameSource {
    video_duration: f64,
    frame_count: usize,
}

#[async_trait]
impl FrameSource for StubFrameSource {
    async fn extract(
        &self,
        _video: &Path,
        sample_fps: f64,
        _sample_height: u32,
    ) -> MediaResult<FrameBatch> {
        let frames = (0..self.frame_count)
            .map(|i| Frame {
                index: i,
                timestamp: i as f64 / sample_fps,
                pixels: FramePixels::new(3, 3, vec![0u8; 27]).unwrap(),
                content_key: format!("synthetic-{}", i),
            })
            .collect();
        Ok(FrameBatch {
            video_duration: self.video_duration,
            frames,
        })
    }
}

/// Scorer replaying a fixed per-frame script. `None` entries fail.
struct ScriptedScorer {
    name: &'static str,
    values: Vec<Option<f64>>,
}

impl ScriptedScorer {
    fn new(name: &'static str, values: &[f64]) -> Self {
        Self {
            name,
            values: values.iter().map(|&v| Some(v)).collect(),
        }
    }
}

#[async_trait]
impl FrameScorer for ScriptedScorer {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn score(&self, frame: &Frame) -> Result<f64, ModelFailure> {
        self.values[frame.index].ok_or_else(|| ModelFailure::failed("scripted failure"))
    }
}

/// Embedding model returning one fixed vector for every frame.
struct ConstantEmbeddingModel {
    vector: Vec<f32>,
}

#[async_trait]
impl EmbeddingModel for ConstantEmbeddingModel {
    fn dim(&self) -> usize {
        self.vector.len()
    }

    async fn embed(&self, _frame: &Frame) -> Result<Vec<f32>, ModelFailure> {
        Ok(self.vector.clone())
    }
}

/// Embedding model returning a distinct vector per frame index.
struct PerFrameEmbeddingModel {
    vectors: BTreeMap<usize, Vec<f32>>,
}

#[async_trait]
impl EmbeddingModel for PerFrameEmbeddingModel {
    fn dim(&self) -> usize {
        2
    }

    async fn embed(&self, frame: &Frame) -> Result<Vec<f32>, ModelFailure> {
        self.vectors
            .get(&frame.index)
            .cloned()
            .ok_or_else(|| ModelFailure::failed("no scripted vector"))
    }
}

struct FailingEmbeddingModel;

#[async_trait]
impl EmbeddingModel for FailingEmbeddingModel {
    fn dim(&self) -> usize {
        2
    }

    async fn embed(&self, _frame: &Frame) -> Result<Vec<f32>, ModelFailure> {
        Err(ModelFailure::failed("model offline"))
    }
}

/// Clip cutter that records requested cuts instead of invoking FFmpeg.
#[derive(Default)]
struct RecordingCutter {
    cuts: Mutex<Vec<(f64, f64, PathBuf)>>,
}

#[async_trait]
impl ClipCutter for RecordingCutter {
    async fn cut(
        &self,
        _video: &Path,
        start_seconds: f64,
        duration_seconds: f64,
        output: &Path,
    ) -> MediaResult<PathBuf> {
        self.cuts.lock().unwrap().push((
            start_seconds,
            duration_seconds,
            output.to_path_buf(),
        ));
        Ok(output.to_path_buf())
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("debug")
        .with_test_writer()
        .try_init();
}

fn single_scorer_config(sample_fps: f64) -> PipelineConfig {
    let mut weights = BTreeMap::new();
    weights.insert("quality".to_string(), ScorerWeight::positive(1.0));
    PipelineConfig {
        sample_fps,
        weights,
        diversity_enabled: false,
        ..Default::default()
    }
}

fn embedder_with(model: Arc<dyn EmbeddingModel>) -> CachedEmbedder {
    CachedEmbedder::new(
        model,
        Arc::new(MemoryEmbeddingStore::new()),
        Duration::from_secs(5),
    )
}

#[tokio::test]
async fn test_two_bump_video_yields_two_separated_clips() {
    init_tracing();

    // 20 frames at 2 fps over a 10 second video, with quality bumps around
    // t=1.0-1.5s and t=6.0-6.5s.
    let values = [
        0.1, 0.2, 0.9, 0.8, 0.3, 0.2, 0.1, 0.1, 0.1, 0.1, //
        0.1, 0.1, 0.85, 0.9, 0.2, 0.1, 0.05, 0.05, 0.05, 0.05,
    ];

    let config = PipelineConfig {
        smooth_window_seconds: 1.0,
        min_peak_distance_seconds: 3.0,
        top_k: 2,
        pre_roll_seconds: 1.0,
        post_roll_seconds: 2.0,
        ..single_scorer_config(2.0)
    };

    let pipeline = Pipeline::builder(config)
        .frame_source(Arc::new(StubFrameSource {
            video_duration: 10.0,
            frame_count: 20,
        }))
        .scorer(Arc::new(ScriptedScorer::new("quality", &values)))
        .build()
        .unwrap();

    let result = pipeline.run(Path::new("two-bumps.mp4")).await.unwrap();

    assert_eq!(result.clips.len(), 2);
    assert!(result.failed_frames.is_empty());

    // Clips come back ordered by start time
    let first = &result.clips[0];
    let second = &result.clips[1];
    assert!((first.peak_seconds - 1.5).abs() < 1e-9);
    assert!((second.peak_seconds - 6.5).abs() < 1e-9);
    assert!(second.peak_seconds - first.peak_seconds >= 3.0);

    // Pre/post roll around each peak
    assert!((first.start_seconds - 0.5).abs() < 1e-9);
    assert!((first.end_seconds - 3.5).abs() < 1e-9);
    assert!((second.start_seconds - 5.5).abs() < 1e-9);
    assert!((second.end_seconds - 8.5).abs() < 1e-9);

    // Diagnostics cover the whole series
    assert_eq!(result.composite.len(), 20);
    assert_eq!(result.smoothed.len(), 20);
    assert!((result.video_duration - 10.0).abs() < 1e-9);

    // The result is the externally consumed artifact; it must serialize, and
    // clips without a cut file must omit the path entirely.
    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["clips"].as_array().unwrap().len(), 2);
    assert!(json["clips"][0].get("output_path").is_none());
    assert!(json["clips"][0]["breakdown"].get("quality").is_some());
}

#[tokio::test]
async fn test_identical_embeddings_collapse_to_single_clip() {
    init_tracing();

    // Five well separated bumps, but every peak frame embeds identically:
    // the diversity filter must keep only the strongest clip.
    let mut values = vec![0.0; 50];
    for (bump, &height) in [5usize, 15, 25, 35, 45]
        .iter()
        .zip(&[0.9, 0.8, 0.7, 0.6, 0.5])
    {
        values[*bump] = height;
    }

    let mut config = single_scorer_config(1.0);
    config.smooth_window_seconds = 0.0;
    config.min_peak_distance_seconds = 3.0;
    config.top_k = 5;
    config.diversity_enabled = true;
    config.similarity_threshold = 0.12;

    let pipeline = Pipeline::builder(config)
        .frame_source(Arc::new(StubFrameSource {
            video_duration: 50.0,
            frame_count: 50,
        }))
        .scorer(Arc::new(ScriptedScorer::new("quality", &values)))
        .embedder(embedder_with(Arc::new(ConstantEmbeddingModel {
            vector: vec![0.6, 0.8],
        })))
        .build()
        .unwrap();

    let result = pipeline.run(Path::new("repetitive.mp4")).await.unwrap();

    assert_eq!(result.clips.len(), 1);
    // The survivor is the strongest peak
    assert!((result.clips[0].peak_seconds - 5.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_distinct_embeddings_keep_all_clips() {
    let mut values = vec![0.0; 30];
    values[5] = 0.9;
    values[15] = 0.8;
    values[25] = 0.7;

    let mut config = single_scorer_config(1.0);
    config.smooth_window_seconds = 0.0;
    config.min_peak_distance_seconds = 3.0;
    config.top_k = 5;
    config.diversity_enabled = true;

    let mut vectors = BTreeMap::new();
    vectors.insert(5, vec![1.0, 0.0]);
    vectors.insert(15, vec![0.0, 1.0]);
    vectors.insert(25, vec![-1.0, 0.0]);

    let pipeline = Pipeline::builder(config)
        .frame_source(Arc::new(StubFrameSource {
            video_duration: 30.0,
            frame_count: 30,
        }))
        .scorer(Arc::new(ScriptedScorer::new("quality", &values)))
        .embedder(embedder_with(Arc::new(PerFrameEmbeddingModel { vectors })))
        .build()
        .unwrap();

    let result = pipeline.run(Path::new("varied.mp4")).await.unwrap();
    assert_eq!(result.clips.len(), 3);
}

#[tokio::test]
async fn test_windows_clamped_to_short_video() {
    // 2 second video, peak at t=1.0 with 1s pre-roll and 3s post-roll:
    // the clip clamps to the full [0, 2] range.
    let mut config = single_scorer_config(2.0);
    config.smooth_window_seconds = 0.0;
    config.min_peak_distance_seconds = 0.0;
    config.top_k = 1;
    config.pre_roll_seconds = 1.0;
    config.post_roll_seconds = 3.0;

    let pipeline = Pipeline::builder(config)
        .frame_source(Arc::new(StubFrameSource {
            video_duration: 2.0,
            frame_count: 4,
        }))
        .scorer(Arc::new(ScriptedScorer::new("quality", &[0.1, 0.2, 0.9, 0.3])))
        .build()
        .unwrap();

    let result = pipeline.run(Path::new("short.mp4")).await.unwrap();

    assert_eq!(result.clips.len(), 1);
    let clip = &result.clips[0];
    assert!((clip.peak_seconds - 1.0).abs() < 1e-9);
    assert_eq!(clip.start_seconds, 0.0);
    assert_eq!(clip.end_seconds, 2.0);
}

#[tokio::test]
async fn test_degraded_frame_cannot_become_peak() {
    // Secondary scorer fails exactly on the global maximum frame, which
    // excludes it from peak candidacy; the runner-up bump wins instead.
    let quality = [0.1, 0.1, 0.9, 0.1, 0.1, 0.1, 0.1, 0.1, 0.6, 0.1];
    let mut aux = ScriptedScorer::new("aux", &[0.5; 10]);
    aux.values[2] = None;

    let mut weights = BTreeMap::new();
    weights.insert("quality".to_string(), ScorerWeight::positive(0.7));
    weights.insert("aux".to_string(), ScorerWeight::positive(0.3));
    let config = PipelineConfig {
        sample_fps: 1.0,
        weights,
        smooth_window_seconds: 0.0,
        min_peak_distance_seconds: 0.0,
        top_k: 1,
        diversity_enabled: false,
        ..Default::default()
    };

    let pipeline = Pipeline::builder(config)
        .frame_source(Arc::new(StubFrameSource {
            video_duration: 10.0,
            frame_count: 10,
        }))
        .scorer(Arc::new(ScriptedScorer::new("quality", &quality)))
        .scorer(Arc::new(aux))
        .build()
        .unwrap();

    let result = pipeline.run(Path::new("degraded.mp4")).await.unwrap();

    assert_eq!(result.degraded_frames.len(), 1);
    assert!(result.degraded_frames.contains(&2));
    // Degraded frame stays in the diagnostic series
    assert_eq!(result.composite.len(), 10);
    // ...but the selected peak is the runner-up at t=8
    assert_eq!(result.clips.len(), 1);
    assert!((result.clips[0].peak_seconds - 8.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_embedding_failure_aborts_run() {
    let mut values = vec![0.0; 20];
    values[5] = 0.9;
    values[15] = 0.8;

    let mut config = single_scorer_config(1.0);
    config.smooth_window_seconds = 0.0;
    config.min_peak_distance_seconds = 3.0;
    config.top_k = 5;
    config.diversity_enabled = true;

    let pipeline = Pipeline::builder(config)
        .frame_source(Arc::new(StubFrameSource {
            video_duration: 20.0,
            frame_count: 20,
        }))
        .scorer(Arc::new(ScriptedScorer::new("quality", &values)))
        .embedder(embedder_with(Arc::new(FailingEmbeddingModel)))
        .build()
        .unwrap();

    let err = pipeline.run(Path::new("offline.mp4")).await.unwrap_err();
    assert!(matches!(err, EngineError::EmbeddingUnavailable(_)));
}

#[tokio::test]
async fn test_clip_cutter_invoked_per_selected_clip() {
    let mut values = vec![0.0; 20];
    values[5] = 0.9;
    values[15] = 0.8;

    let mut config = single_scorer_config(1.0);
    config.smooth_window_seconds = 0.0;
    config.min_peak_distance_seconds = 3.0;
    config.top_k = 5;

    let cutter = Arc::new(RecordingCutter::default());
    let pipeline = Pipeline::builder(config)
        .frame_source(Arc::new(StubFrameSource {
            video_duration: 20.0,
            frame_count: 20,
        }))
        .scorer(Arc::new(ScriptedScorer::new("quality", &values)))
        .clip_cutter(cutter.clone(), PathBuf::from("/tmp/clips"))
        .build()
        .unwrap();

    let result = pipeline.run(Path::new("cut-me.mp4")).await.unwrap();

    assert_eq!(result.clips.len(), 2);
    for clip in &result.clips {
        let path = clip.output_path.as_ref().expect("cut clip has a path");
        assert!(path.starts_with("/tmp/clips"));
    }

    let cuts = cutter.cuts.lock().unwrap();
    assert_eq!(cuts.len(), 2);
    for ((start, duration, _), clip) in cuts.iter().zip(&result.clips) {
        assert!((start - clip.start_seconds).abs() < 1e-9);
        assert!((duration - (clip.end_seconds - clip.start_seconds)).abs() < 1e-9);
    }
}

#[tokio::test]
async fn test_cancellation_between_stages() {
    let pipeline = Pipeline::builder(single_scorer_config(1.0))
        .frame_source(Arc::new(StubFrameSource {
            video_duration: 10.0,
            frame_count: 10,
        }))
        .scorer(Arc::new(ScriptedScorer::new("quality", &[0.5; 10])))
        .build()
        .unwrap();

    let (tx, rx) = tokio::sync::watch::channel(true);
    let err = pipeline
        .run_with_cancel(Path::new("cancelled.mp4"), rx)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Cancelled));
    drop(tx);
}

#[tokio::test]
async fn test_builder_requires_frame_source() {
    let err = Pipeline::builder(single_scorer_config(1.0))
        .scorer(Arc::new(ScriptedScorer::new("quality", &[])))
        .build()
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidSetup(_)));
}

#[tokio::test]
async fn test_builder_requires_scorer_per_weight() {
    let err = Pipeline::builder(single_scorer_config(1.0))
        .frame_source(Arc::new(StubFrameSource {
            video_duration: 1.0,
            frame_count: 1,
        }))
        .build()
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidSetup(_)));
}

#[tokio::test]
async fn test_builder_requires_embedder_when_diversity_enabled() {
    let mut config = single_scorer_config(1.0);
    config.diversity_enabled = true;

    let err = Pipeline::builder(config)
        .frame_source(Arc::new(StubFrameSource {
            video_duration: 1.0,
            frame_count: 1,
        }))
        .scorer(Arc::new(ScriptedScorer::new("quality", &[])))
        .build()
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidSetup(_)));
}

#[tokio::test]
async fn test_invalid_config_rejected_at_build() {
    let mut config = single_scorer_config(1.0);
    config.top_k = 0;

    let err = Pipeline::builder(config)
        .frame_source(Arc::new(StubFrameSource {
            video_duration: 1.0,
            frame_count: 1,
        }))
        .scorer(Arc::new(ScriptedScorer::new("quality", &[])))
        .build()
        .unwrap_err();
    assert!(matches!(err, EngineError::Config(_)));
}
