//! Pipeline configuration.
//!
//! The configuration surface is a structured, validated set of named fields.
//! Invalid weight/threshold combinations are rejected before the pipeline
//! starts, never discovered mid-run.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use validator::{Validate, ValidationError, ValidationErrors};

/// Direction a scorer contributes to the composite score.
///
/// A penalty signal (e.g. exposure) uses `Negative` so that a higher raw
/// penalty lowers the composite value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sign {
    Positive,
    Negative,
}

impl Sign {
    /// Multiplier applied in the weighted sum.
    pub fn multiplier(self) -> f64 {
        match self {
            Sign::Positive => 1.0,
            Sign::Negative => -1.0,
        }
    }
}

/// Weight and direction for one scorer in the composite combination.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScorerWeight {
    /// Magnitude of the contribution; need not sum to 1 across scorers
    pub weight: f64,
    pub sign: Sign,
}

impl ScorerWeight {
    pub fn positive(weight: f64) -> Self {
        Self {
            weight,
            sign: Sign::Positive,
        }
    }

    pub fn negative(weight: f64) -> Self {
        Self {
            weight,
            sign: Sign::Negative,
        }
    }

    /// Signed weight used in the composite sum.
    pub fn signed(&self) -> f64 {
        self.sign.multiplier() * self.weight
    }
}

/// Configuration error.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Invalid(#[from] ValidationErrors),
}

/// Validated configuration for one pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[validate(schema(function = validate_cross_fields))]
pub struct PipelineConfig {
    /// Frame sampling rate in frames per second
    #[validate(range(min = 0.1, max = 60.0))]
    pub sample_fps: f64,

    /// Target frame height in pixels; width scales proportionally
    #[validate(range(min = 64, max = 4320))]
    pub sample_height: u32,

    /// Scorer name -> weight and sign
    #[validate(custom(function = validate_weights))]
    pub weights: BTreeMap<String, ScorerWeight>,

    /// Temporal smoothing window in seconds
    #[validate(range(min = 0.0))]
    pub smooth_window_seconds: f64,

    /// Minimum separation between accepted peaks in seconds
    #[validate(range(min = 0.0))]
    pub min_peak_distance_seconds: f64,

    /// Maximum number of peaks to select
    #[validate(range(min = 1))]
    pub top_k: usize,

    /// Seconds included before each peak
    #[validate(range(min = 0.0))]
    pub pre_roll_seconds: f64,

    /// Seconds included after each peak
    #[validate(range(min = 0.0))]
    pub post_roll_seconds: f64,

    /// Whether near-duplicate clips are suppressed
    pub diversity_enabled: bool,

    /// Minimum cosine distance between accepted clips
    #[validate(range(min = 0.0, max = 2.0))]
    pub similarity_threshold: f64,

    /// Per-call timeout for scorer and embedding model invocations
    #[validate(range(min = 1))]
    pub model_timeout_seconds: u64,

    /// Maximum frames scored concurrently
    #[validate(range(min = 1))]
    pub max_scoring_parallelism: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let mut weights = BTreeMap::new();
        weights.insert("sharpness".to_string(), ScorerWeight::positive(0.3));
        weights.insert("exposure".to_string(), ScorerWeight::negative(0.2));
        weights.insert("aesthetics".to_string(), ScorerWeight::positive(0.4));
        weights.insert("saliency".to_string(), ScorerWeight::positive(0.1));

        Self {
            sample_fps: 3.0,
            sample_height: 720,
            weights,
            smooth_window_seconds: 2.0,
            min_peak_distance_seconds: 4.0,
            top_k: 5,
            pre_roll_seconds: 1.0,
            post_roll_seconds: 2.0,
            diversity_enabled: true,
            similarity_threshold: 0.12,
            model_timeout_seconds: 30,
            max_scoring_parallelism: 4,
        }
    }
}

impl PipelineConfig {
    /// Create config from environment variables, falling back to defaults
    /// for anything unset or unparsable. Scorer weights are not read from the
    /// environment; callers wanting non-default weights set them directly.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            sample_fps: env_parse("BESTSHOT_SAMPLE_FPS", defaults.sample_fps),
            sample_height: env_parse("BESTSHOT_SAMPLE_HEIGHT", defaults.sample_height),
            weights: defaults.weights,
            smooth_window_seconds: env_parse(
                "BESTSHOT_SMOOTH_WINDOW_SECS",
                defaults.smooth_window_seconds,
            ),
            min_peak_distance_seconds: env_parse(
                "BESTSHOT_MIN_PEAK_DISTANCE_SECS",
                defaults.min_peak_distance_seconds,
            ),
            top_k: env_parse("BESTSHOT_TOP_K", defaults.top_k),
            pre_roll_seconds: env_parse("BESTSHOT_PRE_ROLL_SECS", defaults.pre_roll_seconds),
            post_roll_seconds: env_parse("BESTSHOT_POST_ROLL_SECS", defaults.post_roll_seconds),
            diversity_enabled: env_parse("BESTSHOT_DIVERSITY_ENABLED", defaults.diversity_enabled),
            similarity_threshold: env_parse(
                "BESTSHOT_SIMILARITY_THRESHOLD",
                defaults.similarity_threshold,
            ),
            model_timeout_seconds: env_parse(
                "BESTSHOT_MODEL_TIMEOUT_SECS",
                defaults.model_timeout_seconds,
            ),
            max_scoring_parallelism: env_parse(
                "BESTSHOT_MAX_SCORING_PARALLEL",
                defaults.max_scoring_parallelism,
            ),
        }
    }

    /// Run all field and cross-field checks.
    pub fn validated(self) -> Result<Self, ConfigError> {
        self.validate()?;
        Ok(self)
    }

    /// Total planned clip length in seconds.
    pub fn clip_duration(&self) -> f64 {
        self.pre_roll_seconds + self.post_roll_seconds
    }
}

fn env_parse<T: std::str::FromStr>(var: &str, default: T) -> T {
    std::env::var(var)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

fn validate_weights(weights: &BTreeMap<String, ScorerWeight>) -> Result<(), ValidationError> {
    if weights.is_empty() {
        return Err(ValidationError::new("weights_empty"));
    }
    for (name, w) in weights {
        if name.trim().is_empty() {
            return Err(ValidationError::new("weights_unnamed"));
        }
        if !w.weight.is_finite() || w.weight <= 0.0 {
            return Err(ValidationError::new("weights_non_positive"));
        }
    }
    Ok(())
}

fn validate_cross_fields(config: &PipelineConfig) -> Result<(), ValidationError> {
    if config.clip_duration() <= 0.0 {
        return Err(ValidationError::new("zero_clip_duration"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(PipelineConfig::default().validated().is_ok());
    }

    #[test]
    fn test_empty_weights_rejected() {
        let config = PipelineConfig {
            weights: BTreeMap::new(),
            ..Default::default()
        };
        assert!(config.validated().is_err());
    }

    #[test]
    fn test_non_positive_weight_rejected() {
        let mut config = PipelineConfig::default();
        config
            .weights
            .insert("sharpness".to_string(), ScorerWeight::positive(0.0));
        assert!(config.validated().is_err());
    }

    #[test]
    fn test_zero_clip_duration_rejected() {
        let config = PipelineConfig {
            pre_roll_seconds: 0.0,
            post_roll_seconds: 0.0,
            ..Default::default()
        };
        assert!(config.validated().is_err());
    }

    #[test]
    fn test_zero_top_k_rejected() {
        let config = PipelineConfig {
            top_k: 0,
            ..Default::default()
        };
        assert!(config.validated().is_err());
    }

    #[test]
    fn test_threshold_out_of_range_rejected() {
        let config = PipelineConfig {
            similarity_threshold: 2.5,
            ..Default::default()
        };
        assert!(config.validated().is_err());
    }

    #[test]
    fn test_signed_weight() {
        assert!((ScorerWeight::negative(0.2).signed() + 0.2).abs() < f64::EPSILON);
        assert!((ScorerWeight::positive(0.3).signed() - 0.3).abs() < f64::EPSILON);
    }
}
