//! Pipeline configuration and the two notebook presets

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use super::ensemble::{BoostingConfig, ForestConfig};
use super::error::{PipelineError, PipelineResult};
use super::evaluate::EvaluationConfig;
use super::impute::DEFAULT_NEIGHBORS;
use super::schema::{DatasetSchema, FeatureColumns};
use super::variance::DEFAULT_VARIANCE_THRESHOLD;

/// Which label the importance filter is fit against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReductionReference {
    /// Fit once on the primary target and reuse the reduced matrix for both.
    #[default]
    Primary,
    /// Fit a separate filter for each target.
    PerTarget,
}

impl FromStr for ReductionReference {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "primary" => Ok(ReductionReference::Primary),
            "per-target" | "per_target" | "pertarget" => Ok(ReductionReference::PerTarget),
            _ => Err(format!(
                "Invalid reduction reference '{}'. Use 'primary' or 'per-target'",
                s
            )),
        }
    }
}

impl fmt::Display for ReductionReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReductionReference::Primary => write!(f, "primary"),
            ReductionReference::PerTarget => write!(f, "per-target"),
        }
    }
}

/// Built-in dataset layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    /// 3200 touch-sensor features, `user_id` and `touch_type` labels
    Sensor,
    /// 2268 EEG features, `PEGI` and `ESRB` labels
    Eeg,
}

impl FromStr for Preset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sensor" => Ok(Preset::Sensor),
            "eeg" => Ok(Preset::Eeg),
            _ => Err(format!("Invalid preset '{}'. Use 'sensor' or 'eeg'", s)),
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Preset::Sensor => write!(f, "sensor"),
            Preset::Eeg => write!(f, "eeg"),
        }
    }
}

impl Preset {
    pub fn config(&self) -> PipelineConfig {
        match self {
            Preset::Sensor => PipelineConfig::sensor(),
            Preset::Eeg => PipelineConfig::eeg(),
        }
    }
}

/// Everything a pipeline run needs besides the input data.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineConfig {
    pub schema: DatasetSchema,
    pub primary_target: String,
    pub secondary_target: String,
    /// Neighbours for k-NN imputation; `None` skips the cleaning stage
    pub imputation: Option<usize>,
    /// Variance threshold; `None` skips the variance filter
    pub variance_threshold: Option<f64>,
    pub reduction_reference: ReductionReference,
    pub forest: ForestConfig,
    pub evaluation: EvaluationConfig,
    pub parallel_targets: bool,
}

impl PipelineConfig {
    /// Touch-sensor pipeline: variance filter, no imputation, default boosting.
    pub fn sensor() -> Self {
        Self {
            schema: DatasetSchema::new(
                FeatureColumns::Numbered {
                    start: 0,
                    count: 3200,
                },
                vec!["user_id".to_string(), "touch_type".to_string()],
            ),
            primary_target: "user_id".to_string(),
            secondary_target: "touch_type".to_string(),
            imputation: None,
            variance_threshold: Some(DEFAULT_VARIANCE_THRESHOLD),
            reduction_reference: ReductionReference::Primary,
            forest: ForestConfig::default(),
            evaluation: EvaluationConfig::default(),
            parallel_targets: false,
        }
    }

    /// EEG pipeline: k-NN imputation, no variance filter, 50 boosting estimators.
    pub fn eeg() -> Self {
        Self {
            schema: DatasetSchema::new(
                FeatureColumns::Numbered {
                    start: 0,
                    count: 2268,
                },
                vec!["PEGI".to_string(), "ESRB".to_string()],
            ),
            primary_target: "PEGI".to_string(),
            secondary_target: "ESRB".to_string(),
            imputation: Some(DEFAULT_NEIGHBORS),
            variance_threshold: None,
            reduction_reference: ReductionReference::Primary,
            forest: ForestConfig::default(),
            evaluation: EvaluationConfig {
                boosting: BoostingConfig {
                    n_estimators: 50,
                    ..Default::default()
                },
                ..Default::default()
            },
            parallel_targets: false,
        }
    }

    /// Use one seed for the split and both ensembles.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.forest.seed = seed;
        self.evaluation.split_seed = seed;
        self.evaluation.boosting.seed = seed;
        self
    }

    /// Toggle progress bars in the ensemble stages.
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.forest.show_progress = show_progress;
        self.evaluation.boosting.show_progress = show_progress;
        self
    }

    /// Check cross-field consistency before any data is touched.
    pub fn validate(&self) -> PipelineResult<()> {
        self.schema.validate_layout()?;

        for target in [&self.primary_target, &self.secondary_target] {
            if !self.schema.labels.contains(target) {
                return Err(PipelineError::DataFormat(format!(
                    "target '{}' is not one of the label columns {:?}",
                    target, self.schema.labels
                )));
            }
        }

        if self.imputation == Some(0) {
            return Err(PipelineError::InvariantViolation(
                "imputation needs at least one neighbour".to_string(),
            ));
        }
        if let Some(threshold) = self.variance_threshold {
            if !threshold.is_finite() || threshold < 0.0 {
                return Err(PipelineError::InvariantViolation(format!(
                    "variance threshold must be a non-negative number, got {}",
                    threshold
                )));
            }
        }
        if self.forest.n_trees == 0 {
            return Err(PipelineError::InvariantViolation(
                "random forest needs at least one tree".to_string(),
            ));
        }
        let test_fraction = self.evaluation.test_fraction;
        if !(test_fraction > 0.0 && test_fraction < 1.0) {
            return Err(PipelineError::InvariantViolation(format!(
                "test fraction must be in (0, 1), got {}",
                test_fraction
            )));
        }
        self.evaluation.boosting.validate()
    }
}
