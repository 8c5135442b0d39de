//! Tree ensembles used for feature importance and classification
//!
//! - [`forest::RandomForest`]: bagged Gini trees, the importance model
//! - [`boosting::GradientBoosting`]: gradient-boosted regression trees, the classifier

pub mod boosting;
pub mod forest;
pub mod tree;

pub use boosting::{BoostingConfig, GradientBoosting};
pub use forest::{ForestConfig, MaxFeatures, RandomForest};

use super::error::{PipelineError, PipelineResult};
use super::matrix::FeatureMatrix;

/// A fitted classifier over dense class indices.
pub trait Classifier {
    /// Predict the class index of one sample.
    fn predict_row(&self, row: &[f64]) -> usize;

    /// Per-feature importance scores, non-negative and summing to 1
    /// (or all zero when the model never split).
    fn feature_importances(&self) -> Vec<f64>;

    /// Predict every row of a matrix.
    fn predict(&self, matrix: &FeatureMatrix) -> Vec<usize> {
        (0..matrix.n_rows())
            .map(|i| self.predict_row(matrix.row(i)))
            .collect()
    }
}

/// Index of the largest value, first one on ties.
pub(crate) fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate() {
        if v > values[best] {
            best = i;
        }
    }
    best
}

/// Shared input checks for ensemble fitting.
pub(crate) fn validate_training_data(
    matrix: &FeatureMatrix,
    labels: &[usize],
    n_classes: usize,
    model: &str,
) -> PipelineResult<()> {
    if matrix.n_rows() == 0 || matrix.n_cols() == 0 {
        return Err(PipelineError::DataFormat(format!(
            "{} needs a non-empty matrix, got {} x {}",
            model,
            matrix.n_rows(),
            matrix.n_cols()
        )));
    }
    if labels.len() != matrix.n_rows() {
        return Err(PipelineError::DataFormat(format!(
            "{}: {} labels for {} rows",
            model,
            labels.len(),
            matrix.n_rows()
        )));
    }
    if let Some(&bad) = labels.iter().find(|&&c| c >= n_classes) {
        return Err(PipelineError::InvariantViolation(format!(
            "{}: class index {} outside 0..{}",
            model, bad, n_classes
        )));
    }
    matrix.ensure_complete(model)
}
