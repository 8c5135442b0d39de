//! Per-target training and evaluation
//!
//! Each target gets its own stratified split of the reduced matrix, a
//! gradient boosting classifier fit on the training rows, and an accuracy
//! measured on the held-out rows.

use serde::Serialize;

use super::ensemble::{BoostingConfig, Classifier, GradientBoosting};
use super::error::{PipelineError, PipelineResult};
use super::labels::{LabelEncoder, LabelVector};
use super::matrix::FeatureMatrix;
use super::score::validate_accuracy;
use super::split::{stratified_split, DEFAULT_TEST_FRACTION};

/// Split and classifier settings shared by both targets.
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationConfig {
    pub test_fraction: f64,
    pub split_seed: u64,
    pub boosting: BoostingConfig,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            test_fraction: DEFAULT_TEST_FRACTION,
            split_seed: 42,
            boosting: BoostingConfig::default(),
        }
    }
}

/// Outcome of evaluating one target.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TargetEvaluation {
    pub target: String,
    pub n_classes: usize,
    pub n_train: usize,
    pub n_test: usize,
    pub n_features: usize,
    pub accuracy: f64,
}

/// Fraction of predictions equal to the actual class.
pub fn accuracy_score(predicted: &[usize], actual: &[usize]) -> PipelineResult<f64> {
    if predicted.len() != actual.len() {
        return Err(PipelineError::InvariantViolation(format!(
            "{} predictions for {} samples",
            predicted.len(),
            actual.len()
        )));
    }
    if actual.is_empty() {
        return Err(PipelineError::InvariantViolation(
            "accuracy of an empty test set is undefined".to_string(),
        ));
    }
    let correct = predicted.iter().zip(actual).filter(|(p, a)| p == a).count();
    Ok(correct as f64 / actual.len() as f64)
}

/// Split, fit, predict and score one target against `matrix`.
pub fn evaluate_target(
    matrix: &FeatureMatrix,
    labels: &LabelVector,
    config: &EvaluationConfig,
) -> PipelineResult<TargetEvaluation> {
    if labels.len() != matrix.n_rows() {
        return Err(PipelineError::DataFormat(format!(
            "label '{}' has {} values for {} rows",
            labels.name(),
            labels.len(),
            matrix.n_rows()
        )));
    }
    matrix.ensure_complete("evaluation")?;

    let encoder = LabelEncoder::fit(labels.values());
    let encoded = encoder.encode(labels.values())?;
    let partition = stratified_split(&encoded, config.test_fraction, config.split_seed)?;

    let train_matrix = matrix.select_rows(&partition.train);
    let test_matrix = matrix.select_rows(&partition.test);
    let train_labels: Vec<usize> = partition.train.iter().map(|&i| encoded[i]).collect();
    let test_labels: Vec<usize> = partition.test.iter().map(|&i| encoded[i]).collect();

    let model = GradientBoosting::fit(
        &train_matrix,
        &train_labels,
        encoder.n_classes(),
        &config.boosting,
    )?;
    let predicted = model.predict(&test_matrix);
    let accuracy = validate_accuracy(labels.name(), accuracy_score(&predicted, &test_labels)?)?;

    Ok(TargetEvaluation {
        target: labels.name().to_string(),
        n_classes: encoder.n_classes(),
        n_train: partition.train.len(),
        n_test: partition.test.len(),
        n_features: matrix.n_cols(),
        accuracy,
    })
}
