//! Low-variance feature reduction

use super::error::{PipelineError, PipelineResult};
use super::matrix::FeatureMatrix;

/// Default variance threshold below which a feature is dropped
pub const DEFAULT_VARIANCE_THRESHOLD: f64 = 0.01;

/// Compute the variance of every feature column.
///
/// Uses the population variance (divided by `n`) over observed cells, two
/// passes per column so the result is exact for constant columns.
/// Returns `(column, variance)` pairs in column order.
pub fn analyze_variance(matrix: &FeatureMatrix) -> Vec<(String, f64)> {
    matrix
        .names()
        .iter()
        .enumerate()
        .map(|(j, name)| (name.clone(), column_variance(&matrix.column(j))))
        .collect()
}

fn column_variance(values: &[f64]) -> f64 {
    let observed: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    if observed.is_empty() {
        return 0.0;
    }
    let n = observed.len() as f64;
    let mean = observed.iter().sum::<f64>() / n;
    observed.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n
}

/// Get features whose variance is strictly below `threshold`
pub fn get_low_variance_features(variances: &[(String, f64)], threshold: f64) -> Vec<String> {
    variances
        .iter()
        .filter(|(_, variance)| *variance < threshold)
        .map(|(name, _)| name.clone())
        .collect()
}

/// Drop low-variance features, returning the reduced matrix and the dropped names.
pub fn apply_variance_filter(
    matrix: &FeatureMatrix,
    threshold: f64,
) -> PipelineResult<(FeatureMatrix, Vec<String>)> {
    if !threshold.is_finite() || threshold < 0.0 {
        return Err(PipelineError::InvariantViolation(format!(
            "variance threshold must be a non-negative number, got {}",
            threshold
        )));
    }

    let variances = analyze_variance(matrix);
    let to_drop = get_low_variance_features(&variances, threshold);
    let reduced = matrix.drop_columns(&to_drop);

    if reduced.n_cols() == 0 {
        return Err(PipelineError::InsufficientFeatures {
            stage: "variance filter".to_string(),
        });
    }

    Ok((reduced, to_drop))
}
