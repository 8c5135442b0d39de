//! Composite scoring of two accuracies

use super::error::{PipelineError, PipelineResult};

/// Check that an accuracy is a valid fraction.
pub fn validate_accuracy(name: &str, accuracy: f64) -> PipelineResult<f64> {
    if accuracy.is_finite() && (0.0..=1.0).contains(&accuracy) {
        Ok(accuracy)
    } else {
        Err(PipelineError::InvariantViolation(format!(
            "accuracy for '{}' must lie in [0, 1], got {}",
            name, accuracy
        )))
    }
}

/// Product of two accuracies.
pub fn composite_score(first: f64, second: f64) -> PipelineResult<f64> {
    let a = validate_accuracy("first target", first)?;
    let b = validate_accuracy("second target", second)?;
    Ok(a * b)
}
