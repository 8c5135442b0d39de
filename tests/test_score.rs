//! Tests for the composite score

use duoscore::pipeline::{composite_score, validate_accuracy, PipelineError};

#[path = "common/mod.rs"]
mod common;

#[test]
fn test_score_is_product_not_mean() {
    let score = composite_score(0.9, 0.5).unwrap();
    common::assert_close(score, 0.45, 1e-15);
    assert!((score - 0.7).abs() > 0.1, "score must not be the mean");
}

#[test]
fn test_score_bounds() {
    assert_eq!(composite_score(1.0, 1.0).unwrap(), 1.0);
    assert_eq!(composite_score(0.0, 0.8).unwrap(), 0.0);
}

#[test]
fn test_out_of_range_accuracy_is_invariant_violation() {
    for (a, b) in [(1.2, 0.5), (0.5, -0.1), (f64::NAN, 0.5), (0.5, f64::INFINITY)] {
        assert!(matches!(
            composite_score(a, b),
            Err(PipelineError::InvariantViolation(_))
        ));
    }
}

#[test]
fn test_validate_accuracy_names_the_target() {
    let err = validate_accuracy("ESRB", 1.5).unwrap_err();
    assert!(err.to_string().contains("ESRB"));
}
