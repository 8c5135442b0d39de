//! Tests for k-nearest-neighbour imputation

use duoscore::pipeline::{FeatureMatrix, KnnImputer, PipelineError};

#[path = "common/mod.rs"]
mod common;

#[test]
fn test_scenario_b_fills_every_cell_within_observed_range() {
    let matrix = common::scenario_b_matrix();
    assert_eq!(matrix.missing_count(), 10);

    let observed: Vec<f64> = matrix
        .column(2)
        .into_iter()
        .filter(|v| !v.is_nan())
        .collect();
    let lo = observed.iter().cloned().fold(f64::INFINITY, f64::min);
    let hi = observed.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

    let outcome = KnnImputer::default().impute(&matrix).unwrap();

    assert!(!outcome.matrix.has_missing());
    assert_eq!(outcome.imputed_cells, 10);
    assert_eq!(outcome.imputed_columns, vec!["2"]);
    for i in (0..50).step_by(5) {
        let v = outcome.matrix.get(i, 2);
        assert!(v >= lo && v <= hi, "imputed {} outside [{}, {}]", v, lo, hi);
    }
}

#[test]
fn test_complete_rows_are_unchanged() {
    let matrix = common::scenario_b_matrix();
    let outcome = KnnImputer::new(3).impute(&matrix).unwrap();

    for i in (0..50).filter(|i| i % 5 != 0) {
        assert_eq!(outcome.matrix.row(i), matrix.row(i));
    }
    // Observed cells of incomplete rows are untouched too
    assert_eq!(outcome.matrix.get(0, 0), matrix.get(0, 0));
}

#[test]
fn test_uses_nearest_neighbours() {
    let nan = f64::NAN;
    let matrix = FeatureMatrix::from_rows(
        vec!["a".into(), "b".into()],
        &[
            vec![0.0, nan],
            vec![0.1, 10.0],
            vec![0.2, 20.0],
            vec![100.0, 1000.0],
        ],
    )
    .unwrap();

    let outcome = KnnImputer::new(2).impute(&matrix).unwrap();
    common::assert_close(outcome.matrix.get(0, 1), 15.0, 1e-12);

    let nearest = KnnImputer::new(1).impute(&matrix).unwrap();
    common::assert_close(nearest.matrix.get(0, 1), 10.0, 1e-12);
}

#[test]
fn test_k_larger_than_donors_uses_all_donors() {
    let nan = f64::NAN;
    let matrix = FeatureMatrix::from_rows(
        vec!["a".into(), "b".into()],
        &[vec![1.0, nan], vec![2.0, 4.0], vec![3.0, 8.0]],
    )
    .unwrap();
    let outcome = KnnImputer::new(5).impute(&matrix).unwrap();
    common::assert_close(outcome.matrix.get(0, 1), 6.0, 1e-12);
}

#[test]
fn test_fully_missing_column_is_imputation_error() {
    let nan = f64::NAN;
    let matrix = FeatureMatrix::from_rows(
        vec!["ok".into(), "empty".into()],
        &[vec![1.0, nan], vec![2.0, nan]],
    )
    .unwrap();

    let err = KnnImputer::default().impute(&matrix).unwrap_err();
    assert_eq!(
        err,
        PipelineError::Imputation {
            column: "empty".to_string(),
            reason: "no observed values to estimate from".to_string(),
        }
    );
}

#[test]
fn test_zero_neighbours_is_rejected() {
    let matrix = common::scenario_b_matrix();
    assert!(matches!(
        KnnImputer::new(0).impute(&matrix),
        Err(PipelineError::InvariantViolation(_))
    ));
}

#[test]
fn test_complete_matrix_passes_through() {
    let matrix = FeatureMatrix::from_rows(vec!["a".into()], &[vec![1.0], vec![2.0]]).unwrap();
    let outcome = KnnImputer::default().impute(&matrix).unwrap();
    assert_eq!(outcome.imputed_cells, 0);
    assert_eq!(outcome.matrix, matrix);
}
