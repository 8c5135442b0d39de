//! Unit tests for missing value analysis

use duoscore::pipeline::{
    analyze_missing_values, get_features_with_missing, get_fully_missing_features, FeatureMatrix,
};

#[path = "common/mod.rs"]
mod common;

fn missing_matrix() -> FeatureMatrix {
    let nan = f64::NAN;
    FeatureMatrix::from_rows(
        vec![
            "complete".into(),
            "partial".into(),
            "all_missing".into(),
            "one_missing".into(),
        ],
        &[
            vec![1.0, 1.0, nan, 1.0],
            vec![2.0, nan, nan, 2.0],
            vec![3.0, nan, nan, nan],
            vec![4.0, 4.0, nan, 4.0],
            vec![5.0, 5.0, nan, 5.0],
        ],
    )
    .unwrap()
}

#[test]
fn test_analyze_missing_values_basic() {
    let ratios = analyze_missing_values(&missing_matrix());
    let ratio_map: std::collections::HashMap<_, _> = ratios.into_iter().collect();

    common::assert_close(ratio_map["complete"], 0.0, 1e-12);
    common::assert_close(ratio_map["partial"], 0.4, 1e-12);
    common::assert_close(ratio_map["all_missing"], 1.0, 1e-12);
    common::assert_close(ratio_map["one_missing"], 0.2, 1e-12);
}

#[test]
fn test_analyze_missing_values_sorted_descending() {
    let ratios = analyze_missing_values(&missing_matrix());
    let names: Vec<&str> = ratios.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(names, vec!["all_missing", "partial", "one_missing", "complete"]);
}

#[test]
fn test_feature_selection_by_ratio() {
    let ratios = analyze_missing_values(&missing_matrix());

    let with_missing = get_features_with_missing(&ratios);
    assert_eq!(with_missing.len(), 3);
    assert!(!with_missing.contains(&"complete".to_string()));

    assert_eq!(get_fully_missing_features(&ratios), vec!["all_missing"]);
}

#[test]
fn test_empty_matrix_has_no_ratios() {
    let m = FeatureMatrix::from_rows(vec!["a".into()], &[]).unwrap();
    assert!(analyze_missing_values(&m).is_empty());
}
