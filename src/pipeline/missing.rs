//! Missing value analysis

use super::matrix::FeatureMatrix;

/// Analyze missing values per feature column.
///
/// Returns `(column, missing_ratio)` pairs sorted by ratio descending.
/// A cell is missing when it holds `NaN`.
pub fn analyze_missing_values(matrix: &FeatureMatrix) -> Vec<(String, f64)> {
    if matrix.n_rows() == 0 {
        return Vec::new();
    }

    let n_rows = matrix.n_rows() as f64;
    let mut missing_counts = vec![0usize; matrix.n_cols()];
    for i in 0..matrix.n_rows() {
        for (j, v) in matrix.row(i).iter().enumerate() {
            if v.is_nan() {
                missing_counts[j] += 1;
            }
        }
    }

    let mut missing_ratios: Vec<(String, f64)> = matrix
        .names()
        .iter()
        .zip(missing_counts)
        .map(|(name, count)| (name.clone(), count as f64 / n_rows))
        .collect();

    // Stable sort keeps column order among equal ratios
    missing_ratios.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    missing_ratios
}

/// Get features that have at least one missing cell
pub fn get_features_with_missing(missing_ratios: &[(String, f64)]) -> Vec<String> {
    missing_ratios
        .iter()
        .filter(|(_, ratio)| *ratio > 0.0)
        .map(|(name, _)| name.clone())
        .collect()
}

/// Get features with no observed value at all
pub fn get_fully_missing_features(missing_ratios: &[(String, f64)]) -> Vec<String> {
    missing_ratios
        .iter()
        .filter(|(_, ratio)| *ratio >= 1.0)
        .map(|(name, _)| name.clone())
        .collect()
}
