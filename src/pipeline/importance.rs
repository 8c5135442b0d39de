//! Median-threshold feature filter driven by random forest importances
//!
//! The filter is fit against one reference label and then applied, unchanged,
//! to any matrix with the same columns.

use serde::Serialize;

use super::ensemble::{Classifier, ForestConfig, RandomForest};
use super::error::{PipelineError, PipelineResult};
use super::labels::{LabelEncoder, LabelVector};
use super::matrix::FeatureMatrix;

/// Importance of one feature and whether the filter kept it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureImportance {
    pub feature: String,
    pub importance: f64,
    pub retained: bool,
}

/// Fit a random forest against `labels` and return `(column, importance)` pairs
/// in column order.
pub fn analyze_feature_importance(
    matrix: &FeatureMatrix,
    labels: &LabelVector,
    config: &ForestConfig,
) -> PipelineResult<Vec<(String, f64)>> {
    matrix.ensure_complete("importance filter")?;
    if labels.len() != matrix.n_rows() {
        return Err(PipelineError::DataFormat(format!(
            "label '{}' has {} values for {} rows",
            labels.name(),
            labels.len(),
            matrix.n_rows()
        )));
    }

    let encoder = LabelEncoder::fit(labels.values());
    let encoded = encoder.encode(labels.values())?;
    let forest = RandomForest::fit(matrix, &encoded, encoder.n_classes(), config)?;

    Ok(matrix
        .names()
        .iter()
        .cloned()
        .zip(forest.feature_importances())
        .collect())
}

/// Median of the importance scores, averaging the two middle values for an
/// even count. Returns 0.0 for an empty slice.
pub fn median_importance(importances: &[(String, f64)]) -> f64 {
    let mut scores: Vec<f64> = importances.iter().map(|(_, s)| *s).collect();
    if scores.is_empty() {
        return 0.0;
    }
    scores.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = scores.len() / 2;
    if scores.len() % 2 == 0 {
        (scores[mid - 1] + scores[mid]) / 2.0
    } else {
        scores[mid]
    }
}

/// Get features whose importance is strictly below `threshold`
pub fn get_below_median_features(importances: &[(String, f64)], threshold: f64) -> Vec<String> {
    importances
        .iter()
        .filter(|(_, score)| *score < threshold)
        .map(|(name, _)| name.clone())
        .collect()
}

/// A fitted importance filter.
#[derive(Debug, Clone, Serialize)]
pub struct ImportanceFilter {
    /// Label column the forest was fit against
    pub reference_label: String,
    /// Median importance; features at or above it are kept
    pub threshold: f64,
    /// Every input feature in column order
    pub importances: Vec<FeatureImportance>,
    /// Kept feature names in column order
    pub retained: Vec<String>,
}

impl ImportanceFilter {
    pub fn fit(
        matrix: &FeatureMatrix,
        reference: &LabelVector,
        config: &ForestConfig,
    ) -> PipelineResult<Self> {
        let scores = analyze_feature_importance(matrix, reference, config)?;
        let threshold = median_importance(&scores);
        let dropped = get_below_median_features(&scores, threshold);

        let importances: Vec<FeatureImportance> = scores
            .into_iter()
            .map(|(feature, importance)| FeatureImportance {
                retained: !dropped.contains(&feature),
                feature,
                importance,
            })
            .collect();

        let retained: Vec<String> = importances
            .iter()
            .filter(|f| f.retained)
            .map(|f| f.feature.clone())
            .collect();

        if retained.is_empty() {
            return Err(PipelineError::InsufficientFeatures {
                stage: "importance filter".to_string(),
            });
        }

        Ok(Self {
            reference_label: reference.name().to_string(),
            threshold,
            importances,
            retained,
        })
    }

    /// Keep only the retained columns of `matrix`, in their original order.
    pub fn transform(&self, matrix: &FeatureMatrix) -> PipelineResult<FeatureMatrix> {
        matrix.select_named(&self.retained)
    }

    pub fn n_dropped(&self) -> usize {
        self.importances.len() - self.retained.len()
    }

    /// The `n` most important features, highest first.
    pub fn top_features(&self, n: usize) -> Vec<&FeatureImportance> {
        let mut ranked: Vec<&FeatureImportance> = self.importances.iter().collect();
        ranked.sort_by(|a, b| {
            b.importance
                .partial_cmp(&a.importance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        ranked.truncate(n);
        ranked
    }
}
