//! Explicit column layout for an input table
//!
//! The layout is validated once at load time so that later stages can rely
//! on every declared feature and label column being present.

use polars::prelude::*;
use serde::Serialize;

use super::error::{PipelineError, PipelineResult};

/// Which columns hold numeric features.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureColumns {
    /// Columns named by consecutive integers: `start`, `start + 1`, ...
    Numbered { start: usize, count: usize },
    /// Columns listed by name, in order.
    Named(Vec<String>),
}

impl FeatureColumns {
    /// Resolve to the ordered list of column names.
    pub fn names(&self) -> Vec<String> {
        match self {
            FeatureColumns::Numbered { start, count } => {
                (*start..*start + *count).map(|i| i.to_string()).collect()
            }
            FeatureColumns::Named(names) => names.clone(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            FeatureColumns::Numbered { count, .. } => *count,
            FeatureColumns::Named(names) => names.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Declared feature and label columns of a dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetSchema {
    pub features: FeatureColumns,
    pub labels: Vec<String>,
}

impl DatasetSchema {
    pub fn new(features: FeatureColumns, labels: Vec<String>) -> Self {
        Self { features, labels }
    }

    pub fn feature_names(&self) -> Vec<String> {
        self.features.names()
    }

    /// Check the schema against itself: one or two labels, no overlaps.
    pub fn validate_layout(&self) -> PipelineResult<()> {
        if self.features.is_empty() {
            return Err(PipelineError::DataFormat(
                "schema declares no feature columns".to_string(),
            ));
        }
        if self.labels.is_empty() || self.labels.len() > 2 {
            return Err(PipelineError::DataFormat(format!(
                "schema must declare one or two label columns, got {}",
                self.labels.len()
            )));
        }
        let features = self.feature_names();
        let mut seen = std::collections::HashSet::new();
        for name in features.iter().chain(self.labels.iter()) {
            if !seen.insert(name.as_str()) {
                return Err(PipelineError::DataFormat(format!(
                    "column '{}' is declared more than once",
                    name
                )));
            }
        }
        Ok(())
    }

    /// Validate the schema against a loaded DataFrame.
    ///
    /// Fails fast on the first absent column or on a feature column that is
    /// neither numeric nor entirely empty.
    pub fn validate(&self, df: &DataFrame) -> PipelineResult<()> {
        self.validate_layout()?;

        let available: std::collections::HashSet<String> = df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();

        let absent: Vec<String> = self
            .feature_names()
            .into_iter()
            .chain(self.labels.iter().cloned())
            .filter(|name| !available.contains(name))
            .collect();

        if !absent.is_empty() {
            let preview: Vec<&String> = absent.iter().take(5).collect();
            return Err(PipelineError::DataFormat(format!(
                "{} declared column(s) absent from dataset, e.g. {:?}",
                absent.len(),
                preview
            )));
        }

        for name in self.feature_names() {
            let column = df
                .column(&name)
                .map_err(|e| PipelineError::DataFormat(e.to_string()))?;
            let all_null = column.null_count() == column.len();
            if !column.dtype().is_primitive_numeric() && !all_null {
                return Err(PipelineError::DataFormat(format!(
                    "feature column '{}' has non-numeric type {}",
                    name,
                    column.dtype()
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numbered_names() {
        let cols = FeatureColumns::Numbered { start: 3, count: 3 };
        assert_eq!(cols.names(), vec!["3", "4", "5"]);
        assert_eq!(cols.len(), 3);
    }

    #[test]
    fn test_label_count_enforced() {
        let schema = DatasetSchema::new(
            FeatureColumns::Numbered { start: 0, count: 2 },
            vec!["a".into(), "b".into(), "c".into()],
        );
        assert!(matches!(
            schema.validate_layout(),
            Err(PipelineError::DataFormat(_))
        ));
    }

    #[test]
    fn test_label_overlapping_feature_rejected() {
        let schema = DatasetSchema::new(
            FeatureColumns::Named(vec!["x".into(), "y".into()]),
            vec!["y".into()],
        );
        assert!(schema.validate_layout().is_err());
    }

    #[test]
    fn test_validate_against_dataframe() {
        let df = df! {
            "0" => [1.0f64, 2.0],
            "1" => [3i32, 4],
            "label" => ["a", "b"],
        }
        .unwrap();
        let ok = DatasetSchema::new(
            FeatureColumns::Numbered { start: 0, count: 2 },
            vec!["label".into()],
        );
        assert!(ok.validate(&df).is_ok());

        let too_wide = DatasetSchema::new(
            FeatureColumns::Numbered { start: 0, count: 3 },
            vec!["label".into()],
        );
        assert!(too_wide.validate(&df).is_err());

        let string_feature = DatasetSchema::new(
            FeatureColumns::Named(vec!["label".into()]),
            vec!["0".into()],
        );
        assert!(string_feature.validate(&df).is_err());
    }
}
