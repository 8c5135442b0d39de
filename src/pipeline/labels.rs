//! Label vectors and dense integer encoding
//!
//! Labels arrive as strings (categorical or ordinal). Classifiers work on
//! dense class indices `0..k`, so each target is encoded before fitting.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use super::error::{PipelineError, PipelineResult};

/// One label column, row-aligned with the feature matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelVector {
    name: String,
    values: Vec<String>,
}

impl LabelVector {
    pub fn new(name: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Invertible mapping between label values and dense class indices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelEncoder {
    classes: Vec<String>,
}

impl LabelEncoder {
    /// Learn the class set of a label vector.
    ///
    /// Classes are sorted numerically when every value parses as a number,
    /// lexicographically otherwise, so ordinal codes keep their order.
    pub fn fit(values: &[String]) -> Self {
        let mut classes: Vec<String> = values.to_vec();
        let all_numeric = classes.iter().all(|v| v.trim().parse::<f64>().is_ok());
        if all_numeric {
            classes.sort_by(|a, b| {
                let x: f64 = a.trim().parse().unwrap_or(f64::NAN);
                let y: f64 = b.trim().parse().unwrap_or(f64::NAN);
                x.partial_cmp(&y).unwrap_or(Ordering::Equal).then_with(|| a.cmp(b))
            });
        } else {
            classes.sort();
        }
        classes.dedup();
        Self { classes }
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn n_classes(&self) -> usize {
        self.classes.len()
    }

    /// Encode every value; unseen values are a data format error.
    pub fn encode(&self, values: &[String]) -> PipelineResult<Vec<usize>> {
        values
            .iter()
            .map(|v| {
                self.classes.iter().position(|c| c == v).ok_or_else(|| {
                    PipelineError::DataFormat(format!("label value '{}' was not seen at fit time", v))
                })
            })
            .collect()
    }

    /// Map a class index back to its label value.
    pub fn decode(&self, class: usize) -> Option<&str> {
        self.classes.get(class).map(String::as_str)
    }
}

/// Count members per class for encoded labels.
pub fn class_counts(encoded: &[usize], n_classes: usize) -> Vec<usize> {
    let mut counts = vec![0usize; n_classes];
    for &c in encoded {
        if c < n_classes {
            counts[c] += 1;
        }
    }
    counts
}
