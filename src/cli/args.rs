//! Command-line argument definitions using clap

use std::path::{Path, PathBuf};

use clap::Parser;

use crate::pipeline::{FeatureColumns, PipelineConfig, Preset, ReductionReference};

/// duoscore - Reduce features, train per-target classifiers and combine their accuracies
#[derive(Parser, Debug)]
#[command(name = "duoscore")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Input file path (CSV or Parquet)
    #[arg(short, long)]
    pub input: PathBuf,

    /// Dataset layout and pipeline to start from: "sensor" or "eeg"
    #[arg(long, default_value = "sensor")]
    pub preset: Preset,

    /// Label column whose accuracy is the first factor of the score
    #[arg(long)]
    pub primary_target: Option<String>,

    /// Label column whose accuracy is the second factor of the score
    #[arg(long)]
    pub secondary_target: Option<String>,

    /// First numbered feature column
    #[arg(long, conflicts_with = "feature_columns")]
    pub feature_start: Option<usize>,

    /// Number of numbered feature columns
    #[arg(long, conflicts_with = "feature_columns", value_parser = parse_positive_usize)]
    pub feature_count: Option<usize>,

    /// Explicit feature column names (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub feature_columns: Vec<String>,

    /// Label column names (comma-separated, one or two)
    #[arg(long, value_delimiter = ',')]
    pub label_columns: Vec<String>,

    /// Drop features whose variance is below this value
    #[arg(long, conflicts_with = "no_variance_filter", value_parser = parse_non_negative)]
    pub variance_threshold: Option<f64>,

    /// Skip the variance filter
    #[arg(long, default_value = "false")]
    pub no_variance_filter: bool,

    /// Neighbours used to impute each missing cell
    #[arg(long, conflicts_with = "no_impute", value_parser = parse_positive_usize)]
    pub impute_neighbors: Option<usize>,

    /// Skip imputation
    #[arg(long, default_value = "false")]
    pub no_impute: bool,

    /// Label the importance filter is fit against: "primary" or "per-target"
    #[arg(long)]
    pub reduction_reference: Option<ReductionReference>,

    /// Trees in the importance forest
    #[arg(long, value_parser = parse_positive_usize)]
    pub forest_trees: Option<usize>,

    /// Boosting rounds of the classifier
    #[arg(long, value_parser = parse_positive_usize)]
    pub estimators: Option<usize>,

    /// Boosting shrinkage
    #[arg(long, value_parser = parse_learning_rate)]
    pub learning_rate: Option<f64>,

    /// Depth of each boosting tree
    #[arg(long, value_parser = parse_positive_usize)]
    pub max_depth: Option<usize>,

    /// Fraction of rows held out for testing
    #[arg(long, default_value = "0.3", value_parser = parse_test_size)]
    pub test_size: f64,

    /// Seed for the split and both ensembles
    #[arg(long, default_value = "42")]
    pub seed: u64,

    /// Evaluate the two targets concurrently
    #[arg(long, default_value = "false")]
    pub parallel_targets: bool,

    /// JSON report path.
    /// Defaults to the input directory with a '_scores.json' suffix.
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// SVG chart path.
    /// Defaults to the input directory with an '_accuracy.svg' suffix.
    #[arg(long)]
    pub chart: Option<PathBuf>,

    /// Number of rows to use for schema inference (CSV only).
    /// Use 0 for full table scan (very slow for large files).
    #[arg(long, default_value = "10000")]
    pub infer_schema_length: usize,
}

impl Cli {
    /// Start from the preset and apply every override given on the command line.
    pub fn to_config(&self) -> PipelineConfig {
        let mut config = self.preset.config().with_seed(self.seed);

        if !self.feature_columns.is_empty() {
            config.schema.features = FeatureColumns::Named(self.feature_columns.clone());
        } else if self.feature_start.is_some() || self.feature_count.is_some() {
            let (start, count) = match config.schema.features {
                FeatureColumns::Numbered { start, count } => (start, count),
                FeatureColumns::Named(ref names) => (0, names.len()),
            };
            config.schema.features = FeatureColumns::Numbered {
                start: self.feature_start.unwrap_or(start),
                count: self.feature_count.unwrap_or(count),
            };
        }

        if !self.label_columns.is_empty() {
            config.schema.labels = self.label_columns.clone();
            if self.primary_target.is_none() {
                config.primary_target = self.label_columns[0].clone();
            }
            if self.secondary_target.is_none() {
                config.secondary_target = self
                    .label_columns
                    .get(1)
                    .unwrap_or(&self.label_columns[0])
                    .clone();
            }
        }
        if let Some(target) = &self.primary_target {
            config.primary_target = target.clone();
        }
        if let Some(target) = &self.secondary_target {
            config.secondary_target = target.clone();
        }

        if self.no_variance_filter {
            config.variance_threshold = None;
        } else if let Some(threshold) = self.variance_threshold {
            config.variance_threshold = Some(threshold);
        }

        if self.no_impute {
            config.imputation = None;
        } else if let Some(k) = self.impute_neighbors {
            config.imputation = Some(k);
        }

        if let Some(reference) = self.reduction_reference {
            config.reduction_reference = reference;
        }
        if let Some(n) = self.forest_trees {
            config.forest.n_trees = n;
        }
        if let Some(n) = self.estimators {
            config.evaluation.boosting.n_estimators = n;
        }
        if let Some(lr) = self.learning_rate {
            config.evaluation.boosting.learning_rate = lr;
        }
        if let Some(depth) = self.max_depth {
            config.evaluation.boosting.max_depth = depth;
        }
        config.evaluation.test_fraction = self.test_size;
        config.parallel_targets = self.parallel_targets;

        config
    }

    /// Get the JSON report path, deriving it from the input if not given.
    pub fn report_path(&self) -> PathBuf {
        self.report
            .clone()
            .unwrap_or_else(|| derived_path(&self.input, "_scores.json"))
    }

    /// Get the SVG chart path, deriving it from the input if not given.
    pub fn chart_path(&self) -> PathBuf {
        self.chart
            .clone()
            .unwrap_or_else(|| derived_path(&self.input, "_accuracy.svg"))
    }
}

fn derived_path(input: &Path, suffix: &str) -> PathBuf {
    let parent = input.parent().unwrap_or_else(|| Path::new("."));
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("duoscore");
    parent.join(format!("{}{}", stem, suffix))
}

fn parse_f64(s: &str) -> Result<f64, String> {
    s.parse()
        .map_err(|_| format!("'{}' is not a valid number", s))
}

/// Validator for test_size: strictly between 0 and 1
fn parse_test_size(s: &str) -> Result<f64, String> {
    let value = parse_f64(s)?;
    if value > 0.0 && value < 1.0 {
        Ok(value)
    } else {
        Err(format!("test size must be between 0 and 1 (exclusive), got {}", value))
    }
}

/// Validator for variance_threshold
fn parse_non_negative(s: &str) -> Result<f64, String> {
    let value = parse_f64(s)?;
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(format!("value must be a non-negative number, got {}", value))
    }
}

/// Validator for learning_rate
fn parse_learning_rate(s: &str) -> Result<f64, String> {
    let value = parse_f64(s)?;
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(format!("learning rate must be positive, got {}", value))
    }
}

fn parse_positive_usize(s: &str) -> Result<usize, String> {
    let value: usize = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid count", s))?;
    if value == 0 {
        Err("value must be at least 1".to_string())
    } else {
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validators() {
        assert!(parse_test_size("0.3").is_ok());
        assert!(parse_test_size("1.0").is_err());
        assert!(parse_test_size("0").is_err());
        assert!(parse_non_negative("-0.1").is_err());
        assert!(parse_non_negative("0").is_ok());
        assert!(parse_positive_usize("0").is_err());
        assert!(parse_learning_rate("abc").is_err());
    }

    #[test]
    fn test_derived_paths() {
        let cli = Cli::parse_from(["duoscore", "-i", "/data/eeg.csv"]);
        assert_eq!(cli.report_path(), PathBuf::from("/data/eeg_scores.json"));
        assert_eq!(cli.chart_path(), PathBuf::from("/data/eeg_accuracy.svg"));
    }
}
