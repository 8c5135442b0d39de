//! Dataset loader for CSV and Parquet files

use std::path::Path;

use anyhow::{Context, Result};
use polars::prelude::*;

use super::error::{PipelineError, PipelineResult};
use super::labels::LabelVector;
use super::matrix::FeatureMatrix;
use super::schema::DatasetSchema;
use crate::utils::{create_spinner, finish_with_success};

/// Features and labels extracted from one input table, row-aligned.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub features: FeatureMatrix,
    pub labels: Vec<LabelVector>,
}

impl Dataset {
    pub fn n_rows(&self) -> usize {
        self.features.n_rows()
    }

    /// Look up a label vector by column name.
    pub fn label(&self, name: &str) -> PipelineResult<&LabelVector> {
        self.labels
            .iter()
            .find(|l| l.name() == name)
            .ok_or_else(|| PipelineError::DataFormat(format!("label column '{}' not loaded", name)))
    }
}

/// Read a CSV or Parquet file into a DataFrame.
///
/// `infer_schema_length` only applies to CSV; 0 means a full table scan.
pub fn load_dataframe(path: &Path, infer_schema_length: usize) -> Result<DataFrame> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    let schema_length = if infer_schema_length == 0 {
        None
    } else {
        Some(infer_schema_length)
    };

    let lf = match extension.as_str() {
        "csv" => LazyCsvReader::new(path)
            .with_infer_schema_length(schema_length)
            .finish()
            .with_context(|| format!("Failed to load CSV file: {}", path.display()))?,
        "parquet" => LazyFrame::scan_parquet(path, Default::default())
            .with_context(|| format!("Failed to load Parquet file: {}", path.display()))?,
        _ => anyhow::bail!(
            "Unsupported file format: {}. Supported formats: csv, parquet",
            extension
        ),
    };

    lf.collect()
        .with_context(|| format!("Failed to read dataset: {}", path.display()))
}

/// Load a dataset and split it into features and labels according to `schema`.
pub fn load_dataset(
    path: &Path,
    schema: &DatasetSchema,
    infer_schema_length: usize,
) -> Result<Dataset> {
    let df = load_dataframe(path, infer_schema_length)?;
    let dataset = extract_dataset(&df, schema)
        .with_context(|| format!("Dataset {} does not match the declared schema", path.display()))?;
    Ok(dataset)
}

/// Same as [`load_dataset`] but shows a spinner and returns shape statistics.
///
/// Returns `(dataset, rows, columns, memory_mb)` where `columns` counts every
/// column of the file, not only the declared ones.
pub fn load_dataset_with_progress(
    path: &Path,
    schema: &DatasetSchema,
    infer_schema_length: usize,
) -> Result<(Dataset, usize, usize, f64)> {
    let spinner = create_spinner(&format!("Reading {}...", path.display()));
    let df = load_dataframe(path, infer_schema_length)?;
    let (rows, cols) = df.shape();
    let memory_mb = df.estimated_size() as f64 / (1024.0 * 1024.0);
    let dataset = extract_dataset(&df, schema)
        .with_context(|| format!("Dataset {} does not match the declared schema", path.display()))?;
    finish_with_success(&spinner, "Dataset loaded");
    Ok((dataset, rows, cols, memory_mb))
}

/// Validate `df` against `schema` and extract the feature matrix and labels.
///
/// Feature nulls become `NaN`; label nulls are rejected because every row
/// with a feature vector must carry a label.
pub fn extract_dataset(df: &DataFrame, schema: &DatasetSchema) -> PipelineResult<Dataset> {
    schema.validate(df)?;

    let feature_names = schema.feature_names();
    let columns = feature_names
        .iter()
        .map(|name| extract_feature_column(df, name))
        .collect::<PipelineResult<Vec<Vec<f64>>>>()?;
    let features = FeatureMatrix::from_columns(feature_names, &columns)?;

    let labels = schema
        .labels
        .iter()
        .map(|name| extract_label_column(df, name))
        .collect::<PipelineResult<Vec<LabelVector>>>()?;

    for label in &labels {
        if label.len() != features.n_rows() {
            return Err(PipelineError::DataFormat(format!(
                "label column '{}' has {} rows but the feature matrix has {}",
                label.name(),
                label.len(),
                features.n_rows()
            )));
        }
    }

    Ok(Dataset { features, labels })
}

fn polars_error(column: &str, err: PolarsError) -> PipelineError {
    PipelineError::DataFormat(format!("column '{}': {}", column, err))
}

fn extract_feature_column(df: &DataFrame, name: &str) -> PipelineResult<Vec<f64>> {
    let column = df.column(name).map_err(|e| polars_error(name, e))?;

    // An entirely empty column may be inferred as String or Null.
    if column.null_count() == column.len() {
        return Ok(vec![f64::NAN; column.len()]);
    }

    let float_col = column
        .cast(&DataType::Float64)
        .map_err(|e| polars_error(name, e))?;
    let values = float_col
        .f64()
        .map_err(|e| polars_error(name, e))?
        .into_iter()
        .map(|v| v.unwrap_or(f64::NAN))
        .collect();
    Ok(values)
}

fn extract_label_column(df: &DataFrame, name: &str) -> PipelineResult<LabelVector> {
    let column = df.column(name).map_err(|e| polars_error(name, e))?;
    let string_col = column
        .cast(&DataType::String)
        .map_err(|e| polars_error(name, e))?;
    let values = string_col
        .str()
        .map_err(|e| polars_error(name, e))?
        .into_iter()
        .enumerate()
        .map(|(row, v)| {
            v.map(|s| s.to_string()).ok_or_else(|| {
                PipelineError::DataFormat(format!(
                    "label column '{}' has no value at row {}",
                    name, row
                ))
            })
        })
        .collect::<PipelineResult<Vec<String>>>()?;
    Ok(LabelVector::new(name, values))
}
