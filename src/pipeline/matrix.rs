//! Dense feature matrix with named columns
//!
//! Values are stored row-major so that tree ensembles can route a sample
//! with a single slice. Missing cells are represented as `NaN`.

use super::error::{PipelineError, PipelineResult};

/// A rectangular block of numeric features.
///
/// Stages never mutate a matrix in place; filtering and imputation
/// always produce a new value.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    names: Vec<String>,
    values: Vec<f64>,
    n_rows: usize,
}

impl FeatureMatrix {
    /// Build a matrix from column names and row-major values.
    pub fn new(names: Vec<String>, values: Vec<f64>, n_rows: usize) -> PipelineResult<Self> {
        if values.len() != n_rows * names.len() {
            return Err(PipelineError::DataFormat(format!(
                "matrix has {} values but {} rows x {} columns were declared",
                values.len(),
                n_rows,
                names.len()
            )));
        }
        Ok(Self {
            names,
            values,
            n_rows,
        })
    }

    /// Build a matrix from a list of rows.
    pub fn from_rows(names: Vec<String>, rows: &[Vec<f64>]) -> PipelineResult<Self> {
        let n_cols = names.len();
        let mut values = Vec::with_capacity(rows.len() * n_cols);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != n_cols {
                return Err(PipelineError::DataFormat(format!(
                    "row {} has {} values, expected {}",
                    i,
                    row.len(),
                    n_cols
                )));
            }
            values.extend_from_slice(row);
        }
        Self::new(names, values, rows.len())
    }

    /// Build a matrix from per-column vectors of equal length.
    pub fn from_columns(names: Vec<String>, columns: &[Vec<f64>]) -> PipelineResult<Self> {
        if names.len() != columns.len() {
            return Err(PipelineError::DataFormat(format!(
                "{} column names for {} columns",
                names.len(),
                columns.len()
            )));
        }
        let n_rows = columns.first().map_or(0, Vec::len);
        if let Some((idx, col)) = columns.iter().enumerate().find(|(_, c)| c.len() != n_rows) {
            return Err(PipelineError::DataFormat(format!(
                "column '{}' has {} rows, expected {}",
                names[idx],
                col.len(),
                n_rows
            )));
        }
        let n_cols = names.len();
        let mut values = vec![0.0; n_rows * n_cols];
        for (j, col) in columns.iter().enumerate() {
            for (i, &v) in col.iter().enumerate() {
                values[i * n_cols + j] = v;
            }
        }
        Self::new(names, values, n_rows)
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_cols(&self) -> usize {
        self.names.len()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Row-major backing values.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn row(&self, i: usize) -> &[f64] {
        let n_cols = self.n_cols();
        &self.values[i * n_cols..(i + 1) * n_cols]
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[i * self.n_cols() + j]
    }

    /// Copy one column out of the matrix.
    pub fn column(&self, j: usize) -> Vec<f64> {
        (0..self.n_rows).map(|i| self.get(i, j)).collect()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// Number of missing (`NaN`) cells.
    pub fn missing_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_nan()).count()
    }

    pub fn has_missing(&self) -> bool {
        self.values.iter().any(|v| v.is_nan())
    }

    /// Fail with a data format error when any cell is missing.
    pub fn ensure_complete(&self, stage: &str) -> PipelineResult<()> {
        let missing = self.missing_count();
        if missing > 0 {
            return Err(PipelineError::DataFormat(format!(
                "{} requires a complete feature matrix but {} cell(s) are missing; enable imputation",
                stage, missing
            )));
        }
        Ok(())
    }

    /// New matrix keeping the given columns, in the given order.
    pub fn select_columns(&self, indices: &[usize]) -> Self {
        let names = indices.iter().map(|&j| self.names[j].clone()).collect();
        let mut values = Vec::with_capacity(self.n_rows * indices.len());
        for i in 0..self.n_rows {
            let row = self.row(i);
            values.extend(indices.iter().map(|&j| row[j]));
        }
        Self {
            names,
            values,
            n_rows: self.n_rows,
        }
    }

    /// New matrix keeping the named columns, in the given order.
    pub fn select_named(&self, names: &[String]) -> PipelineResult<Self> {
        let indices = names
            .iter()
            .map(|name| {
                self.column_index(name).ok_or_else(|| {
                    PipelineError::DataFormat(format!("feature column '{}' not present", name))
                })
            })
            .collect::<PipelineResult<Vec<usize>>>()?;
        Ok(self.select_columns(&indices))
    }

    /// New matrix without the named columns. Unknown names are ignored.
    pub fn drop_columns(&self, names: &[String]) -> Self {
        let keep: Vec<usize> = (0..self.n_cols())
            .filter(|&j| !names.contains(&self.names[j]))
            .collect();
        self.select_columns(&keep)
    }

    /// New matrix with the given rows, in the given order.
    pub fn select_rows(&self, rows: &[usize]) -> Self {
        let mut values = Vec::with_capacity(rows.len() * self.n_cols());
        for &i in rows {
            values.extend_from_slice(self.row(i));
        }
        Self {
            names: self.names.clone(),
            values,
            n_rows: rows.len(),
        }
    }

    /// Estimated heap size in bytes.
    pub fn estimated_size(&self) -> usize {
        self.values.len() * std::mem::size_of::<f64>()
            + self.names.iter().map(String::len).sum::<usize>()
    }
}
