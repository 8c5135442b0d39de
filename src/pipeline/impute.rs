//! k-nearest-neighbour imputation of missing feature cells
//!
//! Distances between rows use the NaN-aware Euclidean metric: squared
//! differences are summed over coordinates present in both rows and scaled
//! up by `n_features / n_shared`. The full receiver-by-donor distance matrix
//! is computed with four matrix products over value and mask matrices.

use faer::Mat;
use rayon::prelude::*;

use super::error::{PipelineError, PipelineResult};
use super::matrix::FeatureMatrix;
use super::missing::{analyze_missing_values, get_fully_missing_features};
use crate::utils::stage_progress_bar;

/// Default number of neighbours consulted per missing cell.
pub const DEFAULT_NEIGHBORS: usize = 5;

/// Imputation settings.
#[derive(Debug, Clone, Copy)]
pub struct KnnImputer {
    pub n_neighbors: usize,
    pub show_progress: bool,
}

impl Default for KnnImputer {
    fn default() -> Self {
        Self {
            n_neighbors: DEFAULT_NEIGHBORS,
            show_progress: false,
        }
    }
}

/// Result of an imputation pass.
#[derive(Debug, Clone)]
pub struct ImputationOutcome {
    /// Fully populated matrix with the input's shape
    pub matrix: FeatureMatrix,
    /// Number of cells that were filled
    pub imputed_cells: usize,
    /// Columns that had at least one missing cell
    pub imputed_columns: Vec<String>,
}

impl KnnImputer {
    pub fn new(n_neighbors: usize) -> Self {
        Self {
            n_neighbors,
            ..Default::default()
        }
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Fill every missing cell from the `n_neighbors` closest rows that
    /// observe the same feature.
    ///
    /// Rows without missing cells are copied unchanged. When no donor shares
    /// a coordinate with the receiver, the column mean is used instead.
    pub fn impute(&self, matrix: &FeatureMatrix) -> PipelineResult<ImputationOutcome> {
        if self.n_neighbors == 0 {
            return Err(PipelineError::InvariantViolation(
                "imputation needs at least one neighbour".to_string(),
            ));
        }

        let missing_ratios = analyze_missing_values(matrix);
        if let Some(column) = get_fully_missing_features(&missing_ratios).into_iter().next() {
            return Err(PipelineError::Imputation {
                column,
                reason: "no observed values to estimate from".to_string(),
            });
        }

        let receivers: Vec<usize> = (0..matrix.n_rows())
            .filter(|&i| matrix.row(i).iter().any(|v| v.is_nan()))
            .collect();

        if receivers.is_empty() {
            return Ok(ImputationOutcome {
                matrix: matrix.clone(),
                imputed_cells: 0,
                imputed_columns: Vec::new(),
            });
        }

        let imputed_columns: Vec<String> = matrix
            .names()
            .iter()
            .enumerate()
            .filter(|(j, _)| (0..matrix.n_rows()).any(|i| matrix.get(i, *j).is_nan()))
            .map(|(_, name)| name.clone())
            .collect();

        let distances = nan_euclidean_distances(matrix, &receivers);
        let column_means = observed_column_means(matrix);

        let pb = stage_progress_bar(
            self.show_progress,
            receivers.len() as u64,
            "   Imputing rows",
        );

        let fills: Vec<(usize, usize, f64)> = receivers
            .par_iter()
            .enumerate()
            .flat_map_iter(|(k, &row)| {
                let cells = self.fill_row(matrix, &distances, k, row, &column_means);
                pb.inc(1);
                cells
            })
            .collect();

        pb.finish_and_clear();

        let mut values = matrix.values().to_vec();
        let n_cols = matrix.n_cols();
        for &(i, j, v) in &fills {
            values[i * n_cols + j] = v;
        }

        Ok(ImputationOutcome {
            matrix: FeatureMatrix::new(matrix.names().to_vec(), values, matrix.n_rows())?,
            imputed_cells: fills.len(),
            imputed_columns,
        })
    }

    fn fill_row(
        &self,
        matrix: &FeatureMatrix,
        distances: &Mat<f64>,
        receiver_idx: usize,
        row: usize,
        column_means: &[f64],
    ) -> Vec<(usize, usize, f64)> {
        let mut cells = Vec::new();
        for (j, value) in matrix.row(row).iter().enumerate() {
            if !value.is_nan() {
                continue;
            }

            let mut donors: Vec<(f64, usize)> = (0..matrix.n_rows())
                .filter(|&d| d != row && !matrix.get(d, j).is_nan())
                .map(|d| (distances[(receiver_idx, d)], d))
                .filter(|(dist, _)| dist.is_finite())
                .collect();

            let estimate = if donors.is_empty() {
                column_means[j]
            } else {
                donors.sort_by(|a, b| {
                    a.0.partial_cmp(&b.0)
                        .unwrap_or(std::cmp::Ordering::Equal)
                        .then(a.1.cmp(&b.1))
                });
                let k = self.n_neighbors.min(donors.len());
                donors[..k].iter().map(|&(_, d)| matrix.get(d, j)).sum::<f64>() / k as f64
            };

            cells.push((row, j, estimate));
        }
        cells
    }
}

/// Feature-major copy (`n_cols x rows.len()`) of selected rows.
fn feature_major(matrix: &FeatureMatrix, rows: &[usize], f: impl Fn(f64) -> f64) -> Mat<f64> {
    Mat::from_fn(matrix.n_cols(), rows.len(), |j, k| f(matrix.get(rows[k], j)))
}

/// NaN-aware Euclidean distances from each receiver row to every row.
///
/// Entry `(k, d)` is the distance between `receivers[k]` and row `d`, or
/// `NaN` when the two rows share no observed coordinate.
pub(crate) fn nan_euclidean_distances(matrix: &FeatureMatrix, receivers: &[usize]) -> Mat<f64> {
    let all_rows: Vec<usize> = (0..matrix.n_rows()).collect();
    let zeroed = |v: f64| if v.is_nan() { 0.0 } else { v };
    let squared = |v: f64| if v.is_nan() { 0.0 } else { v * v };
    let present = |v: f64| if v.is_nan() { 0.0 } else { 1.0 };

    let x = feature_major(matrix, &all_rows, zeroed);
    let x_sq = feature_major(matrix, &all_rows, squared);
    let x_mask = feature_major(matrix, &all_rows, present);

    let r = feature_major(matrix, receivers, zeroed);
    let r_sq = feature_major(matrix, receivers, squared);
    let r_mask = feature_major(matrix, receivers, present);

    // Sums over coordinates observed in both rows
    let cross = r.transpose() * &x;
    let r_sq_shared = r_sq.transpose() * &x_mask;
    let x_sq_shared = r_mask.transpose() * &x_sq;
    let shared = r_mask.transpose() * &x_mask;

    let n_features = matrix.n_cols() as f64;
    Mat::from_fn(receivers.len(), matrix.n_rows(), |k, d| {
        let n_shared = shared[(k, d)];
        if n_shared <= 0.0 {
            return f64::NAN;
        }
        let sq = (r_sq_shared[(k, d)] + x_sq_shared[(k, d)] - 2.0 * cross[(k, d)]).max(0.0);
        (sq * n_features / n_shared).sqrt()
    })
}

fn observed_column_means(matrix: &FeatureMatrix) -> Vec<f64> {
    (0..matrix.n_cols())
        .map(|j| {
            let (sum, count) = (0..matrix.n_rows())
                .map(|i| matrix.get(i, j))
                .filter(|v| !v.is_nan())
                .fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
            if count == 0 {
                f64::NAN
            } else {
                sum / count as f64
            }
        })
        .collect()
}
