//! Shared test utilities and fixture generators
#![allow(dead_code)]

use duoscore::pipeline::{Dataset, FeatureMatrix, LabelVector};
use polars::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::PathBuf;
use tempfile::TempDir;

/// Numbered column names `"0"`, `"1"`, ... as used by the presets
pub fn numbered_names(count: usize) -> Vec<String> {
    (0..count).map(|i| i.to_string()).collect()
}

/// Rows of `n_classes` classes, `per_class` rows each.
///
/// The first `informative` features are centred on the class index times
/// five, the rest are uniform noise in [0, 1). Labels are `"c0"`, `"c1"`, ...
pub fn class_blobs(
    per_class: usize,
    n_classes: usize,
    n_features: usize,
    informative: usize,
    seed: u64,
) -> (Vec<Vec<f64>>, Vec<String>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut rows = Vec::new();
    let mut labels = Vec::new();
    for class in 0..n_classes {
        for _ in 0..per_class {
            let row: Vec<f64> = (0..n_features)
                .map(|j| {
                    if j < informative {
                        class as f64 * 5.0 + rng.gen_range(-1.0..1.0)
                    } else {
                        rng.gen::<f64>()
                    }
                })
                .collect();
            rows.push(row);
            labels.push(format!("c{}", class));
        }
    }
    (rows, labels)
}

/// Scenario A: 100 rows, 20 numbered features, column `"19"` constant.
///
/// `label_a` is a 2-class label driven by features 0-2; `label_b` is a
/// 3-class label driven by features 3-5.
pub fn scenario_a_dataset() -> Dataset {
    let mut rng = StdRng::seed_from_u64(7);
    let n = 100;
    let mut rows = Vec::with_capacity(n);
    let mut label_a = Vec::with_capacity(n);
    let mut label_b = Vec::with_capacity(n);
    for i in 0..n {
        let a = i % 2;
        let b = i % 3;
        let row: Vec<f64> = (0..20)
            .map(|j| match j {
                0..=2 => a as f64 * 4.0 + rng.gen_range(-1.0..1.0),
                3..=5 => b as f64 * 4.0 + rng.gen_range(-1.0..1.0),
                19 => 1.0,
                _ => rng.gen::<f64>() * 3.0,
            })
            .collect();
        rows.push(row);
        label_a.push(if a == 0 { "no" } else { "yes" }.to_string());
        label_b.push(b.to_string());
    }

    Dataset {
        features: FeatureMatrix::from_rows(numbered_names(20), &rows).unwrap(),
        labels: vec![
            LabelVector::new("label_a", label_a),
            LabelVector::new("label_b", label_b),
        ],
    }
}

/// Scenario B: 50 rows, 6 features, column `"2"` missing in every fifth row.
pub fn scenario_b_matrix() -> FeatureMatrix {
    let mut rng = StdRng::seed_from_u64(11);
    let rows: Vec<Vec<f64>> = (0..50)
        .map(|i| {
            (0..6)
                .map(|j| {
                    if j == 2 && i % 5 == 0 {
                        f64::NAN
                    } else {
                        (i as f64 / 10.0) + rng.gen_range(0.0..1.0) * (j + 1) as f64
                    }
                })
                .collect()
        })
        .collect();
    FeatureMatrix::from_rows(numbered_names(6), &rows).unwrap()
}

/// A small table in the sensor layout (numbered features plus two labels).
pub fn create_labelled_dataframe(rows: usize, n_features: usize, seed: u64) -> DataFrame {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut columns: Vec<Column> = Vec::with_capacity(n_features + 2);

    let user: Vec<String> = (0..rows).map(|i| format!("u{}", i % 2)).collect();
    let touch: Vec<i64> = (0..rows).map(|i| (i % 3) as i64).collect();

    for j in 0..n_features {
        let values: Vec<f64> = (0..rows)
            .map(|i| match j {
                0 => (i % 2) as f64 * 3.0 + rng.gen_range(-0.5..0.5),
                1 => (i % 3) as f64 * 3.0 + rng.gen_range(-0.5..0.5),
                _ => rng.gen::<f64>(),
            })
            .collect();
        columns.push(Column::new(j.to_string().into(), values));
    }
    columns.push(Column::new("user_id".into(), user));
    columns.push(Column::new("touch_type".into(), touch));

    DataFrame::new(columns).unwrap()
}

/// Create a temporary directory with a test CSV file
pub fn create_temp_csv(df: &mut DataFrame) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let csv_path = temp_dir.path().join("test_data.csv");

    let mut file = std::fs::File::create(&csv_path).unwrap();
    CsvWriter::new(&mut file).finish(df).unwrap();

    (temp_dir, csv_path)
}

/// Create a temporary directory with a test Parquet file
pub fn create_temp_parquet(df: &mut DataFrame) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let parquet_path = temp_dir.path().join("test_data.parquet");

    let file = std::fs::File::create(&parquet_path).unwrap();
    ParquetWriter::new(file).finish(df).unwrap();

    (temp_dir, parquet_path)
}

/// Assert that two floats agree within `tol`
pub fn assert_close(actual: f64, expected: f64, tol: f64) {
    assert!(
        (actual - expected).abs() <= tol,
        "expected {} within {}, got {}",
        expected,
        tol,
        actual
    );
}
