//! Tests for CLI argument parsing and the end-to-end binary

use assert_cmd::Command;
use clap::Parser;
use duoscore::cli::Cli;
use duoscore::pipeline::{FeatureColumns, Preset, ReductionReference};
use predicates::prelude::*;
use std::path::PathBuf;

#[path = "common/mod.rs"]
mod common;

#[test]
fn test_cli_default_values() {
    let cli = Cli::parse_from(["duoscore", "-i", "data.csv"]);

    assert_eq!(cli.preset, Preset::Sensor, "Default preset should be sensor");
    assert_eq!(cli.test_size, 0.3, "Default test size should be 0.3");
    assert_eq!(cli.seed, 42, "Default seed should be 42");
    assert!(!cli.parallel_targets);
    assert!(!cli.no_impute);
    assert!(!cli.no_variance_filter);
    assert_eq!(
        cli.infer_schema_length, 10000,
        "Default schema inference should be 10000"
    );
}

#[test]
fn test_cli_sensor_config() {
    let config = Cli::parse_from(["duoscore", "-i", "touch.csv"]).to_config();

    assert_eq!(config.primary_target, "user_id");
    assert_eq!(config.secondary_target, "touch_type");
    assert_eq!(config.schema.features.len(), 3200);
    assert_eq!(config.variance_threshold, Some(0.01));
    assert_eq!(config.imputation, None);
    assert_eq!(config.evaluation.boosting.n_estimators, 100);
    assert!(config.validate().is_ok());
}

#[test]
fn test_cli_eeg_config() {
    let config = Cli::parse_from(["duoscore", "-i", "eeg.parquet", "--preset", "eeg"]).to_config();

    assert_eq!(config.primary_target, "PEGI");
    assert_eq!(config.secondary_target, "ESRB");
    assert_eq!(config.schema.features.len(), 2268);
    assert_eq!(config.imputation, Some(5));
    assert_eq!(config.variance_threshold, None);
    assert_eq!(config.evaluation.boosting.n_estimators, 50);
}

#[test]
fn test_cli_overrides() {
    let cli = Cli::parse_from([
        "duoscore",
        "-i",
        "data.csv",
        "--feature-start",
        "10",
        "--feature-count",
        "40",
        "--label-columns",
        "genre,rating",
        "--variance-threshold",
        "0.5",
        "--impute-neighbors",
        "3",
        "--reduction-reference",
        "per-target",
        "--forest-trees",
        "25",
        "--estimators",
        "60",
        "--learning-rate",
        "0.05",
        "--max-depth",
        "4",
        "--test-size",
        "0.25",
        "--seed",
        "7",
        "--parallel-targets",
    ]);
    let config = cli.to_config();

    assert_eq!(
        config.schema.features,
        FeatureColumns::Numbered { start: 10, count: 40 }
    );
    assert_eq!(config.primary_target, "genre");
    assert_eq!(config.secondary_target, "rating");
    assert_eq!(config.variance_threshold, Some(0.5));
    assert_eq!(config.imputation, Some(3));
    assert_eq!(config.reduction_reference, ReductionReference::PerTarget);
    assert_eq!(config.forest.n_trees, 25);
    assert_eq!(config.forest.seed, 7);
    assert_eq!(config.evaluation.boosting.n_estimators, 60);
    assert_eq!(config.evaluation.boosting.learning_rate, 0.05);
    assert_eq!(config.evaluation.boosting.max_depth, 4);
    assert_eq!(config.evaluation.test_fraction, 0.25);
    assert_eq!(config.evaluation.split_seed, 7);
    assert!(config.parallel_targets);
}

#[test]
fn test_cli_named_features_and_disabled_stages() {
    let cli = Cli::parse_from([
        "duoscore",
        "-i",
        "data.csv",
        "--preset",
        "eeg",
        "--feature-columns",
        "alpha,beta,gamma",
        "--no-impute",
        "--no-variance-filter",
    ]);
    let config = cli.to_config();

    assert_eq!(
        config.schema.features,
        FeatureColumns::Named(vec!["alpha".into(), "beta".into(), "gamma".into()])
    );
    assert_eq!(config.imputation, None);
    assert_eq!(config.variance_threshold, None);
}

#[test]
fn test_cli_single_label_column_is_used_twice() {
    let config =
        Cli::parse_from(["duoscore", "-i", "data.csv", "--label-columns", "genre"]).to_config();
    assert_eq!(config.primary_target, "genre");
    assert_eq!(config.secondary_target, "genre");
    assert!(config.validate().is_ok());
}

#[test]
fn test_cli_rejects_invalid_values() {
    assert!(Cli::try_parse_from(["duoscore", "-i", "d.csv", "--test-size", "1.5"]).is_err());
    assert!(Cli::try_parse_from(["duoscore", "-i", "d.csv", "--preset", "audio"]).is_err());
    assert!(Cli::try_parse_from(["duoscore", "-i", "d.csv", "--forest-trees", "0"]).is_err());
    assert!(Cli::try_parse_from([
        "duoscore",
        "-i",
        "d.csv",
        "--no-impute",
        "--impute-neighbors",
        "4"
    ])
    .is_err());
    assert!(Cli::try_parse_from(["duoscore"]).is_err());
}

#[test]
fn test_cli_output_paths() {
    let cli = Cli::parse_from(["duoscore", "-i", "/path/to/touch.parquet"]);
    assert_eq!(cli.report_path(), PathBuf::from("/path/to/touch_scores.json"));
    assert_eq!(cli.chart_path(), PathBuf::from("/path/to/touch_accuracy.svg"));

    let cli = Cli::parse_from([
        "duoscore",
        "-i",
        "touch.csv",
        "--report",
        "out/report.json",
        "--chart",
        "out/chart.svg",
    ]);
    assert_eq!(cli.report_path(), PathBuf::from("out/report.json"));
    assert_eq!(cli.chart_path(), PathBuf::from("out/chart.svg"));
}

#[test]
fn test_binary_fails_on_missing_input() {
    Command::cargo_bin("duoscore")
        .unwrap()
        .args(["-i", "/nonexistent/touch.csv"])
        .assert()
        .failure();
}

#[test]
fn test_binary_full_run() {
    let mut df = common::create_labelled_dataframe(60, 6, 3);
    let (temp_dir, csv_path) = common::create_temp_csv(&mut df);
    let report = temp_dir.path().join("report.json");
    let chart = temp_dir.path().join("chart.svg");

    Command::cargo_bin("duoscore")
        .unwrap()
        .arg("-i")
        .arg(&csv_path)
        .args(["--feature-count", "6", "--forest-trees", "10", "--estimators", "10"])
        .arg("--report")
        .arg(&report)
        .arg("--chart")
        .arg(&chart)
        .assert()
        .success()
        .stdout(predicate::str::contains("Composite Score"));

    assert!(report.exists());
    assert!(std::fs::read_to_string(&chart).unwrap().contains("<svg"));

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&report).unwrap()).unwrap();
    let score = json["composite_score"].as_f64().unwrap();
    assert!((0.0..=1.0).contains(&score));
}
