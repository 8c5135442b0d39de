//! duoscore: Two-Target Scoring CLI Tool
//!
//! Runs the load, clean, reduce, evaluate and score stages with styled
//! progress output, then writes a JSON report and an SVG accuracy chart.

use std::time::Instant;

use anyhow::Result;
use clap::Parser;
use console::style;

use duoscore::cli::Cli;
use duoscore::pipeline::{
    analyze_missing_values, clean_stage, composite_score, evaluate_stage,
    get_features_with_missing, load_dataset_with_progress, reduce_stage, variance_stage,
    KnnImputer, PipelineOutcome, ReductionReference,
};
use duoscore::report::{build_score_report, export_score_report, AccuracyChart, PipelineSummary};
use duoscore::utils::{
    create_spinner, finish_with_success, print_banner, print_completion, print_config,
    print_count, print_info, print_metric, print_step_header, print_step_time, print_success,
};

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = cli.to_config().with_progress(!cli.parallel_targets);
    config.validate()?;

    let report_path = cli.report_path();
    let chart_path = cli.chart_path();

    print_banner(env!("CARGO_PKG_VERSION"));
    print_config(
        &cli.input,
        &cli.preset.to_string(),
        &config,
        &[report_path.as_path(), chart_path.as_path()],
    );

    // Load dataset
    let step_start = Instant::now();
    let (dataset, rows, cols, memory_mb) =
        load_dataset_with_progress(&cli.input, &config.schema, cli.infer_schema_length)?;

    println!("\n    {} Dataset Statistics:", style("✧").cyan());
    println!("      Rows: {}", rows);
    println!("      Columns: {}", cols);
    println!("      Feature columns: {}", dataset.features.n_cols());
    println!("      Estimated memory: {:.2} MB", memory_mb);

    let mut summary = PipelineSummary::new(dataset.features.n_cols());
    summary.load_time = step_start.elapsed();
    print_step_time(summary.load_time);

    // Step 1: Missing values and imputation
    print_step_header(1, "Missing Values");

    let step_start = Instant::now();
    let missing_ratios = analyze_missing_values(&dataset.features);
    let incomplete = get_features_with_missing(&missing_ratios);
    if incomplete.is_empty() {
        print_info("No missing cells");
    } else {
        print_count(
            "feature(s) with missing cells",
            incomplete.len(),
            Some(&format!("({} cells)", dataset.features.missing_count())),
        );
    }

    let imputer = config
        .imputation
        .map(|k| KnnImputer::new(k).with_progress(true));
    let (cleaned, cleaning) = clean_stage(&dataset.features, imputer)?;
    match &cleaning {
        Some(c) if c.imputed_cells > 0 => {
            summary.set_imputed_cells(c.imputed_cells);
            print_success(&format!(
                "Imputed {} cell(s) in {} column(s)",
                c.imputed_cells,
                c.imputed_columns.len()
            ));
        }
        Some(_) => print_info("Imputation enabled, nothing to fill"),
        None => print_info("Imputation disabled"),
    }
    summary.clean_time = step_start.elapsed();
    print_step_time(summary.clean_time);

    // Step 2: Variance filter
    print_step_header(2, "Variance Filter");

    let step_start = Instant::now();
    let (filtered, variance_dropped) = variance_stage(cleaned, config.variance_threshold)?;
    match config.variance_threshold {
        None => print_info("Variance filter disabled"),
        Some(_) if variance_dropped.is_empty() => {
            print_info("No features below the variance threshold")
        }
        Some(threshold) => {
            print_count(
                "low-variance feature(s)",
                variance_dropped.len(),
                Some(&format!("(<{})", threshold)),
            );
            print_success("Dropped low-variance features");
        }
    }
    summary.add_variance_drops(&variance_dropped);
    let n_features_after_variance = filtered.n_cols();
    println!("      Features remaining: {}", n_features_after_variance);
    summary.variance_time = step_start.elapsed();
    print_step_time(summary.variance_time);

    // Step 3: Importance filter
    print_step_header(3, "Importance Filter");

    let step_start = Instant::now();
    let reductions = reduce_stage(
        &filtered,
        &dataset,
        &config.primary_target,
        &config.secondary_target,
        config.reduction_reference,
        &config.forest,
    )?;
    let shown = match config.reduction_reference {
        ReductionReference::Primary => &reductions[..1],
        ReductionReference::PerTarget => &reductions[..],
    };
    for reduction in shown {
        let filter = &reduction.filter;
        println!(
            "      {} fit on {}: median importance {:.6}",
            style("•").dim(),
            style(&filter.reference_label).cyan(),
            filter.threshold
        );
        print_count(
            "feature(s) below the median",
            filter.n_dropped(),
            Some(&format!("({} kept)", filter.retained.len())),
        );
        for top in filter.top_features(5) {
            println!(
                "        {} {:<20} {:.6}",
                style("›").dim(),
                top.feature,
                top.importance
            );
        }
    }
    for reduction in &reductions {
        summary.add_retained(&reduction.target, reduction.matrix.n_cols());
    }
    print_success("Importance filter applied");
    summary.importance_time = step_start.elapsed();
    print_step_time(summary.importance_time);

    // Step 4: Train and evaluate per target
    print_step_header(4, "Train & Evaluate");

    let step_start = Instant::now();
    let spinner = cli
        .parallel_targets
        .then(|| create_spinner("Evaluating both targets in parallel..."));
    let evaluations = evaluate_stage(
        &reductions,
        &dataset,
        &config.evaluation,
        config.parallel_targets,
    )?;
    if let Some(spinner) = spinner {
        finish_with_success(&spinner, "Evaluation complete");
    }
    for evaluation in &evaluations {
        print_metric(
            &format!(
                "{} accuracy ({} classes, {} test rows)",
                evaluation.target, evaluation.n_classes, evaluation.n_test
            ),
            evaluation.accuracy,
        );
        summary.add_evaluation(evaluation.clone());
    }
    summary.evaluate_time = step_start.elapsed();
    print_step_time(summary.evaluate_time);

    // Step 5: Score and report
    print_step_header(5, "Score & Report");

    let score = composite_score(evaluations[0].accuracy, evaluations[1].accuracy)?;
    summary.set_composite_score(score);
    print_metric("Composite score", score);

    let chart = AccuracyChart::from_evaluations(&evaluations)?;
    chart.display();
    chart.write_svg(&chart_path)?;
    print_success(&format!("Chart saved to {}", chart_path.display()));

    let outcome = PipelineOutcome {
        n_rows: dataset.n_rows(),
        n_features_loaded: dataset.features.n_cols(),
        cleaning,
        variance_dropped,
        n_features_after_variance,
        reductions,
        evaluations,
        composite_score: score,
    };
    let report = build_score_report(
        &outcome,
        &config,
        &cli.input.display().to_string(),
        Some(&cli.preset.to_string()),
        (&summary).into(),
    );
    export_score_report(&report, &report_path)?;
    print_success(&format!("Report saved to {}", report_path.display()));

    summary.display();
    print_completion();

    Ok(())
}
