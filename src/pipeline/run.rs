//! Stage composition
//!
//! Each stage takes the previous stage's matrix by reference and returns a
//! new one. `run_pipeline` chains them silently; the binary calls the stage
//! functions one by one so it can report between them.

use std::sync::Arc;

use serde::Serialize;

use super::config::{PipelineConfig, ReductionReference};
use super::ensemble::ForestConfig;
use super::error::PipelineResult;
use super::evaluate::{evaluate_target, EvaluationConfig, TargetEvaluation};
use super::importance::ImportanceFilter;
use super::impute::KnnImputer;
use super::loader::Dataset;
use super::matrix::FeatureMatrix;
use super::score::composite_score;
use super::variance::apply_variance_filter;

/// Cleaning stage result.
#[derive(Debug, Clone, Serialize)]
pub struct CleaningSummary {
    pub missing_cells: usize,
    pub imputed_cells: usize,
    pub imputed_columns: Vec<String>,
}

/// The reduced matrix a target is evaluated on, and the filter that made it.
#[derive(Debug, Clone)]
pub struct TargetReduction {
    pub target: String,
    pub filter: Arc<ImportanceFilter>,
    pub matrix: Arc<FeatureMatrix>,
}

/// Everything a run produced.
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub n_rows: usize,
    pub n_features_loaded: usize,
    pub cleaning: Option<CleaningSummary>,
    pub variance_dropped: Vec<String>,
    pub n_features_after_variance: usize,
    pub reductions: [TargetReduction; 2],
    pub evaluations: [TargetEvaluation; 2],
    pub composite_score: f64,
}

/// Fill missing cells when `imputer` is set; otherwise pass the matrix through.
pub fn clean_stage(
    matrix: &FeatureMatrix,
    imputer: Option<KnnImputer>,
) -> PipelineResult<(FeatureMatrix, Option<CleaningSummary>)> {
    let Some(imputer) = imputer else {
        return Ok((matrix.clone(), None));
    };
    let missing_cells = matrix.missing_count();
    let outcome = imputer.impute(matrix)?;
    let summary = CleaningSummary {
        missing_cells,
        imputed_cells: outcome.imputed_cells,
        imputed_columns: outcome.imputed_columns,
    };
    Ok((outcome.matrix, Some(summary)))
}

/// Apply the variance filter when a threshold is set.
pub fn variance_stage(
    matrix: FeatureMatrix,
    threshold: Option<f64>,
) -> PipelineResult<(FeatureMatrix, Vec<String>)> {
    match threshold {
        Some(t) => apply_variance_filter(&matrix, t),
        None => Ok((matrix, Vec::new())),
    }
}

/// Fit importance filters and build the matrix each target is evaluated on.
///
/// Under [`ReductionReference::Primary`] one filter is fit on the primary
/// target and both reductions share it and its output matrix.
pub fn reduce_stage(
    matrix: &FeatureMatrix,
    dataset: &Dataset,
    primary_target: &str,
    secondary_target: &str,
    reference: ReductionReference,
    forest: &ForestConfig,
) -> PipelineResult<[TargetReduction; 2]> {
    let fit = |target: &str| -> PipelineResult<TargetReduction> {
        let filter = ImportanceFilter::fit(matrix, dataset.label(target)?, forest)?;
        let reduced = filter.transform(matrix)?;
        Ok(TargetReduction {
            target: target.to_string(),
            filter: Arc::new(filter),
            matrix: Arc::new(reduced),
        })
    };

    let primary = fit(primary_target)?;
    let secondary = match reference {
        ReductionReference::Primary => TargetReduction {
            target: secondary_target.to_string(),
            filter: Arc::clone(&primary.filter),
            matrix: Arc::clone(&primary.matrix),
        },
        ReductionReference::PerTarget => fit(secondary_target)?,
    };
    Ok([primary, secondary])
}

/// Evaluate both targets on their reduced matrices, optionally side by side.
pub fn evaluate_stage(
    reductions: &[TargetReduction; 2],
    dataset: &Dataset,
    config: &EvaluationConfig,
    parallel: bool,
) -> PipelineResult<[TargetEvaluation; 2]> {
    let run = |reduction: &TargetReduction| -> PipelineResult<TargetEvaluation> {
        evaluate_target(&reduction.matrix, dataset.label(&reduction.target)?, config)
    };

    let (first, second) = if parallel {
        rayon::join(|| run(&reductions[0]), || run(&reductions[1]))
    } else {
        (run(&reductions[0]), run(&reductions[1]))
    };
    Ok([first?, second?])
}

/// Run every stage on a loaded dataset.
pub fn run_pipeline(dataset: &Dataset, config: &PipelineConfig) -> PipelineResult<PipelineOutcome> {
    config.validate()?;

    let imputer = config.imputation.map(KnnImputer::new);
    let (cleaned, cleaning) = clean_stage(&dataset.features, imputer)?;
    let (filtered, variance_dropped) = variance_stage(cleaned, config.variance_threshold)?;
    let n_features_after_variance = filtered.n_cols();

    let reductions = reduce_stage(
        &filtered,
        dataset,
        &config.primary_target,
        &config.secondary_target,
        config.reduction_reference,
        &config.forest,
    )?;
    let evaluations = evaluate_stage(
        &reductions,
        dataset,
        &config.evaluation,
        config.parallel_targets,
    )?;
    let composite_score = composite_score(evaluations[0].accuracy, evaluations[1].accuracy)?;

    Ok(PipelineOutcome {
        n_rows: dataset.n_rows(),
        n_features_loaded: dataset.features.n_cols(),
        cleaning,
        variance_dropped,
        n_features_after_variance,
        reductions,
        evaluations,
        composite_score,
    })
}
