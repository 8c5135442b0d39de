//! JSON export of a scoring run

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;

use crate::pipeline::{
    CleaningSummary, ImportanceFilter, PipelineConfig, PipelineOutcome, TargetEvaluation,
};

use super::summary::PipelineSummary;

/// Metadata about the run
#[derive(Debug, Clone, Serialize)]
pub struct ReportMetadata {
    /// Timestamp of the run (ISO 8601 format)
    pub timestamp: String,
    pub duoscore_version: String,
    pub input_file: String,
    /// Preset the configuration started from, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preset: Option<String>,
    pub config: PipelineConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct DatasetShape {
    pub rows: usize,
    pub features: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct VarianceSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,
    pub dropped: Vec<String>,
    pub features_after: usize,
}

/// One fitted importance filter and the targets evaluated on its output
#[derive(Debug, Clone, Serialize)]
pub struct ImportanceSection {
    pub applied_to: Vec<String>,
    #[serde(flatten)]
    pub filter: ImportanceFilter,
}

/// Timing information in milliseconds
#[derive(Debug, Clone, Default, Serialize)]
pub struct TimingInfo {
    pub load_ms: u64,
    pub clean_ms: u64,
    pub variance_ms: u64,
    pub importance_ms: u64,
    pub evaluate_ms: u64,
    pub total_ms: u64,
}

impl From<&PipelineSummary> for TimingInfo {
    fn from(summary: &PipelineSummary) -> Self {
        Self {
            load_ms: summary.load_time.as_millis() as u64,
            clean_ms: summary.clean_time.as_millis() as u64,
            variance_ms: summary.variance_time.as_millis() as u64,
            importance_ms: summary.importance_time.as_millis() as u64,
            evaluate_ms: summary.evaluate_time.as_millis() as u64,
            total_ms: summary.total_time().as_millis() as u64,
        }
    }
}

/// Complete run report
#[derive(Debug, Clone, Serialize)]
pub struct ScoreReport {
    pub metadata: ReportMetadata,
    pub dataset: DatasetShape,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cleaning: Option<CleaningSummary>,
    pub variance: VarianceSection,
    pub importance: Vec<ImportanceSection>,
    pub evaluations: Vec<TargetEvaluation>,
    pub composite_score: f64,
    pub timing: TimingInfo,
}

/// Assemble the report for a finished run.
///
/// Filters shared between targets appear once, listing every target they
/// were applied to.
pub fn build_score_report(
    outcome: &PipelineOutcome,
    config: &PipelineConfig,
    input_file: &str,
    preset: Option<&str>,
    timing: TimingInfo,
) -> ScoreReport {
    let mut importance: Vec<(Arc<ImportanceFilter>, Vec<String>)> = Vec::new();
    for reduction in &outcome.reductions {
        match importance
            .iter_mut()
            .find(|(filter, _)| Arc::ptr_eq(filter, &reduction.filter))
        {
            Some((_, targets)) => targets.push(reduction.target.clone()),
            None => importance.push((Arc::clone(&reduction.filter), vec![reduction.target.clone()])),
        }
    }

    ScoreReport {
        metadata: ReportMetadata {
            timestamp: Utc::now().to_rfc3339(),
            duoscore_version: env!("CARGO_PKG_VERSION").to_string(),
            input_file: input_file.to_string(),
            preset: preset.map(|p| p.to_string()),
            config: config.clone(),
        },
        dataset: DatasetShape {
            rows: outcome.n_rows,
            features: outcome.n_features_loaded,
        },
        cleaning: outcome.cleaning.clone(),
        variance: VarianceSection {
            threshold: config.variance_threshold,
            dropped: outcome.variance_dropped.clone(),
            features_after: outcome.n_features_after_variance,
        },
        importance: importance
            .into_iter()
            .map(|(filter, applied_to)| ImportanceSection {
                applied_to,
                filter: (*filter).clone(),
            })
            .collect(),
        evaluations: outcome.evaluations.to_vec(),
        composite_score: outcome.composite_score,
        timing,
    }
}

/// Export the run report to a JSON file
pub fn export_score_report(report: &ScoreReport, output_path: &Path) -> Result<()> {
    let json =
        serde_json::to_string_pretty(report).context("Failed to serialize score report to JSON")?;

    std::fs::write(output_path, json)
        .with_context(|| format!("Failed to write score report to {}", output_path.display()))?;

    Ok(())
}
