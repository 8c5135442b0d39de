//! Error taxonomy for the scoring pipeline.
//!
//! Every variant is terminal for a run: stages never retry and never
//! attempt partial recovery, they surface the error to the caller.

use thiserror::Error;

/// Errors raised by pipeline stages.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PipelineError {
    /// Input columns are missing, malformed, or disagree in length.
    #[error("data format error: {0}")]
    DataFormat(String),

    /// A missing cell cannot be filled from any neighbour.
    #[error("imputation error in column '{column}': {reason}")]
    Imputation {
        /// Column that could not be imputed
        column: String,
        /// Why imputation was impossible
        reason: String,
    },

    /// A reduction stage left no usable feature columns.
    #[error("insufficient features: {stage} retained zero columns")]
    InsufficientFeatures {
        /// Name of the stage that collapsed the matrix
        stage: String,
    },

    /// A label distribution cannot be split while preserving class proportions.
    #[error("stratification error: {0}")]
    Stratification(String),

    /// An internal numeric invariant was broken (a programming defect).
    #[error("invariant violation: {0}")]
    InvariantViolation(String),
}

/// Result alias used by all pipeline stages.
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;
