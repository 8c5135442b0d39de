//! duoscore: two-target classification scoring
//!
//! Loads a tabular dataset with one or two label columns, cleans and reduces
//! its feature matrix (k-NN imputation, variance filter, median-threshold
//! random forest importance filter), evaluates a gradient boosting
//! classifier per target on a stratified split, and multiplies the two
//! accuracies into a composite score.

pub mod cli;
pub mod pipeline;
pub mod report;
pub mod utils;
