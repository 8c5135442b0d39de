//! Gradient-boosted decision trees for classification
//!
//! Binary problems fit one regression tree per round on the log-loss
//! gradient, starting from the log-odds of the positive class. Problems with
//! three or more classes fit one tree per class per round against a softmax.
//! Tree structure comes from squared error on the pseudo-residuals; leaf
//! values are then replaced with a single Newton step.

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::seq::index::sample;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::Serialize;

use super::tree::{grow, SquaredError, Tree, TreeParams};
use super::{argmax, validate_training_data, Classifier};
use crate::pipeline::error::{PipelineError, PipelineResult};
use crate::pipeline::labels::class_counts;
use crate::pipeline::matrix::FeatureMatrix;
use crate::utils::stage_progress_bar;

/// Probabilities are clamped away from 0 and 1 before taking logs.
const PROB_EPSILON: f64 = 1e-15;

/// Newton denominators smaller than this produce a zero step.
const HESSIAN_EPSILON: f64 = 1e-12;

/// Gradient boosting hyper-parameters.
#[derive(Debug, Clone, Serialize)]
pub struct BoostingConfig {
    pub n_estimators: usize,
    pub learning_rate: f64,
    pub max_depth: usize,
    pub min_samples_leaf: usize,
    /// Fraction of rows drawn (without replacement) for each round
    pub subsample: f64,
    pub seed: u64,
    #[serde(skip)]
    pub show_progress: bool,
}

impl Default for BoostingConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            learning_rate: 0.1,
            max_depth: 3,
            min_samples_leaf: 1,
            subsample: 1.0,
            seed: 42,
            show_progress: false,
        }
    }
}

impl BoostingConfig {
    pub fn validate(&self) -> PipelineResult<()> {
        if self.n_estimators == 0 {
            return Err(PipelineError::InvariantViolation(
                "gradient boosting needs at least one estimator".to_string(),
            ));
        }
        if !self.learning_rate.is_finite() || self.learning_rate <= 0.0 {
            return Err(PipelineError::InvariantViolation(format!(
                "learning rate must be positive, got {}",
                self.learning_rate
            )));
        }
        if !(self.subsample > 0.0 && self.subsample <= 1.0) {
            return Err(PipelineError::InvariantViolation(format!(
                "subsample must be in (0, 1], got {}",
                self.subsample
            )));
        }
        Ok(())
    }
}

/// A fitted gradient boosting classifier.
#[derive(Debug, Clone)]
pub struct GradientBoosting {
    n_classes: usize,
    n_features: usize,
    learning_rate: f64,
    /// Raw score each prediction starts from: one entry for binary
    /// problems, one per class otherwise.
    initial: Vec<f64>,
    /// Trees per round, each round holding `initial.len()` trees.
    rounds: Vec<Vec<Tree<f64>>>,
    importances: Vec<f64>,
}

impl GradientBoosting {
    /// Fit on `labels` (class indices `0..n_classes`).
    ///
    /// A single-class problem fits no trees and always predicts class 0.
    pub fn fit(
        matrix: &FeatureMatrix,
        labels: &[usize],
        n_classes: usize,
        config: &BoostingConfig,
    ) -> PipelineResult<Self> {
        validate_training_data(matrix, labels, n_classes, "gradient boosting")?;
        config.validate()?;

        let n_rows = matrix.n_rows();
        let n_features = matrix.n_cols();
        let priors: Vec<f64> = class_counts(labels, n_classes)
            .into_iter()
            .map(|c| (c as f64 / n_rows as f64).clamp(PROB_EPSILON, 1.0 - PROB_EPSILON))
            .collect();

        let initial = match n_classes {
            1 => vec![0.0],
            2 => vec![(priors[1] / priors[0]).ln()],
            _ => priors.iter().map(|p| p.ln()).collect(),
        };

        let mut model = Self {
            n_classes,
            n_features,
            learning_rate: config.learning_rate,
            initial,
            rounds: Vec::new(),
            importances: vec![0.0; n_features],
        };

        if n_classes == 1 {
            return Ok(model);
        }

        let n_outputs = model.initial.len();
        let mut raw: Vec<Vec<f64>> = vec![model.initial.clone(); n_rows];
        let params = TreeParams {
            max_depth: Some(config.max_depth),
            min_samples_split: 2,
            min_samples_leaf: config.min_samples_leaf,
            max_features: None,
        };
        let sample_size = ((config.subsample * n_rows as f64).round() as usize).clamp(1, n_rows);
        let mut rng = StdRng::seed_from_u64(config.seed);

        let pb = stage_progress_bar(
            config.show_progress,
            config.n_estimators as u64,
            "   Boosting rounds",
        );

        for _ in 0..config.n_estimators {
            let rows: Vec<usize> = if sample_size < n_rows {
                let mut drawn = sample(&mut rng, n_rows, sample_size).into_vec();
                drawn.sort_unstable();
                drawn
            } else {
                (0..n_rows).collect()
            };
            let tree_seeds: Vec<u64> = (0..n_outputs).map(|_| rng.gen()).collect();

            let probs: Vec<Vec<f64>> = raw.iter().map(|f| output_probabilities(f)).collect();

            let round: Vec<Tree<f64>> = tree_seeds
                .par_iter()
                .enumerate()
                .map(|(k, &seed)| {
                    fit_output_tree(matrix, labels, &probs, &rows, k, n_outputs, &params, seed)
                })
                .collect();

            for (i, scores) in raw.iter_mut().enumerate() {
                let row = matrix.row(i);
                for (score, tree) in scores.iter_mut().zip(&round) {
                    *score += config.learning_rate * tree.predict_leaf(row);
                }
            }

            model.rounds.push(round);
            pb.inc(1);
        }

        pb.finish_and_clear();

        model.importances = summed_importance(&model.rounds, n_features);
        Ok(model)
    }

    /// Raw additive scores for one row.
    fn decision_function(&self, row: &[f64]) -> Vec<f64> {
        let mut scores = self.initial.clone();
        for round in &self.rounds {
            for (score, tree) in scores.iter_mut().zip(round) {
                *score += self.learning_rate * tree.predict_leaf(row);
            }
        }
        scores
    }

    /// Class probabilities for one row.
    pub fn predict_proba(&self, row: &[f64]) -> Vec<f64> {
        match self.n_classes {
            1 => vec![1.0],
            _ => output_probabilities(&self.decision_function(row)),
        }
    }

    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn n_trees(&self) -> usize {
        self.rounds.iter().map(Vec::len).sum()
    }
}

impl Classifier for GradientBoosting {
    fn predict_row(&self, row: &[f64]) -> usize {
        argmax(&self.predict_proba(row))
    }

    fn feature_importances(&self) -> Vec<f64> {
        self.importances.clone()
    }
}

/// Map raw scores to class probabilities: sigmoid for a single binary
/// score, softmax otherwise.
fn output_probabilities(scores: &[f64]) -> Vec<f64> {
    if scores.len() == 1 {
        let p = 1.0 / (1.0 + (-scores[0]).exp());
        return vec![1.0 - p, p];
    }
    let max = scores.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = scores.iter().map(|s| (s - max).exp()).collect();
    let total: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / total).collect()
}

/// Fit the tree for output `k` of one round and set its Newton leaf values.
#[allow(clippy::too_many_arguments)]
fn fit_output_tree(
    matrix: &FeatureMatrix,
    labels: &[usize],
    probs: &[Vec<f64>],
    rows: &[usize],
    k: usize,
    n_outputs: usize,
    params: &TreeParams,
    seed: u64,
) -> Tree<f64> {
    // Binary problems model the positive class, index 1.
    let class = if n_outputs == 1 { 1 } else { k };
    let residuals: Vec<f64> = labels
        .iter()
        .zip(probs)
        .map(|(&y, p)| {
            let target = if y == class { 1.0 } else { 0.0 };
            target - p[class]
        })
        .collect();

    let criterion = SquaredError {
        targets: &residuals,
    };
    let mut rng = StdRng::seed_from_u64(seed);
    let mut tree = grow(matrix, &criterion, rows.to_vec(), params, &mut rng);

    let mut sums: HashMap<usize, (f64, f64)> = HashMap::new();
    for &i in rows {
        let r = residuals[i];
        let hessian = if n_outputs == 1 {
            let p = probs[i][1];
            p * (1.0 - p)
        } else {
            r.abs() * (1.0 - r.abs())
        };
        let entry = sums.entry(tree.leaf_index(matrix.row(i))).or_insert((0.0, 0.0));
        entry.0 += r;
        entry.1 += hessian;
    }

    let scale = if n_outputs == 1 {
        1.0
    } else {
        (n_outputs as f64 - 1.0) / n_outputs as f64
    };
    for (leaf, (numerator, denominator)) in sums {
        let value = if denominator.abs() < HESSIAN_EPSILON {
            0.0
        } else {
            scale * numerator / denominator
        };
        tree.set_leaf_value(leaf, value);
    }

    tree
}

/// Per-tree normalized impurity decrease, summed over all trees and renormalized.
fn summed_importance(rounds: &[Vec<Tree<f64>>], n_features: usize) -> Vec<f64> {
    let mut importance = vec![0.0; n_features];
    for tree in rounds.iter().flatten() {
        let per_tree = tree.impurity_decrease_by_feature(n_features);
        let total: f64 = per_tree.iter().sum();
        if total > 0.0 {
            for (acc, v) in importance.iter_mut().zip(per_tree) {
                *acc += v / total;
            }
        }
    }
    let total: f64 = importance.iter().sum();
    if total > 0.0 {
        importance.iter_mut().for_each(|v| *v /= total);
    }
    importance
}
