//! Random forest classifier
//!
//! Bagged, fully grown Gini trees with per-node feature subsampling. The
//! forest exists mainly for its mean-decrease-in-impurity importances, which
//! drive the median-threshold feature filter.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::Serialize;

use super::tree::{grow, Gini, Tree, TreeParams};
use super::{argmax, validate_training_data, Classifier};
use crate::pipeline::error::{PipelineError, PipelineResult};
use crate::pipeline::matrix::FeatureMatrix;
use crate::utils::stage_progress_bar;

/// How many features each node may consider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MaxFeatures {
    /// `ceil(sqrt(n_features))`, at least 1
    Sqrt,
    /// `ceil(log2(n_features))`, at least 1
    Log2,
    /// Every feature
    All,
    /// A fixed count, capped at `n_features`
    Count(usize),
}

impl MaxFeatures {
    pub fn resolve(&self, n_features: usize) -> usize {
        let k = match self {
            MaxFeatures::Sqrt => (n_features as f64).sqrt().ceil() as usize,
            MaxFeatures::Log2 => (n_features as f64).log2().ceil() as usize,
            MaxFeatures::All => n_features,
            MaxFeatures::Count(k) => *k,
        };
        k.clamp(1, n_features.max(1))
    }
}

/// Random forest hyper-parameters.
#[derive(Debug, Clone, Serialize)]
pub struct ForestConfig {
    pub n_trees: usize,
    pub max_depth: Option<usize>,
    pub min_samples_leaf: usize,
    pub max_features: MaxFeatures,
    pub bootstrap: bool,
    pub seed: u64,
    #[serde(skip)]
    pub show_progress: bool,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: None,
            min_samples_leaf: 1,
            max_features: MaxFeatures::Sqrt,
            bootstrap: true,
            seed: 42,
            show_progress: false,
        }
    }
}

/// A fitted random forest.
#[derive(Debug, Clone)]
pub struct RandomForest {
    trees: Vec<Tree<Vec<f64>>>,
    n_features: usize,
    n_classes: usize,
    importances: Vec<f64>,
}

impl RandomForest {
    /// Fit a forest on `labels` (class indices `0..n_classes`).
    ///
    /// Each tree draws its own seed from `config.seed` before fitting, so
    /// the result is identical however the trees are scheduled.
    pub fn fit(
        matrix: &FeatureMatrix,
        labels: &[usize],
        n_classes: usize,
        config: &ForestConfig,
    ) -> PipelineResult<Self> {
        validate_training_data(matrix, labels, n_classes, "random forest")?;
        if config.n_trees == 0 {
            return Err(PipelineError::InvariantViolation(
                "random forest needs at least one tree".to_string(),
            ));
        }

        let n_rows = matrix.n_rows();
        let n_features = matrix.n_cols();
        let params = TreeParams {
            max_depth: config.max_depth,
            min_samples_split: 2,
            min_samples_leaf: config.min_samples_leaf,
            max_features: Some(config.max_features.resolve(n_features)),
        };
        let criterion = Gini { labels, n_classes };

        let mut seeder = StdRng::seed_from_u64(config.seed);
        let tree_seeds: Vec<u64> = (0..config.n_trees).map(|_| seeder.gen()).collect();

        let pb = stage_progress_bar(
            config.show_progress,
            config.n_trees as u64,
            "   Fitting trees",
        );

        let trees: Vec<Tree<Vec<f64>>> = tree_seeds
            .par_iter()
            .map(|&seed| {
                let mut rng = StdRng::seed_from_u64(seed);
                let rows: Vec<usize> = if config.bootstrap {
                    (0..n_rows).map(|_| rng.gen_range(0..n_rows)).collect()
                } else {
                    (0..n_rows).collect()
                };
                let tree = grow(matrix, &criterion, rows, &params, &mut rng);
                pb.inc(1);
                tree
            })
            .collect();

        pb.finish_and_clear();

        let importances = mean_normalized_importance(&trees, n_features);

        Ok(Self {
            trees,
            n_features,
            n_classes,
            importances,
        })
    }

    /// Class probabilities averaged over all trees.
    pub fn predict_proba(&self, row: &[f64]) -> Vec<f64> {
        let mut probs = vec![0.0; self.n_classes];
        for tree in &self.trees {
            for (p, leaf_p) in probs.iter_mut().zip(tree.predict_leaf(row)) {
                *p += leaf_p;
            }
        }
        let n = self.trees.len() as f64;
        probs.iter_mut().for_each(|p| *p /= n);
        probs
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }
}

impl Classifier for RandomForest {
    fn predict_row(&self, row: &[f64]) -> usize {
        argmax(&self.predict_proba(row))
    }

    fn feature_importances(&self) -> Vec<f64> {
        self.importances.clone()
    }
}

/// Per-tree normalized impurity decrease, averaged and renormalized.
fn mean_normalized_importance(trees: &[Tree<Vec<f64>>], n_features: usize) -> Vec<f64> {
    let mut importance = vec![0.0; n_features];
    for tree in trees {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_features_resolution() {
        assert_eq!(MaxFeatures::Sqrt.resolve(3200), 57);
        assert_eq!(MaxFeatures::Sqrt.resolve(1), 1);
        assert_eq!(MaxFeatures::Log2.resolve(8), 3);
        assert_eq!(MaxFeatures::All.resolve(20), 20);
        assert_eq!(MaxFeatures::Count(50).resolve(20), 20);
        assert_eq!(MaxFeatures::Count(0).resolve(20), 1);
    }

    #[test]
    fn test_rejects_out_of_range_labels() {
        let m = FeatureMatrix::from_rows(vec!["a".into()], &[vec![1.0], vec![2.0]]).unwrap();
        let result = RandomForest::fit(&m, &[0, 2], 2, &ForestConfig::default());
        assert!(matches!(result, Err(PipelineError::InvariantViolation(_))));
    }
}
