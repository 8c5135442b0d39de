//! CART decision trees
//!
//! One builder serves both ensembles: the random forest grows Gini
//! classification trees, gradient boosting grows squared-error regression
//! trees on pseudo-residuals. Trees are grown iteratively with an explicit
//! work stack so fully grown trees never exhaust a worker thread's stack.

use rand::rngs::StdRng;
use rand::seq::index::sample;
use rayon::prelude::*;

use crate::pipeline::matrix::FeatureMatrix;

/// Impurity below which a node is considered pure
const PURE_EPSILON: f64 = 1e-12;

/// Two feature values closer than this are treated as equal
const VALUE_EPSILON: f64 = 1e-12;

/// Growth limits shared by all tree kinds.
#[derive(Debug, Clone, Copy)]
pub struct TreeParams {
    /// `None` grows until leaves are pure or too small to split.
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Features drawn per node; `None` considers every feature.
    pub max_features: Option<usize>,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) enum TreeNode<L> {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
        /// `n * impurity(node) - n_left * impurity(left) - n_right * impurity(right)`
        impurity_decrease: f64,
    },
    Leaf {
        value: L,
    },
}

/// A fitted binary tree whose leaves carry `L`.
#[derive(Debug, Clone)]
pub struct Tree<L> {
    nodes: Vec<TreeNode<L>>,
}

impl<L> Tree<L> {
    /// Index of the leaf node a sample routes to.
    pub(crate) fn leaf_index(&self, row: &[f64]) -> usize {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                TreeNode::Leaf { .. } => return idx,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    ..
                } => {
                    idx = if row[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }

    pub fn predict_leaf(&self, row: &[f64]) -> &L {
        match &self.nodes[self.leaf_index(row)] {
            TreeNode::Leaf { value } => value,
            TreeNode::Split { .. } => unreachable!("leaf_index always stops at a leaf"),
        }
    }

    /// Overwrite the value of the leaf at `idx`.
    pub(crate) fn set_leaf_value(&mut self, idx: usize, new_value: L) {
        if let TreeNode::Leaf { value } = &mut self.nodes[idx] {
            *value = new_value;
        }
    }

    /// Summed impurity decrease per feature, not normalized.
    pub fn impurity_decrease_by_feature(&self, n_features: usize) -> Vec<f64> {
        let mut totals = vec![0.0; n_features];
        for node in &self.nodes {
            if let TreeNode::Split {
                feature,
                impurity_decrease,
                ..
            } = node
            {
                if *feature < n_features {
                    totals[*feature] += impurity_decrease;
                }
            }
        }
        totals
    }

    pub fn n_leaves(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, TreeNode::Leaf { .. }))
            .count()
    }

    pub fn depth(&self) -> usize {
        fn walk<L>(nodes: &[TreeNode<L>], idx: usize) -> usize {
            match &nodes[idx] {
                TreeNode::Leaf { .. } => 0,
                TreeNode::Split { left, right, .. } => {
                    1 + walk(nodes, *left).max(walk(nodes, *right))
                }
            }
        }
        walk(&self.nodes, 0)
    }
}

/// Running statistics and impurity for one splitting criterion.
pub(crate) trait SplitCriterion: Sync {
    type Stats: Clone + Send + Sync;
    type Leaf: Clone + Send;

    fn empty(&self) -> Self::Stats;
    fn push(&self, stats: &mut Self::Stats, row: usize);
    fn remove(&self, stats: &mut Self::Stats, row: usize);
    fn count(&self, stats: &Self::Stats) -> f64;
    /// Per-sample impurity of the set described by `stats`.
    fn impurity(&self, stats: &Self::Stats) -> f64;
    fn leaf(&self, stats: &Self::Stats) -> Self::Leaf;

    fn stats_of(&self, rows: &[usize]) -> Self::Stats {
        let mut stats = self.empty();
        for &r in rows {
            self.push(&mut stats, r);
        }
        stats
    }
}

/// Gini impurity over dense class labels; leaves hold class probabilities.
pub(crate) struct Gini<'a> {
    pub labels: &'a [usize],
    pub n_classes: usize,
}

#[derive(Clone)]
pub(crate) struct ClassCounts {
    counts: Vec<f64>,
    total: f64,
}

impl SplitCriterion for Gini<'_> {
    type Stats = ClassCounts;
    type Leaf = Vec<f64>;

    fn empty(&self) -> ClassCounts {
        ClassCounts {
            counts: vec![0.0; self.n_classes],
            total: 0.0,
        }
    }

    fn push(&self, stats: &mut ClassCounts, row: usize) {
        stats.counts[self.labels[row]] += 1.0;
        stats.total += 1.0;
    }

    fn remove(&self, stats: &mut ClassCounts, row: usize) {
        stats.counts[self.labels[row]] -= 1.0;
        stats.total -= 1.0;
    }

    fn count(&self, stats: &ClassCounts) -> f64 {
        stats.total
    }

    fn impurity(&self, stats: &ClassCounts) -> f64 {
        if stats.total <= 0.0 {
            return 0.0;
        }
        let sum_sq: f64 = stats
            .counts
            .iter()
            .map(|c| {
                let p = c / stats.total;
                p * p
            })
            .sum();
        1.0 - sum_sq
    }

    fn leaf(&self, stats: &ClassCounts) -> Vec<f64> {
        if stats.total <= 0.0 {
            return vec![0.0; self.n_classes];
        }
        stats.counts.iter().map(|c| c / stats.total).collect()
    }
}

/// Squared error over continuous targets; leaves hold the mean.
pub(crate) struct SquaredError<'a> {
    pub targets: &'a [f64],
}

#[derive(Clone)]
pub(crate) struct Moments {
    n: f64,
    sum: f64,
    sum_sq: f64,
}

impl SplitCriterion for SquaredError<'_> {
    type Stats = Moments;
    type Leaf = f64;

    fn empty(&self) -> Moments {
        Moments {
            n: 0.0,
            sum: 0.0,
            sum_sq: 0.0,
        }
    }

    fn push(&self, stats: &mut Moments, row: usize) {
        let t = self.targets[row];
        stats.n += 1.0;
        stats.sum += t;
        stats.sum_sq += t * t;
    }

    fn remove(&self, stats: &mut Moments, row: usize) {
        let t = self.targets[row];
        stats.n -= 1.0;
        stats.sum -= t;
        stats.sum_sq -= t * t;
    }

    fn count(&self, stats: &Moments) -> f64 {
        stats.n
    }

    fn impurity(&self, stats: &Moments) -> f64 {
        if stats.n <= 0.0 {
            return 0.0;
        }
        let mean = stats.sum / stats.n;
        (stats.sum_sq / stats.n - mean * mean).max(0.0)
    }

    fn leaf(&self, stats: &Moments) -> f64 {
        if stats.n <= 0.0 {
            0.0
        } else {
            stats.sum / stats.n
        }
    }
}

/// Best split found for one node.
#[derive(Debug, Clone, Copy)]
struct SplitCandidate {
    feature: usize,
    threshold: f64,
    decrease: f64,
}

/// Grow a tree on `rows` (row indices into `matrix`, repeats allowed).
pub(crate) fn grow<C: SplitCriterion>(
    matrix: &FeatureMatrix,
    criterion: &C,
    rows: Vec<usize>,
    params: &TreeParams,
    rng: &mut StdRng,
) -> Tree<C::Leaf> {
    let n_features = matrix.n_cols();
    let mut nodes: Vec<TreeNode<C::Leaf>> = Vec::new();
    let root_stats = criterion.stats_of(&rows);
    nodes.push(TreeNode::Leaf {
        value: criterion.leaf(&root_stats),
    });

    let mut stack: Vec<(usize, Vec<usize>, usize)> = vec![(0, rows, 0)];

    while let Some((node_idx, node_rows, depth)) = stack.pop() {
        let stats = criterion.stats_of(&node_rows);
        let n = node_rows.len();

        let depth_reached = params.max_depth.is_some_and(|max| depth >= max);
        if depth_reached
            || n < params.min_samples_split.max(2)
            || n < 2 * params.min_samples_leaf.max(1)
            || criterion.impurity(&stats) <= PURE_EPSILON
        {
            continue;
        }

        let candidates = match params.max_features {
            Some(k) if k < n_features => {
                let mut drawn = sample(rng, n_features, k.max(1)).into_vec();
                drawn.sort_unstable();
                drawn
            }
            _ => (0..n_features).collect(),
        };

        let Some(best) = find_best_split(matrix, criterion, &node_rows, &stats, &candidates, params)
        else {
            continue;
        };

        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = node_rows
            .iter()
            .partition(|&&r| matrix.get(r, best.feature) <= best.threshold);

        if left_rows.is_empty() || right_rows.is_empty() {
            continue;
        }

        let left_idx = nodes.len();
        nodes.push(TreeNode::Leaf {
            value: criterion.leaf(&criterion.stats_of(&left_rows)),
        });
        let right_idx = nodes.len();
        nodes.push(TreeNode::Leaf {
            value: criterion.leaf(&criterion.stats_of(&right_rows)),
        });

        nodes[node_idx] = TreeNode::Split {
            feature: best.feature,
            threshold: best.threshold,
            left: left_idx,
            right: right_idx,
            impurity_decrease: best.decrease,
        };

        stack.push((right_idx, right_rows, depth + 1));
        stack.push((left_idx, left_rows, depth + 1));
    }

    Tree { nodes }
}

/// Search the candidate features for the split with the largest impurity decrease.
///
/// Features are scanned in parallel; ties go to the lowest feature index so
/// the result does not depend on scheduling.
fn find_best_split<C: SplitCriterion>(
    matrix: &FeatureMatrix,
    criterion: &C,
    rows: &[usize],
    stats: &C::Stats,
    candidates: &[usize],
    params: &TreeParams,
) -> Option<SplitCandidate> {
    let n = rows.len() as f64;
    let parent_total = n * criterion.impurity(stats);
    let min_leaf = params.min_samples_leaf.max(1) as f64;

    let per_feature: Vec<Option<SplitCandidate>> = candidates
        .par_iter()
        .map(|&feature| {
            let mut pairs: Vec<(f64, usize)> =
                rows.iter().map(|&r| (matrix.get(r, feature), r)).collect();
            pairs.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

            let mut left = criterion.empty();
            let mut right = stats.clone();
            let mut best: Option<SplitCandidate> = None;

            for i in 0..pairs.len() - 1 {
                criterion.push(&mut left, pairs[i].1);
                criterion.remove(&mut right, pairs[i].1);

                if (pairs[i + 1].0 - pairs[i].0).abs() < VALUE_EPSILON {
                    continue;
                }

                let n_left = criterion.count(&left);
                let n_right = criterion.count(&right);
                if n_left < min_leaf || n_right < min_leaf {
                    continue;
                }

                let decrease = parent_total
                    - n_left * criterion.impurity(&left)
                    - n_right * criterion.impurity(&right);

                if decrease > best.map_or(PURE_EPSILON, |b| b.decrease) {
                    best = Some(SplitCandidate {
                        feature,
                        threshold: split_threshold(pairs[i].0, pairs[i + 1].0),
                        decrease,
                    });
                }
            }
            best
        })
        .collect();

    per_feature
        .into_iter()
        .flatten()
        .fold(None, |acc: Option<SplitCandidate>, cand| match acc {
            Some(b) if b.decrease >= cand.decrease => Some(b),
            _ => Some(cand),
        })
}

/// Midpoint between two adjacent sorted values that still sends `lower` left
/// and `upper` right. Values one ulp apart can round the midpoint up to `upper`.
fn split_threshold(lower: f64, upper: f64) -> f64 {
    let mid = lower / 2.0 + upper / 2.0;
    if mid >= upper || mid.is_infinite() {
        lower
    } else {
        mid
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn matrix(rows: &[Vec<f64>]) -> FeatureMatrix {
        let names = (0..rows[0].len()).map(|i| format!("f{}", i)).collect();
        FeatureMatrix::from_rows(names, rows).unwrap()
    }

    #[test]
    fn test_gini_tree_separates_classes() {
        let m = matrix(&[
            vec![1.0, 5.0],
            vec![2.0, 1.0],
            vec![3.0, 4.0],
            vec![10.0, 2.0],
            vec![11.0, 3.0],
            vec![12.0, 5.0],
        ]);
        let labels = [0, 0, 0, 1, 1, 1];
        let criterion = Gini {
            labels: &labels,
            n_classes: 2,
        };
        let mut rng = StdRng::seed_from_u64(0);
        let tree = grow(&m, &criterion, (0..6).collect(), &TreeParams::default(), &mut rng);

        assert_eq!(tree.depth(), 1);
        assert_eq!(tree.n_leaves(), 2);
        assert_eq!(tree.predict_leaf(&[0.0, 0.0]), &vec![1.0, 0.0]);
        assert_eq!(tree.predict_leaf(&[20.0, 0.0]), &vec![0.0, 1.0]);

        let importance = tree.impurity_decrease_by_feature(2);
        assert!(importance[0] > 0.0);
        assert_eq!(importance[1], 0.0);
    }

    #[test]
    fn test_regression_tree_respects_max_depth() {
        let m = matrix(&[vec![1.0], vec![2.0], vec![3.0], vec![4.0], vec![5.0], vec![6.0]]);
        let targets = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let criterion = SquaredError { targets: &targets };
        let params = TreeParams {
            max_depth: Some(2),
            ..Default::default()
        };
        let mut rng = StdRng::seed_from_u64(0);
        let tree = grow(&m, &criterion, (0..6).collect(), &params, &mut rng);

        assert!(tree.depth() <= 2);
        assert!(tree.n_leaves() <= 4);
        let low = *tree.predict_leaf(&[1.0]);
        let high = *tree.predict_leaf(&[6.0]);
        assert!(low < high);
    }

    #[test]
    fn test_split_threshold_separates_adjacent_values() {
        for lower in [1.0e6, f64::from_bits(1.0e6f64.to_bits() + 1), 0.1, 3.5] {
            let upper = f64::from_bits(lower.to_bits() + 1);
            let t = split_threshold(lower, upper);
            assert!(lower <= t && t < upper, "{} {} {}", lower, t, upper);
        }
        assert_eq!(split_threshold(1.0, 3.0), 2.0);
    }

    #[test]
    fn test_one_ulp_apart_values_still_split() {
        for base in [1.0e6, f64::from_bits(1.0e6f64.to_bits() + 1)] {
            let next = f64::from_bits(base.to_bits() + 1);
            let rows: Vec<Vec<f64>> = (0..20)
                .map(|i| vec![if i % 2 == 0 { base } else { next }])
                .collect();
            let labels: Vec<usize> = (0..20).map(|i| i % 2).collect();
            let criterion = Gini {
                labels: &labels,
                n_classes: 2,
            };
            let mut rng = StdRng::seed_from_u64(0);
            let m = matrix(&rows);
            let tree = grow(&m, &criterion, (0..20).collect(), &TreeParams::default(), &mut rng);

            assert_eq!(tree.n_leaves(), 2);
            assert_eq!(tree.predict_leaf(&[base]), &vec![1.0, 0.0]);
            assert_eq!(tree.predict_leaf(&[next]), &vec![0.0, 1.0]);
        }
    }

    #[test]
    fn test_criterion_stats_are_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ClassCounts>();
        assert_send_sync::<Moments>();
    }

    #[test]
    fn test_constant_feature_never_splits() {
        let m = matrix(&[vec![7.0], vec![7.0], vec![7.0], vec![7.0]]);
        let labels = [0, 1, 0, 1];
        let criterion = Gini {
            labels: &labels,
            n_classes: 2,
        };
        let mut rng = StdRng::seed_from_u64(0);
        let tree = grow(&m, &criterion, (0..4).collect(), &TreeParams::default(), &mut rng);
        assert_eq!(tree.n_leaves(), 1);
        assert_eq!(tree.predict_leaf(&[7.0]), &vec![0.5, 0.5]);
    }

    #[test]
    fn test_min_samples_leaf_blocks_small_children() {
        let m = matrix(&[vec![1.0], vec![2.0], vec![3.0], vec![4.0]]);
        let labels = [0, 1, 1, 1];
        let criterion = Gini {
            labels: &labels,
            n_classes: 2,
        };
        let params = TreeParams {
            min_samples_leaf: 2,
            ..Default::default()
        };
        let mut rng = StdRng::seed_from_u64(0);
        let tree = grow(&m, &criterion, (0..4).collect(), &params, &mut rng);
        // The only pure split isolates one sample, which is not allowed.
        assert!(tree.n_leaves() <= 2);
        let left = tree.predict_leaf(&[1.0]);
        assert!((left[0] - 0.5).abs() < 1e-12);
    }
}
