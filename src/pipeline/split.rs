//! Stratified train/test split

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Serialize;

use super::error::{PipelineError, PipelineResult};

/// Default fraction of rows held out for testing
pub const DEFAULT_TEST_FRACTION: f64 = 0.3;

/// Disjoint, exhaustive division of row indices. Both lists are sorted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SplitPartition {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Split row indices so each class keeps its proportion in both halves.
///
/// `labels` are dense class indices. The test side gets `ceil(test_fraction * n)`
/// rows, allocated per class by largest remainder. Every class keeps at least
/// one row in the training side.
pub fn stratified_split(
    labels: &[usize],
    test_fraction: f64,
    seed: u64,
) -> PipelineResult<SplitPartition> {
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(PipelineError::InvariantViolation(format!(
            "test fraction must be in (0, 1), got {}",
            test_fraction
        )));
    }

    let n = labels.len();
    let n_classes = labels.iter().max().map_or(0, |&m| m + 1);
    let mut members: Vec<Vec<usize>> = vec![Vec::new(); n_classes];
    for (i, &c) in labels.iter().enumerate() {
        members[c].push(i);
    }
    members.retain(|m| !m.is_empty());

    if let Some(smallest) = members.iter().find(|m| m.len() < 2) {
        return Err(PipelineError::Stratification(format!(
            "a class has only {} member(s); every class needs at least 2",
            smallest.len()
        )));
    }

    let n_test = (test_fraction * n as f64).ceil() as usize;
    let n_train = n - n_test;
    if n_test < members.len() || n_train < members.len() {
        return Err(PipelineError::Stratification(format!(
            "{} train / {} test rows cannot hold {} classes",
            n_train,
            n_test,
            members.len()
        )));
    }

    let sizes: Vec<usize> = members.iter().map(Vec::len).collect();
    let allocation = allocate_test_counts(&sizes, n_test, n);

    let mut rng = StdRng::seed_from_u64(seed);
    let mut train = Vec::with_capacity(n_train);
    let mut test = Vec::with_capacity(n_test);
    for (mut rows, k) in members.into_iter().zip(allocation) {
        rows.shuffle(&mut rng);
        test.extend_from_slice(&rows[..k]);
        train.extend_from_slice(&rows[k..]);
    }
    train.sort_unstable();
    test.sort_unstable();

    Ok(SplitPartition { train, test })
}

/// Per-class test counts summing to `n_test`: floor of the proportional
/// share, then one extra row to the largest remainders, never taking a
/// class's last row.
fn allocate_test_counts(sizes: &[usize], n_test: usize, n: usize) -> Vec<usize> {
    let exact: Vec<f64> = sizes
        .iter()
        .map(|&s| s as f64 * n_test as f64 / n as f64)
        .collect();
    let mut counts: Vec<usize> = exact
        .iter()
        .zip(sizes)
        .map(|(e, &s)| (e.floor() as usize).min(s - 1))
        .collect();

    let mut order: Vec<usize> = (0..sizes.len()).collect();
    order.sort_by(|&a, &b| {
        let ra = exact[a] - exact[a].floor();
        let rb = exact[b] - exact[b].floor();
        rb.partial_cmp(&ra)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.cmp(&b))
    });

    let mut remaining = n_test.saturating_sub(counts.iter().sum());
    while remaining > 0 {
        let mut progressed = false;
        for &c in &order {
            if remaining == 0 {
                break;
            }
            if counts[c] < sizes[c] - 1 {
                counts[c] += 1;
                remaining -= 1;
                progressed = true;
            }
        }
        if !progressed {
            break;
        }
    }
    counts
}
