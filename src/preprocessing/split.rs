//! Seeded train/test splitting
//!
//! A stratified split is attempted first. When the labels cannot support one
//! (a class with a single member, or fewer slots than classes in either
//! partition) the split falls back to a seeded random permutation.

use crate::error::{PipelineError, Result};
use polars::prelude::*;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::debug;

/// How the rows were partitioned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitStrategy {
    Stratified,
    Random,
}

/// Why a stratified split is not possible
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StratifyError {
    #[error("class '{0}' has only one member")]
    SingletonClass(String),

    #[error("{n_classes} classes do not fit into train={n_train}, test={n_test}")]
    TooFewSlots {
        n_classes: usize,
        n_train: usize,
        n_test: usize,
    },
}

/// Row indices of each partition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainTestSplit {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
    pub strategy: SplitStrategy,
}

/// Partition `labels.len()` rows, `ceil(test_ratio * n)` of them into test.
pub fn train_test_split(labels: &[String], test_ratio: f64, seed: u64) -> Result<TrainTestSplit> {
    let n = labels.len();
    let n_test = ((test_ratio * n as f64).ceil() as usize).min(n);
    let n_train = n - n_test;
    if n_train == 0 || n_test == 0 {
        return Err(PipelineError::EmptyPartition {
            train: n_train,
            test: n_test,
        });
    }

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    match stratified_split(labels, n_train, n_test, &mut rng) {
        Ok((train, test)) => Ok(TrainTestSplit {
            train,
            test,
            strategy: SplitStrategy::Stratified,
        }),
        Err(reason) => {
            debug!(reason = %reason, "Stratified split not possible, using random split");
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let (train, test) = random_split(n, n_test, &mut rng);
            Ok(TrainTestSplit {
                train,
                test,
                strategy: SplitStrategy::Random,
            })
        }
    }
}

/// Shuffle all rows, first `n_test` go to test
pub fn random_split(n: usize, n_test: usize, rng: &mut impl Rng) -> (Vec<usize>, Vec<usize>) {
    let mut indices: Vec<usize> = (0..n).collect();
    indices.shuffle(rng);
    let train = indices.split_off(n_test);
    (train, indices)
}

/// Split preserving class proportions as closely as integer counts allow
pub fn stratified_split(
    labels: &[String],
    n_train: usize,
    n_test: usize,
    rng: &mut impl Rng,
) -> std::result::Result<(Vec<usize>, Vec<usize>), StratifyError> {
    let mut classes: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (i, label) in labels.iter().enumerate() {
        classes.entry(label.as_str()).or_default().push(i);
    }

    if let Some((label, _)) = classes.iter().find(|(_, rows)| rows.len() < 2) {
        return Err(StratifyError::SingletonClass(label.to_string()));
    }
    let n_classes = classes.len();
    if n_train < n_classes || n_test < n_classes {
        return Err(StratifyError::TooFewSlots {
            n_classes,
            n_train,
            n_test,
        });
    }

    let counts: Vec<usize> = classes.values().map(Vec::len).collect();
    let train_counts = approximate_mode(&counts, n_train, rng);
    let remaining: Vec<usize> = counts
        .iter()
        .zip(&train_counts)
        .map(|(c, t)| c - t)
        .collect();
    let test_counts = approximate_mode(&remaining, n_test, rng);

    let mut train = Vec::with_capacity(n_train);
    let mut test = Vec::with_capacity(n_test);
    for ((_, mut rows), (n_tr, n_te)) in classes
        .into_iter()
        .zip(train_counts.into_iter().zip(test_counts))
    {
        rows.shuffle(rng);
        train.extend_from_slice(&rows[..n_tr]);
        test.extend_from_slice(&rows[n_tr..n_tr + n_te]);
    }

    train.shuffle(rng);
    test.shuffle(rng);
    Ok((train, test))
}

/// Distribute `n_draws` across classes proportionally to `counts`.
///
/// Each class gets the floor of its share; leftover draws go to the classes
/// with the largest fractional remainders, ties broken at random.
fn approximate_mode(counts: &[usize], n_draws: usize, rng: &mut impl Rng) -> Vec<usize> {
    let total: usize = counts.iter().sum();
    if total == 0 {
        return vec![0; counts.len()];
    }

    let shares: Vec<f64> = counts
        .iter()
        .map(|&c| c as f64 * n_draws as f64 / total as f64)
        .collect();
    let mut drawn: Vec<usize> = shares.iter().map(|s| s.floor() as usize).collect();
    let mut need = n_draws.saturating_sub(drawn.iter().sum());

    let mut remainders: Vec<f64> = shares
        .iter()
        .zip(&drawn)
        .map(|(s, &d)| s - d as f64)
        .collect();
    remainders.sort_by(|a, b| b.total_cmp(a));
    remainders.dedup();

    for value in remainders {
        if need == 0 {
            break;
        }
        let mut candidates: Vec<usize> = (0..counts.len())
            .filter(|&i| shares[i] - drawn[i] as f64 == value && drawn[i] < counts[i])
            .collect();
        candidates.shuffle(rng);
        for i in candidates.into_iter().take(need) {
            drawn[i] += 1;
            need -= 1;
        }
    }

    drawn
}

/// Select rows of `df` by position, in the given order
pub fn take_rows(df: &DataFrame, rows: &[usize]) -> Result<DataFrame> {
    let idx: Vec<IdxSize> = rows.iter().map(|&i| i as IdxSize).collect();
    let idx = IdxCa::from_vec("idx".into(), idx);
    Ok(df.take(&idx)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn labels(pattern: &[(&str, usize)]) -> Vec<String> {
        pattern
            .iter()
            .flat_map(|(label, n)| std::iter::repeat(label.to_string()).take(*n))
            .collect()
    }

    fn count(labels: &[String], rows: &[usize], label: &str) -> usize {
        rows.iter().filter(|&&i| labels[i] == label).count()
    }

    #[test]
    fn test_sizes_use_ceiling() {
        let y = labels(&[("a", 50), ("b", 50)]);
        let split = train_test_split(&y, 0.2, 42).unwrap();
        assert_eq!(split.test.len(), 20);
        assert_eq!(split.train.len(), 80);

        let y = labels(&[("a", 5), ("b", 5)]);
        let split = train_test_split(&y, 0.25, 42).unwrap();
        assert_eq!(split.test.len(), 3);
        assert_eq!(split.train.len(), 7);
    }

    #[test]
    fn test_partitions_cover_all_rows_once() {
        let y = labels(&[("a", 30), ("b", 12), ("c", 9)]);
        let split = train_test_split(&y, 0.3, 42).unwrap();

        let all: HashSet<usize> = split.train.iter().chain(&split.test).copied().collect();
        assert_eq!(all.len(), y.len());
        assert_eq!(split.train.len() + split.test.len(), y.len());
    }

    #[test]
    fn test_stratified_preserves_proportions() {
        let y = labels(&[("a", 80), ("b", 20)]);
        let split = train_test_split(&y, 0.2, 42).unwrap();

        assert_eq!(split.strategy, SplitStrategy::Stratified);
        assert_eq!(count(&y, &split.test, "a"), 16);
        assert_eq!(count(&y, &split.test, "b"), 4);
    }

    #[test]
    fn test_singleton_class_falls_back_to_random() {
        let y = labels(&[("a", 10), ("b", 1)]);
        let split = train_test_split(&y, 0.3, 42).unwrap();
        assert_eq!(split.strategy, SplitStrategy::Random);
        assert_eq!(split.test.len(), 4);
    }

    #[test]
    fn test_too_few_slots_falls_back_to_random() {
        let y = labels(&[("a", 2), ("b", 2), ("c", 2), ("d", 2)]);
        let split = train_test_split(&y, 0.25, 42).unwrap();
        assert_eq!(split.strategy, SplitStrategy::Random);
    }

    #[test]
    fn test_split_is_deterministic() {
        let y = labels(&[("a", 40), ("b", 35)]);
        assert_eq!(train_test_split(&y, 0.2, 42).unwrap(), train_test_split(&y, 0.2, 42).unwrap());
    }

    #[test]
    fn test_empty_partition() {
        let y = labels(&[("a", 1)]);
        let err = train_test_split(&y, 0.2, 42).unwrap_err();
        assert!(matches!(err, PipelineError::EmptyPartition { train: 0, test: 1 }));

        let err = train_test_split(&[], 0.2, 42).unwrap_err();
        assert!(matches!(err, PipelineError::EmptyPartition { train: 0, test: 0 }));
    }

    #[test]
    fn test_approximate_mode_hands_out_every_draw() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let drawn = approximate_mode(&[3, 3, 3], 4, &mut rng);
        assert_eq!(drawn.iter().sum::<usize>(), 4);
        assert!(drawn.iter().all(|&d| d == 1 || d == 2));
    }

    #[test]
    fn test_take_rows() {
        let df = df!("x" => &[10i64, 20, 30]).unwrap();
        let taken = take_rows(&df, &[2, 0]).unwrap();
        let x: Vec<i64> = taken.column("x").unwrap().i64().unwrap().into_no_null_iter().collect();
        assert_eq!(x, vec![30, 10]);
    }
}
