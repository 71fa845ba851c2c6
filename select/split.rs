//! # Holdout and Cross-Validation Splits
//!
//! Reproducibility across runs is a hard requirement of the analysis, so
//! every partition here is driven by a caller-supplied seed: the stratified
//! train/holdout split groups rows by exact outcome value and shuffles each
//! group with a seeded RNG, and `KFold` shuffles the training rows once
//! before carving consecutive folds.
//!
//! A degenerate class distribution (any outcome value with fewer than two
//! rows) cannot be stratified and fails loudly rather than silently
//! downgrading to an unstratified split.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use thiserror::Error;

/// A disjoint train/holdout partition of row indices.
#[derive(Debug, Clone)]
pub struct TrainTestSplit {
    pub train_indices: Vec<usize>,
    pub test_indices: Vec<usize>,
}

/// Errors raised while partitioning data.
#[derive(Error, Debug)]
pub enum SplitError {
    #[error("Cannot split an empty dataset.")]
    EmptyData,
    #[error("Holdout fraction must lie strictly between 0 and 1, got {0}.")]
    InvalidFraction(f64),
    #[error(
        "Stratified splitting requires every target class to have at least 2 members; the class with value {value} has {count}. A continuous target cannot be stratified."
    )]
    ClassTooSmall { value: f64, count: usize },
    #[error("Cross-validation needs at least 2 folds, got {0}.")]
    TooFewFolds(usize),
    #[error(
        "Cannot build {folds} cross-validation folds from only {samples} training rows."
    )]
    TooFewSamples { samples: usize, folds: usize },
}

/// Splits row indices into train and holdout subsets, stratified on the
/// exact values of `y`.
///
/// Each class contributes `round(class_size * test_fraction)` rows to the
/// holdout, clamped so every class keeps at least one row on each side.
/// Rows within a class are shuffled with a seeded RNG, so identical inputs
/// and seeds always yield identical partitions.
pub fn stratified_split(
    y: ArrayView1<f64>,
    test_fraction: f64,
    seed: u64,
) -> Result<TrainTestSplit, SplitError> {
    if y.is_empty() {
        return Err(SplitError::EmptyData);
    }
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(SplitError::InvalidFraction(test_fraction));
    }

    // Group row indices by exact target value, preserving first-appearance
    // order so the partition does not depend on hash iteration order.
    let mut class_order: Vec<u64> = Vec::new();
    let mut classes: std::collections::HashMap<u64, Vec<usize>> =
        std::collections::HashMap::new();
    for (row, &value) in y.iter().enumerate() {
        let key = value.to_bits();
        let members = classes.entry(key).or_insert_with(|| {
            class_order.push(key);
            Vec::new()
        });
        members.push(row);
    }

    for &key in &class_order {
        let count = classes[&key].len();
        if count < 2 {
            return Err(SplitError::ClassTooSmall {
                value: f64::from_bits(key),
                count,
            });
        }
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut train_indices = Vec::with_capacity(y.len());
    let mut test_indices = Vec::new();
    for &key in &class_order {
        let mut members = classes
            .remove(&key)
            .expect("every recorded class key is present in the map");
        members.shuffle(&mut rng);

        let quota = ((members.len() as f64) * test_fraction).round() as usize;
        let quota = quota.clamp(1, members.len() - 1);
        test_indices.extend_from_slice(&members[..quota]);
        train_indices.extend_from_slice(&members[quota..]);
    }

    // Sorted index lists keep downstream row extraction in table order.
    train_indices.sort_unstable();
    test_indices.sort_unstable();

    log::debug!(
        "Stratified split: {} train rows, {} holdout rows across {} classes.",
        train_indices.len(),
        test_indices.len(),
        class_order.len()
    );

    Ok(TrainTestSplit {
        train_indices,
        test_indices,
    })
}

/// K-fold cross-validator with a seeded shuffle.
///
/// The sample indices are shuffled once, then carved into `n_splits`
/// consecutive folds whose sizes differ by at most one. Each fold serves
/// once as the validation set while the remaining folds train.
#[derive(Debug, Clone)]
pub struct KFold {
    n_splits: usize,
    seed: u64,
}

impl KFold {
    pub fn new(n_splits: usize, seed: u64) -> Self {
        Self { n_splits, seed }
    }

    /// Generates `(train_indices, validation_indices)` pairs for each fold.
    pub fn split(&self, n_samples: usize) -> Result<Vec<(Vec<usize>, Vec<usize>)>, SplitError> {
        if self.n_splits < 2 {
            return Err(SplitError::TooFewFolds(self.n_splits));
        }
        if n_samples < self.n_splits {
            return Err(SplitError::TooFewSamples {
                samples: n_samples,
                folds: self.n_splits,
            });
        }

        let mut indices: Vec<usize> = (0..n_samples).collect();
        let mut rng = StdRng::seed_from_u64(self.seed);
        indices.shuffle(&mut rng);

        let fold_size = n_samples / self.n_splits;
        let remainder = n_samples % self.n_splits;

        let mut result = Vec::with_capacity(self.n_splits);
        let mut start = 0;
        for fold in 0..self.n_splits {
            // Distribute the remainder across the leading folds.
            let current_fold_size = if fold < remainder {
                fold_size + 1
            } else {
                fold_size
            };
            let end = start + current_fold_size;

            let validation_indices: Vec<usize> = indices[start..end].to_vec();
            let mut train_indices = Vec::with_capacity(n_samples - current_fold_size);
            train_indices.extend_from_slice(&indices[..start]);
            train_indices.extend_from_slice(&indices[end..]);

            result.push((train_indices, validation_indices));
            start = end;
        }

        Ok(result)
    }
}

/// Materializes the rows named by `indices` into owned arrays.
pub fn take_rows(
    x: ArrayView2<f64>,
    y: ArrayView1<f64>,
    indices: &[usize],
) -> (Array2<f64>, Array1<f64>) {
    (x.select(Axis(0), indices), y.select(Axis(0), indices))
}
