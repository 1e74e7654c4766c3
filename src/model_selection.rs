//! K-fold cross-validation.

use rayon::prelude::*;

use crate::error::{Error, Result};
use crate::models::Regressor;

/// K-Fold cross-validation splitter.
///
/// Splits samples into K contiguous folds in sample order (no shuffling).
/// Each fold is used once as the validation set while the remaining K-1
/// folds form the training set.
#[derive(Clone, Debug)]
pub struct KFold {
    n_splits: usize,
}

impl KFold {
    /// Creates a new K-fold splitter.
    #[must_use]
    pub fn new(n_splits: usize) -> Self {
        Self { n_splits }
    }

    /// Returns the number of folds.
    #[must_use]
    pub fn n_splits(&self) -> usize {
        self.n_splits
    }

    /// Generates `(train_indices, test_indices)` pairs for each fold.
    ///
    /// When `n_samples` does not divide evenly, the first
    /// `n_samples % n_splits` folds receive one extra sample.
    ///
    /// # Errors
    ///
    /// Returns `Error::InsufficientSamples` when there are fewer samples
    /// than folds, since at least one validation fold would be empty.
    pub fn split(&self, n_samples: usize) -> Result<Vec<(Vec<usize>, Vec<usize>)>> {
        if n_samples < self.n_splits {
            return Err(Error::InsufficientSamples {
                n_samples,
                n_splits: self.n_splits,
            });
        }

        let fold_size = n_samples / self.n_splits;
        let remainder = n_samples % self.n_splits;

        let mut folds = Vec::with_capacity(self.n_splits);
        let mut start = 0;

        for i in 0..self.n_splits {
            let extra = usize::from(i < remainder);
            let end = start + fold_size + extra;

            let test_indices: Vec<usize> = (start..end).collect();
            let train_indices: Vec<usize> = (0..start).chain(end..n_samples).collect();

            folds.push((train_indices, test_indices));
            start = end;
        }

        Ok(folds)
    }
}

/// How cross-validation folds are scheduled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FoldExecution {
    /// Evaluate folds one after another on the calling thread.
    Sequential,
    /// Evaluate folds concurrently on the rayon thread pool.
    ///
    /// This is resource parallelism within a single trial; trials themselves
    /// remain strictly sequential.
    Parallel,
}

/// Scores a model configuration with k-fold cross-validation.
///
/// For each fold, a fresh clone of `model` is fitted on the training
/// portion and scored (R²) on the held-out portion. Returns the per-fold
/// scores in fold order.
///
/// Any fold failure is propagated to the caller immediately; there is no
/// policy that records a failed fold as a bad score.
///
/// # Errors
///
/// Returns `Error::InsufficientSamples` when `y` has fewer samples than
/// folds, and any error raised by the model's `fit`, `predict`, or `score`.
pub fn cross_val_score<M>(
    model: &M,
    x: &[Vec<f64>],
    y: &[f64],
    kfold: &KFold,
    execution: FoldExecution,
) -> Result<Vec<f64>>
where
    M: Regressor + Clone + Send + Sync,
{
    let splits = kfold.split(y.len())?;

    let evaluate = |(train_indices, test_indices): &(Vec<usize>, Vec<usize>)| -> Result<f64> {
        let (x_train, y_train) = extract_samples(x, y, train_indices);
        let (x_test, y_test) = extract_samples(x, y, test_indices);

        let mut fold_model = model.clone();
        fold_model.fit(&x_train, &y_train)?;
        fold_model.score(&x_test, &y_test)
    };

    match execution {
        FoldExecution::Sequential => splits.iter().map(evaluate).collect(),
        FoldExecution::Parallel => splits.par_iter().map(evaluate).collect(),
    }
}

/// Arithmetic mean of per-fold scores.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn mean_score(scores: &[f64]) -> f64 {
    if scores.is_empty() {
        return 0.0;
    }
    scores.iter().sum::<f64>() / scores.len() as f64
}

/// Extracts the rows of `x` and entries of `y` at `indices`.
fn extract_samples(x: &[Vec<f64>], y: &[f64], indices: &[usize]) -> (Vec<Vec<f64>>, Vec<f64>) {
    let x_subset = indices.iter().map(|&i| x[i].clone()).collect();
    let y_subset = indices.iter().map(|&i| y[i]).collect();
    (x_subset, y_subset)
}
