//! Study implementation driving the optimization loop.

use core::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::{Error, Result};
use crate::sampler::random::RandomSampler;
use crate::sampler::{CompletedTrial, Sampler};
use crate::trial::Trial;
use crate::types::Direction;

/// Per-trial observer callback invoked after a trial is recorded.
///
/// Callbacks are advisory: they can report progress but have no way to
/// influence which configurations the sampler proposes next, so removing
/// them never changes the search outcome.
pub type TrialCallback<'a> = &'a (dyn Fn(&Study, &CompletedTrial) + 'a);

/// A study manages one optimization run, tracking trials and the running best.
///
/// Trials are evaluated strictly sequentially: trial `i + 1` is sampled only
/// after trial `i`'s score has been recorded. The trial history is the single
/// piece of shared state; the sampler reads it to bias future proposals.
///
/// A study lives for one optimization run and is discarded once the best
/// configuration has been extracted.
///
/// # Examples
///
/// ```
/// use hypertune::{Direction, Study};
///
/// let study = Study::new(Direction::Maximize);
/// study
///     .optimize(20, |trial| {
///         let x = trial.suggest_float("x", -10.0, 10.0)?;
///         Ok(-(x - 3.0).powi(2))
///     })
///     .unwrap();
///
/// assert_eq!(study.n_trials(), 20);
/// assert!(study.best_value().unwrap() <= 0.0);
/// ```
pub struct Study {
    /// The optimization direction.
    direction: Direction,
    /// The sampler used to propose hyperparameter values.
    sampler: Arc<dyn Sampler>,
    /// Completed trials in chronological order, shared with in-flight trials.
    trials: Arc<RwLock<Vec<CompletedTrial>>>,
    /// Monotonic trial ID counter.
    next_trial_id: AtomicU64,
}

impl Study {
    /// Creates a new study with the given optimization direction.
    ///
    /// Uses the default [`RandomSampler`] for hyperparameter sampling; use
    /// [`with_sampler`](Self::with_sampler) for informed search.
    #[must_use]
    pub fn new(direction: Direction) -> Self {
        Self::with_sampler(direction, RandomSampler::new())
    }

    /// Creates a new study with a custom sampler.
    ///
    /// # Examples
    ///
    /// ```
    /// use hypertune::sampler::tpe::TpeSampler;
    /// use hypertune::{Direction, Study};
    ///
    /// let study = Study::with_sampler(Direction::Maximize, TpeSampler::new());
    /// assert_eq!(study.direction(), Direction::Maximize);
    /// ```
    pub fn with_sampler(direction: Direction, sampler: impl Sampler + 'static) -> Self {
        Self {
            direction,
            sampler: Arc::new(sampler),
            trials: Arc::new(RwLock::new(Vec::new())),
            next_trial_id: AtomicU64::new(0),
        }
    }

    /// Creates a study that maximizes the objective value.
    pub fn maximize(sampler: impl Sampler + 'static) -> Self {
        Self::with_sampler(Direction::Maximize, sampler)
    }

    /// Creates a study that minimizes the objective value.
    pub fn minimize(sampler: impl Sampler + 'static) -> Self {
        Self::with_sampler(Direction::Minimize, sampler)
    }

    /// Returns the optimization direction.
    #[must_use]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Requests a new trial with suggested parameters.
    ///
    /// This is the first half of the ask-and-tell interface: suggest values
    /// on the returned trial, evaluate the objective externally, then pass
    /// the trial back to [`tell`](Self::tell) with the result.
    #[must_use]
    pub fn ask(&self) -> Trial {
        let id = self.next_trial_id.fetch_add(1, Ordering::Relaxed);
        Trial::new(
            id,
            self.direction,
            Arc::clone(&self.sampler),
            Arc::clone(&self.trials),
        )
    }

    /// Records the result of a trial obtained from [`ask`](Self::ask).
    pub fn tell(&self, trial: Trial, value: f64) {
        let completed = trial.into_completed(value);
        tracing::debug!(trial_id = completed.id, value, "trial completed");
        self.trials.write().push(completed);
    }

    /// Runs the optimization loop for exactly `n_trials` evaluations.
    ///
    /// Equivalent to [`optimize_with_callbacks`](Self::optimize_with_callbacks)
    /// with an empty callback list.
    ///
    /// # Errors
    ///
    /// Propagates the first objective-evaluation error; a failed trial fails
    /// the whole run, it is never silently skipped or retried.
    pub fn optimize<F>(&self, n_trials: usize, objective: F) -> Result<()>
    where
        F: FnMut(&mut Trial) -> Result<f64>,
    {
        self.optimize_with_callbacks(n_trials, objective, &[])
    }

    /// Runs the optimization loop, invoking observers after every trial.
    ///
    /// Exactly `n_trials` trials are sampled and evaluated; there is no early
    /// stopping or convergence-based termination. After each trial is
    /// recorded, every callback is called with the study and the completed
    /// trial, in order.
    ///
    /// # Errors
    ///
    /// Propagates the first objective-evaluation error, aborting the run.
    pub fn optimize_with_callbacks<F>(
        &self,
        n_trials: usize,
        mut objective: F,
        callbacks: &[TrialCallback<'_>],
    ) -> Result<()>
    where
        F: FnMut(&mut Trial) -> Result<f64>,
    {
        for _ in 0..n_trials {
            let mut trial = self.ask();
            let value = objective(&mut trial)?;

            let improved = match self.best_value() {
                Ok(best) => match self.direction {
                    Direction::Minimize => value < best,
                    Direction::Maximize => value > best,
                },
                Err(_) => true,
            };

            let completed = trial.into_completed(value);
            tracing::debug!(trial_id = completed.id, value, "trial completed");
            if improved {
                tracing::info!(trial_id = completed.id, value, "new best value found");
            }
            self.trials.write().push(completed.clone());

            for callback in callbacks {
                callback(self, &completed);
            }
        }

        Ok(())
    }

    /// Returns all completed trials in chronological order.
    ///
    /// The returned vector is a clone of the internal storage.
    #[must_use]
    pub fn trials(&self) -> Vec<CompletedTrial> {
        self.trials.read().clone()
    }

    /// Returns the number of completed trials.
    #[must_use]
    pub fn n_trials(&self) -> usize {
        self.trials.read().len()
    }

    /// Returns the trial with the best objective value.
    ///
    /// "Best" depends on the optimization direction: the lowest value when
    /// minimizing, the highest when maximizing.
    ///
    /// # Errors
    ///
    /// Returns `Error::NoCompletedTrials` if no trials have been recorded.
    pub fn best_trial(&self) -> Result<CompletedTrial> {
        let trials = self.trials.read();
        let direction = self.direction;

        trials
            .iter()
            .max_by(|a, b| {
                let ordering = a
                    .value
                    .partial_cmp(&b.value)
                    .unwrap_or(core::cmp::Ordering::Equal);
                match direction {
                    Direction::Minimize => ordering.reverse(),
                    Direction::Maximize => ordering,
                }
            })
            .cloned()
            .ok_or(Error::NoCompletedTrials)
    }

    /// Returns the best objective value found so far.
    ///
    /// # Errors
    ///
    /// Returns `Error::NoCompletedTrials` if no trials have been recorded.
    pub fn best_value(&self) -> Result<f64> {
        self.best_trial().map(|trial| trial.value)
    }
}
