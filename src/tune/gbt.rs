//! Search space and objective for the gradient-boosted-trees family.

use crate::error::{Error, Result};
use crate::model_selection::FoldExecution;
use crate::models::{BoostedTrees, BoostedTreesConfig, GrowPolicy};
use crate::sampler::CompletedTrial;
use crate::trial::Trial;

use super::{ConsoleObserver, SearchObserver, search_and_refit};

/// Number of trials in one boosted-trees search.
pub const GBT_TRIAL_BUDGET: usize = 100;

/// Tree-depth search range.
const MAX_DEPTH_RANGE: (i64, i64) = (3, 9);
/// Boosting-round search range.
const N_ESTIMATORS_RANGE: (i64, i64) = (100, 1000);
/// Learning-rate search range (log-uniform).
const ETA_RANGE: (f64, f64) = (1e-8, 1.0);
/// Minimum-split-loss search range (log-uniform).
const GAMMA_RANGE: (f64, f64) = (1e-8, 1.0);
/// Grow-policy choices; sampling and refit both index into this array.
const GROW_POLICY_CHOICES: [GrowPolicy; 2] = [GrowPolicy::Depthwise, GrowPolicy::Lossguide];

#[allow(clippy::cast_sign_loss)]
fn config_from_values(
    max_depth: i64,
    n_estimators: i64,
    eta: f64,
    gamma: f64,
    grow_policy: GrowPolicy,
) -> BoostedTreesConfig {
    BoostedTreesConfig {
        max_depth: max_depth as usize,
        n_estimators: n_estimators as usize,
        eta,
        gamma,
        grow_policy,
    }
}

/// Maps one sampled point to a fully specified boosted-trees regressor.
fn sample_model(trial: &mut Trial) -> Result<BoostedTrees> {
    let max_depth = trial.suggest_int("max_depth", MAX_DEPTH_RANGE.0, MAX_DEPTH_RANGE.1)?;
    let n_estimators =
        trial.suggest_int("n_estimators", N_ESTIMATORS_RANGE.0, N_ESTIMATORS_RANGE.1)?;
    let eta = trial.suggest_log_float("eta", ETA_RANGE.0, ETA_RANGE.1)?;
    let gamma = trial.suggest_log_float("gamma", GAMMA_RANGE.0, GAMMA_RANGE.1)?;
    let grow_policy = trial.suggest_categorical("grow_policy", &GROW_POLICY_CHOICES)?;

    Ok(BoostedTrees::new(config_from_values(
        max_depth,
        n_estimators,
        eta,
        gamma,
        grow_policy,
    )))
}

/// Rebuilds the boosted-trees regressor recorded as the best configuration.
fn rebuild_model(best: &CompletedTrial) -> Result<BoostedTrees> {
    let grow_policy = GROW_POLICY_CHOICES
        .get(best.categorical("grow_policy")?)
        .copied()
        .ok_or_else(|| Error::ParameterType {
            name: "grow_policy".to_string(),
            expected: "categorical",
        })?;

    Ok(BoostedTrees::new(config_from_values(
        best.int("max_depth")?,
        best.int("n_estimators")?,
        best.float("eta")?,
        best.float("gamma")?,
        grow_policy,
    )))
}

/// Tunes a gradient-boosted-trees regressor on the training set and returns
/// the best configuration refitted on all of it.
///
/// Searches `max_depth` over `[3, 9]`, `n_estimators` over `[100, 1000]`,
/// `eta` and `gamma` log-uniformly over `[1e-8, 1]`, and the grow policy
/// over {depthwise, lossguide} for exactly [`GBT_TRIAL_BUDGET`] trials,
/// maximizing mean 3-fold cross-validated R². The squared-error objective
/// and tree booster are fixed. Progress goes to the console; use
/// [`optimize_gbt_with`] to substitute another observer.
///
/// # Errors
///
/// Returns `Error::SampleCountMismatch` when `x` and `y` disagree on sample
/// count, `Error::InsufficientSamples` when there are fewer samples than
/// cross-validation folds, and any model-fitting error raised during
/// evaluation — a failed trial fails the whole run.
pub fn optimize_gbt(x: &[Vec<f64>], y: &[f64]) -> Result<BoostedTrees> {
    optimize_gbt_with(x, y, &ConsoleObserver)
}

/// [`optimize_gbt`] with a caller-supplied progress observer.
///
/// # Errors
///
/// See [`optimize_gbt`].
pub fn optimize_gbt_with(
    x: &[Vec<f64>],
    y: &[f64],
    observer: &dyn SearchObserver,
) -> Result<BoostedTrees> {
    search_and_refit(
        x,
        y,
        GBT_TRIAL_BUDGET,
        FoldExecution::Sequential,
        observer,
        sample_model,
        rebuild_model,
    )
}
