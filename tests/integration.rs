//! Integration tests for the search driver and samplers.

use hypertune::prelude::*;

// =============================================================================
// Test: TPE optimizes simple functions through the study driver
// =============================================================================

#[test]
fn test_tpe_optimizes_quadratic_function() {
    // Minimize f(x) = (x - 3)^2 where x in [-10, 10]; optimal x = 3.
    let sampler = TpeSampler::builder()
        .seed(42)
        .n_startup_trials(5)
        .n_ei_candidates(24)
        .build()
        .expect("builder settings are valid");

    let study = Study::minimize(sampler);
    study
        .optimize(50, |trial| {
            let x = trial.suggest_float("x", -10.0, 10.0)?;
            Ok((x - 3.0).powi(2))
        })
        .expect("optimization should succeed");

    let best = study.best_trial().expect("should have at least one trial");
    assert!(
        best.value < 1.0,
        "TPE should find near-optimal: best value {} should be < 1.0",
        best.value
    );
}

#[test]
fn test_tpe_maximization() {
    // Maximize f(x) = -(x - 2)^2 + 10 where x in [-10, 10]; optimal f = 10.
    let sampler = TpeSampler::builder().seed(456).n_startup_trials(5).build().unwrap();

    let study = Study::maximize(sampler);
    study
        .optimize(50, |trial| {
            let x = trial.suggest_float("x", -10.0, 10.0)?;
            Ok(-(x - 2.0).powi(2) + 10.0)
        })
        .expect("optimization should succeed");

    let best = study.best_trial().expect("should have at least one trial");
    assert!(
        best.value > 5.0,
        "TPE should find a reasonably good solution: best value {} should be > 5.0",
        best.value
    );
}

// =============================================================================
// Test: recorded trial count equals the configured budget exactly
// =============================================================================

#[test]
fn test_trial_count_equals_budget() {
    for budget in [1, 10, 100] {
        let study = Study::maximize(RandomSampler::with_seed(7));
        study
            .optimize(budget, |trial| trial.suggest_float("x", 0.0, 1.0))
            .unwrap();
        assert_eq!(study.n_trials(), budget);
    }
}

// =============================================================================
// Test: the running best never decreases (cumulative-best invariant)
// =============================================================================

#[test]
fn test_running_best_is_monotone_nondecreasing() {
    let study = Study::maximize(TpeSampler::builder().seed(3).n_startup_trials(8).build().unwrap());

    let bests = parking_lot::Mutex::new(Vec::new());
    let record = |study: &Study, _trial: &CompletedTrial| {
        bests.lock().push(study.best_value().unwrap());
    };

    study
        .optimize_with_callbacks(
            60,
            |trial| {
                let x = trial.suggest_float("x", -4.0, 4.0)?;
                let y = trial.suggest_float("y", -4.0, 4.0)?;
                Ok(-(x * x + y * y))
            },
            &[&record],
        )
        .unwrap();

    let bests = bests.into_inner();
    assert_eq!(bests.len(), 60);
    for pair in bests.windows(2) {
        assert!(
            pair[1] >= pair[0],
            "best score regressed from {} to {}",
            pair[0],
            pair[1]
        );
    }
}

// =============================================================================
// Test: every sampled value respects its declared bounds and choices
// =============================================================================

#[test]
fn test_sampled_values_respect_bounds() {
    let policies = ["depthwise", "lossguide"];
    let kernels = ["rbf", "matern32", "matern52"];

    for seed in [1_u64, 2, 3] {
        let study = Study::maximize(
            TpeSampler::builder().seed(seed).n_startup_trials(10).build().unwrap(),
        );

        study
            .optimize(100, |trial| {
                let c = trial.suggest_log_float("C", 1e-3, 1e3)?;
                let epsilon = trial.suggest_log_float("epsilon", 1e-3, 1e1)?;
                let eta = trial.suggest_log_float("eta", 1e-8, 1.0)?;
                let gamma = trial.suggest_log_float("gamma", 1e-8, 1.0)?;
                let length_scale = trial.suggest_log_float("length_scale", 1e-2, 1e2)?;
                let max_depth = trial.suggest_int("max_depth", 3, 9)?;
                let n_estimators = trial.suggest_int("n_estimators", 100, 1000)?;
                let n_restarts = trial.suggest_int("n_restarts_optimizer", 0, 10)?;
                let policy = trial.suggest_categorical("grow_policy", &policies)?;
                let kernel = trial.suggest_categorical("kernel", &kernels)?;

                assert!((1e-3..=1e3).contains(&c), "C {c} out of bounds");
                assert!((1e-3..=1e1).contains(&epsilon), "epsilon {epsilon} out of bounds");
                assert!((1e-8..=1.0).contains(&eta), "eta {eta} out of bounds");
                assert!((1e-8..=1.0).contains(&gamma), "gamma {gamma} out of bounds");
                assert!(
                    (1e-2..=1e2).contains(&length_scale),
                    "length_scale {length_scale} out of bounds"
                );
                assert!((3..=9).contains(&max_depth));
                assert!((100..=1000).contains(&n_estimators));
                assert!((0..=10).contains(&n_restarts));
                assert!(policies.contains(&policy));
                assert!(kernels.contains(&kernel));

                // Score correlated with a few parameters so TPE has structure
                // to exploit while the bounds are checked on every proposal.
                Ok(-(c.ln().powi(2)) - eta)
            })
            .unwrap();
    }
}

// =============================================================================
// Test: suggesting the same name twice
// =============================================================================

#[test]
fn test_resuggesting_same_name_returns_cached_value() {
    let study = Study::maximize(RandomSampler::with_seed(5));
    let mut trial = study.ask();

    let first = trial.suggest_float("x", 0.0, 1.0).unwrap();
    let second = trial.suggest_float("x", 0.0, 1.0).unwrap();
    assert!((first - second).abs() < f64::EPSILON);
}

#[test]
fn test_resuggesting_with_different_bounds_is_a_conflict() {
    let study = Study::maximize(RandomSampler::with_seed(5));
    let mut trial = study.ask();

    let _ = trial.suggest_float("x", 0.0, 1.0).unwrap();
    let result = trial.suggest_float("x", 0.0, 2.0);
    assert!(matches!(result, Err(Error::ParameterConflict { .. })));
}

#[test]
fn test_invalid_bounds_are_rejected() {
    let study = Study::maximize(RandomSampler::new());
    let mut trial = study.ask();

    assert!(matches!(
        trial.suggest_float("a", 2.0, 1.0),
        Err(Error::InvalidBounds { .. })
    ));
    assert!(matches!(
        trial.suggest_log_float("b", -1.0, 1.0),
        Err(Error::InvalidLogBounds)
    ));
    assert!(matches!(
        trial.suggest_int("c", 9, 3),
        Err(Error::InvalidBounds { .. })
    ));
    let empty: [&str; 0] = [];
    assert!(matches!(
        trial.suggest_categorical("d", &empty),
        Err(Error::EmptyChoices)
    ));
}

// =============================================================================
// Test: random sampler distributes across the full range
// =============================================================================

#[test]
fn test_random_sampler_covers_range() {
    let study = Study::maximize(RandomSampler::with_seed(42));
    let values = parking_lot::Mutex::new(Vec::new());

    study
        .optimize(200, |trial| {
            let x = trial.suggest_float("x", 0.0, 1.0)?;
            values.lock().push(x);
            Ok(0.0)
        })
        .unwrap();

    let values = values.into_inner();
    let below = values.iter().filter(|&&v| v < 0.5).count();
    let above = values.len() - below;
    assert!(below > 50 && above > 50, "samples look non-uniform: {below} below vs {above} above");
}

// =============================================================================
// Test: an objective error aborts the run and keeps earlier trials
// =============================================================================

#[test]
fn test_evaluation_error_fails_the_run() {
    let study = Study::maximize(RandomSampler::with_seed(1));
    let result = study.optimize(20, |trial| {
        let x = trial.suggest_float("x", 0.0, 1.0)?;
        if trial.id() >= 5 {
            return Err(Error::EmptyTrainingSet);
        }
        Ok(x)
    });

    assert!(result.is_err());
    assert_eq!(study.n_trials(), 5, "trials before the failure stay recorded");
}
