//! End-to-end tests for the per-family optimization entry points.

use parking_lot::Mutex;

use hypertune::prelude::*;

/// Observer that records per-trial running bests and the final history.
#[derive(Default)]
struct RecordingObserver {
    bests: Mutex<Vec<f64>>,
    history_len: Mutex<Option<usize>>,
}

impl SearchObserver for RecordingObserver {
    fn trial_finished(&self, study: &Study, _trial: &CompletedTrial) {
        self.bests.lock().push(study.best_value().unwrap());
    }

    fn search_finished(&self, history: &OptimizationHistory) {
        *self.history_len.lock() = Some(history.len());
    }
}

/// Synthetic linear data: `n` samples, 3 features, deterministic noise.
fn synthetic_linear(n: usize) -> (Vec<Vec<f64>>, Vec<f64>) {
    let x: Vec<Vec<f64>> = (0..n)
        .map(|i| {
            let i = i as f64;
            vec![i, (i * 1.7).sin() * 4.0, (i * 0.9).cos() * 2.0]
        })
        .collect();
    let y: Vec<f64> = x
        .iter()
        .enumerate()
        .map(|(i, row)| 2.0 * row[0] - 1.0 * row[1] + 0.5 * row[2] + 0.1 * (i as f64).sin())
        .collect();
    (x, y)
}

// =============================================================================
// End-to-end: SVR search beats a mean-predictor baseline on held-out data
// =============================================================================

#[test]
fn test_optimize_svr_beats_mean_baseline_on_held_out_split() {
    let (x_all, y_all) = synthetic_linear(26);
    let (x_train, x_test) = x_all.split_at(20);
    let (y_train, y_test) = y_all.split_at(20);

    let observer = RecordingObserver::default();
    let model = optimize_svr_with(x_train, y_train, &observer).expect("search should succeed");

    // Exactly the configured budget was spent.
    assert_eq!(observer.bests.lock().len(), 100);
    assert_eq!(*observer.history_len.lock(), Some(100));

    // The refitted model predicts held-out targets better than the mean
    // predictor, whose R² is zero.
    let score = model.score(x_test, y_test).unwrap();
    assert!(score > 0.0, "held-out R² {score} not above mean baseline");
}

// =============================================================================
// End-to-end: Gaussian-process search spends its smaller budget
// =============================================================================

#[test]
fn test_optimize_gpr_runs_ten_trials() {
    let (x, y) = synthetic_linear(20);

    let observer = RecordingObserver::default();
    let model = optimize_gpr_with(&x, &y, &observer).expect("search should succeed");

    assert_eq!(observer.bests.lock().len(), 10);
    assert_eq!(*observer.history_len.lock(), Some(10));

    // Refit model reproduces the training targets reasonably.
    let score = model.score(&x, &y).unwrap();
    assert!(score > 0.0, "training R² {score} unexpectedly poor");
}

// =============================================================================
// End-to-end: boosted-trees search spends its full budget
// =============================================================================

#[test]
fn test_optimize_gbt_runs_full_budget() {
    let (x, y) = synthetic_linear(20);

    let observer = RecordingObserver::default();
    let model = optimize_gbt_with(&x, &y, &observer).expect("search should succeed");

    assert_eq!(observer.bests.lock().len(), 100);

    let score = model.score(&x, &y).unwrap();
    assert!(score > 0.0, "training R² {score} unexpectedly poor");
}

// =============================================================================
// The running best reported to observers never decreases
// =============================================================================

#[test]
fn test_reported_best_is_monotone() {
    let (x, y) = synthetic_linear(20);

    let observer = RecordingObserver::default();
    optimize_gpr_with(&x, &y, &observer).expect("search should succeed");

    let bests = observer.bests.lock();
    for pair in bests.windows(2) {
        assert!(
            pair[1] >= pair[0],
            "reported best regressed from {} to {}",
            pair[0],
            pair[1]
        );
    }
}

// =============================================================================
// Input validation
// =============================================================================

#[test]
fn test_mismatched_sample_counts_fail_fast() {
    let (x, mut y) = synthetic_linear(20);
    y.pop();

    let err = optimize_svr_with(&x, &y, &SilentObserver).unwrap_err();
    match err {
        Error::SampleCountMismatch { features, targets } => {
            assert_eq!(features, 20);
            assert_eq!(targets, 19);
        }
        other => panic!("unexpected error: {other}"),
    }

    let message = optimize_svr_with(&x, &y, &SilentObserver)
        .unwrap_err()
        .to_string();
    assert!(
        message.contains("20") && message.contains("19"),
        "error should name both lengths: {message}"
    );
}

#[test]
fn test_two_samples_with_three_folds_is_an_evaluation_error() {
    let x = vec![vec![0.0, 1.0, 2.0], vec![3.0, 4.0, 5.0]];
    let y = vec![0.0, 1.0];

    for result in [
        optimize_svr_with(&x, &y, &SilentObserver).map(|_| ()),
        optimize_gbt_with(&x, &y, &SilentObserver).map(|_| ()),
        optimize_gpr_with(&x, &y, &SilentObserver).map(|_| ()),
    ] {
        match result {
            Err(Error::InsufficientSamples {
                n_samples,
                n_splits,
            }) => {
                assert_eq!(n_samples, 2);
                assert_eq!(n_splits, 3);
            }
            Err(other) => panic!("unexpected error: {other}"),
            Ok(()) => panic!("degenerate dataset should not produce a model"),
        }
    }
}

// =============================================================================
// Kernel reconstruction round-trip
// =============================================================================

#[test]
fn test_kernel_reconstruction_round_trip() {
    let (x, y) = synthetic_linear(15);
    let probe = vec![vec![7.5, 1.0, -0.5], vec![12.25, -2.0, 1.0]];

    for family in [KernelFamily::Rbf, KernelFamily::Matern32, KernelFamily::Matern52] {
        // The same tag + length_scale must rebuild a kernel that behaves
        // identically at evaluation time and at refit time.
        let build = || {
            GaussianProcess::new(GaussianProcessConfig {
                kernel: KernelSpec::new(family, 0.8),
                alpha: 1e-10,
                n_restarts_optimizer: 0,
            })
        };

        let mut evaluation_model = build();
        evaluation_model.fit(&x, &y).unwrap();
        let mut refit_model = build();
        refit_model.fit(&x, &y).unwrap();

        let first = evaluation_model.predict(&probe).unwrap();
        let second = refit_model.predict(&probe).unwrap();
        for (a, b) in first.iter().zip(&second) {
            assert!(
                (a - b).abs() < 1e-12,
                "{family:?}: reconstructed kernels diverged ({a} vs {b})"
            );
        }
    }
}
