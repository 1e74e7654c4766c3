//! Regression scoring metrics.

/// Coefficient of determination (R²).
///
/// `R² = 1 - SS_res / SS_tot`, where `SS_res` is the residual sum of squares
/// and `SS_tot` the total sum of squares around the mean of `y_true`. A
/// model that always predicts the mean scores 0.0; a perfect model scores
/// 1.0; worse-than-mean predictions go negative.
///
/// When `y_true` is constant, `SS_tot` is zero: the score is 1.0 for exact
/// predictions and 0.0 otherwise.
///
/// # Panics
///
/// Panics if the slices have different lengths.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn r2_score(y_true: &[f64], y_pred: &[f64]) -> f64 {
    assert_eq!(
        y_true.len(),
        y_pred.len(),
        "r2_score requires equal-length slices"
    );

    let n = y_true.len() as f64;
    let mean = y_true.iter().sum::<f64>() / n;

    let ss_res: f64 = y_true
        .iter()
        .zip(y_pred)
        .map(|(t, p)| (t - p).powi(2))
        .sum();
    let ss_tot: f64 = y_true.iter().map(|t| (t - mean).powi(2)).sum();

    if ss_tot == 0.0 {
        return if ss_res == 0.0 { 1.0 } else { 0.0 };
    }

    1.0 - ss_res / ss_tot
}

/// Mean squared error.
///
/// # Panics
///
/// Panics if the slices have different lengths.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn mean_squared_error(y_true: &[f64], y_pred: &[f64]) -> f64 {
    assert_eq!(
        y_true.len(),
        y_pred.len(),
        "mean_squared_error requires equal-length slices"
    );

    let n = y_true.len() as f64;
    y_true
        .iter()
        .zip(y_pred)
        .map(|(t, p)| (t - p).powi(2))
        .sum::<f64>()
        / n
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perfect_predictions_score_one() {
        let y = [1.0, 2.0, 3.0, 4.0];
        assert!((r2_score(&y, &y) - 1.0).abs() < 1e-12);
        assert!(mean_squared_error(&y, &y).abs() < 1e-12);
    }

    #[test]
    fn test_mean_predictor_scores_zero() {
        let y_true = [1.0, 2.0, 3.0, 4.0];
        let mean = 2.5;
        let y_pred = [mean; 4];
        assert!(r2_score(&y_true, &y_pred).abs() < 1e-12);
    }

    #[test]
    fn test_worse_than_mean_is_negative() {
        let y_true = [1.0, 2.0, 3.0, 4.0];
        let y_pred = [4.0, 3.0, 2.0, 1.0];
        assert!(r2_score(&y_true, &y_pred) < 0.0);
    }

    #[test]
    fn test_constant_targets() {
        let y_true = [2.0, 2.0, 2.0];
        assert!((r2_score(&y_true, &[2.0, 2.0, 2.0]) - 1.0).abs() < 1e-12);
        assert!(r2_score(&y_true, &[2.0, 2.0, 2.1]).abs() < 1e-12);
    }

    #[test]
    fn test_mse_matches_hand_computation() {
        let y_true = [0.0, 0.0];
        let y_pred = [1.0, 3.0];
        assert!((mean_squared_error(&y_true, &y_pred) - 5.0).abs() < 1e-12);
    }
}
