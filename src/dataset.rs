//! Training-set validation.

use crate::error::{Error, Result};

/// Checks that the feature matrix and target vector agree on sample count.
///
/// This is the only precondition the optimization entry points enforce;
/// it runs once per entry point, before any sampling. Whether the sample
/// count is large enough for the configured cross-validation fold count is
/// checked later, when the folds are built.
///
/// # Errors
///
/// Returns `Error::SampleCountMismatch` naming both lengths when
/// `x.len() != y.len()`.
///
/// # Examples
///
/// ```
/// use hypertune::check_consistency;
///
/// let x = vec![vec![1.0, 2.0], vec![3.0, 4.0]];
/// let y = vec![0.5, 1.5];
/// assert!(check_consistency(&x, &y).is_ok());
///
/// let short_y = vec![0.5];
/// assert!(check_consistency(&x, &short_y).is_err());
/// ```
pub fn check_consistency(x: &[Vec<f64>], y: &[f64]) -> Result<()> {
    if x.len() == y.len() {
        Ok(())
    } else {
        Err(Error::SampleCountMismatch {
            features: x.len(),
            targets: y.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matching_lengths_accepted() {
        let x = vec![vec![0.0]; 7];
        let y = vec![0.0; 7];
        assert!(check_consistency(&x, &y).is_ok());
    }

    #[test]
    fn test_empty_inputs_accepted() {
        let x: Vec<Vec<f64>> = vec![];
        let y: Vec<f64> = vec![];
        assert!(check_consistency(&x, &y).is_ok());
    }

    #[test]
    fn test_mismatch_names_both_lengths() {
        let x = vec![vec![0.0]; 4];
        let y = vec![0.0; 6];
        let err = check_consistency(&x, &y).unwrap_err();
        match err {
            Error::SampleCountMismatch { features, targets } => {
                assert_eq!(features, 4);
                assert_eq!(targets, 6);
            }
            other => panic!("unexpected error: {other}"),
        }
        let message = check_consistency(&x, &y).unwrap_err().to_string();
        assert!(message.contains('4') && message.contains('6'));
    }
}
