//! Trial implementation for tracking sampled hyperparameters.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::distribution::{
    CategoricalDistribution, Distribution, FloatDistribution, IntDistribution,
};
use crate::error::{Error, Result};
use crate::param::ParamValue;
use crate::sampler::{CompletedTrial, Sampler};
use crate::types::Direction;

/// A trial represents a single evaluation of the objective function.
///
/// Each trial has a unique ID and stores the sampled hyperparameter values
/// along with their distributions, keyed by hyperparameter name. Values are
/// proposed by the study's sampler, which sees the history of completed
/// trials for informed sampling.
///
/// Suggesting the same name twice with the same bounds returns the cached
/// value; suggesting it with different bounds or a different kind is a
/// conflict.
pub struct Trial {
    /// Unique identifier for this trial.
    id: u64,
    /// Direction of the owning study, forwarded to the sampler.
    direction: Direction,
    /// Sampled hyperparameter values, keyed by name.
    params: HashMap<String, ParamValue>,
    /// Hyperparameter distributions, keyed by name.
    distributions: HashMap<String, Distribution>,
    /// The sampler used to propose values.
    sampler: Arc<dyn Sampler>,
    /// Access to the history of completed trials (shared with the study).
    history: Arc<RwLock<Vec<CompletedTrial>>>,
}

impl core::fmt::Debug for Trial {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Trial")
            .field("id", &self.id)
            .field("direction", &self.direction)
            .field("params", &self.params)
            .field("distributions", &self.distributions)
            .finish_non_exhaustive()
    }
}

impl Trial {
    /// Creates a new trial bound to a sampler and shared trial history.
    pub(crate) fn new(
        id: u64,
        direction: Direction,
        sampler: Arc<dyn Sampler>,
        history: Arc<RwLock<Vec<CompletedTrial>>>,
    ) -> Self {
        Self {
            id,
            direction,
            params: HashMap::new(),
            distributions: HashMap::new(),
            sampler,
            history,
        }
    }

    /// Returns the unique ID of this trial.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Returns the sampled hyperparameter values so far.
    #[must_use]
    pub fn params(&self) -> &HashMap<String, ParamValue> {
        &self.params
    }

    /// Suggests a floating-point hyperparameter sampled uniformly
    /// from `[low, high]`.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidBounds` if `low > high` (or either bound is
    /// NaN) and `Error::ParameterConflict` if `name` was previously
    /// suggested with a different configuration.
    pub fn suggest_float(&mut self, name: &str, low: f64, high: f64) -> Result<f64> {
        self.suggest_float_inner(name, low, high, false)
    }

    /// Suggests a floating-point hyperparameter sampled log-uniformly
    /// from `[low, high]`.
    ///
    /// Log-uniform sampling spends equal probability mass per order of
    /// magnitude, which suits scale-type hyperparameters such as
    /// regularization strengths and learning rates.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidBounds` if `low > high`,
    /// `Error::InvalidLogBounds` if `low <= 0`, and
    /// `Error::ParameterConflict` on a mismatched re-suggestion.
    pub fn suggest_log_float(&mut self, name: &str, low: f64, high: f64) -> Result<f64> {
        self.suggest_float_inner(name, low, high, true)
    }

    fn suggest_float_inner(
        &mut self,
        name: &str,
        low: f64,
        high: f64,
        log_scale: bool,
    ) -> Result<f64> {
        if !(low <= high) {
            return Err(Error::InvalidBounds { low, high });
        }
        if log_scale && low <= 0.0 {
            return Err(Error::InvalidLogBounds);
        }

        let distribution = Distribution::Float(FloatDistribution {
            low,
            high,
            log_scale,
        });
        match self.suggest(name, distribution)? {
            ParamValue::Float(v) => Ok(v),
            _ => Err(Error::ParameterType {
                name: name.to_string(),
                expected: "float",
            }),
        }
    }

    /// Suggests an integer hyperparameter sampled uniformly from
    /// `[low, high]` (both inclusive).
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidBounds` if `low > high` and
    /// `Error::ParameterConflict` on a mismatched re-suggestion.
    #[allow(clippy::cast_precision_loss)]
    pub fn suggest_int(&mut self, name: &str, low: i64, high: i64) -> Result<i64> {
        if low > high {
            return Err(Error::InvalidBounds {
                low: low as f64,
                high: high as f64,
            });
        }

        let distribution = Distribution::Int(IntDistribution { low, high });
        match self.suggest(name, distribution)? {
            ParamValue::Int(v) => Ok(v),
            _ => Err(Error::ParameterType {
                name: name.to_string(),
                expected: "integer",
            }),
        }
    }

    /// Suggests a categorical hyperparameter, returning one of `choices`.
    ///
    /// The recorded value is the choice index, so the winning configuration
    /// can be reconstructed later from the same choices array.
    ///
    /// # Errors
    ///
    /// Returns `Error::EmptyChoices` if `choices` is empty and
    /// `Error::ParameterConflict` on a mismatched re-suggestion.
    pub fn suggest_categorical<T: Clone>(&mut self, name: &str, choices: &[T]) -> Result<T> {
        if choices.is_empty() {
            return Err(Error::EmptyChoices);
        }

        let distribution = Distribution::Categorical(CategoricalDistribution {
            n_choices: choices.len(),
        });
        match self.suggest(name, distribution)? {
            ParamValue::Categorical(idx) if idx < choices.len() => Ok(choices[idx].clone()),
            _ => Err(Error::ParameterType {
                name: name.to_string(),
                expected: "categorical",
            }),
        }
    }

    /// Shared suggestion path: cached re-suggestion, conflict detection,
    /// sampling, and storage.
    fn suggest(&mut self, name: &str, distribution: Distribution) -> Result<ParamValue> {
        if let Some(existing) = self.distributions.get(name) {
            if *existing == distribution {
                if let Some(value) = self.params.get(name) {
                    return Ok(value.clone());
                }
            }
            return Err(Error::ParameterConflict {
                name: name.to_string(),
                reason: "parameter was previously suggested with a different configuration or type"
                    .to_string(),
            });
        }

        let value = {
            let history = self.history.read();
            self.sampler
                .sample(name, &distribution, self.direction, self.id, &history)
        };

        self.distributions.insert(name.to_string(), distribution);
        self.params.insert(name.to_string(), value.clone());

        Ok(value)
    }

    /// Consumes the trial, producing an immutable record of it.
    pub(crate) fn into_completed(self, value: f64) -> CompletedTrial {
        CompletedTrial::new(self.id, self.params, self.distributions, value)
    }
}
