//! Termination criteria for orthant-wise runs.
//!
//! A criterion inspects the state after every line search and returns a
//! scalar together with a short status string. The driver stops as soon as
//! the scalar drops below the configured tolerance, so a criterion that is
//! not ready to judge yet returns infinity.

use crate::state::StateSnapshot;
use num_traits::Float;
use owlqn_core::{
    error::{OptimizerError, Result},
    types::{constants, Scalar},
};
use std::collections::VecDeque;
use std::fmt::Debug;

/// Value and status text reported by a criterion.
#[derive(Debug, Clone, PartialEq)]
pub struct TerminationSignal<T: Scalar> {
    /// Quantity compared against the tolerance
    pub value: T,
    /// Human-readable status, shown in progress output
    pub status: String,
}

impl<T: Scalar> TerminationSignal<T> {
    /// Signal that never triggers termination.
    pub fn not_ready(status: impl Into<String>) -> Self {
        Self {
            value: <T as Float>::infinity(),
            status: status.into(),
        }
    }
}

/// Pluggable stopping rule.
pub trait TerminationCriterion<T: Scalar>: Debug {
    /// Examines the state after a line search.
    fn evaluate(&mut self, state: &StateSnapshot<'_, T>) -> TerminationSignal<T>;

    /// Forgets anything recorded by a previous run.
    fn reset(&mut self) {}
}

/// Relative improvement of the objective averaged over a sliding window.
///
/// With `v₀` the oldest value in the window, `n` the number of values in it
/// and `v` the current value, the criterion is `(v₀ - v) / n / |v|`. Until
/// more than `min_history` values have been recorded it reports infinity.
#[derive(Debug, Clone)]
pub struct RelativeMeanImprovement<T: Scalar> {
    min_history: usize,
    window: usize,
    previous: VecDeque<T>,
}

impl<T: Scalar> Default for RelativeMeanImprovement<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Scalar> RelativeMeanImprovement<T> {
    /// Creates the criterion with a window of 10 values, judging once more
    /// than 5 have been seen.
    pub fn new() -> Self {
        Self {
            min_history: constants::MIN_IMPROVEMENT_HISTORY,
            window: constants::IMPROVEMENT_WINDOW,
            previous: VecDeque::with_capacity(constants::IMPROVEMENT_WINDOW),
        }
    }

    /// Creates the criterion with custom window sizes.
    ///
    /// `window` must exceed `min_history`.
    pub fn with_window(min_history: usize, window: usize) -> Result<Self> {
        if window <= min_history {
            return Err(OptimizerError::invalid_configuration(
                "improvement window must be larger than the minimum history",
                "window",
                window.to_string(),
            ));
        }
        Ok(Self {
            min_history,
            window,
            previous: VecDeque::with_capacity(window),
        })
    }

    /// Number of values currently held.
    pub fn len(&self) -> usize {
        self.previous.len()
    }

    /// True when no value has been recorded.
    pub fn is_empty(&self) -> bool {
        self.previous.is_empty()
    }
}

impl<T: Scalar> TerminationCriterion<T> for RelativeMeanImprovement<T> {
    fn evaluate(&mut self, state: &StateSnapshot<'_, T>) -> TerminationSignal<T> {
        let current = state.value;

        let signal = if self.previous.len() > self.min_history {
            if self.previous.len() >= self.window {
                self.previous.pop_front();
            }
            let oldest = self.previous.front().copied().unwrap_or(current);
            let count = <T as Scalar>::from_usize(self.previous.len());
            let improvement = (oldest - current) / count / <T as Float>::abs(current);

            TerminationSignal {
                value: improvement,
                status: format!("({:.3e})", <T as Scalar>::try_to_f64(improvement).unwrap_or(f64::NAN)),
            }
        } else {
            TerminationSignal::not_ready(format!("(wait for {} iters)", self.min_history))
        };

        self.previous.push_back(current);
        signal
    }

    fn reset(&mut self) {
        self.previous.clear();
    }
}
