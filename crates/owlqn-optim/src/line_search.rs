//! Orthant-projected backtracking line search.
//!
//! Candidates are `x + α·dir` with every coordinate that would change sign
//! clamped to zero. The step is shrunk geometrically until the Armijo
//! sufficient-decrease condition holds against the unprojected directional
//! derivative.

use crate::state::OptimizerState;
use owlqn_core::{
    cost_function::CostFunction,
    error::{OptimizerError, Result},
    types::{constants, DVector, Scalar},
    vector_ops,
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Parameters of the backtracking search.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LineSearchParams<T: Scalar> {
    /// Sufficient-decrease constant of the Armijo condition
    pub c1: T,
    /// Step shrink factor from the second iteration on
    pub backoff: T,
    /// Step shrink factor on the first iteration
    pub first_iteration_backoff: T,
}

impl<T: Scalar> Default for LineSearchParams<T> {
    fn default() -> Self {
        Self {
            c1: constants::armijo_c1(),
            backoff: <T as Scalar>::from_f64(constants::DEFAULT_BACKOFF),
            first_iteration_backoff: <T as Scalar>::from_f64(constants::FIRST_ITERATION_BACKOFF),
        }
    }
}

impl<T: Scalar> LineSearchParams<T> {
    /// Checks that every parameter lies in the open unit interval.
    pub fn validate(&self) -> Result<()> {
        let unit = |value: T| value > T::zero() && value < T::one();
        if !unit(self.c1) {
            return Err(OptimizerError::invalid_configuration(
                "sufficient-decrease constant must lie in (0, 1)",
                "c1",
                self.c1.to_string(),
            ));
        }
        if !unit(self.backoff) {
            return Err(OptimizerError::invalid_configuration(
                "backoff must lie in (0, 1)",
                "backoff",
                self.backoff.to_string(),
            ));
        }
        if !unit(self.first_iteration_backoff) {
            return Err(OptimizerError::invalid_configuration(
                "first-iteration backoff must lie in (0, 1)",
                "first_iteration_backoff",
                self.first_iteration_backoff.to_string(),
            ));
        }
        Ok(())
    }
}

/// Summary of one completed line search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineSearchOutcome<T: Scalar> {
    /// Accepted step length
    pub step_size: T,
    /// Number of rejected candidates
    pub backtracks: usize,
    /// Directional derivative at the start point
    pub directional_derivative: T,
    /// Objective value before the search
    pub initial_value: T,
    /// Objective value at the accepted point
    pub final_value: T,
}

/// Writes `x + alpha * dir` into `new_x`, clamping to zero every coordinate
/// whose sign would flip relative to `x`.
///
/// Coordinates of `x` at zero may move freely. Nothing is clamped when the L1
/// weight is zero.
pub fn project_candidate<T: Scalar>(
    new_x: &mut DVector<T>,
    x: &DVector<T>,
    dir: &DVector<T>,
    alpha: T,
    l1_weight: T,
) {
    vector_ops::add_mult_into(new_x, x, dir, alpha);

    if l1_weight > T::zero() {
        for (candidate, &origin) in new_x.iter_mut().zip(x.iter()) {
            if origin * *candidate < T::zero() {
                *candidate = T::zero();
            }
        }
    }
}

impl<T, C> OptimizerState<'_, T, C>
where
    T: Scalar,
    C: CostFunction<T> + ?Sized,
{
    /// Runs the backtracking search along the current direction.
    ///
    /// On success the candidate point, its gradient and the stored value
    /// describe the accepted point. A directional derivative that is not
    /// strictly negative aborts the run with
    /// [`OptimizerError::NonDescentDirection`].
    pub fn line_search(&mut self, params: &LineSearchParams<T>) -> Result<LineSearchOutcome<T>> {
        let initial_value = self.value;
        let dir_deriv = self.directional_derivative();

        if !(dir_deriv < T::zero()) {
            return Err(OptimizerError::non_descent_direction(
                <T as Scalar>::try_to_f64(dir_deriv).unwrap_or(f64::NAN),
                self.iter,
            ));
        }

        let (mut alpha, backoff) = if self.iter == 1 {
            (T::one() / vector_ops::norm(&self.dir), params.first_iteration_backoff)
        } else {
            (T::one(), params.backoff)
        };

        let mut backtracks = 0;
        loop {
            project_candidate(&mut self.new_x, &self.x, &self.dir, alpha, self.l1_weight);
            self.value = self.eval_l1()?;

            if self.value <= initial_value + params.c1 * dir_deriv * alpha {
                break;
            }

            log::trace!(
                "iteration {}: step {alpha} rejected with value {}",
                self.iter,
                self.value
            );
            alpha *= backoff;
            backtracks += 1;
        }

        Ok(LineSearchOutcome {
            step_size: alpha,
            backtracks,
            directional_derivative: dir_deriv,
            initial_value,
            final_value: self.value,
        })
    }
}
