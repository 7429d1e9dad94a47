//! Mutable state of a single orthant-wise run.
//!
//! The state owns every buffer the iteration touches: the accepted point and
//! its gradient, the candidate point and its gradient, the search direction,
//! the curvature history and the scratch coefficients of the two-loop
//! recursion. Buffers are allocated once at construction and reused.
//!
//! The direction update lives in [`crate::direction`] and the line search in
//! [`crate::line_search`]; both are methods on [`OptimizerState`].

use crate::history::CurvatureHistory;
use owlqn_core::{
    cost_function::CostFunction,
    error::{OptimizerError, Result},
    types::{DVector, Scalar},
    vector_ops,
};
use num_traits::Float;
use std::fmt;

/// Read-only view of the state after a line search, handed to termination
/// criteria.
#[derive(Debug, Clone, Copy)]
pub struct StateSnapshot<'s, T: Scalar> {
    /// Point accepted by the latest line search
    pub point: &'s DVector<T>,
    /// Point the latest line search started from
    pub last_point: &'s DVector<T>,
    /// Smooth-loss gradient at `point`
    pub gradient: &'s DVector<T>,
    /// Smooth-loss gradient at `last_point`
    pub last_gradient: &'s DVector<T>,
    /// Direction of the latest line search
    pub direction: &'s DVector<T>,
    /// Regularized objective value at `point`
    pub value: T,
    /// Iteration counter, starting at 1
    pub iteration: usize,
}

/// Buffers and counters of an orthant-wise quasi-Newton run.
pub struct OptimizerState<'a, T: Scalar, C: CostFunction<T> + ?Sized> {
    pub(crate) x: DVector<T>,
    pub(crate) grad: DVector<T>,
    pub(crate) new_x: DVector<T>,
    /// Gradient at `new_x`. Between the direction update and the line search
    /// it holds the pseudo-gradient at `x` instead.
    pub(crate) new_grad: DVector<T>,
    pub(crate) dir: DVector<T>,
    pub(crate) history: CurvatureHistory<T>,
    pub(crate) alphas: Vec<T>,
    pub(crate) value: T,
    pub(crate) iter: usize,
    pub(crate) l1_weight: T,
    function: &'a C,
    evaluations: usize,
}

impl<'a, T, C> OptimizerState<'a, T, C>
where
    T: Scalar,
    C: CostFunction<T> + ?Sized,
{
    /// Creates the state at `initial` and evaluates the regularized objective
    /// there once.
    pub fn new(function: &'a C, initial: &DVector<T>, memory_size: usize, l1_weight: T) -> Result<Self> {
        if memory_size == 0 {
            return Err(OptimizerError::invalid_configuration(
                "memory size must be greater than zero",
                "memory_size",
                "0",
            ));
        }
        if l1_weight < T::zero() || !<T as Float>::is_finite(l1_weight) {
            return Err(OptimizerError::invalid_configuration(
                "L1 weight must be finite and non-negative",
                "l1_weight",
                l1_weight.to_string(),
            ));
        }

        let dim = initial.len();
        let mut state = Self {
            x: initial.clone(),
            grad: DVector::zeros(dim),
            new_x: initial.clone(),
            new_grad: DVector::zeros(dim),
            dir: DVector::zeros(dim),
            history: CurvatureHistory::new(memory_size, dim),
            alphas: vec![T::zero(); memory_size],
            value: T::zero(),
            iter: 1,
            l1_weight,
            function,
            evaluations: 0,
        };

        state.value = state.eval_l1()?;
        state.grad.copy_from(&state.new_grad);

        Ok(state)
    }

    /// Evaluates the regularized objective at `new_x`, storing the smooth-loss
    /// gradient into `new_grad`.
    pub(crate) fn eval_l1(&mut self) -> Result<T> {
        let smooth = self.function.cost_and_gradient(&self.new_x, &mut self.new_grad)?;
        self.evaluations += 1;

        if self.new_grad.len() != self.new_x.len() {
            return Err(OptimizerError::dimension_mismatch(
                self.new_x.len(),
                self.new_grad.len(),
            ));
        }

        if self.l1_weight > T::zero() {
            Ok(smooth + self.l1_weight * vector_ops::l1_norm(&self.new_x))
        } else {
            Ok(smooth)
        }
    }

    /// Records the curvature pair of the accepted step and makes the candidate
    /// the current point.
    pub fn shift(&mut self) {
        match self.history.record(&self.new_x, &self.x, &self.new_grad, &self.grad) {
            Some(rho) if rho <= T::zero() => {
                log::debug!("non-positive curvature s·y = {rho} recorded at iteration {}", self.iter);
            }
            Some(_) => {}
            None => log::warn!("curvature history unavailable; continuing with steepest descent"),
        }

        std::mem::swap(&mut self.x, &mut self.new_x);
        std::mem::swap(&mut self.grad, &mut self.new_grad);
        self.iter += 1;
    }

    /// Candidate point: after a line search, the newly accepted point.
    pub fn point(&self) -> &DVector<T> {
        &self.new_x
    }

    /// Point the current iteration started from.
    pub fn last_point(&self) -> &DVector<T> {
        &self.x
    }

    /// Smooth-loss gradient at [`Self::point`], valid after a line search.
    pub fn gradient(&self) -> &DVector<T> {
        &self.new_grad
    }

    /// Smooth-loss gradient at [`Self::last_point`].
    pub fn last_gradient(&self) -> &DVector<T> {
        &self.grad
    }

    /// Pseudo-gradient at [`Self::last_point`], valid between a direction
    /// update and the following line search.
    pub fn pseudo_gradient(&self) -> &DVector<T> {
        &self.new_grad
    }

    /// Latest search direction.
    pub fn direction(&self) -> &DVector<T> {
        &self.dir
    }

    /// Regularized objective value at the most recently accepted point.
    pub fn value(&self) -> T {
        self.value
    }

    /// Iteration counter, starting at 1.
    pub fn iteration(&self) -> usize {
        self.iter
    }

    /// Problem dimension.
    pub fn dim(&self) -> usize {
        self.x.len()
    }

    /// L1 regularization weight.
    pub fn l1_weight(&self) -> T {
        self.l1_weight
    }

    /// Curvature history.
    pub fn history(&self) -> &CurvatureHistory<T> {
        &self.history
    }

    /// Number of objective evaluations so far.
    pub fn function_evaluations(&self) -> usize {
        self.evaluations
    }

    /// Snapshot of the state for termination criteria.
    pub fn snapshot(&self) -> StateSnapshot<'_, T> {
        StateSnapshot {
            point: &self.new_x,
            last_point: &self.x,
            gradient: &self.new_grad,
            last_gradient: &self.grad,
            direction: &self.dir,
            value: self.value,
            iteration: self.iter,
        }
    }
}

impl<T, C> fmt::Debug for OptimizerState<'_, T, C>
where
    T: Scalar,
    C: CostFunction<T> + ?Sized,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OptimizerState")
            .field("dim", &self.dim())
            .field("iteration", &self.iter)
            .field("value", &self.value)
            .field("l1_weight", &self.l1_weight)
            .field("history_len", &self.history.len())
            .field("evaluations", &self.evaluations)
            .finish_non_exhaustive()
    }
}
