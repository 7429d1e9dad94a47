//! Search direction of the orthant-wise method.
//!
//! A direction update runs three steps:
//!
//! 1. the steepest-descent direction of the regularized objective is the
//!    negated pseudo-gradient,
//! 2. the two-loop recursion maps it through the limited-memory inverse
//!    Hessian approximation,
//! 3. every coordinate whose sign disagrees with the steepest-descent
//!    direction is zeroed, so the step stays in the orthant the
//!    pseudo-gradient selected.
//!
//! The free functions implement the steps on plain vectors; the methods on
//! [`OptimizerState`] wire them to the state buffers.

use crate::{history::CurvatureHistory, state::OptimizerState};
use owlqn_core::{
    cost_function::CostFunction,
    error::Result,
    types::{constants, DVector, Scalar},
    vector_ops,
};

/// Writes the negated pseudo-gradient of `loss + l1_weight * ||x||₁` at `x`
/// into `dir`.
///
/// With a zero weight this is simply `-grad`. Otherwise each coordinate uses
/// the one-sided derivative pointing downhill, and zero when neither side
/// descends.
pub fn steepest_descent_direction<T: Scalar>(
    dir: &mut DVector<T>,
    x: &DVector<T>,
    grad: &DVector<T>,
    l1_weight: T,
) {
    debug_assert_eq!(dir.len(), x.len());
    debug_assert_eq!(grad.len(), x.len());

    if l1_weight == T::zero() {
        vector_ops::scale_into(dir, grad, -T::one());
        return;
    }

    for i in 0..x.len() {
        let xi = x[i];
        let gi = grad[i];
        dir[i] = if xi < T::zero() {
            -gi + l1_weight
        } else if xi > T::zero() {
            -gi - l1_weight
        } else if gi < -l1_weight {
            -gi - l1_weight
        } else if gi > l1_weight {
            -gi + l1_weight
        } else {
            T::zero()
        };
    }
}

/// Applies the two-loop recursion to `dir` in place.
///
/// `alphas` is scratch space with room for at least `history.len()`
/// coefficients. An empty history leaves `dir` untouched.
pub fn apply_inverse_hessian<T: Scalar>(
    dir: &mut DVector<T>,
    history: &CurvatureHistory<T>,
    alphas: &mut [T],
) {
    let count = history.len();
    if count == 0 {
        return;
    }
    debug_assert!(alphas.len() >= count);

    for i in (0..count).rev() {
        alphas[i] = -vector_ops::dot(history.s(i), dir) / history.rho(i);
        vector_ops::add_mult(dir, history.y(i), alphas[i]);
    }

    let newest = count - 1;
    let y = history.y(newest);
    vector_ops::scale(dir, history.rho(newest) / vector_ops::dot(y, y));

    for i in 0..count {
        let beta = vector_ops::dot(history.y(i), dir) / history.rho(i);
        vector_ops::add_mult(dir, history.s(i), -alphas[i] - beta);
    }
}

/// Zeroes every coordinate of `dir` whose sign disagrees with `steepest`.
///
/// Does nothing when the L1 weight is zero.
pub fn constrain_to_orthant<T: Scalar>(dir: &mut DVector<T>, steepest: &DVector<T>, l1_weight: T) {
    if l1_weight == T::zero() {
        return;
    }

    for (d, &s) in dir.iter_mut().zip(steepest.iter()) {
        if *d * s <= T::zero() {
            *d = T::zero();
        }
    }
}

/// Directional derivative of `loss + l1_weight * ||x||₁` at `x` along `dir`.
///
/// Coordinates with a zero direction contribute nothing. A coordinate sitting
/// at zero is charged the penalty slope in the direction it would move. Each
/// coordinate contributes `dirᵢ` times its one-sided slope, the same slope the
/// steepest-descent direction negates, so a direction that agrees in sign
/// with the steepest-descent direction always yields a negative sum.
pub fn directional_derivative<T: Scalar>(
    dir: &DVector<T>,
    x: &DVector<T>,
    grad: &DVector<T>,
    l1_weight: T,
) -> T {
    if l1_weight == T::zero() {
        return vector_ops::dot(dir, grad);
    }

    let mut total = T::zero();
    for i in 0..dir.len() {
        let di = dir[i];
        if di == T::zero() {
            continue;
        }
        let side = if x[i] == T::zero() { di } else { x[i] };
        let slope = if side < T::zero() {
            grad[i] - l1_weight
        } else {
            grad[i] + l1_weight
        };
        total += di * slope;
    }

    total
}

impl<T, C> OptimizerState<'_, T, C>
where
    T: Scalar,
    C: CostFunction<T> + ?Sized,
{
    /// Computes a new search direction from the current point.
    ///
    /// Afterwards [`OptimizerState::direction`] holds the orthant-constrained
    /// quasi-Newton direction and [`OptimizerState::pseudo_gradient`] the
    /// pseudo-gradient it was derived from.
    pub fn update_direction(&mut self) {
        steepest_descent_direction(&mut self.dir, &self.x, &self.grad, self.l1_weight);
        // Keep the steepest direction around for the sign fix.
        self.new_grad.copy_from(&self.dir);

        apply_inverse_hessian(&mut self.dir, &self.history, &mut self.alphas);
        constrain_to_orthant(&mut self.dir, &self.new_grad, self.l1_weight);

        // Stored negated, the buffer now reads as the pseudo-gradient.
        vector_ops::scale(&mut self.new_grad, -T::one());
    }

    /// Directional derivative of the regularized objective at the current
    /// point along the current direction.
    pub fn directional_derivative(&self) -> T {
        directional_derivative(&self.dir, &self.x, &self.grad, self.l1_weight)
    }

    /// Compares the analytic directional derivative against a one-sided
    /// finite difference along the current direction.
    ///
    /// Returns `(numeric, analytic)`, or `None` for a zero direction. The check
    /// overwrites the candidate point and gradient, so it must run between a
    /// direction update and the line search.
    pub fn numeric_directional_derivative(&mut self) -> Result<Option<(T, T)>> {
        let dir_norm = vector_ops::norm(&self.dir);
        if dir_norm == T::zero() {
            return Ok(None);
        }

        let step = <T as Scalar>::from_f64(constants::DIRECTION_CHECK_STEP) / dir_norm;
        let analytic = self.directional_derivative();

        crate::line_search::project_candidate(
            &mut self.new_x,
            &self.x,
            &self.dir,
            step,
            self.l1_weight,
        );
        let shifted_value = self.eval_l1()?;
        let numeric = (shifted_value - self.value) / step;

        Ok(Some((numeric, analytic)))
    }
}
