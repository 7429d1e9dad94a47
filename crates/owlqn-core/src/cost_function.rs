//! Objective collaborator interface.
//!
//! The optimizer only ever asks an objective for the value of its smooth
//! part and the gradient at a point. The L1 penalty is never part of the
//! collaborator; the optimizer adds it itself.
//!
//! # Design Philosophy
//!
//! - The gradient is written into a caller-provided buffer so the optimizer
//!   can reuse its working vectors for the whole run.
//! - Collaborators are borrowed, never owned: the optimizer holds a
//!   reference for the duration of one run and nothing longer.
//! - Finite-difference helpers are provided for checking hand-written
//!   gradients.

use crate::{
    error::{OptimizerError, Result},
    types::{DMatrix, DVector, Scalar},
    vector_ops,
};
use num_traits::Float;
use std::cell::Cell;
use std::fmt::Debug;

/// A differentiable objective: the smooth part of the loss.
pub trait CostFunction<T: Scalar>: Debug {
    /// Evaluates the loss at `point` and writes its gradient into `gradient`.
    ///
    /// `gradient` has the same length as `point`; its previous contents are
    /// unspecified and must be overwritten.
    fn cost_and_gradient(&self, point: &DVector<T>, gradient: &mut DVector<T>) -> Result<T>;

    /// Evaluates the loss only.
    ///
    /// The default implementation computes the gradient into a scratch
    /// buffer and discards it.
    fn cost(&self, point: &DVector<T>) -> Result<T> {
        let mut gradient = DVector::zeros(point.len());
        self.cost_and_gradient(point, &mut gradient)
    }

    /// Computes only the gradient, allocating the result.
    fn gradient(&self, point: &DVector<T>) -> Result<DVector<T>> {
        let mut gradient = DVector::zeros(point.len());
        self.cost_and_gradient(point, &mut gradient)?;
        Ok(gradient)
    }

    /// Approximates the gradient with central finite differences.
    fn gradient_fd(&self, point: &DVector<T>) -> Result<DVector<T>> {
        let n = point.len();
        let h = <T as Float>::sqrt(T::EPSILON);
        let mut gradient = DVector::zeros(n);
        let mut shifted = point.clone();

        for i in 0..n {
            let original = shifted[i];

            shifted[i] = original + h;
            let f_plus = self.cost(&shifted)?;
            shifted[i] = original - h;
            let f_minus = self.cost(&shifted)?;
            shifted[i] = original;

            gradient[i] = (f_plus - f_minus) / (h + h);
        }

        Ok(gradient)
    }
}

impl<T, C> CostFunction<T> for &C
where
    T: Scalar,
    C: CostFunction<T> + ?Sized,
{
    fn cost_and_gradient(&self, point: &DVector<T>, gradient: &mut DVector<T>) -> Result<T> {
        (**self).cost_and_gradient(point, gradient)
    }

    fn cost(&self, point: &DVector<T>) -> Result<T> {
        (**self).cost(point)
    }
}

/// A quadratic objective.
///
/// Computes f(x) = 0.5 * x^T * A * x + b^T * x + c
#[derive(Debug, Clone)]
pub struct QuadraticCost<T: Scalar> {
    /// The quadratic form matrix (should be symmetric)
    pub a: DMatrix<T>,
    /// The linear term
    pub b: DVector<T>,
    /// The constant term
    pub c: T,
}

impl<T: Scalar> QuadraticCost<T> {
    /// Creates a new quadratic cost function.
    pub fn new(a: DMatrix<T>, b: DVector<T>, c: T) -> Self {
        Self { a, b, c }
    }

    /// Creates the quadratic f(x) = 0.5 * ||x||^2.
    pub fn simple(dim: usize) -> Self {
        Self {
            a: DMatrix::identity(dim, dim),
            b: DVector::zeros(dim),
            c: T::zero(),
        }
    }

    /// Creates f(x) = 0.5 * ||x - center||^2 + offset.
    pub fn shifted(center: DVector<T>, offset: T) -> Self {
        let dim = center.len();
        let half = <T as Scalar>::from_f64(0.5);
        let c = offset + half * vector_ops::dot(&center, &center);
        Self {
            a: DMatrix::identity(dim, dim),
            b: -center,
            c,
        }
    }

    /// Creates the separable quadratic f(x) = 0.5 * Σ wᵢ xᵢ² + offset.
    pub fn diagonal(weights: DVector<T>, offset: T) -> Self {
        let dim = weights.len();
        Self {
            a: DMatrix::from_diagonal(&weights),
            b: DVector::zeros(dim),
            c: offset,
        }
    }

    /// Dimension of the domain.
    pub fn dim(&self) -> usize {
        self.b.len()
    }
}

impl<T: Scalar> CostFunction<T> for QuadraticCost<T> {
    fn cost_and_gradient(&self, point: &DVector<T>, gradient: &mut DVector<T>) -> Result<T> {
        if point.len() != self.dim() {
            return Err(OptimizerError::dimension_mismatch(self.dim(), point.len()));
        }

        let ax = &self.a * point;
        let half = <T as Scalar>::from_f64(0.5);
        let value = half * vector_ops::dot(point, &ax) + vector_ops::dot(&self.b, point) + self.c;

        gradient.copy_from(&ax);
        vector_ops::add(gradient, &self.b);
        Ok(value)
    }
}

/// Wrapper counting objective evaluations.
#[derive(Debug)]
pub struct CountingCostFunction<F> {
    /// The underlying cost function
    pub inner: F,
    evaluations: Cell<usize>,
}

impl<F> CountingCostFunction<F> {
    /// Creates a new counting wrapper around a cost function.
    pub fn new(inner: F) -> Self {
        Self {
            inner,
            evaluations: Cell::new(0),
        }
    }

    /// Number of evaluations since creation or the last reset.
    pub fn evaluations(&self) -> usize {
        self.evaluations.get()
    }

    /// Resets the counter to zero.
    pub fn reset_count(&self) {
        self.evaluations.set(0);
    }
}

impl<T, F> CostFunction<T> for CountingCostFunction<F>
where
    T: Scalar,
    F: CostFunction<T>,
{
    fn cost_and_gradient(&self, point: &DVector<T>, gradient: &mut DVector<T>) -> Result<T> {
        self.evaluations.set(self.evaluations.get() + 1);
        self.inner.cost_and_gradient(point, gradient)
    }
}

/// Utilities for checking gradient implementations.
pub struct DerivativeChecker;

impl DerivativeChecker {
    /// Checks if the gradient implementation matches finite differences.
    ///
    /// Returns `(passes, max_error)` where `max_error` is the largest
    /// component-wise deviation between the analytic and numeric gradients.
    pub fn check_gradient<T: Scalar>(
        cost_fn: &(impl CostFunction<T> + ?Sized),
        point: &DVector<T>,
        tol: T,
    ) -> Result<(bool, T)> {
        let analytical_grad = cost_fn.gradient(point)?;
        let fd_grad = cost_fn.gradient_fd(point)?;

        let max_error = analytical_grad
            .iter()
            .zip(fd_grad.iter())
            .map(|(&a, &f)| <T as Float>::abs(a - f))
            .fold(T::zero(), |a, b| <T as Float>::max(a, b));

        Ok((max_error < tol, max_error))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_quadratic_cost() {
        // f(x) = 0.5 * ||x||^2
        let cost = QuadraticCost::<f64>::simple(3);
        let point = DVector::from_vec(vec![1.0, 2.0, 3.0]);

        let mut gradient = DVector::zeros(3);
        let value = cost.cost_and_gradient(&point, &mut gradient).unwrap();
        assert_relative_eq!(value, 7.0);
        assert_relative_eq!(gradient, point);
    }

    #[test]
    fn test_quadratic_cost_general() {
        // f(x) = x1^2 + x2^2 + x1*x2 + 2*x1 + 3*x2 + 5
        let a = DMatrix::from_row_slice(2, 2, &[2.0, 1.0, 1.0, 2.0]);
        let b = DVector::from_vec(vec![2.0, 3.0]);
        let cost = QuadraticCost::new(a, b, 5.0);
        let point = DVector::from_vec(vec![1.0, -1.0]);

        assert_relative_eq!(cost.cost(&point).unwrap(), 5.0);

        let gradient = cost.gradient(&point).unwrap();
        assert_relative_eq!(gradient[0], 3.0);
        assert_relative_eq!(gradient[1], 2.0);
    }

    #[test]
    fn test_shifted_quadratic() {
        let center = DVector::from_vec(vec![2.0, -1.0]);
        let cost = QuadraticCost::shifted(center.clone(), 1.0);

        assert_relative_eq!(cost.cost(&center).unwrap(), 1.0);
        assert_relative_eq!(cost.gradient(&center).unwrap().norm(), 0.0);

        let origin = DVector::zeros(2);
        assert_relative_eq!(cost.cost(&origin).unwrap(), 3.5);
        assert_relative_eq!(cost.gradient(&origin).unwrap(), -center);
    }

    #[test]
    fn test_dimension_mismatch() {
        let cost = QuadraticCost::<f64>::simple(3);
        let err = cost.cost(&DVector::zeros(2)).unwrap_err();
        assert!(matches!(err, OptimizerError::DimensionMismatch { .. }));
    }

    #[test]
    fn test_finite_difference_gradient() {
        // f(x) = x1^2 + 2*x2^2
        let cost = QuadraticCost::diagonal(DVector::from_vec(vec![2.0, 4.0]), 0.0);
        let point = DVector::from_vec(vec![1.0, 2.0]);

        let fd_grad = cost.gradient_fd(&point).unwrap();
        assert_relative_eq!(fd_grad[0], 2.0, epsilon = 1e-6);
        assert_relative_eq!(fd_grad[1], 8.0, epsilon = 1e-6);
    }

    #[test]
    fn test_counting_cost_function() {
        let cost = CountingCostFunction::new(QuadraticCost::<f64>::simple(2));
        let point = DVector::from_vec(vec![1.0, 1.0]);
        assert_eq!(cost.evaluations(), 0);

        let _ = cost.cost(&point).unwrap();
        let _ = cost.gradient(&point).unwrap();
        assert_eq!(cost.evaluations(), 2);

        cost.reset_count();
        assert_eq!(cost.evaluations(), 0);
    }

    #[test]
    fn test_reference_forwards() {
        fn evaluate<C: CostFunction<f64>>(cost_fn: C, point: &DVector<f64>) -> f64 {
            cost_fn.cost(point).unwrap()
        }

        let cost = QuadraticCost::<f64>::simple(2);
        let borrowed: &dyn CostFunction<f64> = &cost;
        let point = DVector::from_vec(vec![3.0, 4.0]);
        assert_relative_eq!(evaluate(borrowed, &point), 12.5);
        assert_relative_eq!(evaluate(&cost, &point), 12.5);
    }

    #[test]
    fn test_derivative_checker_gradient() {
        let cost = QuadraticCost::<f64>::simple(3);
        let point = DVector::from_vec(vec![1.0, 2.0, 3.0]);

        let (passes, error) = DerivativeChecker::check_gradient(&cost, &point, 1e-6).unwrap();
        assert!(passes);
        assert!(error < 1e-6);
    }
}
