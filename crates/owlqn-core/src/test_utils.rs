//! Shared test objectives and helpers for tests and benchmarks.

#![cfg(any(test, feature = "test-utils"))]

use crate::{
    cost_function::CostFunction,
    error::{OptimizerError, Result},
    types::{DVector, Scalar},
};
use num_traits::Float;

/// Extended Rosenbrock function plus a constant offset.
///
/// f(x) = offset + Σ (1 - xᵢ)² + 100 (xᵢ₊₁ - xᵢ²)²
#[derive(Debug, Clone)]
pub struct RosenbrockCost {
    dim: usize,
    offset: f64,
}

impl RosenbrockCost {
    /// Creates the function on `dim ≥ 2` variables.
    pub fn new(dim: usize, offset: f64) -> Self {
        Self { dim, offset }
    }
}

impl CostFunction<f64> for RosenbrockCost {
    fn cost_and_gradient(&self, x: &DVector<f64>, gradient: &mut DVector<f64>) -> Result<f64> {
        if x.len() != self.dim {
            return Err(OptimizerError::dimension_mismatch(self.dim, x.len()));
        }

        let mut cost = self.offset;
        gradient.fill(0.0);

        for i in 0..self.dim - 1 {
            let a = 1.0 - x[i];
            let b = x[i + 1] - x[i] * x[i];
            cost += a * a + 100.0 * b * b;

            gradient[i] += -2.0 * a - 400.0 * x[i] * b;
            gradient[i + 1] += 200.0 * b;
        }

        Ok(cost)
    }
}

/// Closed-form minimizer of `0.5 * ||x - center||² + weight * ||x||₁`.
pub fn soft_threshold<T: Scalar>(center: &DVector<T>, weight: T) -> DVector<T> {
    center.map(|c| {
        let magnitude = <T as Float>::abs(c) - weight;
        if magnitude <= T::zero() {
            T::zero()
        } else {
            <T as Float>::signum(c) * magnitude
        }
    })
}

/// True when every nonzero coordinate of `direction` has the same sign as
/// the corresponding coordinate of `reference`.
pub fn same_orthant<T: Scalar>(direction: &DVector<T>, reference: &DVector<T>) -> bool {
    direction
        .iter()
        .zip(reference.iter())
        .all(|(&d, &r)| d == T::zero() || d * r > T::zero())
}

/// True when no coordinate of `candidate` has a strictly opposite sign to
/// the same coordinate of `origin`.
pub fn never_crosses_zero<T: Scalar>(origin: &DVector<T>, candidate: &DVector<T>) -> bool {
    origin
        .iter()
        .zip(candidate.iter())
        .all(|(&o, &c)| o * c >= T::zero())
}
