//! Type definitions and aliases for orthant-wise optimization.
//!
//! This module provides the scalar trait shared by every algorithm in the
//! workspace, vector aliases, and the numerical constants of the method.

use nalgebra::{Dyn, OMatrix, OVector, RealField, Scalar as NalgebraScalar};
use num_traits::{Float, FromPrimitive};
use std::fmt::{Debug, Display};

/// Trait for scalar types used in optimization (f32 or f64).
///
/// This trait combines all the necessary numeric traits required
/// by the optimizer and the objective collaborators.
pub trait Scalar:
    NalgebraScalar
    + RealField
    + Float
    + FromPrimitive
    + Display
    + Debug
    + Default
    + Copy
    + Send
    + Sync
    + 'static
{
    /// Machine epsilon for this scalar type.
    const EPSILON: Self;

    /// Default tolerance on the relative mean improvement.
    const DEFAULT_TOLERANCE: Self;

    /// Convert from f64 (for constants).
    ///
    /// # Panics
    ///
    /// Panics if the conversion fails. Use `try_from_f64` for a non-panicking version.
    fn from_f64(v: f64) -> Self {
        <Self as FromPrimitive>::from_f64(v).expect("Failed to convert from f64")
    }

    /// Try to convert from f64.
    ///
    /// Returns None if the conversion fails.
    fn try_from_f64(v: f64) -> Option<Self> {
        <Self as FromPrimitive>::from_f64(v)
    }

    /// Convert to f64 (for logging/display).
    ///
    /// # Panics
    ///
    /// Panics if the conversion fails. Use `try_to_f64` for a non-panicking version.
    fn to_f64(self) -> f64 {
        num_traits::cast(self).expect("Failed to convert to f64")
    }

    /// Try to convert to f64.
    fn try_to_f64(self) -> Option<f64> {
        num_traits::cast(self)
    }

    /// Convert from usize (for window sizes and counts).
    ///
    /// # Panics
    ///
    /// Panics if the conversion fails.
    fn from_usize(v: usize) -> Self {
        <Self as FromPrimitive>::from_usize(v).expect("Failed to convert from usize")
    }
}

impl Scalar for f32 {
    const EPSILON: Self = f32::EPSILON;
    const DEFAULT_TOLERANCE: Self = 1e-4;
}

impl Scalar for f64 {
    const EPSILON: Self = f64::EPSILON;
    const DEFAULT_TOLERANCE: Self = 1e-4;
}

/// Type alias for a dynamically-sized vector.
pub type DVector<T> = OVector<T, Dyn>;

/// Type alias for a dynamically-sized matrix.
pub type DMatrix<T> = OMatrix<T, Dyn, Dyn>;

/// Numerical constants of the orthant-wise method.
pub mod constants {
    use super::Scalar;

    /// Armijo sufficient-decrease parameter c₁.
    pub const ARMIJO_C1: f64 = 1e-4;

    /// Step reduction factor applied after a rejected trial step.
    pub const DEFAULT_BACKOFF: f64 = 0.5;

    /// Step reduction factor used on the first iteration, before any
    /// curvature information exists.
    pub const FIRST_ITERATION_BACKOFF: f64 = 0.1;

    /// Default number of curvature pairs kept in memory.
    pub const DEFAULT_MEMORY_SIZE: usize = 10;

    /// Default L1 regularization weight.
    pub const DEFAULT_L1_WEIGHT: f64 = 1.0;

    /// Number of objective values the termination monitor must have seen
    /// before it reports a finite signal.
    pub const MIN_IMPROVEMENT_HISTORY: usize = 5;

    /// Capacity of the termination monitor's sliding window.
    pub const IMPROVEMENT_WINDOW: usize = 10;

    /// Relative step of the numeric directional derivative check.
    pub const DIRECTION_CHECK_STEP: f64 = 1.05e-8;

    /// Get default convergence tolerance.
    pub fn default_tolerance<T: Scalar>() -> T {
        T::DEFAULT_TOLERANCE
    }

    /// Armijo parameter converted to `T`.
    pub fn armijo_c1<T: Scalar>() -> T {
        <T as Scalar>::from_f64(ARMIJO_C1)
    }
}
