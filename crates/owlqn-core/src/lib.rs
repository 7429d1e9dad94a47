//! Core traits and types for orthant-wise quasi-Newton optimization.
//!
//! This crate provides the foundations shared by the optimizer and the
//! objective collaborators: the scalar trait, vector arithmetic, the
//! differentiable objective interface and the error types.
//!
//! # Key Concepts
//!
//! - **Objective collaborator**: a smooth loss that reports its value and
//!   gradient at a point; the L1 penalty is added by the optimizer
//! - **Vector arithmetic**: in-place operations on fixed-length vectors that
//!   the optimizer uses for every update
//!
//! # Modules
//!
//! - [`cost_function`]: Objective interface and derivative checks
//! - [`error`]: Error types for optimization runs
//! - [`types`]: Scalar trait, vector aliases and numerical constants
//! - [`vector_ops`]: Elementary vector arithmetic

pub mod cost_function;
pub mod error;
pub mod types;
pub mod vector_ops;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

// Re-export commonly used items at the crate root
pub use error::{OptimizerError, OptimizerResult, Result};

/// Prelude module for convenient imports.
///
/// # Example
/// ```
/// use owlqn_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::cost_function::{
        CostFunction, CountingCostFunction, DerivativeChecker, QuadraticCost,
    };
    pub use crate::error::{OptimizerError, OptimizerResult, Result};
    pub use crate::types::{constants, DMatrix, DVector, Scalar};
    pub use crate::vector_ops;
}
