//! OWL-QN: orthant-wise limited-memory quasi-Newton optimization.
//!
//! Minimizes `f(x) + C * ||x||₁` for a smooth, differentiable `f`, producing
//! sparse solutions with exact zeros. This crate re-exports the workspace:
//!
//! - [`owlqn_core`]: scalar trait, vector arithmetic, the [`CostFunction`]
//!   interface and error types
//! - [`owlqn_optim`]: the optimizer, its building blocks and progress reporters
//! - [`owlqn_models`]: logistic regression and least squares objectives with
//!   Matrix Market I/O (feature `models`, enabled by default)
//!
//! # Examples
//!
//! ```rust
//! use owlqn::prelude::*;
//!
//! let cost = QuadraticCost::shifted(DVector::from_vec(vec![2.0_f64, -0.5]), 1.0);
//! let mut optimizer = OWLQN::new(OWLQNConfig::new().with_l1_weight(1.0).with_quiet(true));
//! let result = optimizer.minimize(&cost, &DVector::zeros(2)).unwrap();
//!
//! assert_eq!(result.point[1], 0.0);
//! assert!((result.point[0] - 1.0).abs() < 1e-3);
//! ```

pub use nalgebra;
pub use owlqn_core;
#[cfg(feature = "models")]
pub use owlqn_models;
pub use owlqn_optim;

pub use owlqn_core::{
    cost_function::CostFunction,
    error::{OptimizerError, OptimizerResult},
};
pub use owlqn_optim::{OptimizationResult, TerminationReason, OWLQN, OWLQNConfig};

/// Commonly used items.
pub mod prelude {
    pub use owlqn_core::prelude::*;
    pub use owlqn_optim::{
        ConsoleReporter, LineSearchParams, LogReporter, NoOpReporter, OptimizationResult,
        ProgressReporter, RelativeMeanImprovement, TerminationCriterion, TerminationReason, OWLQN,
        OWLQNConfig,
    };

    #[cfg(feature = "models")]
    pub use owlqn_models::{
        DataError, LeastSquaresObjective, LeastSquaresProblem, LogisticRegressionObjective,
        LogisticRegressionProblem, MatrixMarket,
    };
}
