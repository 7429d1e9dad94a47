//! Objective collaborators for OWL-QN.
//!
//! Two smooth losses over training data read from Matrix Market files:
//!
//! - [`logistic`]: binary logistic regression over dense or sparse instances
//! - [`least_squares`]: linear least squares over a dense design matrix
//!
//! Both accept an optional L2 weight and implement
//! [`owlqn_core::cost_function::CostFunction`], so the L1 penalty stays with
//! the optimizer.
//!
//! # Examples
//!
//! ```rust
//! use owlqn_core::cost_function::CostFunction;
//! use owlqn_core::types::DVector;
//! use owlqn_models::{LogisticRegressionObjective, LogisticRegressionProblem};
//!
//! let mut problem = LogisticRegressionProblem::dense(2);
//! problem.add_dense_instance(&[1.0, 0.5], true).unwrap();
//! problem.add_dense_instance(&[-1.0, 0.0], false).unwrap();
//!
//! let objective = LogisticRegressionObjective::new(&problem, 0.0);
//! let value = objective.cost(&DVector::zeros(2)).unwrap();
//! assert!((value - (1.0 + 2.0 * 2f64.ln())).abs() < 1e-12);
//! ```

pub mod error;
pub mod least_squares;
pub mod logistic;
pub mod matrix_market;

pub use error::DataError;
pub use least_squares::{LeastSquaresObjective, LeastSquaresProblem};
pub use logistic::{LogisticRegressionObjective, LogisticRegressionProblem};
pub use matrix_market::MatrixMarket;
