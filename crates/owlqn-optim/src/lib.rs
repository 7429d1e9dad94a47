//! OWL-QN Optimization - L1-regularized limited-memory quasi-Newton minimization.
//!
//! This crate minimizes objectives of the form `f(x) + C * ||x||₁` where `f`
//! is smooth, using the orthant-wise limited-memory quasi-Newton method. The
//! smooth part is supplied through [`owlqn_core::cost_function::CostFunction`];
//! the optimizer adds the L1 term itself.
//!
//! # Building Blocks
//!
//! - **History**: ring buffer of the last `m` curvature pairs
//! - **Direction**: pseudo-gradient, two-loop recursion and orthant sign fix
//! - **Line search**: orthant-projected backtracking with the Armijo condition
//! - **Termination**: pluggable criteria, relative mean improvement by default
//! - **Reporters**: progress hooks, including the classic console table
//!
//! # Examples
//!
//! ```rust
//! use owlqn_core::cost_function::QuadraticCost;
//! use owlqn_core::types::DVector;
//! use owlqn_optim::{OWLQN, OWLQNConfig, TerminationReason};
//!
//! // 0.5 * ||x - (5, 2, -4)||² + 1, penalized with weight 3
//! let cost = QuadraticCost::shifted(DVector::from_vec(vec![5.0, 2.0, -4.0]), 1.0);
//! let mut optimizer = OWLQN::new(
//!     OWLQNConfig::new()
//!         .with_l1_weight(3.0)
//!         .with_tolerance(1e-8)
//!         .with_quiet(true)
//! );
//!
//! let result = optimizer.minimize(&cost, &DVector::zeros(3)).unwrap();
//! assert_ne!(result.termination_reason, TerminationReason::MaxIterations);
//! assert_eq!(result.point[1], 0.0);
//! ```

pub mod direction;
pub mod history;
pub mod line_search;
pub mod owlqn;
pub mod reporter;
pub mod state;
pub mod termination;

// Re-export main types for convenience
pub use history::CurvatureHistory;
pub use line_search::{LineSearchOutcome, LineSearchParams};
pub use owlqn::{OptimizationResult, TerminationReason, OWLQN, OWLQNConfig};
pub use reporter::{ConsoleReporter, LogReporter, NoOpReporter, ProgressReporter, RunInfo};
pub use state::{OptimizerState, StateSnapshot};
pub use termination::{RelativeMeanImprovement, TerminationCriterion, TerminationSignal};
