//! Orthant-wise limited-memory quasi-Newton (OWL-QN) minimization.
//!
//! OWL-QN minimizes `f(x) + C * ||x||₁` where `f` is smooth and `C ≥ 0`. It
//! extends L-BFGS to the non-differentiable L1 term by working one orthant at
//! a time: the direction is built from the pseudo-gradient, restricted to the
//! orthant it selects, and line search candidates are projected back onto
//! that orthant. Many coordinates end exactly at zero, which makes the method
//! the standard tool for large sparse models.
//!
//! # Algorithm Overview
//!
//! ```text
//! evaluate f(x₀) + C·||x₀||₁
//! for k = 1, 2, ...
//!     d ← −pseudo-gradient at x
//!     d ← two-loop recursion over the last m curvature pairs applied to d
//!     zero the coordinates of d that leave the chosen orthant
//!     backtrack along d with orthant projection until sufficient decrease
//!     stop when the termination criterion falls below the tolerance
//!     record (x_new − x, ∇f(x_new) − ∇f(x)) and move to x_new
//! ```
//!
//! # References
//!
//! - Andrew & Gao, "Scalable training of L1-regularized log-linear models"
//!   (ICML 2007)

use crate::{
    line_search::LineSearchParams,
    reporter::{NoOpReporter, ProgressReporter, RunInfo},
    state::OptimizerState,
    termination::{RelativeMeanImprovement, TerminationCriterion},
};
use num_traits::Float;
use owlqn_core::{
    cost_function::CostFunction,
    error::{OptimizerError, Result},
    types::{constants, DVector, Scalar},
    vector_ops,
};
use std::fmt;
use std::time::{Duration, Instant};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Configuration of an OWL-QN run.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OWLQNConfig<T: Scalar> {
    /// Weight of the L1 penalty (default: 1.0)
    pub l1_weight: T,
    /// Tolerance on the termination criterion (default: 1e-4)
    pub tolerance: T,
    /// Number of curvature pairs kept (default: 10)
    pub memory_size: usize,
    /// Suppress progress reporting (default: false)
    pub quiet: bool,
    /// Stop after this many iterations (default: unbounded)
    pub max_iterations: Option<usize>,
    /// Compare every directional derivative against a finite difference and
    /// log both (default: false)
    pub verify_directions: bool,
    /// Backtracking parameters
    pub line_search: LineSearchParams<T>,
}

impl<T: Scalar> Default for OWLQNConfig<T> {
    fn default() -> Self {
        Self {
            l1_weight: <T as Scalar>::from_f64(constants::DEFAULT_L1_WEIGHT),
            tolerance: constants::default_tolerance(),
            memory_size: constants::DEFAULT_MEMORY_SIZE,
            quiet: false,
            max_iterations: None,
            verify_directions: false,
            line_search: LineSearchParams::default(),
        }
    }
}

impl<T: Scalar> OWLQNConfig<T> {
    /// Creates a new configuration with default parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the L1 penalty weight.
    pub fn with_l1_weight(mut self, weight: T) -> Self {
        self.l1_weight = weight;
        self
    }

    /// Sets the termination tolerance.
    pub fn with_tolerance(mut self, tolerance: T) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Sets the number of curvature pairs kept.
    pub fn with_memory_size(mut self, size: usize) -> Self {
        self.memory_size = size;
        self
    }

    /// Suppresses or enables progress reporting.
    pub fn with_quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    /// Caps the number of iterations.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = Some(max_iterations);
        self
    }

    /// Enables the finite-difference check of every search direction.
    pub fn with_direction_verification(mut self) -> Self {
        self.verify_directions = true;
        self
    }

    /// Sets the backtracking parameters.
    pub fn with_line_search(mut self, params: LineSearchParams<T>) -> Self {
        self.line_search = params;
        self
    }

    /// Checks every parameter, reporting the first invalid one.
    pub fn validate(&self) -> Result<()> {
        if self.l1_weight < T::zero() || !<T as Float>::is_finite(self.l1_weight) {
            return Err(OptimizerError::invalid_configuration(
                "L1 weight must be finite and non-negative",
                "l1_weight",
                self.l1_weight.to_string(),
            ));
        }
        if !(self.tolerance > T::zero()) {
            return Err(OptimizerError::invalid_configuration(
                "tolerance must be positive",
                "tolerance",
                self.tolerance.to_string(),
            ));
        }
        if self.memory_size == 0 {
            return Err(OptimizerError::invalid_configuration(
                "memory size must be greater than zero",
                "memory_size",
                "0",
            ));
        }
        if self.max_iterations == Some(0) {
            return Err(OptimizerError::invalid_configuration(
                "iteration cap must be at least one",
                "max_iterations",
                "0",
            ));
        }
        self.line_search.validate()
    }
}

/// Why a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum TerminationReason {
    /// The termination criterion fell below the tolerance.
    Converged,
    /// No progress is possible: either the directional derivative along the
    /// new direction was exactly zero, or the accepted step left every
    /// coordinate unchanged.
    Stationary,
    /// The iteration cap was reached.
    MaxIterations,
}

/// Outcome of a completed run.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OptimizationResult<T: Scalar> {
    /// Final point
    pub point: DVector<T>,
    /// Regularized objective value at `point`
    pub value: T,
    /// Number of completed iterations
    pub iterations: usize,
    /// Number of objective evaluations
    pub function_evaluations: usize,
    /// Number of non-zero coordinates of `point`
    pub nonzero_weights: usize,
    /// Wall-clock time of the run
    pub duration: Duration,
    /// Why the run stopped
    pub termination_reason: TerminationReason,
    /// True unless the iteration cap stopped the run
    pub converged: bool,
}

/// OWL-QN optimizer.
///
/// The optimizer keeps its configuration, termination criterion and reporter
/// between runs; every call to [`OWLQN::minimize`] starts from fresh buffers
/// and an empty curvature history.
///
/// # Example
///
/// ```
/// use owlqn_core::cost_function::QuadraticCost;
/// use owlqn_core::types::DVector;
/// use owlqn_optim::{OWLQNConfig, OWLQN};
///
/// let cost = QuadraticCost::shifted(DVector::from_vec(vec![3.0_f64, -0.5]), 1.0);
/// let config = OWLQNConfig::new().with_l1_weight(1.0).with_quiet(true);
/// let mut optimizer = OWLQN::new(config);
///
/// let result = optimizer.minimize(&cost, &DVector::zeros(2)).unwrap();
/// assert!((result.point[0] - 2.0).abs() < 1e-3);
/// assert_eq!(result.point[1], 0.0);
/// ```
pub struct OWLQN<T: Scalar> {
    config: OWLQNConfig<T>,
    criterion: Box<dyn TerminationCriterion<T>>,
    reporter: Box<dyn ProgressReporter<T>>,
}

impl<T: Scalar> OWLQN<T> {
    /// Creates an optimizer with the relative mean improvement criterion and
    /// no reporter.
    pub fn new(config: OWLQNConfig<T>) -> Self {
        Self {
            config,
            criterion: Box::new(RelativeMeanImprovement::new()),
            reporter: Box::new(NoOpReporter),
        }
    }

    /// Creates an optimizer with the default configuration.
    pub fn with_default_config() -> Self {
        Self::new(OWLQNConfig::default())
    }

    /// Replaces the termination criterion.
    pub fn with_criterion(mut self, criterion: Box<dyn TerminationCriterion<T>>) -> Self {
        self.criterion = criterion;
        self
    }

    /// Replaces the progress reporter.
    pub fn with_reporter(mut self, reporter: Box<dyn ProgressReporter<T>>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Returns the configuration.
    pub fn config(&self) -> &OWLQNConfig<T> {
        &self.config
    }

    /// Returns the optimizer name.
    pub fn name(&self) -> &'static str {
        "OWL-QN"
    }

    /// Minimizes `function + l1_weight * ||x||₁` starting from `initial`.
    ///
    /// The returned point is the last point accepted by a line search, or
    /// `initial` when the first direction already shows stationarity.
    ///
    /// # Errors
    ///
    /// Returns [`OptimizerError::InvalidConfiguration`] for invalid settings,
    /// [`OptimizerError::NonDescentDirection`] when a search direction does not
    /// descend (usually a gradient inconsistent with the values), and any
    /// error raised by `function`.
    pub fn minimize<C>(&mut self, function: &C, initial: &DVector<T>) -> Result<OptimizationResult<T>>
    where
        C: CostFunction<T> + ?Sized,
    {
        let start = Instant::now();
        self.config.validate()?;

        let config = &self.config;
        let mut state = OptimizerState::new(function, initial, config.memory_size, config.l1_weight)?;
        let mut silent = NoOpReporter;
        let reporter: &mut dyn ProgressReporter<T> = if config.quiet {
            &mut silent
        } else {
            self.reporter.as_mut()
        };

        log::debug!(
            "starting OWL-QN on {} variables (l1 weight {}, memory {}, tolerance {})",
            state.dim(),
            config.l1_weight,
            config.memory_size,
            config.tolerance
        );
        reporter.on_start(&RunInfo {
            dim: state.dim(),
            l1_weight: config.l1_weight,
            memory_size: config.memory_size,
            tolerance: config.tolerance,
            initial_value: state.value(),
        });

        self.criterion.reset();
        self.criterion.evaluate(&state.snapshot());

        let mut stopped_before_search = false;
        let reason = loop {
            state.update_direction();

            if config.verify_directions {
                if let Some((numeric, analytic)) = state.numeric_directional_derivative()? {
                    log::debug!(
                        "iteration {}: numeric directional derivative {numeric}, analytic {analytic}",
                        state.iteration()
                    );
                }
            }

            if state.directional_derivative() == T::zero() {
                log::debug!("iteration {}: zero directional derivative", state.iteration());
                stopped_before_search = true;
                break TerminationReason::Stationary;
            }

            let outcome = state.line_search(&config.line_search)?;
            reporter.on_line_search(state.iteration(), &outcome);

            let signal = self.criterion.evaluate(&state.snapshot());
            reporter.on_iteration(state.iteration(), state.value(), &signal);

            if signal.value < config.tolerance {
                break TerminationReason::Converged;
            }
            if state.point() == state.last_point() {
                log::debug!("iteration {}: accepted step left the point unchanged", state.iteration());
                break TerminationReason::Stationary;
            }
            if config.max_iterations.is_some_and(|cap| state.iteration() >= cap) {
                break TerminationReason::MaxIterations;
            }

            state.shift();
        };

        // A zero directional derivative stops before the line search, leaving
        // the candidate buffers stale.
        let (point, iterations) = if stopped_before_search {
            (state.last_point().clone(), state.iteration() - 1)
        } else {
            (state.point().clone(), state.iteration())
        };
        let result = OptimizationResult {
            nonzero_weights: vector_ops::count_nonzero(&point),
            point,
            value: state.value(),
            iterations,
            function_evaluations: state.function_evaluations(),
            duration: start.elapsed(),
            termination_reason: reason,
            converged: reason != TerminationReason::MaxIterations,
        };

        log::debug!(
            "OWL-QN stopped after {} iterations ({:?}) with value {}",
            result.iterations,
            result.termination_reason,
            result.value
        );
        reporter.on_finish(&result);

        Ok(result)
    }
}

impl<T: Scalar> fmt::Debug for OWLQN<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OWLQN")
            .field("config", &self.config)
            .field("criterion", &self.criterion)
            .finish_non_exhaustive()
    }
}
