//! Error types for orthant-wise optimization.
//!
//! Every fatal condition of a run surfaces as an [`OptimizerError`]. Returning
//! the error aborts the run in progress; no partial iterate is reported.

use thiserror::Error;

/// Errors that can occur during optimization.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OptimizerError {
    /// Invalid optimizer configuration.
    ///
    /// This error occurs when the optimizer is configured with invalid
    /// parameters (e.g., a zero memory size or a negative L1 weight).
    #[error("Invalid optimizer configuration: {reason} ({parameter} = {value})")]
    InvalidConfiguration {
        /// Description of the configuration error
        reason: String,
        /// Name of the invalid parameter
        parameter: String,
        /// Value that was invalid
        value: String,
    },

    /// The search direction is not a descent direction.
    ///
    /// The directional derivative at the start of a line search was positive,
    /// which almost always means the objective returned a gradient that is
    /// inconsistent with its values.
    #[error(
        "Non-descent direction chosen at iteration {iteration} \
         (directional derivative {directional_derivative:e}): check your gradient"
    )]
    NonDescentDirection {
        /// Directional derivative of the regularized objective along the direction
        directional_derivative: f64,
        /// Iteration at which the direction was computed
        iteration: usize,
    },

    /// Dimension mismatch between vectors.
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimension
        expected: String,
        /// Actual dimension
        actual: String,
    },

    /// The objective collaborator failed to evaluate a point.
    #[error("Objective evaluation failed: {reason}")]
    EvaluationFailed {
        /// Description of the failure
        reason: String,
    },
}

impl OptimizerError {
    /// Create an InvalidConfiguration error.
    pub fn invalid_configuration<S1, S2, S3>(reason: S1, parameter: S2, value: S3) -> Self
    where
        S1: Into<String>,
        S2: Into<String>,
        S3: Into<String>,
    {
        Self::InvalidConfiguration {
            reason: reason.into(),
            parameter: parameter.into(),
            value: value.into(),
        }
    }

    /// Create a NonDescentDirection error.
    pub fn non_descent_direction(directional_derivative: f64, iteration: usize) -> Self {
        Self::NonDescentDirection {
            directional_derivative,
            iteration,
        }
    }

    /// Create a DimensionMismatch error.
    pub fn dimension_mismatch<S1, S2>(expected: S1, actual: S2) -> Self
    where
        S1: std::fmt::Display,
        S2: std::fmt::Display,
    {
        Self::DimensionMismatch {
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    /// Create an EvaluationFailed error.
    pub fn evaluation_failed<S: Into<String>>(reason: S) -> Self {
        Self::EvaluationFailed {
            reason: reason.into(),
        }
    }
}

/// Result type alias for optimizer operations.
pub type OptimizerResult<T> = std::result::Result<T, OptimizerError>;

/// Result type alias kept short for collaborator implementations.
pub type Result<T> = OptimizerResult<T>;
