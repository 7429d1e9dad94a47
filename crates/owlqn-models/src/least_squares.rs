//! Linear least squares.

use crate::{
    error::{DataError, Result},
    matrix_market::{self, MatrixMarket},
};
use owlqn_core::{
    cost_function::CostFunction,
    error::{OptimizerError, OptimizerResult},
    types::{DMatrix, DVector},
};
use std::path::Path;

/// A dense design matrix `A` (`m x n`) with targets `b` (length `m`).
#[derive(Debug, Clone, PartialEq)]
pub struct LeastSquaresProblem {
    a: DMatrix<f64>,
    b: DVector<f64>,
}

impl LeastSquaresProblem {
    /// Creates a problem, checking that `b` has one target per row of `a`.
    pub fn new(a: DMatrix<f64>, b: DVector<f64>) -> Result<Self> {
        if a.nrows() != b.len() {
            return Err(DataError::shape_mismatch("targets", a.nrows(), b.len()));
        }
        Ok(Self { a, b })
    }

    /// Loads `A` and `b` from two Matrix Market files in array format.
    pub fn from_files<P: AsRef<Path>, Q: AsRef<Path>>(matrix: P, targets: Q) -> Result<Self> {
        let matrix = matrix_market::read_file(matrix)?;
        let targets = matrix_market::read_file(targets)?;
        Self::from_matrix_market(&matrix, &targets)
    }

    /// Builds a problem from parsed files. Both must be dense; `targets`
    /// must be a single column.
    pub fn from_matrix_market(matrix: &MatrixMarket, targets: &MatrixMarket) -> Result<Self> {
        require_array(matrix, "matrix file")?;
        require_array(targets, "target file")?;
        if targets.cols() != 1 {
            return Err(DataError::shape_mismatch("target columns", 1, targets.cols()));
        }

        let a = matrix.to_dense()?;
        let b = DVector::from_column_slice(targets.to_dense()?.as_slice());
        let problem = Self::new(a, b)?;
        log::info!(
            "loaded {} instances with {} features",
            problem.num_instances(),
            problem.num_features()
        );
        Ok(problem)
    }

    /// Number of rows of `A`.
    pub fn num_instances(&self) -> usize {
        self.a.nrows()
    }

    /// Number of columns of `A`, the dimension of the weight vector.
    pub fn num_features(&self) -> usize {
        self.a.ncols()
    }
}

fn require_array(matrix: &MatrixMarket, what: &str) -> Result<()> {
    match matrix {
        MatrixMarket::Array { .. } => Ok(()),
        MatrixMarket::Coordinate { .. } => Err(DataError::WrongFormat {
            what: what.to_string(),
            expected: "array".to_string(),
            found: matrix.format_name().to_string(),
        }),
    }
}

/// Squared residual with an optional L2 penalty.
///
/// ```text
/// f(w) = (l2 * ||w||² + ||A w - b||²) / 2 + 1
/// ```
#[derive(Debug, Clone, Copy)]
pub struct LeastSquaresObjective<'p> {
    problem: &'p LeastSquaresProblem,
    l2_weight: f64,
}

impl<'p> LeastSquaresObjective<'p> {
    /// Creates the objective. `l2_weight` is expected to be non-negative.
    pub fn new(problem: &'p LeastSquaresProblem, l2_weight: f64) -> Self {
        Self { problem, l2_weight }
    }
}

impl CostFunction<f64> for LeastSquaresObjective<'_> {
    fn cost_and_gradient(&self, point: &DVector<f64>, gradient: &mut DVector<f64>) -> OptimizerResult<f64> {
        let dim = self.problem.num_features();
        if point.len() != dim {
            return Err(OptimizerError::dimension_mismatch(dim, point.len()));
        }

        let residual = &self.problem.a * point - &self.problem.b;

        gradient.copy_from(point);
        *gradient *= self.l2_weight;
        gradient.gemv_tr(1.0, &self.problem.a, &residual, 1.0);

        let value = self.l2_weight * point.norm_squared() + residual.norm_squared();
        Ok(0.5 * value + 1.0)
    }
}
