//! Binary logistic regression.
//!
//! Instances are stored row-compressed: `instance_starts[i]..instance_starts[i + 1]`
//! indexes the values of instance `i`, and for sparse problems the matching
//! feature indices. Labels are `true` for `+1` and `false` for `-1`.

use crate::{
    error::{DataError, Result},
    matrix_market::{self, MatrixMarket},
};
use owlqn_core::{
    cost_function::CostFunction,
    error::{OptimizerError, OptimizerResult},
    types::DVector,
};
use std::path::Path;

/// Scores beyond this magnitude use the asymptotes of the logistic loss.
const SATURATION: f64 = 30.0;

#[derive(Debug, Clone, PartialEq)]
enum Layout {
    Dense,
    Sparse { indices: Vec<usize> },
}

/// Labelled training instances for logistic regression.
#[derive(Debug, Clone, PartialEq)]
pub struct LogisticRegressionProblem {
    num_features: usize,
    instance_starts: Vec<usize>,
    layout: Layout,
    values: Vec<f64>,
    labels: Vec<bool>,
}

impl LogisticRegressionProblem {
    /// Empty problem whose instances list every feature.
    pub fn dense(num_features: usize) -> Self {
        Self::with_layout(num_features, Layout::Dense)
    }

    /// Empty problem whose instances list their non-zero features only.
    pub fn sparse(num_features: usize) -> Self {
        Self::with_layout(num_features, Layout::Sparse { indices: Vec::new() })
    }

    fn with_layout(num_features: usize, layout: Layout) -> Self {
        Self {
            num_features,
            instance_starts: vec![0],
            layout,
            values: Vec::new(),
            labels: Vec::new(),
        }
    }

    /// Loads features and labels from two Matrix Market files.
    ///
    /// The feature file may be in coordinate or array format; the label file
    /// must be an `n x 1` array of `1` and `-1` values.
    pub fn from_files<P: AsRef<Path>, Q: AsRef<Path>>(features: P, labels: Q) -> Result<Self> {
        let features = matrix_market::read_file(features)?;
        let labels = matrix_market::read_file(labels)?;
        Self::from_matrix_market(&features, &labels)
    }

    /// Builds a problem with one instance per row of `features`.
    pub fn from_matrix_market(features: &MatrixMarket, labels: &MatrixMarket) -> Result<Self> {
        features.validate()?;
        labels.validate()?;
        let labels = read_labels(labels, features.rows())?;

        let problem = match features {
            MatrixMarket::Coordinate {
                rows,
                cols,
                entries,
            } => {
                let mut by_row = vec![Vec::new(); *rows];
                for &(i, j, value) in entries {
                    by_row[i].push((j, value));
                }

                let mut problem = Self::sparse(*cols);
                for (row, label) in by_row.iter().zip(labels) {
                    let (indices, values): (Vec<usize>, Vec<f64>) = row.iter().copied().unzip();
                    problem.add_sparse_instance(&indices, &values, label)?;
                }
                problem
            }
            MatrixMarket::Array { rows, cols, values } => {
                let mut problem = Self::dense(*cols);
                let mut row = vec![0.0; *cols];
                for (i, label) in labels.into_iter().enumerate() {
                    for (j, slot) in row.iter_mut().enumerate() {
                        *slot = values[i + rows * j];
                    }
                    problem.add_dense_instance(&row, label)?;
                }
                problem
            }
        };

        log::info!(
            "loaded {} instances with {} features ({} stored values)",
            problem.num_instances(),
            problem.num_features(),
            problem.values.len()
        );
        Ok(problem)
    }

    /// Appends an instance listing every feature.
    pub fn add_dense_instance(&mut self, values: &[f64], label: bool) -> Result<()> {
        if !matches!(self.layout, Layout::Dense) {
            return Err(DataError::invalid_instance("dense instance added to a sparse problem"));
        }
        if values.len() != self.num_features {
            return Err(DataError::shape_mismatch("instance", self.num_features, values.len()));
        }

        self.values.extend_from_slice(values);
        self.finish_instance(label);
        Ok(())
    }

    /// Appends an instance given by its non-zero features.
    pub fn add_sparse_instance(&mut self, indices: &[usize], values: &[f64], label: bool) -> Result<()> {
        let num_features = self.num_features;
        let Layout::Sparse { indices: stored } = &mut self.layout else {
            return Err(DataError::invalid_instance("sparse instance added to a dense problem"));
        };
        if indices.len() != values.len() {
            return Err(DataError::shape_mismatch("instance values", indices.len(), values.len()));
        }
        if let Some(&index) = indices.iter().find(|&&index| index >= num_features) {
            return Err(DataError::invalid_instance(format!(
                "feature index {index} out of range for {num_features} features"
            )));
        }

        stored.extend_from_slice(indices);
        self.values.extend_from_slice(values);
        self.finish_instance(label);
        Ok(())
    }

    fn finish_instance(&mut self, label: bool) {
        self.instance_starts.push(self.values.len());
        self.labels.push(label);
    }

    /// Number of instances.
    pub fn num_instances(&self) -> usize {
        self.labels.len()
    }

    /// Number of features, the dimension of the weight vector.
    pub fn num_features(&self) -> usize {
        self.num_features
    }

    /// Label of instance `i`, `true` for `+1`.
    pub fn label(&self, i: usize) -> bool {
        self.labels[i]
    }

    fn features(&self, i: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        let range = self.instance_starts[i]..self.instance_starts[i + 1];
        let start = range.start;
        range.map(move |k| {
            let index = match &self.layout {
                Layout::Dense => k - start,
                Layout::Sparse { indices } => indices[k],
            };
            (index, self.values[k])
        })
    }

    /// Margin of instance `i`: `y_i * (w . x_i)`.
    pub fn score(&self, i: usize, weights: &DVector<f64>) -> f64 {
        let score: f64 = self.features(i).map(|(j, value)| weights[j] * value).sum();
        if self.labels[i] {
            score
        } else {
            -score
        }
    }

    /// Adds `-scale * y_i * x_i` to `target`.
    pub fn add_scaled_instance(&self, i: usize, scale: f64, target: &mut DVector<f64>) {
        let scale = if self.labels[i] { -scale } else { scale };
        for (j, value) in self.features(i) {
            target[j] += scale * value;
        }
    }
}

fn read_labels(labels: &MatrixMarket, num_instances: usize) -> Result<Vec<bool>> {
    let MatrixMarket::Array { rows, cols, values } = labels else {
        return Err(DataError::WrongFormat {
            what: "label file".to_string(),
            expected: "array".to_string(),
            found: labels.format_name().to_string(),
        });
    };
    if *rows != num_instances {
        return Err(DataError::shape_mismatch("labels", num_instances, rows));
    }
    if *cols != 1 {
        return Err(DataError::shape_mismatch("label columns", 1, cols));
    }

    values
        .iter()
        .map(|&value| {
            if value == 1.0 {
                Ok(true)
            } else if value == -1.0 {
                Ok(false)
            } else {
                Err(DataError::InvalidLabel { value })
            }
        })
        .collect()
}

/// Logistic loss over a problem, with an optional L2 penalty.
///
/// ```text
/// f(w) = 1 + l2/2 * ||w||² + Σ_i log(1 + exp(-y_i * w . x_i))
/// ```
///
/// The constant keeps the value away from zero, which the relative
/// improvement test divides by.
#[derive(Debug, Clone, Copy)]
pub struct LogisticRegressionObjective<'p> {
    problem: &'p LogisticRegressionProblem,
    l2_weight: f64,
}

impl<'p> LogisticRegressionObjective<'p> {
    /// Creates the objective. `l2_weight` is expected to be non-negative.
    pub fn new(problem: &'p LogisticRegressionProblem, l2_weight: f64) -> Self {
        Self { problem, l2_weight }
    }
}

impl CostFunction<f64> for LogisticRegressionObjective<'_> {
    fn cost_and_gradient(&self, point: &DVector<f64>, gradient: &mut DVector<f64>) -> OptimizerResult<f64> {
        let dim = self.problem.num_features();
        if point.len() != dim {
            return Err(OptimizerError::dimension_mismatch(dim, point.len()));
        }

        let mut loss = 1.0;
        for (g, &w) in gradient.iter_mut().zip(point.iter()) {
            loss += 0.5 * w * w * self.l2_weight;
            *g = self.l2_weight * w;
        }

        for i in 0..self.problem.num_instances() {
            let score = self.problem.score(i, point);
            let (instance_loss, probability) = if score < -SATURATION {
                (-score, 0.0)
            } else if score > SATURATION {
                (0.0, 1.0)
            } else {
                let temp = 1.0 + (-score).exp();
                (temp.ln(), 1.0 / temp)
            };

            loss += instance_loss;
            self.problem.add_scaled_instance(i, 1.0 - probability, gradient);
        }

        Ok(loss)
    }
}
