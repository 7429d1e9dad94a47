//! OWL-QN trainer
//!
//! Fits L1-regularized logistic regression (or least squares) to data in
//! Matrix Market files and writes the learned weights.

use anyhow::{Context, Result};
use clap::Parser;
use owlqn_core::{cost_function::CostFunction, types::DVector};
use owlqn_models::{
    matrix_market, LeastSquaresObjective, LeastSquaresProblem, LogisticRegressionObjective,
    LogisticRegressionProblem,
};
use owlqn_optim::{ConsoleReporter, OWLQNConfig, OWLQN};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "owlqn")]
#[command(about = "Train L1-regularized logistic regression or least squares with OWL-QN")]
#[command(version)]
struct Cli {
    /// Feature matrix in Matrix Market format (coordinate or array; array only with --least-squares)
    feature_file: PathBuf,

    /// Labels (1 or -1), or targets with --least-squares, as an n x 1 Matrix Market array
    label_file: PathBuf,

    /// Weight of the L1 regularizer; larger values give sparser weights
    #[arg(allow_negative_numbers = true)]
    reg_weight: f64,

    /// Output file for the learned weights (Matrix Market array)
    output_file: PathBuf,

    /// Fit least squares instead of logistic regression
    #[arg(long)]
    least_squares: bool,

    /// Suppress the progress table and summary
    #[arg(short, long)]
    quiet: bool,

    /// Convergence tolerance on the mean relative improvement
    #[arg(long, default_value = "1e-4", allow_negative_numbers = true)]
    tol: f64,

    /// Number of curvature pairs kept by the quasi-Newton approximation
    #[arg(short, long, default_value = "10")]
    memory: usize,

    /// Weight of an additional L2 regularizer
    #[arg(long, default_value = "0", allow_negative_numbers = true)]
    l2_weight: f64,

    /// Stop after this many iterations even if not converged
    #[arg(long)]
    max_iterations: Option<usize>,

    /// Log verbosity level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: tracing::Level,
}

impl Cli {
    fn validate(&self) -> Result<()> {
        if self.reg_weight.is_nan() || self.reg_weight < 0.0 {
            anyhow::bail!("L1 regularization weight must be non-negative, got {}", self.reg_weight);
        }
        if self.tol.is_nan() || self.tol <= 0.0 {
            anyhow::bail!("--tol (convergence tolerance) must be positive, got {}", self.tol);
        }
        if self.l2_weight.is_nan() || self.l2_weight < 0.0 {
            anyhow::bail!("--l2-weight must be non-negative, got {}", self.l2_weight);
        }
        if self.memory == 0 {
            anyhow::bail!("--memory (L-BFGS memory parameter) must be positive");
        }
        Ok(())
    }

    fn config(&self) -> OWLQNConfig<f64> {
        let config = OWLQNConfig::new()
            .with_l1_weight(self.reg_weight)
            .with_tolerance(self.tol)
            .with_memory_size(self.memory)
            .with_quiet(self.quiet);
        match self.max_iterations {
            Some(cap) => config.with_max_iterations(cap),
            None => config,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(cli.log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    cli.validate()?;

    if !cli.quiet {
        let mut args = std::env::args();
        let program = args.next().unwrap_or_else(|| "owlqn".to_string());
        println!("{program} called with arguments");
        println!("   {}", args.collect::<Vec<_>>().join(" "));
    }

    let weights = if cli.least_squares {
        let problem = LeastSquaresProblem::from_files(&cli.feature_file, &cli.label_file)
            .context("failed to load least squares problem")?;
        train(&LeastSquaresObjective::new(&problem, cli.l2_weight), problem.num_features(), &cli)?
    } else {
        let problem = LogisticRegressionProblem::from_files(&cli.feature_file, &cli.label_file)
            .context("failed to load logistic regression problem")?;
        train(
            &LogisticRegressionObjective::new(&problem, cli.l2_weight),
            problem.num_features(),
            &cli,
        )?
    };

    matrix_market::write_vector_file(&cli.output_file, &weights)
        .with_context(|| format!("failed to write weights to {}", cli.output_file.display()))?;
    tracing::info!("wrote {} weights to {}", weights.len(), cli.output_file.display());

    Ok(())
}

fn train<C: CostFunction<f64>>(objective: &C, dim: usize, cli: &Cli) -> Result<DVector<f64>> {
    let mut optimizer = OWLQN::new(cli.config());
    if !cli.quiet {
        optimizer = optimizer.with_reporter(Box::new(ConsoleReporter::stdout()));
    }

    let result = optimizer
        .minimize(objective, &DVector::zeros(dim))
        .context("optimization failed")?;
    tracing::info!(
        "stopped after {} iterations ({:?}), {} function evaluations in {:.3?}",
        result.iterations,
        result.termination_reason,
        result.function_evaluations,
        result.duration
    );

    if !cli.quiet {
        println!(
            "Finished with optimization.  {}/{} non-zero weights.",
            result.nonzero_weights, dim
        );
    }
    Ok(result.point)
}
