//! Progress reporting hooks for optimization runs.
//!
//! Reporters observe a run without influencing it. The driver calls them at
//! the start of the run, after every line search, after every termination
//! check and once at the end. Runs configured as quiet skip the reporter
//! entirely.

use crate::{
    line_search::LineSearchOutcome,
    owlqn::OptimizationResult,
    termination::TerminationSignal,
};
use owlqn_core::types::Scalar;
use std::io::{self, Write};

/// Parameters of a run, announced once before the first iteration.
#[derive(Debug, Clone, PartialEq)]
pub struct RunInfo<T: Scalar> {
    /// Problem dimension
    pub dim: usize,
    /// L1 regularization weight
    pub l1_weight: T,
    /// Number of curvature pairs kept
    pub memory_size: usize,
    /// Termination tolerance
    pub tolerance: T,
    /// Regularized objective value at the initial point
    pub initial_value: T,
}

/// Observer of an optimization run.
pub trait ProgressReporter<T: Scalar> {
    /// Called once before the first iteration.
    fn on_start(&mut self, _info: &RunInfo<T>) {}

    /// Called after every line search.
    fn on_line_search(&mut self, _iteration: usize, _outcome: &LineSearchOutcome<T>) {}

    /// Called after the termination check of every iteration.
    fn on_iteration(&mut self, _iteration: usize, _value: T, _signal: &TerminationSignal<T>) {}

    /// Called once when the run stops without error.
    fn on_finish(&mut self, _result: &OptimizationResult<T>) {}
}

impl<T: Scalar, R: ProgressReporter<T> + ?Sized> ProgressReporter<T> for &mut R {
    fn on_start(&mut self, info: &RunInfo<T>) {
        (**self).on_start(info);
    }

    fn on_line_search(&mut self, iteration: usize, outcome: &LineSearchOutcome<T>) {
        (**self).on_line_search(iteration, outcome);
    }

    fn on_iteration(&mut self, iteration: usize, value: T, signal: &TerminationSignal<T>) {
        (**self).on_iteration(iteration, value, signal);
    }

    fn on_finish(&mut self, result: &OptimizationResult<T>) {
        (**self).on_finish(result);
    }
}

/// Reporter that ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpReporter;

impl<T: Scalar> ProgressReporter<T> for NoOpReporter {}

/// Reporter forwarding events to the `log` facade.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogReporter;

impl<T: Scalar> ProgressReporter<T> for LogReporter {
    fn on_start(&mut self, info: &RunInfo<T>) {
        log::info!(
            "optimizing {} variables: l1 weight {}, memory {}, tolerance {}, initial value {}",
            info.dim,
            info.l1_weight,
            info.memory_size,
            info.tolerance,
            info.initial_value
        );
    }

    fn on_line_search(&mut self, iteration: usize, outcome: &LineSearchOutcome<T>) {
        log::debug!(
            "iteration {iteration}: step {} after {} backtracks, value {} -> {}",
            outcome.step_size,
            outcome.backtracks,
            outcome.initial_value,
            outcome.final_value
        );
    }

    fn on_iteration(&mut self, iteration: usize, value: T, signal: &TerminationSignal<T>) {
        log::info!("iteration {iteration}: value {value} {}", signal.status);
    }

    fn on_finish(&mut self, result: &OptimizationResult<T>) {
        log::info!(
            "finished after {} iterations ({:?}): value {}, {} of {} weights non-zero",
            result.iterations,
            result.termination_reason,
            result.value,
            result.nonzero_weights,
            result.point.len()
        );
    }
}

/// Reporter printing the classic iteration table to a writer.
///
/// Each iteration prints one row; the dots following a row count the
/// rejected line search candidates of the next iteration.
///
/// ```text
/// Optimizing function of 3 variables with OWL-QN parameters:
///    l1 regweight = 1
///    L-BFGS memory parameter (m) = 10
///    Convergence tolerance = 0.0001
///
/// Iter    n:  new_value    (conv_crit)   line_search
/// Iter    0:  5.4000e1     (***********) ..
/// Iter    1:  2.1000e1     (wait for 5 iters)
/// ```
#[derive(Debug)]
pub struct ConsoleReporter<W: Write> {
    out: W,
    error: Option<io::Error>,
}

impl ConsoleReporter<io::Stdout> {
    /// Reporter writing to standard output.
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> ConsoleReporter<W> {
    /// Reporter writing to `out`.
    pub fn new(out: W) -> Self {
        Self { out, error: None }
    }

    /// Takes the first write error, if any. Writing stops after an error.
    pub fn take_error(&mut self) -> Option<io::Error> {
        self.error.take()
    }

    /// Returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit(&mut self, write: impl FnOnce(&mut W) -> io::Result<()>) {
        if self.error.is_some() {
            return;
        }
        if let Err(err) = write(&mut self.out).and_then(|()| self.out.flush()) {
            self.error = Some(err);
        }
    }
}

impl<T: Scalar, W: Write> ProgressReporter<T> for ConsoleReporter<W> {
    fn on_start(&mut self, info: &RunInfo<T>) {
        self.emit(|out| {
            writeln!(out, "Optimizing function of {} variables with OWL-QN parameters:", info.dim)?;
            writeln!(out, "   l1 regweight = {}", info.l1_weight)?;
            writeln!(out, "   L-BFGS memory parameter (m) = {}", info.memory_size)?;
            writeln!(out, "   Convergence tolerance = {}", info.tolerance)?;
            writeln!(out)?;
            writeln!(out, "Iter    n:  new_value    (conv_crit)   line_search")?;
            write!(out, "Iter    0:  {:<12.4e} (***********) ", as_f64(info.initial_value))
        });
    }

    fn on_line_search(&mut self, _iteration: usize, outcome: &LineSearchOutcome<T>) {
        self.emit(|out| {
            for _ in 0..outcome.backtracks {
                write!(out, ".")?;
            }
            writeln!(out)
        });
    }

    fn on_iteration(&mut self, iteration: usize, value: T, signal: &TerminationSignal<T>) {
        let value = as_f64(value);
        self.emit(|out| write!(out, "Iter {iteration:>4}:  {value:<12.4e} {} ", signal.status));
    }

    fn on_finish(&mut self, _result: &OptimizationResult<T>) {
        self.emit(|out| writeln!(out));
    }
}

fn as_f64<T: Scalar>(value: T) -> f64 {
    <T as Scalar>::try_to_f64(value).unwrap_or(f64::NAN)
}
