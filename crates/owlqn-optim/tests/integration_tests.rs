//! Integration tests for owlqn-optim
//!
//! These tests run complete minimizations on objectives with known
//! solutions and drive the step-level API to check the invariants that
//! hold across iterations.

use approx::assert_relative_eq;
use owlqn_core::{
    cost_function::{CostFunction, CountingCostFunction, QuadraticCost},
    error::{OptimizerError, Result},
    test_utils::{never_crosses_zero, same_orthant, soft_threshold},
    types::{DMatrix, DVector},
};
use owlqn_optim::{
    LineSearchOutcome, LineSearchParams, LogReporter, OWLQNConfig, OptimizationResult, OptimizerState,
    ProgressReporter, RunInfo, TerminationReason, TerminationSignal, OWLQN,
};
use std::cell::RefCell;
use std::rc::Rc;

/// Separable quadratic `0.5 * Σ wᵢ (xᵢ - cᵢ)² + offset`.
fn weighted_quadratic(weights: &[f64], center: &[f64], offset: f64) -> QuadraticCost<f64> {
    let w = DVector::from_column_slice(weights);
    let c = DVector::from_column_slice(center);
    let constant = offset + 0.5 * w.iter().zip(c.iter()).map(|(wi, ci)| wi * ci * ci).sum::<f64>();
    QuadraticCost::new(DMatrix::from_diagonal(&w), -w.component_mul(&c), constant)
}

/// Minimizer of the weighted quadratic plus `weight * ||x||₁`.
fn weighted_soft_threshold(weights: &[f64], center: &[f64], weight: f64) -> DVector<f64> {
    DVector::from_iterator(
        center.len(),
        weights.iter().zip(center).map(|(&w, &c)| {
            let magnitude = c.abs() - weight / w;
            if magnitude > 0.0 {
                c.signum() * magnitude
            } else {
                0.0
            }
        }),
    )
}

/// Sufficient decrease with the default `c1 = 1e-4`, in the same
/// operation order as the line search.
fn satisfies_armijo(outcome: &LineSearchOutcome<f64>) -> bool {
    outcome.final_value <= outcome.initial_value + 1e-4 * outcome.directional_derivative * outcome.step_size
}

fn quiet(l1_weight: f64) -> OWLQNConfig<f64> {
    OWLQNConfig::new().with_l1_weight(l1_weight).with_quiet(true)
}

#[test]
fn test_smooth_quadratic_without_penalty() {
    let weights = [1.0, 4.0, 25.0, 100.0];
    let cost = weighted_quadratic(&weights, &[0.0; 4], 1.0);
    let mut optimizer = OWLQN::new(quiet(0.0).with_tolerance(1e-6));

    let result = optimizer.minimize(&cost, &DVector::from_element(4, 5.0)).unwrap();

    assert!(result.converged);
    assert!(result.iterations < 100);
    assert!(result.point.norm() < 1e-2, "final point {}", result.point);
    assert!(result.value < 1.0 + 1e-4);
    assert_eq!(result.nonzero_weights, result.point.iter().filter(|&&x| x != 0.0).count());
}

#[test]
fn test_simple_quadratic_from_five_five() {
    let cost = QuadraticCost::<f64>::simple(2);
    let config = OWLQNConfig::new().with_l1_weight(0.0).with_tolerance(1e-6).with_quiet(true);
    let mut optimizer = OWLQN::new(config);

    let result = optimizer.minimize(&cost, &DVector::from_vec(vec![5.0, 5.0])).unwrap();

    assert!(result.iterations < 50, "took {} iterations", result.iterations);
    assert!(result.point.norm() < 1e-6, "final point {}", result.point);
}

#[test]
fn test_l1_penalty_recovers_soft_threshold() {
    let center = DVector::from_vec(vec![5.0, 2.0, -4.0, -1.0, 0.5]);
    let cost = QuadraticCost::shifted(center.clone(), 1.0);
    let mut optimizer = OWLQN::new(quiet(3.0));

    let result = optimizer.minimize(&cost, &DVector::zeros(5)).unwrap();
    let expected = soft_threshold(&center, 3.0);

    assert!(result.converged);
    for i in 0..5 {
        assert_relative_eq!(result.point[i], expected[i], epsilon = 1e-6);
    }
    // Coordinates pinned by the penalty stay exactly at zero.
    assert_eq!(result.point[1], 0.0);
    assert_eq!(result.point[3], 0.0);
    assert_eq!(result.point[4], 0.0);
    assert_eq!(result.nonzero_weights, 2);
}

#[test]
fn test_ill_conditioned_l1_problem() {
    let weights = [1.0, 3.0, 10.0, 30.0, 100.0, 300.0];
    let center = [4.0, -3.0, 2.0, 0.05, -1.0, 0.001];
    let cost = weighted_quadratic(&weights, &center, 1.0);
    let mut optimizer = OWLQN::new(quiet(1.0).with_tolerance(1e-6));

    let start = DVector::from_vec(vec![-1.0, 1.0, -1.0, 1.0, 1.0, -1.0]);
    let result = optimizer.minimize(&cost, &start).unwrap();
    let expected = weighted_soft_threshold(&weights, &center, 1.0);

    for i in 0..6 {
        assert!(
            (result.point[i] - expected[i]).abs() < 1e-2,
            "coordinate {i}: {} vs {}",
            result.point[i],
            expected[i]
        );
    }
    assert!(result.point[5].abs() < 1e-3);
}

#[test]
fn test_zero_start_stays_at_zero_under_heavy_penalty() {
    let cost = QuadraticCost::shifted(DVector::from_vec(vec![1.0, -2.0, 0.5]), 1.0);
    let mut optimizer = OWLQN::new(quiet(10.0));

    let result = optimizer.minimize(&cost, &DVector::zeros(3)).unwrap();
    assert_eq!(result.termination_reason, TerminationReason::Stationary);
    assert_eq!(result.point, DVector::zeros(3));
    assert_eq!(result.nonzero_weights, 0);
}

#[test]
fn test_optimizer_can_be_reused() {
    let cost = weighted_quadratic(&[1.0, 10.0, 50.0], &[2.0, -1.0, 0.5], 2.0);
    let mut optimizer = OWLQN::new(quiet(0.5));
    let start = DVector::from_vec(vec![1.0, 1.0, 1.0]);

    let first = optimizer.minimize(&cost, &start).unwrap();
    let second = optimizer.minimize(&cost, &start).unwrap();

    assert_eq!(first.point, second.point);
    assert_eq!(first.iterations, second.iterations);
    assert_eq!(first.function_evaluations, second.function_evaluations);
}

#[test]
fn test_direction_verification_does_not_change_trajectory() {
    let cost = CountingCostFunction::new(weighted_quadratic(&[1.0, 8.0], &[3.0, -2.0], 1.0));
    let start = DVector::from_vec(vec![0.5, 0.5]);

    let plain = OWLQN::new(quiet(0.2)).minimize(&cost, &start).unwrap();
    let plain_evaluations = cost.evaluations();
    cost.reset_count();

    let checked = OWLQN::new(quiet(0.2).with_direction_verification())
        .minimize(&cost, &start)
        .unwrap();

    assert_eq!(plain.point, checked.point);
    assert_eq!(plain.value, checked.value);
    assert_eq!(plain.iterations, checked.iterations);
    assert_eq!(plain.termination_reason, checked.termination_reason);
    assert_eq!(plain_evaluations, plain.function_evaluations);

    // Each check is one extra evaluation and is counted in the result.
    assert_eq!(checked.function_evaluations, cost.evaluations());
    let extra = checked.function_evaluations - plain.function_evaluations;
    assert!(extra > 0 && extra <= checked.iterations + 1, "{extra} extra evaluations");
}

#[test]
fn test_iteration_cap() {
    let cost = weighted_quadratic(&[1.0, 1000.0], &[1.0, 1.0], 1.0);
    let mut optimizer = OWLQN::new(quiet(0.0).with_max_iterations(3));

    let result = optimizer.minimize(&cost, &DVector::zeros(2)).unwrap();
    assert_eq!(result.termination_reason, TerminationReason::MaxIterations);
    assert_eq!(result.iterations, 3);
    assert!(!result.converged);
}

#[test]
fn test_invalid_memory_size() {
    let cost = QuadraticCost::<f64>::simple(2);
    let mut optimizer = OWLQN::new(quiet(1.0).with_memory_size(0));

    let err = optimizer.minimize(&cost, &DVector::zeros(2)).unwrap_err();
    assert!(matches!(
        err,
        OptimizerError::InvalidConfiguration { ref parameter, .. } if parameter == "memory_size"
    ));
}

#[test]
fn test_dimension_mismatch() {
    let cost = QuadraticCost::<f64>::simple(3);
    let err = OWLQN::new(quiet(1.0)).minimize(&cost, &DVector::zeros(2)).unwrap_err();
    assert_eq!(err, OptimizerError::dimension_mismatch(3, 2));
}

/// `0.5 * x² + 1` reporting the derivative `3 - x` instead of `x`.
#[derive(Debug)]
struct FlippedSlope;

impl CostFunction<f64> for FlippedSlope {
    fn cost_and_gradient(&self, x: &DVector<f64>, gradient: &mut DVector<f64>) -> Result<f64> {
        gradient[0] = 3.0 - x[0];
        Ok(0.5 * x[0] * x[0] + 1.0)
    }
}

#[test]
fn test_inconsistent_gradient_is_fatal() {
    // The first step moves from 2 to 1 and records negative curvature, which
    // turns the second direction uphill.
    let err = OWLQN::new(quiet(0.0))
        .minimize(&FlippedSlope, &DVector::from_vec(vec![2.0]))
        .unwrap_err();

    assert_eq!(err, OptimizerError::non_descent_direction(4.0, 2));
}

/// Fails once the point leaves the unit box.
#[derive(Debug)]
struct BoxedDomain;

impl CostFunction<f64> for BoxedDomain {
    fn cost_and_gradient(&self, x: &DVector<f64>, gradient: &mut DVector<f64>) -> Result<f64> {
        if x.amax() > 1.0 {
            return Err(OptimizerError::evaluation_failed("point outside the unit box"));
        }
        gradient.copy_from(&x.map(|xi| xi - 10.0));
        Ok(0.5 * x.map(|xi| (xi - 10.0).powi(2)).sum())
    }
}

#[test]
fn test_collaborator_error_propagates() {
    // The unit-length first step stays inside; the full quasi-Newton step
    // aimed at (10, 10) does not.
    let err = OWLQN::new(quiet(0.0))
        .minimize(&BoxedDomain, &DVector::from_vec(vec![0.0, 0.0]))
        .unwrap_err();

    assert!(matches!(err, OptimizerError::EvaluationFailed { .. }));
}

#[derive(Debug, Default)]
struct Events {
    starts: usize,
    line_searches: usize,
    iterations: Vec<usize>,
    finishes: usize,
}

struct Recorder(Rc<RefCell<Events>>);

impl ProgressReporter<f64> for Recorder {
    fn on_start(&mut self, info: &RunInfo<f64>) {
        assert_eq!(info.memory_size, 10);
        self.0.borrow_mut().starts += 1;
    }

    fn on_line_search(&mut self, _iteration: usize, outcome: &LineSearchOutcome<f64>) {
        assert!(outcome.final_value <= outcome.initial_value);
        assert!(outcome.directional_derivative < 0.0);
        assert!(satisfies_armijo(outcome), "no sufficient decrease: {outcome:?}");
        self.0.borrow_mut().line_searches += 1;
    }

    fn on_iteration(&mut self, iteration: usize, _value: f64, _signal: &TerminationSignal<f64>) {
        self.0.borrow_mut().iterations.push(iteration);
    }

    fn on_finish(&mut self, _result: &OptimizationResult<f64>) {
        self.0.borrow_mut().finishes += 1;
    }
}

#[test]
fn test_reporter_sees_every_iteration() {
    let events = Rc::new(RefCell::new(Events::default()));
    let cost = weighted_quadratic(&[1.0, 20.0, 5.0], &[3.0, 1.0, -2.0], 1.0);
    let mut optimizer = OWLQN::new(OWLQNConfig::new().with_l1_weight(0.3).with_max_iterations(8))
        .with_reporter(Box::new(Recorder(Rc::clone(&events))));

    let result = optimizer.minimize(&cost, &DVector::zeros(3)).unwrap();

    let events = events.borrow();
    assert_eq!(events.starts, 1);
    assert_eq!(events.finishes, 1);
    assert_eq!(events.line_searches, result.iterations);
    assert_eq!(events.iterations, (1..=result.iterations).collect::<Vec<_>>());
}

#[test]
fn test_quiet_run_reports_nothing() {
    let events = Rc::new(RefCell::new(Events::default()));
    let cost = weighted_quadratic(&[1.0, 2.0], &[3.0, 1.0], 1.0);
    let mut optimizer = OWLQN::new(quiet(0.3)).with_reporter(Box::new(Recorder(Rc::clone(&events))));

    optimizer.minimize(&cost, &DVector::zeros(2)).unwrap();

    let events = events.borrow();
    assert_eq!(events.starts, 0);
    assert_eq!(events.line_searches, 0);
    assert!(events.iterations.is_empty());
}

#[test]
fn test_log_reporter_leaves_the_run_unchanged() {
    let cost = weighted_quadratic(&[1.0, 2.0], &[3.0, 1.0], 1.0);
    let config = OWLQNConfig::new().with_l1_weight(0.3).with_tolerance(1e-6);

    let logged = OWLQN::new(config.clone())
        .with_reporter(Box::new(LogReporter))
        .minimize(&cost, &DVector::zeros(2))
        .unwrap();
    let silent = OWLQN::new(config).minimize(&cost, &DVector::zeros(2)).unwrap();

    assert_eq!(logged.point, silent.point);
    assert_eq!(logged.iterations, silent.iterations);
}

#[test]
fn test_step_level_history_grows_then_evicts() {
    let cost = weighted_quadratic(&[1.0, 7.0, 30.0, 90.0], &[2.0, -3.0, 1.0, 0.4], 5.0);
    let mut state = OptimizerState::new(&cost, &DVector::from_element(4, 1.0), 2, 0.0).unwrap();
    let params = LineSearchParams::default();

    for k in 1..=4 {
        state.update_direction();
        state.line_search(&params).unwrap();
        state.shift();
        assert_eq!(state.history().len(), k.min(2));
        assert_eq!(state.iteration(), k + 1);
    }

    // The newest pair is the step just taken.
    let newest = state.history().len() - 1;
    let step = state.last_point() - state.point();
    assert_relative_eq!(state.history().s(newest).norm(), step.norm(), epsilon = 1e-12);
}

#[test]
fn test_step_level_values_decrease_monotonically() {
    let cost = weighted_quadratic(&[2.0, 9.0, 40.0], &[-1.5, 2.5, 0.3], 3.0);
    let mut state = OptimizerState::new(&cost, &DVector::from_vec(vec![1.0, -1.0, 2.0]), 5, 0.7).unwrap();
    let params = LineSearchParams::default();

    let mut previous = state.value();
    for _ in 0..6 {
        state.update_direction();
        if state.directional_derivative() == 0.0 {
            break;
        }
        let outcome = state.line_search(&params).unwrap();
        assert!(state.value() <= previous);
        assert_eq!(outcome.final_value, state.value());
        previous = state.value();
        state.shift();
    }
}

mod orthant_properties {
    use super::*;
    use proptest::prelude::*;

    fn problems() -> impl Strategy<Value = (Vec<f64>, Vec<f64>, Vec<f64>, f64)> {
        (2usize..7).prop_flat_map(|n| {
            (
                prop::collection::vec(0.5..50.0_f64, n),
                prop::collection::vec(-5.0..5.0_f64, n),
                prop::collection::vec(-3.0..3.0_f64, n),
                0.01..4.0_f64,
            )
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn iterates_respect_orthants((weights, center, start, l1) in problems()) {
            let cost = weighted_quadratic(&weights, &center, 10.0);
            let start = DVector::from_vec(start);
            let mut state = OptimizerState::new(&cost, &start, 4, l1).unwrap();
            let params = LineSearchParams::default();

            for _ in 0..8 {
                state.update_direction();
                let steepest = -state.pseudo_gradient();
                prop_assert!(same_orthant(state.direction(), &steepest));

                let dir_deriv = state.directional_derivative();
                if dir_deriv == 0.0 {
                    break;
                }
                prop_assert!(dir_deriv < 0.0);

                let before = state.value();
                let outcome = state.line_search(&params).unwrap();
                prop_assert!(never_crosses_zero(state.last_point(), state.point()));
                prop_assert!(outcome.final_value <= before);
                prop_assert!(satisfies_armijo(&outcome));

                if before - outcome.final_value <= 1e-12 * before {
                    break;
                }
                state.shift();
            }
        }
    }
}
