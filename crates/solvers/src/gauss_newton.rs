use nalgebra::{DMatrix, DVector};
use varda_core::{AssimilationProblem, ObservationOperator, Observer};

use crate::{
    Action, Config, Error, Event, Point, Solution, Status, evaluate::Weights,
    jacobian::finite_difference,
};

/// Maximum number of step halvings in one line search.
const MAX_HALVINGS: usize = 30;

/// Projected Gauss-Newton minimization of the assimilation cost.
///
/// Each iteration linearizes the operator with finite differences, solves the
/// normal equations for a full step, and halves that step until the projected
/// trial does not increase the cost. Iteration stops when the relative cost
/// decrement falls to the configured tolerance, when the step vanishes after
/// projection, when no step length lowers the cost, or at the iteration limit.
///
/// With `include_background` false the background term is dropped and the
/// background only serves as the starting point.
pub(crate) fn minimize<Op, Obs>(
    operator: &Op,
    problem: &AssimilationProblem,
    config: &Config,
    include_background: bool,
    mut observer: Obs,
) -> Result<Solution, Error>
where
    Op: ObservationOperator + ?Sized,
    Obs: for<'a> Observer<Event<'a>, Action>,
{
    let weights = Weights::new(problem, include_background)?;

    let mut start = problem.background().clone();
    problem.project(&mut start);
    let current = weights.point(operator, problem, start)?;

    if let Some(Action::StopEarly) = observer.observe(&Event::Evaluated {
        iter: 0,
        point: &current,
    }) {
        return Ok(Solution::from_accepted(
            Status::StoppedByObserver,
            vec![current],
            0,
        ));
    }
    let stop = matches!(
        observer.observe(&Event::Accepted {
            iter: 0,
            point: &current,
        }),
        Some(Action::StopEarly)
    );
    let mut accepted = vec![current];
    if stop {
        return Ok(Solution::from_accepted(
            Status::StoppedByObserver,
            accepted,
            0,
        ));
    }

    for iter in 1..=config.max_steps() {
        let current = last(&accepted);
        let jacobian = finite_difference(
            operator,
            &current.state,
            &current.simulated,
            config.differences(),
        )?;
        let direction = direction(problem, &weights, current, &jacobian)?;

        let next = match line_search(
            operator,
            problem,
            &weights,
            current,
            &direction,
            iter,
            &mut observer,
        )? {
            Trial::Accepted(point) => point,
            Trial::Vanished => {
                log::debug!("iteration {iter}: step vanished, stopping");
                return Ok(Solution::from_accepted(
                    Status::Converged,
                    accepted,
                    iter - 1,
                ));
            }
            Trial::Exhausted => {
                log::debug!("iteration {iter}: no step length lowered the cost, stopping");
                return Ok(Solution::from_accepted(Status::Stalled, accepted, iter - 1));
            }
            Trial::StopEarly => {
                return Ok(Solution::from_accepted(
                    Status::StoppedByObserver,
                    accepted,
                    iter - 1,
                ));
            }
        };

        let decrement = relative_decrement(current.cost.j, next.cost.j);
        log::debug!(
            "iteration {iter}: J = {:.6e} (Jb = {:.6e}, Jo = {:.6e}), decrement = {decrement:.3e}",
            next.cost.j,
            next.cost.jb,
            next.cost.jo,
        );

        let action = observer.observe(&Event::Accepted {
            iter,
            point: &next,
        });
        accepted.push(next);

        if let Some(Action::StopEarly) = action {
            return Ok(Solution::from_accepted(
                Status::StoppedByObserver,
                accepted,
                iter,
            ));
        }
        if decrement <= config.cost_decrement_tolerance() {
            return Ok(Solution::from_accepted(Status::Converged, accepted, iter));
        }
    }

    Ok(Solution::from_accepted(
        Status::MaxIters,
        accepted,
        config.max_steps(),
    ))
}

enum Trial {
    Accepted(Point),
    Vanished,
    Exhausted,
    StopEarly,
}

/// Halves the step along `direction` until the cost does not increase.
///
/// Gives up after [`MAX_HALVINGS`] halvings.
fn line_search<Op, Obs>(
    operator: &Op,
    problem: &AssimilationProblem,
    weights: &Weights,
    current: &Point,
    direction: &DVector<f64>,
    iter: usize,
    observer: &mut Obs,
) -> Result<Trial, Error>
where
    Op: ObservationOperator + ?Sized,
    Obs: for<'a> Observer<Event<'a>, Action>,
{
    let mut step = 1.0;

    for _ in 0..=MAX_HALVINGS {
        let mut state = &current.state + direction * step;
        problem.project(&mut state);
        if state == current.state {
            return Ok(Trial::Vanished);
        }

        match weights.point(operator, problem, state.clone()) {
            Ok(point) => {
                let action = observer.observe(&Event::Evaluated {
                    iter,
                    point: &point,
                });
                match action {
                    Some(Action::StopEarly) => return Ok(Trial::StopEarly),
                    Some(Action::AssumeWorse) => {}
                    None if point.cost.j <= current.cost.j => return Ok(Trial::Accepted(point)),
                    None => {}
                }
            }
            Err(error) => {
                let action = observer.observe(&Event::TrialFailed {
                    iter,
                    state: &state,
                    error: &error,
                    best: current,
                });
                match action {
                    Some(Action::StopEarly) => return Ok(Trial::StopEarly),
                    Some(Action::AssumeWorse) => {}
                    None => return Err(error),
                }
            }
        }

        log::trace!("iteration {iter}: halving step {step:.3e}");
        step *= 0.5;
    }

    Ok(Trial::Exhausted)
}

/// Solves `(B⁻¹ + Hᵀ R⁻¹ H) d = −(B⁻¹ (x − xb) − Hᵀ R⁻¹ (y − h(x)))`.
fn direction(
    problem: &AssimilationProblem,
    weights: &Weights,
    current: &Point,
    jacobian: &DMatrix<f64>,
) -> Result<DVector<f64>, Error> {
    let ht_r_inv = jacobian.transpose() * &weights.observation;
    let innovation = problem.observation() - &current.simulated;

    let mut hessian = &ht_r_inv * jacobian;
    let mut gradient = -(&ht_r_inv * innovation);
    if let Some(b_inv) = &weights.background {
        hessian += b_inv;
        gradient += b_inv * (&current.state - problem.background());
    }

    solve(hessian, -gradient)
}

/// Solves the symmetric system `a x = b`, using Cholesky with an LU fallback.
pub(crate) fn solve(a: DMatrix<f64>, b: DVector<f64>) -> Result<DVector<f64>, Error> {
    if let Some(chol) = a.clone().cholesky() {
        return Ok(chol.solve(&b));
    }
    a.lu().solve(&b).ok_or(Error::Singular)
}

/// Relative cost decrease between two accepted iterates.
fn relative_decrement(old: f64, new: f64) -> f64 {
    (old - new) / old.abs().max(new.abs()).max(1.0)
}

fn last(accepted: &[Point]) -> &Point {
    // Never empty: the projected background is accepted first.
    &accepted[accepted.len() - 1]
}
