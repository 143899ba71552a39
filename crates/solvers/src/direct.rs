use nalgebra::DMatrix;
use varda_core::{AssimilationProblem, ObservationOperator, Observer, State};

use crate::{
    Action, Config, Error, Event, Point, Solution, Status, evaluate::Weights,
    jacobian::finite_difference,
};

/// Runs a non-iterative analysis linearized around the background.
///
/// `increment` receives the problem, the innovation `y − h(xb)`, and the
/// Jacobian at the background, and returns the analysis increment. The
/// operator is then evaluated at the analysis so the solution reports its
/// simulated observation and cost.
///
/// Bounds are not applied.
pub(crate) fn analyze<Op, Obs, F>(
    operator: &Op,
    problem: &AssimilationProblem,
    config: &Config,
    include_background: bool,
    mut observer: Obs,
    increment: F,
) -> Result<Solution, Error>
where
    Op: ObservationOperator + ?Sized,
    Obs: for<'a> Observer<Event<'a>, Action>,
    F: FnOnce(&AssimilationProblem, &State, &DMatrix<f64>) -> Result<State, Error>,
{
    if problem.bounds().is_some() {
        log::debug!("bounds are ignored by non-iterative analyses");
    }

    let weights = Weights::new(problem, include_background)?;
    let background = weights.point(operator, problem, problem.background().clone())?;

    if observe(&mut observer, &background, 0) {
        return Ok(Solution::from_accepted(
            Status::StoppedByObserver,
            vec![background],
            0,
        ));
    }

    let jacobian = finite_difference(
        operator,
        &background.state,
        &background.simulated,
        config.differences(),
    )?;
    let innovation = problem.observation() - &background.simulated;
    let analysis = &background.state + increment(problem, &innovation, &jacobian)?;
    let analysis = weights.point(operator, problem, analysis)?;

    log::debug!(
        "analysis: J = {:.6e} (Jb = {:.6e}, Jo = {:.6e})",
        analysis.cost.j,
        analysis.cost.jb,
        analysis.cost.jo,
    );

    let stop = observe(&mut observer, &analysis, 1);
    let status = if stop {
        Status::StoppedByObserver
    } else {
        Status::Converged
    };
    Ok(Solution::from_accepted(status, vec![background, analysis], 1))
}

/// Reports a point as evaluated then accepted, returning true on `StopEarly`.
fn observe<Obs>(observer: &mut Obs, point: &Point, iter: usize) -> bool
where
    Obs: for<'a> Observer<Event<'a>, Action>,
{
    [
        Event::Evaluated { iter, point },
        Event::Accepted { iter, point },
    ]
    .iter()
    .any(|event| matches!(observer.observe(event), Some(Action::StopEarly)))
}
