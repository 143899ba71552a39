//! Weighted least squares without a background term.
//!
//! Both solvers minimize `Jo(x) = ½ (y − h(x))ᵀ R⁻¹ (y − h(x))` and use the
//! background only as a starting point, so `Jb` is always zero. They need at
//! least as many independent observations as parameters.

use nalgebra::DMatrix;
use varda_core::{AssimilationProblem, ObservationOperator, Observer, State};

use crate::{Action, Config, Error, Event, Solution, direct, gauss_newton, gauss_newton::solve};

/// Iterative least squares for a non-linear operator.
///
/// Runs the same projected Gauss-Newton iteration as 3D-VAR with the
/// background term removed, so bounds are honored.
///
/// # Errors
///
/// Returns an error if `R` cannot be inverted, the operator fails, or the
/// normal equations are singular.
pub fn nonlinear<Op, Obs>(
    operator: &Op,
    problem: &AssimilationProblem,
    config: &Config,
    observer: Obs,
) -> Result<Solution, Error>
where
    Op: ObservationOperator + ?Sized,
    Obs: for<'a> Observer<Event<'a>, Action>,
{
    gauss_newton::minimize(operator, problem, config, false, observer)
}

/// One-shot least squares for a linear operator.
///
/// Linearizes at the background and solves
/// `x = xb + (Hᵀ R⁻¹ H)⁻¹ Hᵀ R⁻¹ (y − h(xb))`. Bounds are ignored.
///
/// # Errors
///
/// Returns an error if `R` cannot be inverted, the operator fails, or
/// `Hᵀ R⁻¹ H` is singular.
pub fn linear<Op, Obs>(
    operator: &Op,
    problem: &AssimilationProblem,
    config: &Config,
    observer: Obs,
) -> Result<Solution, Error>
where
    Op: ObservationOperator + ?Sized,
    Obs: for<'a> Observer<Event<'a>, Action>,
{
    direct::analyze(operator, problem, config, false, observer, increment)
}

fn increment(
    problem: &AssimilationProblem,
    innovation: &State,
    jacobian: &DMatrix<f64>,
) -> Result<State, Error> {
    let r_inv = problem
        .observation_error()
        .inverse(problem.observation_len())?;
    let ht_r_inv = jacobian.transpose() * r_inv;
    solve(&ht_r_inv * jacobian, ht_r_inv * innovation)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::convert::Infallible;

    use approx::assert_relative_eq;
    use varda_core::{Covariance, MultiFunction};

    use crate::Status;

    fn problem(background: [f64; 2]) -> AssimilationProblem {
        AssimilationProblem::new(
            State::from_vec(background.to_vec()),
            Covariance::Scalar(1.0),
            State::from_vec(vec![1.0, 3.0, 5.0]),
            Covariance::Scalar(1.0),
        )
        .unwrap()
    }

    // Line through (0, 1), (1, 3), (2, 5): y = a + b t.
    fn line(x: &State) -> State {
        State::from_vec((0..3).map(|t| x[0] + x[1] * f64::from(t)).collect())
    }

    #[test]
    fn linear_fit_ignores_background() {
        let operator = MultiFunction(|states: &[State]| {
            Ok::<_, Infallible>(states.iter().map(line).collect())
        });

        let solution = linear(&operator, &problem([100.0, -40.0]), &Config::default(), ()).unwrap();

        assert_eq!(solution.status, Status::Converged);
        assert_relative_eq!(solution.analysis[0], 1.0, epsilon = 1e-6);
        assert_relative_eq!(solution.analysis[1], 2.0, epsilon = 1e-6);
        assert_eq!(solution.cost.jb, 0.0);
    }

    #[test]
    fn nonlinear_fit_converges_from_afar() {
        // y = exp(k t) sampled at t = 0, 1, 2 with k = ln 2.
        let operator = MultiFunction(|states: &[State]| {
            let outputs = states
                .iter()
                .map(|x| State::from_vec((0..3).map(|t| (x[0] * f64::from(t)).exp()).collect()))
                .collect();
            Ok::<_, Infallible>(outputs)
        });
        let problem = AssimilationProblem::new(
            State::from_vec(vec![0.1]),
            Covariance::Scalar(1.0),
            State::from_vec(vec![1.0, 2.0, 4.0]),
            Covariance::Scalar(1.0),
        )
        .unwrap();

        let solution = nonlinear(&operator, &problem, &Config::default(), ()).unwrap();

        assert_eq!(solution.status, Status::Converged);
        assert_relative_eq!(solution.analysis[0], 2f64.ln(), epsilon = 1e-4);
        assert!(solution.costs.iter().all(|cost| cost.jb == 0.0));
    }
}
