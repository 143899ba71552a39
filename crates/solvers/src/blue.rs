//! Best linear unbiased estimator.
//!
//! The operator is linearized once at the background, `H = ∂h/∂x (xb)`, and
//! the analysis is
//!
//! ```text
//! xa = xb + K (y − h(xb)),    K = B Hᵀ (R + H B Hᵀ)⁻¹
//! ```
//!
//! When there are more observations than parameters the equivalent
//! information form `K = (B⁻¹ + Hᵀ R⁻¹ H)⁻¹ Hᵀ R⁻¹` is used instead, so the
//! system solved is always the smaller one.
//!
//! Bounds are ignored.

use nalgebra::DMatrix;
use varda_core::{AssimilationProblem, ObservationOperator, Observer, State};

use crate::{Action, Config, Error, Event, Solution, direct, gauss_newton::solve};

/// Computes the BLUE analysis.
///
/// The solution holds two accepted states, the background then the analysis.
///
/// # Errors
///
/// Returns an error if a covariance is invalid, the operator fails, or the
/// gain cannot be computed.
pub fn analyze<Op, Obs>(
    operator: &Op,
    problem: &AssimilationProblem,
    config: &Config,
    observer: Obs,
) -> Result<Solution, Error>
where
    Op: ObservationOperator + ?Sized,
    Obs: for<'a> Observer<Event<'a>, Action>,
{
    direct::analyze(operator, problem, config, true, observer, increment)
}

fn increment(
    problem: &AssimilationProblem,
    innovation: &State,
    jacobian: &DMatrix<f64>,
) -> Result<State, Error> {
    let n = problem.state_len();
    let m = problem.observation_len();

    if m <= n {
        let b = problem.background_error().to_matrix(n)?;
        let r = problem.observation_error().to_matrix(m)?;
        let b_ht = &b * jacobian.transpose();
        let innovation_covariance = r + jacobian * &b_ht;
        let weights = solve(innovation_covariance, innovation.clone())?;
        Ok(b_ht * weights)
    } else {
        let b_inv = problem.background_error().inverse(n)?;
        let r_inv = problem.observation_error().inverse(m)?;
        let ht_r_inv = jacobian.transpose() * r_inv;
        let information = b_inv + &ht_r_inv * jacobian;
        solve(information, ht_r_inv * innovation)
    }
}
