//! 3D-VAR: minimization of the background + observation cost.
//!
//! The analysis minimizes
//!
//! ```text
//! J(x) = ½ (x − xb)ᵀ B⁻¹ (x − xb) + ½ (y − h(x))ᵀ R⁻¹ (y − h(x))
//! ```
//!
//! subject to the problem's bounds, using a projected Gauss-Newton iteration
//! with a finite-difference Jacobian and step halving.

use varda_core::{AssimilationProblem, ObservationOperator, Observer};

use crate::{Action, Config, Error, Event, Solution, gauss_newton};

/// Runs 3D-VAR from the background.
///
/// The first accepted state is the background projected onto the bounds.
/// Every accepted state is projected, so with bounds present the analysis
/// always satisfies them.
///
/// # Errors
///
/// Returns an error if a covariance cannot be inverted, the operator fails on
/// an evaluation the observer does not recover from, or the normal equations
/// are singular.
pub fn minimize<Op, Obs>(
    operator: &Op,
    problem: &AssimilationProblem,
    config: &Config,
    observer: Obs,
) -> Result<Solution, Error>
where
    Op: ObservationOperator + ?Sized,
    Obs: for<'a> Observer<Event<'a>, Action>,
{
    gauss_newton::minimize(operator, problem, config, true, observer)
}

/// Runs 3D-VAR without observation.
///
/// # Errors
///
/// See [`minimize`].
pub fn minimize_unobserved<Op>(
    operator: &Op,
    problem: &AssimilationProblem,
    config: &Config,
) -> Result<Solution, Error>
where
    Op: ObservationOperator + ?Sized,
{
    minimize(operator, problem, config, ())
}
