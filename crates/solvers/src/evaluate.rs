//! Observation operator evaluation and the assimilation cost function.
//!
//! The cost of a state `x` with simulated observation `h(x)` is
//!
//! ```text
//! J(x) = ½ (x − xb)ᵀ B⁻¹ (x − xb) + ½ (y − h(x))ᵀ R⁻¹ (y − h(x))
//!      = Jb + Jo
//! ```
//!
//! Least-squares solvers drop the background term, so `Jb` is zero.

use nalgebra::DMatrix;
use varda_core::{AssimilationProblem, ObservationOperator, State};

use crate::Error;

/// The cost function split into its background and observation terms.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Cost {
    /// Total cost `Jb + Jo`.
    pub j: f64,

    /// Background term.
    pub jb: f64,

    /// Observation term.
    pub jo: f64,
}

impl Cost {
    /// Creates a cost from its two terms.
    #[must_use]
    pub fn new(jb: f64, jo: f64) -> Self {
        Self { j: jb + jo, jb, jo }
    }
}

/// A state together with its simulated observation and cost.
#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    /// The parameter state.
    pub state: State,

    /// The operator output `h(state)`.
    pub simulated: State,

    /// The cost at `state`.
    pub cost: Cost,
}

/// Evaluates `operator` over a batch and checks the shape of its output.
///
/// # Errors
///
/// Returns an error if the operator fails, returns the wrong number of
/// vectors, returns a vector whose length is not `observation_len`, or
/// returns a non-finite value.
pub fn simulate<Op>(
    operator: &Op,
    states: &[State],
    observation_len: usize,
) -> Result<Vec<State>, Error>
where
    Op: ObservationOperator + ?Sized,
{
    log::trace!("evaluating observation operator on {} states", states.len());

    let outputs = operator.evaluate(states).map_err(Error::operator)?;

    if outputs.len() != states.len() {
        return Err(Error::BatchLength {
            expected: states.len(),
            actual: outputs.len(),
        });
    }
    for output in &outputs {
        if output.len() != observation_len {
            return Err(Error::OutputLength {
                expected: observation_len,
                actual: output.len(),
            });
        }
        if output.iter().any(|v| !v.is_finite()) {
            return Err(Error::NonFiniteOutput);
        }
    }

    Ok(outputs)
}

/// Evaluates `operator` at a single state.
///
/// # Errors
///
/// See [`simulate`].
pub fn simulate_one<Op>(
    operator: &Op,
    state: &State,
    observation_len: usize,
) -> Result<State, Error>
where
    Op: ObservationOperator + ?Sized,
{
    let mut outputs = simulate(operator, std::slice::from_ref(state), observation_len)?;
    outputs.pop().ok_or(Error::BatchLength {
        expected: 1,
        actual: 0,
    })
}

/// Computes the full cost at `state` given its simulated observation.
///
/// # Errors
///
/// Returns an error if a covariance cannot be inverted.
pub fn cost(
    problem: &AssimilationProblem,
    state: &State,
    simulated: &State,
) -> Result<Cost, Error> {
    Ok(Weights::new(problem, true)?.cost(problem, state, simulated))
}

/// Precomputed inverse covariances used by the iterative solvers.
#[derive(Debug, Clone)]
pub(crate) struct Weights {
    /// `B⁻¹`, or `None` when the background term is dropped.
    pub(crate) background: Option<DMatrix<f64>>,

    /// `R⁻¹`.
    pub(crate) observation: DMatrix<f64>,
}

impl Weights {
    pub(crate) fn new(
        problem: &AssimilationProblem,
        include_background: bool,
    ) -> Result<Self, Error> {
        let background = if include_background {
            Some(problem.background_error().inverse(problem.state_len())?)
        } else {
            None
        };
        let observation = problem
            .observation_error()
            .inverse(problem.observation_len())?;

        Ok(Self {
            background,
            observation,
        })
    }

    pub(crate) fn cost(
        &self,
        problem: &AssimilationProblem,
        state: &State,
        simulated: &State,
    ) -> Cost {
        let jb = self.background.as_ref().map_or(0.0, |b_inv| {
            let dx = state - problem.background();
            0.5 * dx.dot(&(b_inv * &dx))
        });
        let innovation = problem.observation() - simulated;
        let jo = 0.5 * innovation.dot(&(&self.observation * &innovation));

        Cost::new(jb, jo)
    }

    /// Evaluates `state` and wraps the result in a [`Point`].
    pub(crate) fn point<Op>(
        &self,
        operator: &Op,
        problem: &AssimilationProblem,
        state: State,
    ) -> Result<Point, Error>
    where
        Op: ObservationOperator + ?Sized,
    {
        let simulated = simulate_one(operator, &state, problem.observation_len())?;
        let cost = self.cost(problem, &state, &simulated);
        Ok(Point {
            state,
            simulated,
            cost,
        })
    }
}
