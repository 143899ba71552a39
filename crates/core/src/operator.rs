use std::error::Error as StdError;

use crate::{Model, State};

/// A forward model mapping parameter states to simulated observations.
///
/// Operators use a batch calling convention: they receive an ordered sequence
/// of states and return one simulated observation vector per state, in the
/// same order. Solvers use a single batch to evaluate a state together with
/// all of its finite-difference perturbations.
///
/// Implementations that only know how to evaluate one state at a time can be
/// wrapped in [`EachState`].
pub trait ObservationOperator {
    type Error: StdError + Send + Sync + 'static;

    /// Evaluates the operator over a batch of states.
    ///
    /// # Errors
    ///
    /// Returns [`Self::Error`] if any state cannot be evaluated.
    fn evaluate(&self, states: &[State]) -> Result<Vec<State>, Self::Error>;

    /// Returns true if the underlying function natively takes a batch.
    ///
    /// This reports how the function was supplied; callers always see the
    /// batch convention through [`evaluate`](Self::evaluate).
    fn input_function_as_multi(&self) -> bool {
        true
    }
}

impl<T: ObservationOperator + ?Sized> ObservationOperator for &T {
    type Error = T::Error;

    fn evaluate(&self, states: &[State]) -> Result<Vec<State>, Self::Error> {
        (**self).evaluate(states)
    }

    fn input_function_as_multi(&self) -> bool {
        (**self).input_function_as_multi()
    }
}

impl<T: ObservationOperator + ?Sized> ObservationOperator for Box<T> {
    type Error = T::Error;

    fn evaluate(&self, states: &[State]) -> Result<Vec<State>, Self::Error> {
        (**self).evaluate(states)
    }

    fn input_function_as_multi(&self) -> bool {
        (**self).input_function_as_multi()
    }
}

/// An operator built from a closure over a batch of states.
#[derive(Debug, Clone, Copy)]
pub struct MultiFunction<F>(pub F);

impl<F, E> ObservationOperator for MultiFunction<F>
where
    F: Fn(&[State]) -> Result<Vec<State>, E>,
    E: StdError + Send + Sync + 'static,
{
    type Error = E;

    fn evaluate(&self, states: &[State]) -> Result<Vec<State>, E> {
        (self.0)(states)
    }
}

/// An operator that evaluates a single-state [`Model`] once per batch entry.
#[derive(Debug, Clone, Copy)]
pub struct EachState<M>(pub M);

impl<M> ObservationOperator for EachState<M>
where
    M: Model<Input = State, Output = State>,
{
    type Error = M::Error;

    fn evaluate(&self, states: &[State]) -> Result<Vec<State>, Self::Error> {
        states.iter().map(|state| self.0.call(state)).collect()
    }

    fn input_function_as_multi(&self) -> bool {
        false
    }
}
