//! Capability traits for generic observers.
//!
//! These traits abstract over event and action types, so an observer can be
//! written once and reused with any engine whose events expose a cost.
//!
//! # Example
//!
//! ```rust
//! use varda_core::Observer;
//! use varda_observers::traits::{CanStopEarly, HasCost};
//!
//! struct GoodEnough {
//!     threshold: f64,
//! }
//!
//! impl<E: HasCost, A: CanStopEarly> Observer<E, A> for GoodEnough {
//!     fn observe(&mut self, event: &E) -> Option<A> {
//!         (event.cost() < self.threshold).then(A::stop_early)
//!     }
//! }
//! ```

use varda_solvers::{Action, Event};

/// An event that carries a cost value.
pub trait HasCost {
    /// Returns the total cost `J` for this event.
    ///
    /// Returns `f64::NAN` when the event represents an error and no cost is
    /// available.
    fn cost(&self) -> f64;
}

/// An action type that can signal early termination.
pub trait CanStopEarly {
    /// Returns the action that stops the solver early.
    fn stop_early() -> Self;
}

/// An action type that can reject the current evaluation.
pub trait CanAssumeWorse {
    /// Returns the action that treats this evaluation as worse than the best.
    fn assume_worse() -> Self;
}

impl HasCost for Event<'_> {
    fn cost(&self) -> f64 {
        self.point().map_or(f64::NAN, |point| point.cost.j)
    }
}

impl CanStopEarly for Action {
    fn stop_early() -> Self {
        Self::StopEarly
    }
}

impl CanAssumeWorse for Action {
    fn assume_worse() -> Self {
        Self::AssumeWorse
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::convert::Infallible;

    use varda_core::{AssimilationProblem, Covariance, MultiFunction, Observer, State};
    use varda_solvers::{Config, Status, variational};

    struct CostBelow(f64);

    impl<E: HasCost, A: CanStopEarly> Observer<E, A> for CostBelow {
        fn observe(&mut self, event: &E) -> Option<A> {
            (event.cost() < self.0).then(A::stop_early)
        }
    }

    /// Rejects every trial, so no step is ever accepted.
    struct RejectAll;

    impl<E, A: CanAssumeWorse> Observer<E, A> for RejectAll {
        fn observe(&mut self, _event: &E) -> Option<A> {
            Some(A::assume_worse())
        }
    }

    fn problem() -> AssimilationProblem {
        AssimilationProblem::new(
            State::from_vec(vec![0.0]),
            Covariance::Scalar(1e10),
            State::from_vec(vec![4.0]),
            Covariance::Scalar(1.0),
        )
        .unwrap()
    }

    fn identity() -> MultiFunction<impl Fn(&[State]) -> Result<Vec<State>, Infallible>> {
        MultiFunction(|states: &[State]| Ok(states.to_vec()))
    }

    #[test]
    fn generic_observer_stops_on_low_cost() {
        let solution =
            variational::minimize(&identity(), &problem(), &Config::default(), CostBelow(1.0))
                .unwrap();

        // The first trial already qualifies, and stopping on a trial keeps
        // the last accepted estimate.
        assert_eq!(solution.status, Status::StoppedByObserver);
        assert_eq!(solution.iters, 0);
        assert_eq!(solution.analysis, State::from_vec(vec![0.0]));
        assert_eq!(solution.cost.j, 8.0);
    }

    #[test]
    fn rejecting_every_trial_stalls_at_the_background() {
        let solution =
            variational::minimize(&identity(), &problem(), &Config::default(), RejectAll).unwrap();

        assert_eq!(solution.status, Status::Stalled);
        assert_eq!(solution.analysis, State::from_vec(vec![0.0]));
        assert_eq!(solution.iters, 0);
    }
}
