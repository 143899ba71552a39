use varda_core::State;

use crate::{Error, Point};

/// Events emitted by the assimilation solvers.
///
/// Every successful evaluation of the cost function is reported as
/// [`Event::Evaluated`], including line-search trials that end up rejected.
/// Each estimate the solver commits to is then reported as
/// [`Event::Accepted`], starting with the (projected) background at
/// iteration zero.
#[derive(Debug)]
pub enum Event<'a> {
    /// The cost function was evaluated at a state.
    Evaluated {
        /// Iteration during which the evaluation happened.
        iter: usize,

        /// The evaluated point.
        point: &'a Point,
    },

    /// The solver accepted a new estimate.
    Accepted {
        /// Iteration that produced the estimate.
        iter: usize,

        /// The accepted point.
        point: &'a Point,
    },

    /// Evaluating a trial state failed.
    TrialFailed {
        /// Iteration during which the trial was attempted.
        iter: usize,

        /// The state that could not be evaluated.
        state: &'a State,

        /// The evaluation error.
        error: &'a Error,

        /// The last accepted point.
        best: &'a Point,
    },
}

impl Event<'_> {
    /// Returns the iteration the event belongs to.
    #[must_use]
    pub fn iter(&self) -> usize {
        match self {
            Self::Evaluated { iter, .. }
            | Self::Accepted { iter, .. }
            | Self::TrialFailed { iter, .. } => *iter,
        }
    }

    /// Returns the state that was evaluated, accepted, or attempted.
    #[must_use]
    pub fn state(&self) -> &State {
        match self {
            Self::Evaluated { point, .. } | Self::Accepted { point, .. } => &point.state,
            Self::TrialFailed { state, .. } => state,
        }
    }

    /// Returns the point carried by the event, if evaluation succeeded.
    #[must_use]
    pub fn point(&self) -> Option<&Point> {
        match self {
            Self::Evaluated { point, .. } | Self::Accepted { point, .. } => Some(point),
            Self::TrialFailed { .. } => None,
        }
    }
}
