use varda_core::State;

use crate::{Cost, Point};

/// Indicates why a solver finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Converged according to the configured tolerance.
    Converged,

    /// Reached the iteration limit without converging.
    MaxIters,

    /// No step length along the search direction lowered the cost.
    Stalled,

    /// Stopped early due to an observer decision.
    StoppedByObserver,
}

/// The result of an assimilation.
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    /// Final solver status.
    pub status: Status,

    /// The analysis: the last accepted estimate.
    pub analysis: State,

    /// Simulated observation at the analysis.
    pub simulated: State,

    /// Cost at the analysis.
    pub cost: Cost,

    /// Every accepted estimate in order, ending with the analysis.
    pub states: Vec<State>,

    /// Cost at each accepted estimate, parallel to `states`.
    pub costs: Vec<Cost>,

    /// Iteration count when the solver finished.
    pub iters: usize,
}

impl Solution {
    /// Builds a solution from the accepted points.
    ///
    /// `accepted` must not be empty.
    pub(crate) fn from_accepted(status: Status, accepted: Vec<Point>, iters: usize) -> Self {
        let mut states = Vec::with_capacity(accepted.len());
        let mut costs = Vec::with_capacity(accepted.len());
        let mut simulated = State::zeros(0);
        for point in accepted {
            states.push(point.state);
            costs.push(point.cost);
            simulated = point.simulated;
        }

        let analysis = states.last().cloned().unwrap_or_else(|| State::zeros(0));
        let cost = costs.last().copied().unwrap_or_default();

        Self {
            status,
            analysis,
            simulated,
            cost,
            states,
            costs,
            iters,
        }
    }
}
