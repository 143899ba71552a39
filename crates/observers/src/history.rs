use varda_solvers::{Event, Point};

/// Records the points a solver evaluates and accepts.
///
/// Feed it events from an observer closure with [`History::record`]; it
/// never steers the solver. Failed trials are counted but not stored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct History {
    evaluated: Vec<Point>,
    accepted: Vec<Point>,
    failures: usize,
}

impl History {
    /// Creates an empty history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every successfully evaluated point, in evaluation order.
    #[must_use]
    pub fn evaluated(&self) -> &[Point] {
        &self.evaluated
    }

    /// Every accepted point, starting with the first estimate.
    #[must_use]
    pub fn accepted(&self) -> &[Point] {
        &self.accepted
    }

    /// The most recently accepted point.
    #[must_use]
    pub fn best(&self) -> Option<&Point> {
        self.accepted.last()
    }

    /// Number of trials whose evaluation failed.
    #[must_use]
    pub fn failures(&self) -> usize {
        self.failures
    }

    /// Records an event.
    pub fn record(&mut self, event: &Event<'_>) {
        match event {
            Event::Evaluated { point, .. } => self.evaluated.push((*point).clone()),
            Event::Accepted { point, .. } => self.accepted.push((*point).clone()),
            Event::TrialFailed { .. } => self.failures += 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::convert::Infallible;

    use varda_core::{AssimilationProblem, Covariance, MultiFunction, State};
    use varda_solvers::{Action, Config, variational};

    #[test]
    fn records_every_accepted_state() {
        let operator = MultiFunction(|states: &[State]| Ok::<_, Infallible>(states.to_vec()));
        let problem = AssimilationProblem::new(
            State::from_vec(vec![0.0]),
            Covariance::Scalar(1.0),
            State::from_vec(vec![2.0]),
            Covariance::Scalar(1.0),
        )
        .unwrap();
        let mut history = History::new();

        let observer = |event: &Event<'_>| {
            history.record(event);
            None::<Action>
        };

        let solution =
            variational::minimize(&operator, &problem, &Config::default(), observer).unwrap();

        let accepted: Vec<State> = history.accepted().iter().map(|p| p.state.clone()).collect();
        assert_eq!(accepted, solution.states);
        assert!(history.evaluated().len() >= history.accepted().len());
        assert_eq!(history.best().map(|p| &p.state), Some(&solution.analysis));
        assert_eq!(history.failures(), 0);
    }
}
