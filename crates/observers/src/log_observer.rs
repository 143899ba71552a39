use log::Level;
use varda_core::Observer;
use varda_solvers::Event;

/// Reports solver progress through the `log` facade.
///
/// Accepted estimates are logged at the configured level, every evaluation
/// at `trace`, and failed trials at `warn`. The observer never steers the
/// solver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogObserver {
    level: Level,
    target: &'static str,
}

impl Default for LogObserver {
    fn default() -> Self {
        Self {
            level: Level::Info,
            target: "varda",
        }
    }
}

impl LogObserver {
    /// Creates an observer logging accepted estimates at `level`.
    #[must_use]
    pub fn new(level: Level) -> Self {
        Self {
            level,
            ..Self::default()
        }
    }

    /// Sets the log target.
    #[must_use]
    pub fn with_target(mut self, target: &'static str) -> Self {
        self.target = target;
        self
    }

    /// Logs one event.
    pub fn log(&self, event: &Event<'_>) {
        match event {
            Event::Evaluated { iter, point } => log::trace!(
                target: self.target,
                "iter {iter}: evaluated {:?}, J = {:.6e}",
                point.state.as_slice(),
                point.cost.j,
            ),
            Event::Accepted { iter, point } => log::log!(
                target: self.target,
                self.level,
                "iter {iter}: accepted {:?}, J = {:.6e} (Jb = {:.6e}, Jo = {:.6e})",
                point.state.as_slice(),
                point.cost.j,
                point.cost.jb,
                point.cost.jo,
            ),
            Event::TrialFailed { iter, state, error, .. } => log::warn!(
                target: self.target,
                "iter {iter}: evaluation failed at {:?}: {error}",
                state.as_slice(),
            ),
        }
    }
}

impl<A> Observer<Event<'_>, A> for LogObserver {
    fn observe(&mut self, event: &Event<'_>) -> Option<A> {
        self.log(event);
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::convert::Infallible;

    use approx::assert_relative_eq;
    use varda_core::{AssimilationProblem, Covariance, MultiFunction, State};
    use varda_solvers::{Config, Status, variational};

    #[test]
    fn logging_does_not_change_the_result() {
        let operator = MultiFunction(|states: &[State]| {
            Ok::<_, Infallible>(states.iter().map(|x| x * 2.0).collect())
        });
        let problem = AssimilationProblem::new(
            State::from_vec(vec![1.0]),
            Covariance::Scalar(1e10),
            State::from_vec(vec![6.0]),
            Covariance::Scalar(1.0),
        )
        .unwrap();
        let config = Config::default();

        let logged = variational::minimize(
            &operator,
            &problem,
            &config,
            LogObserver::new(Level::Debug).with_target("test"),
        )
        .unwrap();
        let silent = variational::minimize_unobserved(&operator, &problem, &config).unwrap();

        assert_eq!(logged.status, Status::Converged);
        assert_eq!(logged, silent);
        assert_relative_eq!(logged.analysis[0], 3.0, epsilon = 1e-6);
    }
}
