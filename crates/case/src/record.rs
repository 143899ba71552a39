use std::collections::BTreeSet;

use varda_core::State;
use varda_observers::LogObserver;
use varda_solvers::Event;

use crate::{Results, Series, Variable};

/// A callback run each time a watched variable receives a value.
pub(crate) type Watcher = Box<dyn FnMut(&Series) + Send>;

/// Turns solver events into stored variables and notifies watchers.
pub(crate) struct Recorder<'w> {
    results: Results,
    watchers: Vec<(Variable, &'w mut Watcher)>,
    log: LogObserver,
}

impl<'w> Recorder<'w> {
    pub(crate) fn new(
        stored: &BTreeSet<Variable>,
        watchers: Vec<(Variable, &'w mut Watcher)>,
        log: LogObserver,
    ) -> Self {
        let mut results = Results::default();
        for &variable in stored {
            results.store(variable);
        }
        Self {
            results,
            watchers,
            log,
        }
    }

    /// Stores `value` if `variable` is stored, then runs its watchers.
    pub(crate) fn push(&mut self, variable: Variable, value: State) {
        if let Some(series) = self.results.push(variable, value) {
            for (_, watcher) in self.watchers.iter_mut().filter(|(v, _)| *v == variable) {
                watcher(series);
            }
        }
    }

    pub(crate) fn record(&mut self, event: &Event<'_>) {
        self.log.log(event);

        match event {
            Event::Evaluated { point, .. } => {
                self.push(Variable::CurrentState, point.state.clone());
                self.push(Variable::CostFunctionJ, scalar(point.cost.j));
                self.push(Variable::CostFunctionJb, scalar(point.cost.jb));
                self.push(Variable::CostFunctionJo, scalar(point.cost.jo));
                self.push(
                    Variable::SimulatedObservationAtCurrentState,
                    point.simulated.clone(),
                );
            }
            Event::Accepted { point, .. } => {
                self.push(Variable::CurrentOptimum, point.state.clone());
                self.push(Variable::CostFunctionJAtCurrentOptimum, scalar(point.cost.j));
                self.push(
                    Variable::CostFunctionJbAtCurrentOptimum,
                    scalar(point.cost.jb),
                );
                self.push(
                    Variable::CostFunctionJoAtCurrentOptimum,
                    scalar(point.cost.jo),
                );
                self.push(
                    Variable::SimulatedObservationAtCurrentOptimum,
                    point.simulated.clone(),
                );
            }
            Event::TrialFailed { .. } => {}
        }
    }

    /// Returns true if `variable` is stored.
    pub(crate) fn stores(&self, variable: Variable) -> bool {
        self.results.get(variable).is_some()
    }

    pub(crate) fn into_results(self) -> Results {
        self.results
    }
}

pub(crate) fn scalar(value: f64) -> State {
    State::from_element(1, value)
}
