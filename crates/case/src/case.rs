use std::{collections::BTreeSet, fmt};

use log::Level;
use varda_core::{AssimilationProblem, Bounds, ProblemError};
use varda_observers::LogObserver;
use varda_solvers::{
    Action, Assimilate, Config, Differences, Event, Solver, evaluate::simulate_one,
};

use crate::{
    AlgorithmParameters, Background, BackgroundError, CaseError, Observation, ObservationError,
    ObservationOperator, Observer, OneFunction, Results, Section, Series, Variable,
    record::{Recorder, Watcher},
    section::Value,
};

/// A keyed assimilation case.
///
/// A case is configured section by section with [`Case::set`], executed with
/// [`Case::execute`], and queried with [`Case::get`]. Every section starts
/// from its defaults, so only the background, the observation, and the
/// observation function must be supplied.
///
/// ```
/// use varda_case::{Background, Case, Observation, ObservationOperator, OneFunction};
/// use varda_core::State;
///
/// let mut case = Case::new();
/// case.set(Background::new([0.0]))
///     .set(Observation::new([2.0]))
///     .set(ObservationOperator::new(OneFunction::single(|x: &State| {
///         Ok::<_, std::convert::Infallible>(x.clone())
///     })));
///
/// let results = case.execute().unwrap();
/// assert!((results.analysis().unwrap()[0] - 2.0).abs() < 1e-6);
/// ```
#[derive(Default)]
pub struct Case {
    algorithm: AlgorithmParameters,
    background: Background,
    background_error: BackgroundError,
    observation: Observation,
    observation_error: ObservationError,
    operator: ObservationOperator,
    observers: Vec<Observer>,
    watchers: Vec<(Variable, Watcher)>,
    results: Option<Results>,
}

/// What a validated case hands to an engine.
struct Prepared {
    problem: AssimilationProblem,
    function: OneFunction,
    stored: BTreeSet<Variable>,
}

impl Case {
    /// Creates a case with every section at its defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces a section.
    ///
    /// An [`Observer`] section is added alongside the others, replacing only
    /// an observer of the same variable.
    pub fn set(&mut self, section: impl Into<Section>) -> &mut Self {
        match section.into() {
            Section::AlgorithmParameters(s) => self.algorithm = s,
            Section::Background(s) => self.background = s,
            Section::BackgroundError(s) => self.background_error = s,
            Section::Observation(s) => self.observation = s,
            Section::ObservationError(s) => self.observation_error = s,
            Section::ObservationOperator(s) => self.operator = s,
            Section::Observer(s) => {
                self.observers.retain(|o| o.variable != s.variable);
                self.observers.push(s);
            }
        }
        self
    }

    /// Calls `observer` with the series of `variable` each time it grows.
    ///
    /// Observed variables are always stored.
    pub fn observe<F>(&mut self, variable: Variable, observer: F) -> &mut Self
    where
        F: FnMut(&Series) + Send + 'static,
    {
        self.watchers.push((variable, Box::new(observer)));
        self
    }

    #[must_use]
    pub fn algorithm_parameters(&self) -> &AlgorithmParameters {
        &self.algorithm
    }

    #[must_use]
    pub fn observation_operator(&self) -> &ObservationOperator {
        &self.operator
    }

    /// The built-in solver configured by the algorithm and operator sections.
    ///
    /// # Errors
    ///
    /// Returns an error if a tolerance or increment is invalid.
    pub fn solver(&self) -> Result<Solver, CaseError> {
        let differences = Differences::new(
            self.operator.differential_increment,
            self.operator.centered_finite_difference,
        )?;
        let config = Config::new(
            self.algorithm.maximum_number_of_steps,
            self.algorithm.cost_decrement_tolerance,
        )?
        .with_differences(differences);

        Ok(Solver::new(self.algorithm.algorithm, config))
    }

    /// Runs the configured algorithm and stores its results.
    ///
    /// Blocks until the assimilation finishes.
    ///
    /// # Errors
    ///
    /// Returns an error if a required key is missing, dimensions disagree, a
    /// parameter is invalid, or the solver fails.
    pub fn execute(&mut self) -> Result<&Results, CaseError> {
        let solver = self.solver()?;
        self.execute_with(&solver)
    }

    /// Runs the case through `engine` instead of the built-in solver.
    ///
    /// # Errors
    ///
    /// See [`Case::execute`].
    pub fn execute_with<S: Assimilate>(&mut self, engine: &S) -> Result<&Results, CaseError> {
        let Prepared {
            problem,
            function,
            stored,
        } = self.prepare()?;

        log::debug!("executing case:\n{self}");

        let mut templates: Vec<(Variable, Watcher)> =
            self.observers.iter().map(template_watcher).collect();
        let watchers = templates
            .iter_mut()
            .chain(self.watchers.iter_mut())
            .map(|(variable, watcher)| (*variable, watcher))
            .collect();
        let mut recorder = Recorder::new(
            &stored,
            watchers,
            LogObserver::new(Level::Debug).with_target("varda::case"),
        );

        let solution = engine.assimilate(&function, &problem, |event: &Event<'_>| {
            recorder.record(event);
            None::<Action>
        })?;

        let background = problem.background();
        let observation = problem.observation();

        for state in &solution.states {
            recorder.push(Variable::Analysis, state.clone());
        }
        recorder.push(
            Variable::SimulatedObservationAtOptimum,
            solution.simulated.clone(),
        );
        recorder.push(Variable::OMA, observation - &solution.simulated);
        recorder.push(Variable::BMA, background - &solution.analysis);
        recorder.push(Variable::Background, background.clone());
        recorder.push(Variable::Observation, observation.clone());

        let needs_background_simulation = [
            Variable::SimulatedObservationAtBackground,
            Variable::Innovation,
            Variable::OMB,
        ]
        .into_iter()
        .any(|variable| recorder.stores(variable));
        if needs_background_simulation {
            let simulated = simulate_one(&function, background, problem.observation_len())?;
            let innovation = observation - &simulated;
            recorder.push(Variable::SimulatedObservationAtBackground, simulated);
            recorder.push(Variable::Innovation, innovation.clone());
            recorder.push(Variable::OMB, innovation);
        }

        log::info!(
            "{} finished with status {:?} after {} iterations",
            self.algorithm.algorithm,
            solution.status,
            solution.iters,
        );

        Ok(self.results.insert(recorder.into_results()))
    }

    /// Validates the sections and assembles the problem.
    fn prepare(&self) -> Result<Prepared, CaseError> {
        if self.observers.iter().any(|o| o.string.is_some()) {
            return Err(CaseError::Unsupported("Observer/String"));
        }

        let background = self
            .background
            .vector
            .clone()
            .ok_or(CaseError::Missing("Background/Vector"))?;
        let observation = self
            .observation
            .vector
            .clone()
            .ok_or(CaseError::Missing("Observation/Vector"))?;
        let function = self
            .operator
            .function
            .clone()
            .ok_or(CaseError::Missing("ObservationOperator/OneFunction"))?;

        let n = background.len();
        let m = observation.len();
        check_dimension("BackgroundError", n, self.background_error.0.dimension())?;
        check_dimension("ObservationError", m, self.observation_error.0.dimension())?;

        let mut problem = AssimilationProblem::new(
            background,
            self.background_error.0.clone(),
            observation,
            self.observation_error.0.clone(),
        )?;
        if let Some(bounds) = &self.algorithm.bounds {
            check_dimension("AlgorithmParameters/Parameters/Bounds", n, Some(bounds.len()))?;
            let bounds = Bounds::new(bounds.iter().copied()).map_err(ProblemError::from)?;
            problem = problem.with_bounds(bounds)?;
        }

        Ok(Prepared {
            problem,
            function,
            stored: self.stored_variables(),
        })
    }

    /// Variables kept in the results.
    fn stored_variables(&self) -> BTreeSet<Variable> {
        let mut stored = BTreeSet::from([Variable::Analysis]);
        stored.extend(self.algorithm.store_supplementary_calculations.iter().copied());
        stored.extend(self.observers.iter().map(|o| o.variable));
        stored.extend(self.watchers.iter().map(|(variable, _)| *variable));
        if self.background.stored {
            stored.insert(Variable::Background);
        }
        if self.observation.stored {
            stored.insert(Variable::Observation);
        }
        stored
    }

    /// The results of the last successful execution.
    #[must_use]
    pub fn results(&self) -> Option<&Results> {
        self.results.as_ref()
    }

    /// Returns the stored series named `name`, e.g. `"Analysis"`.
    ///
    /// Returns `None` if the case has not been executed, the name is unknown,
    /// or the variable was not stored.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Series> {
        let variable = name.parse().ok()?;
        self.results.as_ref()?.get(variable)
    }

    /// Every set key as a `(path, rendered value)` pair, in section order.
    ///
    /// Paths join nested keys with `/`, e.g. `Background/Vector`.
    #[must_use]
    pub fn entries(&self) -> Vec<(String, String)> {
        let mut entries = Vec::new();
        for (section, values) in self.sections() {
            flatten(section, &values, &mut entries);
        }
        entries
    }

    /// Looks up the rendered value at `path`.
    #[must_use]
    pub fn find(&self, path: &str) -> Option<String> {
        self.entries()
            .into_iter()
            .find_map(|(key, value)| (key == path).then_some(value))
    }

    fn sections(&self) -> Vec<(&'static str, Vec<(&'static str, Value)>)> {
        let mut sections = vec![
            ("AlgorithmParameters", self.algorithm.values()),
            ("Background", self.background.values()),
            ("BackgroundError", self.background_error.values()),
            ("Observation", self.observation.values()),
            ("ObservationError", self.observation_error.values()),
            ("ObservationOperator", self.operator.values()),
        ];
        sections.extend(self.observers.iter().map(|o| ("Observer", o.values())));
        sections
    }
}

fn check_dimension(
    key: &'static str,
    expected: usize,
    actual: Option<usize>,
) -> Result<(), CaseError> {
    match actual {
        Some(actual) if actual != expected => Err(CaseError::Dimension {
            key,
            expected,
            actual,
        }),
        _ => Ok(()),
    }
}

fn template_watcher(observer: &Observer) -> (Variable, Watcher) {
    let variable = observer.variable;
    let template = observer.template;
    let prefix = observer
        .info
        .as_ref()
        .map_or_else(|| format!("{variable} = "), |info| format!("{info} "));

    let watcher: Watcher = Box::new(move |series: &Series| {
        if let Some(line) = template.render(&prefix, series) {
            log::info!(target: "varda::observer", "{line}");
        }
    });
    (variable, watcher)
}

fn flatten(path: &str, values: &[(&'static str, Value)], out: &mut Vec<(String, String)>) {
    for (key, value) in values {
        let path = format!("{path}/{key}");
        match value {
            Value::Leaf(text) => out.push((path, text.clone())),
            Value::Dict(nested) => flatten(&path, nested, out),
        }
    }
}

fn render(values: &[(&'static str, Value)], nested: bool) -> String {
    let items: Vec<String> = values
        .iter()
        .map(|(key, value)| {
            let value = match value {
                Value::Leaf(text) => text.clone(),
                Value::Dict(inner) => format!("{{{}}}", render(inner, true)),
            };
            if nested {
                format!("\"{key}\": {value}")
            } else {
                format!("{key}={value}")
            }
        })
        .collect();
    items.join(", ")
}

/// Renders the case as one `case.set(...)` line per section.
impl fmt::Display for Case {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (section, values) in self.sections() {
            writeln!(f, "case.set('{section}', {})", render(&values, false))?;
        }
        Ok(())
    }
}

impl fmt::Debug for Case {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Case")
            .field("algorithm", &self.algorithm)
            .field("background", &self.background)
            .field("background_error", &self.background_error)
            .field("observation", &self.observation)
            .field("observation_error", &self.observation_error)
            .field("operator", &self.operator)
            .field("observers", &self.observers)
            .field("watchers", &self.watchers.len())
            .field("results", &self.results)
            .finish()
    }
}
