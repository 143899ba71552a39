//! The typed sections of a case.
//!
//! Each section mirrors one keyed block of an assimilation case. Sections
//! start from their documented defaults and are adjusted with builder
//! methods, then handed to [`Case::set`](crate::Case::set).

use varda_core::{Bound, Covariance, CovarianceError, State};
use varda_solvers::Algorithm;

use crate::{
    OneFunction, Template, Variable, template::format_vector, variable::DEFAULT_SUPPLEMENTARY,
};

/// Default variance of the background error.
pub const DEFAULT_BACKGROUND_VARIANCE: f64 = 1e10;

/// Default variance of the observation error.
pub const DEFAULT_OBSERVATION_VARIANCE: f64 = 1.0;

/// A rendered key value: either a leaf or a nested dictionary.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Value {
    Leaf(String),
    Dict(Vec<(&'static str, Value)>),
}

impl Value {
    fn text(value: impl ToString) -> Self {
        Self::Leaf(value.to_string())
    }

    fn quoted(value: impl std::fmt::Display) -> Self {
        Self::Leaf(format!("\"{value}\""))
    }

    /// Plain decimals like `0.5` or `10000000000.0`; exponents only below
    /// `1e-4` or from `1e16` on.
    fn number(value: f64) -> Self {
        Self::Leaf(format!("{value:?}"))
    }

    fn flag(value: bool) -> Self {
        Self::text(if value { "True" } else { "False" })
    }

    fn vector(value: &State) -> Self {
        Self::Leaf(format_vector(value))
    }

    fn covariance(value: &Covariance) -> Self {
        match value {
            Covariance::Scalar(v) => Self::number(*v),
            Covariance::Diagonal(d) => Self::vector(d),
            Covariance::Matrix(m) => {
                let rows: Vec<String> = m
                    .row_iter()
                    .map(|row| format_vector(&row.transpose()))
                    .collect();
                Self::Leaf(format!("[{}]", rows.join(", ")))
            }
        }
    }
}

/// Algorithm choice and its parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct AlgorithmParameters {
    pub algorithm: Algorithm,
    pub bounds: Option<Vec<Bound>>,
    pub maximum_number_of_steps: usize,
    pub cost_decrement_tolerance: f64,
    pub store_supplementary_calculations: Vec<Variable>,
}

impl Default for AlgorithmParameters {
    fn default() -> Self {
        Self::new(Algorithm::default())
    }
}

impl AlgorithmParameters {
    #[must_use]
    pub fn new(algorithm: Algorithm) -> Self {
        Self {
            algorithm,
            bounds: None,
            maximum_number_of_steps: 100,
            cost_decrement_tolerance: 1e-7,
            store_supplementary_calculations: DEFAULT_SUPPLEMENTARY.to_vec(),
        }
    }

    /// Sets per-component bounds, e.g. `[(20.0, 40.0)]`.
    #[must_use]
    pub fn with_bounds<B: Into<Bound>>(mut self, bounds: impl IntoIterator<Item = B>) -> Self {
        self.bounds = Some(bounds.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn with_maximum_number_of_steps(mut self, steps: usize) -> Self {
        self.maximum_number_of_steps = steps;
        self
    }

    #[must_use]
    pub fn with_cost_decrement_tolerance(mut self, tolerance: f64) -> Self {
        self.cost_decrement_tolerance = tolerance;
        self
    }

    /// Replaces the list of supplementary variables to store.
    #[must_use]
    pub fn with_store_supplementary_calculations(
        mut self,
        variables: impl IntoIterator<Item = Variable>,
    ) -> Self {
        self.store_supplementary_calculations = variables.into_iter().collect();
        self
    }

    pub(crate) fn values(&self) -> Vec<(&'static str, Value)> {
        let mut parameters = Vec::new();

        // Only the iterative algorithms take bounds and stopping criteria.
        if self.algorithm.is_iterative() {
            if let Some(bounds) = &self.bounds {
                let rendered: Vec<String> = bounds.iter().map(render_bound).collect();
                parameters.push(("Bounds", Value::Leaf(format!("[{}]", rendered.join(", ")))));
            }
            parameters.push((
                "MaximumNumberOfSteps",
                Value::text(self.maximum_number_of_steps),
            ));
            parameters.push((
                "CostDecrementTolerance",
                Value::number(self.cost_decrement_tolerance),
            ));
        }

        let stored: Vec<String> = self
            .store_supplementary_calculations
            .iter()
            .map(|variable| format!("\"{variable}\""))
            .collect();
        parameters.push((
            "StoreSupplementaryCalculations",
            Value::Leaf(format!("[{}]", stored.join(", "))),
        ));

        vec![
            ("Algorithm", Value::quoted(self.algorithm)),
            ("Parameters", Value::Dict(parameters)),
        ]
    }
}

fn render_bound(bound: &Bound) -> String {
    let side = |value: Option<f64>| value.map_or_else(|| "None".to_owned(), |v| v.to_string());
    format!("[{}, {}]", side(bound.lower), side(bound.upper))
}

/// The prior estimate.
#[derive(Debug, Clone, PartialEq)]
pub struct Background {
    pub vector: Option<State>,
    pub stored: bool,
}

impl Default for Background {
    fn default() -> Self {
        Self {
            vector: None,
            stored: true,
        }
    }
}

impl Background {
    #[must_use]
    pub fn new(vector: impl IntoIterator<Item = f64>) -> Self {
        Self {
            vector: Some(State::from_vec(vector.into_iter().collect())),
            ..Self::default()
        }
    }

    /// Sets whether the background is stored as a result variable.
    #[must_use]
    pub fn stored(mut self, stored: bool) -> Self {
        self.stored = stored;
        self
    }

    pub(crate) fn values(&self) -> Vec<(&'static str, Value)> {
        vector_values(self.vector.as_ref(), self.stored)
    }
}

/// The observation vector.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Observation {
    pub vector: Option<State>,
    pub stored: bool,
}

impl Observation {
    #[must_use]
    pub fn new(vector: impl IntoIterator<Item = f64>) -> Self {
        Self {
            vector: Some(State::from_vec(vector.into_iter().collect())),
            stored: false,
        }
    }

    /// Sets whether the observation is stored as a result variable.
    #[must_use]
    pub fn stored(mut self, stored: bool) -> Self {
        self.stored = stored;
        self
    }

    pub(crate) fn values(&self) -> Vec<(&'static str, Value)> {
        vector_values(self.vector.as_ref(), self.stored)
    }
}

fn vector_values(vector: Option<&State>, stored: bool) -> Vec<(&'static str, Value)> {
    let mut values = Vec::new();
    if let Some(vector) = vector {
        values.push(("Vector", Value::vector(vector)));
    }
    values.push(("Stored", Value::flag(stored)));
    values
}

macro_rules! error_section {
    ($(#[$doc:meta])* $name:ident, $default:expr) => {
        $(#[$doc])*
        ///
        /// Exactly one covariance form is set at a time; setting another
        /// replaces it.
        #[derive(Debug, Clone, PartialEq)]
        pub struct $name(pub Covariance);

        impl Default for $name {
            fn default() -> Self {
                Self(Covariance::Scalar($default))
            }
        }

        impl From<Covariance> for $name {
            fn from(covariance: Covariance) -> Self {
                Self(covariance)
            }
        }

        impl $name {
            /// A full covariance matrix given by rows.
            ///
            /// # Errors
            ///
            /// Returns an error if the matrix is not square.
            pub fn matrix(rows: &[Vec<f64>]) -> Result<Self, CovarianceError> {
                Covariance::from_rows(rows).map(Self)
            }

            /// A diagonal covariance given by its variances.
            #[must_use]
            pub fn diagonal_sparse_matrix(variances: &[f64]) -> Self {
                Self(Covariance::diagonal(variances))
            }

            /// A single variance applied to every component.
            #[must_use]
            pub fn scalar_sparse_matrix(variance: f64) -> Self {
                Self(Covariance::Scalar(variance))
            }

            pub(crate) fn values(&self) -> Vec<(&'static str, Value)> {
                vec![(self.0.key(), Value::covariance(&self.0))]
            }
        }
    };
}

error_section!(
    /// The background error covariance `B`.
    BackgroundError,
    DEFAULT_BACKGROUND_VARIANCE
);

error_section!(
    /// The observation error covariance `R`.
    ObservationError,
    DEFAULT_OBSERVATION_VARIANCE
);

/// The forward model and its differentiation parameters.
#[derive(Debug, Clone)]
pub struct ObservationOperator {
    pub function: Option<OneFunction>,
    pub differential_increment: f64,
    pub centered_finite_difference: bool,
}

impl Default for ObservationOperator {
    fn default() -> Self {
        Self {
            function: None,
            differential_increment: 1e-4,
            centered_finite_difference: false,
        }
    }
}

impl ObservationOperator {
    #[must_use]
    pub fn new(function: OneFunction) -> Self {
        Self {
            function: Some(function),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_differential_increment(mut self, increment: f64) -> Self {
        self.differential_increment = increment;
        self
    }

    #[must_use]
    pub fn with_centered_finite_difference(mut self, centered: bool) -> Self {
        self.centered_finite_difference = centered;
        self
    }

    /// Whether the function natively takes a batch of states.
    #[must_use]
    pub fn input_function_as_multi(&self) -> bool {
        use varda_core::ObservationOperator as _;

        self.function
            .as_ref()
            .is_none_or(OneFunction::input_function_as_multi)
    }

    pub(crate) fn values(&self) -> Vec<(&'static str, Value)> {
        let mut values = Vec::new();
        if self.function.is_some() {
            values.push(("OneFunction", Value::text("<function>")));
        }
        values.push((
            "Parameters",
            Value::Dict(vec![
                (
                    "DifferentialIncrement",
                    Value::number(self.differential_increment),
                ),
                (
                    "CenteredFiniteDifference",
                    Value::flag(self.centered_finite_difference),
                ),
            ]),
        ));
        values.push((
            "InputFunctionAsMulti",
            Value::flag(self.input_function_as_multi()),
        ));
        values
    }
}

/// A template observer attached to one variable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Observer {
    pub variable: Variable,
    pub template: Template,
    /// Observer source code. Not executable here; setting it makes the case
    /// fail with [`CaseError::Unsupported`](crate::CaseError::Unsupported).
    pub string: Option<String>,
    /// Prefix for every logged line.
    pub info: Option<String>,
}

impl Observer {
    #[must_use]
    pub fn new(variable: Variable) -> Self {
        Self {
            variable,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_template(mut self, template: Template) -> Self {
        self.template = template;
        self
    }

    #[must_use]
    pub fn with_info(mut self, info: impl Into<String>) -> Self {
        self.info = Some(info.into());
        self
    }

    #[must_use]
    pub fn with_string(mut self, string: impl Into<String>) -> Self {
        self.string = Some(string.into());
        self
    }

    pub(crate) fn values(&self) -> Vec<(&'static str, Value)> {
        let mut values = vec![
            ("Variable", Value::quoted(self.variable)),
            ("Template", Value::quoted(self.template)),
        ];
        if let Some(string) = &self.string {
            values.push(("String", Value::quoted(string)));
        }
        if let Some(info) = &self.info {
            values.push(("Info", Value::quoted(info)));
        }
        values
    }
}

/// Any case section, as accepted by [`Case::set`](crate::Case::set).
#[derive(Debug, Clone)]
pub enum Section {
    AlgorithmParameters(AlgorithmParameters),
    Background(Background),
    BackgroundError(BackgroundError),
    Observation(Observation),
    ObservationError(ObservationError),
    ObservationOperator(ObservationOperator),
    Observer(Observer),
}

macro_rules! section_from {
    ($($name:ident),+) => {
        $(
            impl From<$name> for Section {
                fn from(section: $name) -> Self {
                    Self::$name(section)
                }
            }
        )+
    };
}

section_from!(
    AlgorithmParameters,
    Background,
    BackgroundError,
    Observation,
    ObservationError,
    ObservationOperator,
    Observer
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let algorithm = AlgorithmParameters::default();
        assert_eq!(algorithm.algorithm, Algorithm::ThreeDVar);
        assert_eq!(algorithm.maximum_number_of_steps, 100);
        assert_eq!(algorithm.cost_decrement_tolerance, 1e-7);
        assert_eq!(algorithm.store_supplementary_calculations.len(), 5);

        assert!(Background::default().stored);
        assert!(!Observation::default().stored);
        assert_eq!(BackgroundError::default().0, Covariance::Scalar(1e10));
        assert_eq!(ObservationError::default().0, Covariance::Scalar(1.0));

        let operator = ObservationOperator::default();
        assert_eq!(operator.differential_increment, 1e-4);
        assert!(!operator.centered_finite_difference);
        assert!(operator.input_function_as_multi());

        let observer = Observer::default();
        assert_eq!(observer.variable, Variable::CurrentState);
        assert_eq!(observer.template, Template::ValuePrinter);
    }

    #[test]
    fn blue_renders_only_stored_variables() {
        let blue = AlgorithmParameters::new(Algorithm::Blue).with_bounds([(0.0, 1.0)]);

        let values = blue.values();

        let Value::Dict(parameters) = &values[1].1 else {
            panic!("parameters should be a dictionary");
        };
        let keys: Vec<&str> = parameters.iter().map(|(key, _)| *key).collect();
        assert_eq!(keys, vec!["StoreSupplementaryCalculations"]);
    }

    #[test]
    fn numbers_render_as_plain_decimals() {
        let leaf = |value: &str| Value::Leaf(value.to_owned());

        assert_eq!(Value::number(1.0), leaf("1.0"));
        assert_eq!(Value::number(0.5), leaf("0.5"));
        assert_eq!(Value::number(1e10), leaf("10000000000.0"));
        assert_eq!(Value::number(1e-4), leaf("0.0001"));
        assert_eq!(Value::number(1e-7), leaf("1e-7"));

        let operator = ObservationOperator::default().values();
        let Value::Dict(parameters) = &operator[0].1 else {
            panic!("parameters should be a dictionary");
        };
        assert_eq!(parameters[0], ("DifferentialIncrement", leaf("0.0001")));
    }

    #[test]
    fn setting_a_covariance_form_replaces_the_previous_one() {
        let error = BackgroundError::diagonal_sparse_matrix(&[5e10]);

        assert_eq!(error.values()[0].0, "DiagonalSparseMatrix");
        assert!(BackgroundError::matrix(&[vec![1.0, 0.0]]).is_err());
    }

    #[test]
    fn single_functions_report_multi_false() {
        let operator = ObservationOperator::new(OneFunction::single(|x: &State| {
            Ok::<_, std::convert::Infallible>(x.clone())
        }));

        assert!(!operator.input_function_as_multi());
    }
}
