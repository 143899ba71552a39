//! Case files: the data sections of a case in TOML.
//!
//! A case file holds everything but the observation function, which is
//! supplied in code when the file is turned into a [`Case`]:
//!
//! ```toml
//! [AlgorithmParameters]
//! Algorithm = "3DVAR"
//!
//! [AlgorithmParameters.Parameters]
//! Bounds = [{ lower = 20.0, upper = 40.0 }]
//! MaximumNumberOfSteps = 100
//!
//! [Background]
//! Vector = [20.0]
//!
//! [BackgroundError]
//! DiagonalSparseMatrix = [5e10]
//!
//! [Observation]
//! Vector = [0.19694513, 0.298513, 0.38073079, 0.45246109]
//!
//! [ObservationError]
//! ScalarSparseMatrix = 0.5
//!
//! [[Observer]]
//! Variable = "Analysis"
//! Template = "ValueSeriePrinter"
//! ```

use serde::Deserialize;
use varda_core::{Bound, Covariance, CovarianceError, ProblemError};
use varda_solvers::Algorithm;

use crate::{
    AlgorithmParameters, Background, BackgroundError, Case, CaseError, Observation,
    ObservationError, ObservationOperator, Observer, OneFunction, Template, Variable,
    section::{DEFAULT_BACKGROUND_VARIANCE, DEFAULT_OBSERVATION_VARIANCE},
    variable::DEFAULT_SUPPLEMENTARY,
};

/// A deserialized case file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CaseFile {
    #[serde(rename = "AlgorithmParameters", default)]
    algorithm: AlgorithmSection,

    #[serde(rename = "Background")]
    background: VectorSection,

    #[serde(rename = "BackgroundError")]
    background_error: Option<CovarianceSection>,

    #[serde(rename = "Observation")]
    observation: VectorSection,

    #[serde(rename = "ObservationError")]
    observation_error: Option<CovarianceSection>,

    #[serde(rename = "ObservationOperator", default)]
    operator: OperatorSection,

    #[serde(rename = "Observer", default)]
    observers: Vec<ObserverSection>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
struct AlgorithmSection {
    #[serde(rename = "Algorithm", default)]
    algorithm: Algorithm,

    #[serde(rename = "Parameters", default)]
    parameters: AlgorithmParametersSection,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "PascalCase", default)]
struct AlgorithmParametersSection {
    bounds: Option<Vec<Bound>>,
    maximum_number_of_steps: usize,
    cost_decrement_tolerance: f64,
    store_supplementary_calculations: Vec<Variable>,
}

impl Default for AlgorithmParametersSection {
    fn default() -> Self {
        Self {
            bounds: None,
            maximum_number_of_steps: 100,
            cost_decrement_tolerance: 1e-7,
            store_supplementary_calculations: DEFAULT_SUPPLEMENTARY.to_vec(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "PascalCase")]
struct VectorSection {
    vector: Vec<f64>,
    stored: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
enum CovarianceSection {
    Matrix(Vec<Vec<f64>>),
    DiagonalSparseMatrix(Vec<f64>),
    ScalarSparseMatrix(f64),
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
struct OperatorSection {
    #[serde(rename = "Parameters", default)]
    parameters: OperatorParametersSection,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "PascalCase", default)]
struct OperatorParametersSection {
    differential_increment: f64,
    centered_finite_difference: bool,
}

impl Default for OperatorParametersSection {
    fn default() -> Self {
        Self {
            differential_increment: 1e-4,
            centered_finite_difference: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "PascalCase")]
struct ObserverSection {
    #[serde(default)]
    variable: Variable,
    #[serde(default)]
    template: Template,
    string: Option<String>,
    info: Option<String>,
}

impl CovarianceSection {
    fn into_covariance(
        self,
        invalid: fn(CovarianceError) -> ProblemError,
    ) -> Result<Covariance, CaseError> {
        Ok(match self {
            Self::Matrix(rows) => Covariance::from_rows(&rows).map_err(invalid)?,
            Self::DiagonalSparseMatrix(variances) => Covariance::diagonal(&variances),
            Self::ScalarSparseMatrix(variance) => Covariance::Scalar(variance),
        })
    }
}

impl CaseFile {
    /// Parses a case file.
    ///
    /// # Errors
    ///
    /// Returns [`CaseError::Parse`] if the text is not a valid case file.
    pub fn from_toml_str(text: &str) -> Result<Self, CaseError> {
        Ok(toml::from_str(text)?)
    }

    /// Builds a case with `function` as the observation function.
    ///
    /// # Errors
    ///
    /// Returns an error if a covariance matrix is not square.
    pub fn into_case(self, function: OneFunction) -> Result<Case, CaseError> {
        let Self {
            algorithm,
            background,
            background_error,
            observation,
            observation_error,
            operator,
            observers,
        } = self;

        let mut algorithm_parameters = AlgorithmParameters::new(algorithm.algorithm)
            .with_maximum_number_of_steps(algorithm.parameters.maximum_number_of_steps)
            .with_cost_decrement_tolerance(algorithm.parameters.cost_decrement_tolerance)
            .with_store_supplementary_calculations(
                algorithm.parameters.store_supplementary_calculations,
            );
        algorithm_parameters.bounds = algorithm.parameters.bounds;

        let background_error = match background_error {
            Some(section) => {
                BackgroundError(section.into_covariance(ProblemError::BackgroundError)?)
            }
            None => BackgroundError(Covariance::Scalar(DEFAULT_BACKGROUND_VARIANCE)),
        };
        let observation_error = match observation_error {
            Some(section) => {
                ObservationError(section.into_covariance(ProblemError::ObservationError)?)
            }
            None => ObservationError(Covariance::Scalar(DEFAULT_OBSERVATION_VARIANCE)),
        };

        let mut case = Case::new();
        case.set(algorithm_parameters)
            .set(Background::new(background.vector).stored(background.stored.unwrap_or(true)))
            .set(background_error)
            .set(
                Observation::new(observation.vector)
                    .stored(observation.stored.unwrap_or(false)),
            )
            .set(observation_error)
            .set(
                ObservationOperator::new(function)
                    .with_differential_increment(operator.parameters.differential_increment)
                    .with_centered_finite_difference(
                        operator.parameters.centered_finite_difference,
                    ),
            );

        for observer in observers {
            case.set(Observer {
                variable: observer.variable,
                template: observer.template,
                string: observer.string,
                info: observer.info,
            });
        }

        Ok(case)
    }
}
