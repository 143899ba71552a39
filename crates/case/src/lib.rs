//! Keyed assimilation cases.
//!
//! A [`Case`] gathers the named sections of an assimilation study (the
//! algorithm and its parameters, the background and its error covariance,
//! the observation and its error covariance, the observation operator, and
//! any observers), runs one of the `varda-solvers` algorithms over them, and
//! keeps the requested result variables by name.
//!
//! Cases can also be read from TOML with [`CaseFile`], or driven from the
//! outside with [`Exchange`] when the caller evaluates the forward model
//! itself.

mod case;
mod error;
mod exchange;
mod file;
mod operator;
mod record;
mod results;
mod section;
mod template;
mod variable;

pub use case::Case;
pub use error::CaseError;
pub use exchange::Exchange;
pub use file::CaseFile;
pub use operator::{OneFunction, OperatorError};
pub use results::{Results, Series};
pub use section::{
    AlgorithmParameters, Background, BackgroundError, DEFAULT_BACKGROUND_VARIANCE,
    DEFAULT_OBSERVATION_VARIANCE, Observation, ObservationError, ObservationOperator, Observer,
    Section,
};
pub use template::Template;
pub use variable::{DEFAULT_SUPPLEMENTARY, ParseVariableError, Variable};
