use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use varda_core::{AssimilationProblem, ObservationOperator, Observer};

use crate::{Action, Config, Error, Event, Solution, blue, least_squares, variational};

/// The assimilation algorithms a [`Solver`] can run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Algorithm {
    /// Variational minimization of background + observation cost.
    #[default]
    #[serde(rename = "3DVAR")]
    ThreeDVar,

    /// Best linear unbiased estimator.
    #[serde(rename = "Blue")]
    Blue,

    /// One-shot weighted least squares.
    #[serde(rename = "LinearLeastSquares")]
    LinearLeastSquares,

    /// Iterative weighted least squares.
    #[serde(rename = "NonLinearLeastSquares")]
    NonLinearLeastSquares,
}

/// Error returned when parsing an unknown algorithm name.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown algorithm `{0}`")]
pub struct ParseAlgorithmError(pub String);

impl Algorithm {
    /// Every supported algorithm.
    pub const ALL: [Algorithm; 4] = [
        Self::ThreeDVar,
        Self::Blue,
        Self::LinearLeastSquares,
        Self::NonLinearLeastSquares,
    ];

    /// Returns the algorithm's name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::ThreeDVar => "3DVAR",
            Self::Blue => "Blue",
            Self::LinearLeastSquares => "LinearLeastSquares",
            Self::NonLinearLeastSquares => "NonLinearLeastSquares",
        }
    }

    /// Returns true if the algorithm iterates and honors bounds.
    #[must_use]
    pub fn is_iterative(self) -> bool {
        matches!(self, Self::ThreeDVar | Self::NonLinearLeastSquares)
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Algorithm {
    type Err = ParseAlgorithmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|algorithm| algorithm.name() == s)
            .ok_or_else(|| ParseAlgorithmError(s.to_owned()))
    }
}

/// An assimilation engine.
///
/// Cases execute through this trait, so any engine can replace [`Solver`].
pub trait Assimilate {
    /// Assimilates `problem` through `operator`, reporting progress to `observer`.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine cannot produce an analysis.
    fn assimilate<Op, Obs>(
        &self,
        operator: &Op,
        problem: &AssimilationProblem,
        observer: Obs,
    ) -> Result<Solution, Error>
    where
        Op: ObservationOperator + ?Sized,
        Obs: for<'a> Observer<Event<'a>, Action>;
}

/// The built-in engine, dispatching to a solver by [`Algorithm`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Solver {
    pub algorithm: Algorithm,
    pub config: Config,
}

impl Solver {
    /// Creates a solver.
    #[must_use]
    pub fn new(algorithm: Algorithm, config: Config) -> Self {
        Self { algorithm, config }
    }
}

impl Assimilate for Solver {
    fn assimilate<Op, Obs>(
        &self,
        operator: &Op,
        problem: &AssimilationProblem,
        observer: Obs,
    ) -> Result<Solution, Error>
    where
        Op: ObservationOperator + ?Sized,
        Obs: for<'a> Observer<Event<'a>, Action>,
    {
        log::debug!(
            "running {} with {} parameters and {} observations",
            self.algorithm,
            problem.state_len(),
            problem.observation_len(),
        );

        let config = &self.config;
        let solution = match self.algorithm {
            Algorithm::ThreeDVar => variational::minimize(operator, problem, config, observer),
            Algorithm::Blue => blue::analyze(operator, problem, config, observer),
            Algorithm::LinearLeastSquares => {
                least_squares::linear(operator, problem, config, observer)
            }
            Algorithm::NonLinearLeastSquares => {
                least_squares::nonlinear(operator, problem, config, observer)
            }
        }?;

        log::debug!(
            "{} finished after {} iterations: {:?}",
            self.algorithm,
            solution.iters,
            solution.status,
        );
        Ok(solution)
    }
}
