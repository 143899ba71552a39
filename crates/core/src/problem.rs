use thiserror::Error;

use crate::{Bounds, BoundsError, Covariance, CovarianceError, State};

/// The inputs of an assimilation: a prior estimate, observations, and their
/// error covariances, with optional bound constraints on the estimate.
///
/// Construction validates every dimension, so solvers can rely on
/// `background`, `background_error`, and `bounds` sharing one length `n` and
/// `observation` and `observation_error` sharing one length `m`.
#[derive(Debug, Clone, PartialEq)]
pub struct AssimilationProblem {
    background: State,
    background_error: Covariance,
    observation: State,
    observation_error: Covariance,
    bounds: Option<Bounds>,
}

/// Errors that can occur when assembling an assimilation problem.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProblemError {
    #[error("background vector is empty")]
    EmptyBackground,

    #[error("observation vector is empty")]
    EmptyObservation,

    #[error("{name} contains a non-finite value")]
    NonFinite { name: &'static str },

    #[error("invalid background error: {0}")]
    BackgroundError(#[source] CovarianceError),

    #[error("invalid observation error: {0}")]
    ObservationError(#[source] CovarianceError),

    #[error("invalid bounds: {0}")]
    Bounds(#[from] BoundsError),
}

impl AssimilationProblem {
    /// Creates a validated problem without bounds.
    ///
    /// # Errors
    ///
    /// Returns an error if a vector is empty or non-finite, or a covariance
    /// is invalid for its vector's length.
    pub fn new(
        background: State,
        background_error: Covariance,
        observation: State,
        observation_error: Covariance,
    ) -> Result<Self, ProblemError> {
        if background.is_empty() {
            return Err(ProblemError::EmptyBackground);
        }
        if observation.is_empty() {
            return Err(ProblemError::EmptyObservation);
        }
        if background.iter().any(|v| !v.is_finite()) {
            return Err(ProblemError::NonFinite { name: "background" });
        }
        if observation.iter().any(|v| !v.is_finite()) {
            return Err(ProblemError::NonFinite {
                name: "observation",
            });
        }

        background_error
            .validate(background.len())
            .map_err(ProblemError::BackgroundError)?;
        observation_error
            .validate(observation.len())
            .map_err(ProblemError::ObservationError)?;

        Ok(Self {
            background,
            background_error,
            observation,
            observation_error,
            bounds: None,
        })
    }

    /// Adds bound constraints on the estimate.
    ///
    /// # Errors
    ///
    /// Returns an error if the number of bounds differs from the background length.
    pub fn with_bounds(mut self, bounds: Bounds) -> Result<Self, ProblemError> {
        bounds.check_dimension(self.background.len())?;
        self.bounds = Some(bounds);
        Ok(self)
    }

    /// The prior estimate `xb`.
    #[must_use]
    pub fn background(&self) -> &State {
        &self.background
    }

    /// The background error covariance `B`.
    #[must_use]
    pub fn background_error(&self) -> &Covariance {
        &self.background_error
    }

    /// The observation vector `y`.
    #[must_use]
    pub fn observation(&self) -> &State {
        &self.observation
    }

    /// The observation error covariance `R`.
    #[must_use]
    pub fn observation_error(&self) -> &Covariance {
        &self.observation_error
    }

    /// The bound constraints, if any.
    #[must_use]
    pub fn bounds(&self) -> Option<&Bounds> {
        self.bounds.as_ref()
    }

    /// Number of estimated parameters.
    #[must_use]
    pub fn state_len(&self) -> usize {
        self.background.len()
    }

    /// Number of observations.
    #[must_use]
    pub fn observation_len(&self) -> usize {
        self.observation.len()
    }

    /// Projects `state` onto the bounds, if any.
    pub fn project(&self, state: &mut State) {
        if let Some(bounds) = &self.bounds {
            bounds.project(state);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(values: &[f64]) -> State {
        State::from_column_slice(values)
    }

    #[test]
    fn accepts_consistent_dimensions() {
        let problem = AssimilationProblem::new(
            state(&[20.0]),
            Covariance::diagonal(&[5e10]),
            state(&[0.2, 0.3, 0.4, 0.5]),
            Covariance::Scalar(0.5),
        )
        .unwrap()
        .with_bounds(Bounds::new([(20.0, 40.0)]).unwrap())
        .unwrap();

        assert_eq!(problem.state_len(), 1);
        assert_eq!(problem.observation_len(), 4);

        let mut x = state(&[50.0]);
        problem.project(&mut x);
        assert_eq!(x[0], 40.0);
    }

    #[test]
    fn rejects_mismatched_covariance() {
        let result = AssimilationProblem::new(
            state(&[1.0, 2.0]),
            Covariance::diagonal(&[1.0]),
            state(&[1.0]),
            Covariance::Scalar(1.0),
        );

        assert_eq!(
            result,
            Err(ProblemError::BackgroundError(CovarianceError::Dimension {
                expected: 2,
                actual: 1
            }))
        );
    }

    #[test]
    fn rejects_empty_and_non_finite_vectors() {
        let empty = AssimilationProblem::new(
            state(&[]),
            Covariance::Scalar(1.0),
            state(&[1.0]),
            Covariance::Scalar(1.0),
        );
        assert_eq!(empty, Err(ProblemError::EmptyBackground));

        let nan = AssimilationProblem::new(
            state(&[1.0]),
            Covariance::Scalar(1.0),
            state(&[f64::NAN]),
            Covariance::Scalar(1.0),
        );
        assert_eq!(
            nan,
            Err(ProblemError::NonFinite {
                name: "observation"
            })
        );
    }

    #[test]
    fn rejects_bounds_of_wrong_length() {
        let problem = AssimilationProblem::new(
            state(&[1.0, 2.0]),
            Covariance::Scalar(1.0),
            state(&[1.0]),
            Covariance::Scalar(1.0),
        )
        .unwrap();

        let result = problem.with_bounds(Bounds::new([(0.0, 1.0)]).unwrap());

        assert!(matches!(result, Err(ProblemError::Bounds(_))));
    }
}
