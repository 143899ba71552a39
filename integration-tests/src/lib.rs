//! Shared cases for the cross-crate tests.

use std::convert::Infallible;

use varda_case::{
    AlgorithmParameters, Background, BackgroundError, Case, Observation, ObservationError,
    ObservationOperator, OneFunction,
};
use varda_core::{Covariance, State};
use varda_flood::scenario::{self, Scenario};
use varda_solvers::Algorithm;

/// Installs a test logger once; later calls are no-ops.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// `y = [x0, 2 x1, 3 x2, x0 + 2 x1 + 3 x2]`, which maps `(2, 3, 4)` onto the
/// linear case's observations.
#[must_use]
pub fn linear(x: &State) -> State {
    State::from_vec(vec![
        x[0],
        2.0 * x[1],
        3.0 * x[2],
        x[0] + 2.0 * x[1] + 3.0 * x[2],
    ])
}

/// The bounded linear case, solved by `algorithm`.
#[must_use]
pub fn linear_case(algorithm: Algorithm) -> Case {
    let mut case = Case::new();
    case.set(
        AlgorithmParameters::new(algorithm).with_bounds([(0.0, 10.0), (3.0, 13.0), (1.5, 15.5)]),
    )
    .set(Background::new([5.0, 7.0, 9.0]))
    .set(BackgroundError::from(Covariance::Scalar(1e10)))
    .set(Observation::new([2.0, 6.0, 12.0, 20.0]))
    .set(ObservationError::from(Covariance::Scalar(1.0)))
    .set(ObservationOperator::new(OneFunction::single(|x: &State| {
        Ok::<_, Infallible>(linear(x))
    })));
    case
}

/// The reference flood calibration as a case.
#[must_use]
pub fn flood_case() -> Case {
    let Scenario {
        model,
        background,
        background_error,
        observation,
        observation_error,
        bounds,
    } = scenario::reference();

    let mut case = Case::new();
    case.set(AlgorithmParameters::default().with_bounds(bounds))
        .set(Background::new(background.iter().copied()))
        .set(BackgroundError::from(background_error))
        .set(Observation::new(observation.iter().copied()))
        .set(ObservationError::from(observation_error))
        .set(ObservationOperator::new(OneFunction::operator(model)));
    case
}
