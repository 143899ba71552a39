//! The reference calibration scenario.
//!
//! Heights were observed at four discharges on the reference reach. Starting
//! from a background roughness of `Ks = 20` with a loose background error,
//! assimilating the observations should recover `Ks = 25`.

use uom::si::{f64::VolumeRate, volume_rate::cubic_meter_per_second};
use varda_core::{AssimilationProblem, Bound, Bounds, Covariance, ProblemError, State};

use crate::{FloodModel, RiverReach};

/// Discharges (m³/s) at which heights were observed.
pub const DISCHARGES: [f64; 4] = [10.0, 20.0, 30.0, 40.0];

/// Observed heights (m).
pub const OBSERVED_HEIGHTS: [f64; 4] = [0.19694513, 0.298513, 0.38073079, 0.45246109];

/// Background Strickler coefficient.
pub const BACKGROUND_STRICKLER: f64 = 20.0;

/// Background error variance on `Ks`.
pub const BACKGROUND_VARIANCE: f64 = 5.0e10;

/// Observation error variance (m²).
pub const OBSERVATION_VARIANCE: f64 = 0.5;

/// Admissible range of `Ks`.
pub const STRICKLER_BOUNDS: (f64, f64) = (20.0, 40.0);

/// A calibration scenario: a forward model and the data to fit it to.
#[derive(Debug, Clone, PartialEq)]
pub struct Scenario {
    pub model: FloodModel,
    pub background: State,
    pub background_error: Covariance,
    pub observation: State,
    pub observation_error: Covariance,
    pub bounds: Vec<Bound>,
}

impl Scenario {
    /// Assembles the assimilation problem.
    ///
    /// # Errors
    ///
    /// Returns an error if the scenario's dimensions or bounds are invalid.
    pub fn problem(&self) -> Result<AssimilationProblem, ProblemError> {
        AssimilationProblem::new(
            self.background.clone(),
            self.background_error.clone(),
            self.observation.clone(),
            self.observation_error.clone(),
        )?
        .with_bounds(Bounds::new(self.bounds.iter().copied())?)
    }
}

/// Returns the reference scenario.
#[must_use]
pub fn reference() -> Scenario {
    let discharges = DISCHARGES
        .into_iter()
        .map(VolumeRate::new::<cubic_meter_per_second>)
        .collect();

    Scenario {
        model: FloodModel::new(RiverReach::reference(), discharges),
        background: State::from_vec(vec![BACKGROUND_STRICKLER]),
        background_error: Covariance::diagonal(&[BACKGROUND_VARIANCE]),
        observation: State::from_column_slice(&OBSERVED_HEIGHTS),
        observation_error: Covariance::Scalar(OBSERVATION_VARIANCE),
        bounds: vec![STRICKLER_BOUNDS.into()],
    }
}
