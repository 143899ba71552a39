use uom::si::{f64::VolumeRate, length::meter};
use varda_core::{Model, ObservationOperator, State};

use crate::{FloodError, RiverReach};

/// Water heights over a fixed set of discharges, parameterized by `Ks`.
///
/// The parameter vector holds a single component, the Strickler coefficient.
/// The output has one height (in meters) per discharge, in discharge order.
#[derive(Debug, Clone, PartialEq)]
pub struct FloodModel {
    pub reach: RiverReach,
    pub discharges: Vec<VolumeRate>,
}

impl FloodModel {
    #[must_use]
    pub fn new(reach: RiverReach, discharges: Vec<VolumeRate>) -> Self {
        Self { reach, discharges }
    }

    /// Number of simulated observations per evaluation.
    #[must_use]
    pub fn observation_len(&self) -> usize {
        self.discharges.len()
    }
}

impl Model for FloodModel {
    type Input = State;
    type Output = State;
    type Error = FloodError;

    fn call(&self, theta: &State) -> Result<State, FloodError> {
        if theta.len() != 1 {
            return Err(FloodError::ParameterLength {
                expected: 1,
                actual: theta.len(),
            });
        }

        let heights = self.reach.heights(&self.discharges, theta[0])?;
        Ok(State::from_iterator(
            heights.len(),
            heights.iter().map(|h| h.get::<meter>()),
        ))
    }
}

impl ObservationOperator for FloodModel {
    type Error = FloodError;

    fn evaluate(&self, states: &[State]) -> Result<Vec<State>, FloodError> {
        states.iter().map(|theta| self.call(theta)).collect()
    }
}
