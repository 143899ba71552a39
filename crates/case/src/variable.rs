use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

macro_rules! variables {
    ($($(#[$doc:meta])* $name:ident,)+) => {
        /// A named result a case can store and observe.
        #[allow(clippy::upper_case_acronyms)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum Variable {
            $($(#[$doc])* $name,)+
        }

        impl Variable {
            /// Every variable, in declaration order.
            pub const ALL: &'static [Variable] = &[$(Self::$name,)+];

            /// Returns the variable's name.
            #[must_use]
            pub fn name(self) -> &'static str {
                match self {
                    $(Self::$name => stringify!($name),)+
                }
            }
        }
    };
}

variables! {
    /// Successive accepted estimates; the last is the analysis.
    Analysis,
    /// Every state at which the cost was evaluated.
    CurrentState,
    /// The best state after each iteration.
    CurrentOptimum,
    /// Total cost at each evaluated state.
    CostFunctionJ,
    /// Background cost at each evaluated state.
    CostFunctionJb,
    /// Observation cost at each evaluated state.
    CostFunctionJo,
    /// Total cost at each current optimum.
    CostFunctionJAtCurrentOptimum,
    /// Background cost at each current optimum.
    CostFunctionJbAtCurrentOptimum,
    /// Observation cost at each current optimum.
    CostFunctionJoAtCurrentOptimum,
    /// `h(x)` at each evaluated state.
    SimulatedObservationAtCurrentState,
    /// `h(x)` at each current optimum.
    SimulatedObservationAtCurrentOptimum,
    /// `h(xa)` at the analysis.
    SimulatedObservationAtOptimum,
    /// `h(xb)` at the background.
    SimulatedObservationAtBackground,
    /// `y − h(xb)`.
    Innovation,
    /// Observation minus analysis, `y − h(xa)`.
    OMA,
    /// Observation minus background, `y − h(xb)`.
    OMB,
    /// Background minus analysis, `xb − xa`.
    BMA,
    /// The background vector.
    Background,
    /// The observation vector.
    Observation,
}

impl Default for Variable {
    fn default() -> Self {
        Self::CurrentState
    }
}

/// Error returned when parsing an unknown variable name.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown variable `{0}`")]
pub struct ParseVariableError(pub String);

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Variable {
    type Err = ParseVariableError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|variable| variable.name() == s)
            .ok_or_else(|| ParseVariableError(s.to_owned()))
    }
}

/// Variables stored by default in addition to those always kept.
pub const DEFAULT_SUPPLEMENTARY: [Variable; 5] = [
    Variable::CostFunctionJAtCurrentOptimum,
    Variable::CostFunctionJoAtCurrentOptimum,
    Variable::CurrentOptimum,
    Variable::SimulatedObservationAtCurrentOptimum,
    Variable::SimulatedObservationAtOptimum,
];
