use thiserror::Error;

/// Errors from invalid river geometry or flow inputs.
#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum FloodError {
    #[error("reach length must be positive, got {0} m")]
    NonPositiveLength(f64),

    #[error("reach width must be positive, got {0} m")]
    NonPositiveWidth(f64),

    #[error("upstream elevation must exceed downstream elevation, slope is {0}")]
    NonPositiveSlope(f64),

    #[error("Strickler coefficient must be finite and positive, got {0}")]
    NonPositiveStrickler(f64),

    #[error("discharge must be finite and non-negative, got {0} m³/s")]
    NegativeDischarge(f64),

    #[error("expected {expected} parameter, got {actual}")]
    ParameterLength { expected: usize, actual: usize },
}
