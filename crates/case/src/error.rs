use thiserror::Error;

use varda_core::ProblemError;
use varda_solvers::ConfigError;

/// Errors that can occur while configuring or executing a case.
#[derive(Debug, Error)]
pub enum CaseError {
    #[error("required key `{0}` is not set")]
    Missing(&'static str),

    #[error("`{key}` has dimension {actual}, expected {expected}")]
    Dimension {
        key: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("`{0}` is not supported")]
    Unsupported(&'static str),

    #[error("invalid case: {0}")]
    Invalid(#[from] ProblemError),

    #[error("invalid solver parameters: {0}")]
    Config(#[from] ConfigError),

    #[error("assimilation failed: {0}")]
    Solver(#[from] varda_solvers::Error),

    #[error("invalid case file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("exchange protocol error: {0}")]
    Exchange(&'static str),
}
