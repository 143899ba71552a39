use std::error::Error as StdError;

use thiserror::Error;

use varda_core::CovarianceError;

/// Errors that can occur while solving an assimilation problem.
#[derive(Debug, Error)]
pub enum Error {
    #[error("covariance error: {0}")]
    Covariance(#[from] CovarianceError),

    #[error("observation operator failed")]
    Operator(#[source] Box<dyn StdError + Send + Sync>),

    #[error("observation operator returned {actual} outputs for {expected} states")]
    BatchLength { expected: usize, actual: usize },

    #[error("observation operator returned a vector of length {actual}, expected {expected}")]
    OutputLength { expected: usize, actual: usize },

    #[error("observation operator returned a non-finite value")]
    NonFiniteOutput,

    #[error("normal equations are singular")]
    Singular,
}

impl Error {
    pub(crate) fn operator<E: StdError + Send + Sync + 'static>(err: E) -> Self {
        Self::Operator(Box::new(err))
    }
}
