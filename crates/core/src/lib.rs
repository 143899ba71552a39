//! Core traits and types for the Varda framework.
//!
//! This crate defines the shared abstractions that solvers, observers, and
//! assimilation cases build on:
//!
//! - [`Model`]: a callable that maps a typed input to a typed output
//! - [`Observer`]: receives solver events and optionally returns control actions
//! - [`ObservationOperator`]: a forward model evaluated over a batch of states
//! - [`Covariance`]: an error covariance given as a full matrix, a diagonal,
//!   or a scalar
//! - [`Bounds`]: optional per-component bound constraints
//! - [`AssimilationProblem`]: the background, observations, and error
//!   covariances handed to a solver

mod bounds;
mod covariance;
mod model;
mod observer;
mod operator;
mod problem;

pub use bounds::{Bound, Bounds, BoundsError};
pub use covariance::{Covariance, CovarianceError};
pub use model::Model;
pub use observer::Observer;
pub use operator::{EachState, MultiFunction, ObservationOperator};
pub use problem::{AssimilationProblem, ProblemError};

/// A parameter or observation vector.
pub type State = nalgebra::DVector<f64>;
