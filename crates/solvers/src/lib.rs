//! Assimilation solvers for the Varda framework.
//!
//! Every solver takes an [`ObservationOperator`] and an
//! [`AssimilationProblem`] and returns a [`Solution`]: the sequence of
//! successive estimates, the last of which is the analysis.
//!
//! # Solvers
//!
//! - [`variational`]: 3D-VAR, minimizing the background + observation cost
//! - [`least_squares`]: linear and non-linear weighted least squares,
//!   without a background term
//! - [`blue`]: best linear unbiased estimator around the background
//!
//! The [`Assimilate`] trait is the boundary a case executes through:
//! [`Solver`] dispatches to the solvers above by [`Algorithm`], and any other
//! engine (or a test stub) can stand in for it.
//!
//! [`ObservationOperator`]: varda_core::ObservationOperator
//! [`AssimilationProblem`]: varda_core::AssimilationProblem

mod action;
mod algorithm;
mod config;
mod direct;
mod error;
mod event;
mod gauss_newton;
mod solution;

pub mod blue;
pub mod evaluate;
pub mod jacobian;
pub mod least_squares;
pub mod variational;

pub use action::Action;
pub use algorithm::{Algorithm, Assimilate, ParseAlgorithmError, Solver};
pub use config::{Config, ConfigError, Differences};
pub use error::Error;
pub use evaluate::{Cost, Point};
pub use event::Event;
pub use solution::{Solution, Status};
