//! Reusable observers for the Varda framework.
//!
//! This crate provides [`Observer`] implementations and capability traits that
//! work with the assimilation solvers in `varda-solvers`.
//!
//! # Modules
//!
//! - [`traits`]: capability traits for generic observers
//!   ([`HasCost`], [`CanStopEarly`], [`CanAssumeWorse`])
//! - [`History`]: records every evaluated and accepted point
//! - [`LogObserver`]: reports solver progress through the `log` facade
//!
//! [`Observer`]: varda_core::Observer
//! [`HasCost`]: traits::HasCost
//! [`CanStopEarly`]: traits::CanStopEarly
//! [`CanAssumeWorse`]: traits::CanAssumeWorse

mod history;
mod log_observer;

pub mod traits;

pub use history::History;
pub use log_observer::LogObserver;
