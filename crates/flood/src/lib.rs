//! River flood height model for the Varda framework.
//!
//! A [`RiverReach`] maps a discharge and a Strickler roughness coefficient to
//! a water height using the Manning-Strickler relation for a wide
//! rectangular channel:
//!
//! ```text
//! H = (Q / (Ks · B · √α))^(3/5),    α = (Zm − Zv) / L
//! ```
//!
//! [`FloodModel`] evaluates that relation over a fixed set of discharges and
//! serves as the observation operator when calibrating `Ks` from measured
//! heights. The [`scenario`] module holds the reference calibration case.

mod error;
mod model;
mod reach;

pub mod scenario;

pub use error::FloodError;
pub use model::FloodModel;
pub use reach::RiverReach;
