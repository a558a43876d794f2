//! Reference climate-response engine for the cicf pipeline
//!
//! [`ReducedComplexityEngine`] couples a handful of small components, each
//! stepped annually over the input year axis:
//!
//! - `components::CarbonCycle`: one-box CO2 cycle with temperature-dependent uptake
//! - `components::GasCycle`: one-box CH4 and N2O cycles
//! - `components::Forcing`: greenhouse-gas and aerosol effective radiative forcing
//! - `components::TwoLayer`: two-layer energy balance model
//!
//! The ODE components are integrated with the fixed-step RK4 solver from
//! `ode_solvers`.
//!
//! # Parameters
//!
//! Each component has an associated parameters struct in the `parameters` module
//! with defaults close to AR6 central estimates.

pub mod components;
pub mod constants;
mod engine;
mod ivp;
pub mod parameters;

pub use engine::ReducedComplexityEngine;
