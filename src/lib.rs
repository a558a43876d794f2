//! Carbon-intensity counterfactual pipeline.
//!
//! Builds a counterfactual CO2 emissions trajectory in which the carbon
//! intensity of GDP stays at its 1975 level while GDP follows its historical
//! path, then runs both the historical and counterfactual scenarios through a
//! climate-response engine and compares the outcomes.
//!
//! The stages live in [`cicf_core`]; the reference engine in
//! [`cicf_components`]. This crate wires them together from a TOML
//! configuration (see [`config`]).

pub mod config;
pub mod errors;
pub mod pipeline;

pub use config::PipelineConfig;
pub use errors::{PipelineError, PipelineResult};
pub use pipeline::{Pipeline, PipelineOutput};
