//! Parameter sets for the reference engine.
//!
//! Every struct implements `Default` with the values documented on each field
//! and uses `#[serde(default)]`, so configuration files only need to list the
//! values they change.

mod carbon_cycle;
mod chemistry;
mod climate;
mod forcing;

pub use carbon_cycle::{CarbonCycleParameters, SolverOptions};
pub use chemistry::{MethaneParameters, NitrousOxideParameters};
pub use climate::TwoLayerParameters;
pub use forcing::ForcingParameters;
