mod carbon_cycle;
mod forcing;
mod gas_cycle;
mod two_layer;

pub use carbon_cycle::{CarbonCycle, CarbonCycleDrivers};
pub use forcing::{Forcing, ForcingDrivers};
pub use gas_cycle::GasCycle;
pub use two_layer::TwoLayer;
