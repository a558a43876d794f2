use cicf_core::timeseries::FloatValue;
use serde::{Deserialize, Serialize};

/// Parameters for the one-box carbon cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CarbonCycleParameters {
    /// Timescale of the box's response
    /// unit: yr
    /// default: 20.3
    pub tau: FloatValue,

    /// Pre-industrial atmospheric CO2 concentration
    /// unit: ppm
    /// default: 278.0
    pub conc_pi: FloatValue,

    /// Sensitivity of lifetime to changes in global-mean temperature
    /// unit: 1 / K
    /// default: 0.042
    pub alpha_temperature: FloatValue,
}

impl Default for CarbonCycleParameters {
    fn default() -> Self {
        Self {
            tau: 20.3,
            conc_pi: 278.0,
            alpha_temperature: 0.042,
        }
    }
}

/// Solver options for the ODE integrations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverOptions {
    /// Fixed RK4 step within each annual interval
    /// unit: yr
    /// default: 0.1
    pub step_size: FloatValue,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self { step_size: 0.1 }
    }
}
