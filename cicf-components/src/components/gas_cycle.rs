//! One-box cycle for short and long-lived non-CO2 gases.
//!
//! $$ \frac{dB}{dt} = \frac{E}{k} - \frac{B - B_0}{\tau} $$
//!
//! With emissions constant over the step this has the closed-form solution
//! $B(t + \Delta t) = B^* + (B(t) - B^*) e^{-\Delta t / \tau}$ where
//! $B^* = B_0 + E \tau / k$ is the equilibrium concentration.

use crate::parameters::{MethaneParameters, NitrousOxideParameters};
use cicf_core::timeseries::FloatValue;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GasCycle {
    /// unit: ppb
    conc_pi: FloatValue,
    /// unit: yr
    tau: FloatValue,
    /// unit: Mt / ppb
    mass_per_ppb: FloatValue,
}

impl GasCycle {
    pub fn methane(parameters: &MethaneParameters) -> Self {
        Self {
            conc_pi: parameters.conc_pi,
            tau: parameters.tau,
            mass_per_ppb: parameters.mass_per_ppb,
        }
    }

    pub fn nitrous_oxide(parameters: &NitrousOxideParameters) -> Self {
        Self {
            conc_pi: parameters.conc_pi,
            tau: parameters.tau,
            mass_per_ppb: parameters.mass_per_ppb,
        }
    }

    pub fn initial_concentration(&self) -> FloatValue {
        self.conc_pi
    }

    /// Concentration one year after `concentration` given `emissions` in Mt / yr.
    pub fn step(&self, concentration: FloatValue, emissions: FloatValue) -> FloatValue {
        let equilibrium = self.conc_pi + emissions * self.tau / self.mass_per_ppb;
        equilibrium + (concentration - equilibrium) * (-1.0 / self.tau).exp()
    }
}
