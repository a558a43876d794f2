//! Carbon cycle component
//!
//! A simple one-box carbon cycle model that tracks atmospheric CO2 concentrations
//! and land uptake based on emissions and temperature.

use crate::constants::GTC_PER_PPM;
use crate::ivp::{IVPBuilder, ModelState, Time, IVP};
use crate::parameters::{CarbonCycleParameters, SolverOptions};
use cicf_core::timeseries::FloatValue;
use serde::{Deserialize, Serialize};

/// Values held constant over one annual step
#[derive(Debug, Clone, Copy)]
pub struct CarbonCycleDrivers {
    /// unit: GtC / yr
    pub emissions: FloatValue,
    /// unit: K
    pub temperature: FloatValue,
}

/// One-box carbon cycle
///
/// The governing equation is:
/// $$ \frac{dC}{dt} = \frac{E}{k} - \frac{C - C_0}{\tau \exp(\alpha_T \cdot T)} $$
///
/// Where:
/// - $C$ is atmospheric CO2 concentration (ppm)
/// - $E$ is emissions (GtC/yr), $k$ is [`GTC_PER_PPM`]
/// - $C_0$ is pre-industrial concentration (ppm)
/// - $\tau$ is the baseline lifetime (yr)
/// - $\alpha_T$ is the temperature sensitivity (1/K)
/// - $T$ is the surface temperature anomaly (K)
///
/// The state is `[concentration (ppm), cumulative land uptake (GtC),
/// cumulative emissions (GtC)]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarbonCycle {
    parameters: CarbonCycleParameters,
    solver_options: SolverOptions,
}

impl CarbonCycle {
    pub fn from_parameters(parameters: CarbonCycleParameters, solver_options: SolverOptions) -> Self {
        Self {
            parameters,
            solver_options,
        }
    }

    /// Pre-industrial equilibrium
    pub fn initial_state(&self) -> ModelState {
        ModelState::new(self.parameters.conc_pi, 0.0, 0.0)
    }

    /// Advance `state` from `t_current` by one year.
    pub fn step(
        &self,
        t_current: Time,
        state: &ModelState,
        drivers: CarbonCycleDrivers,
    ) -> Result<ModelState, String> {
        IVPBuilder::new(self, drivers, *state).solve_rk4(
            t_current,
            t_current + 1.0,
            self.solver_options.step_size,
        )
    }
}

impl IVP<CarbonCycleDrivers> for CarbonCycle {
    fn calculate_dy_dt(
        &self,
        _t: Time,
        drivers: &CarbonCycleDrivers,
        y: &ModelState,
        dy_dt: &mut ModelState,
    ) {
        let conc = y[0];

        // dC / dt = E - (C - C_0) / (tau * exp(alpha_temperature * temperature))
        let lifetime =
            self.parameters.tau * (self.parameters.alpha_temperature * drivers.temperature).exp();
        let uptake = (conc - self.parameters.conc_pi) / lifetime; // ppm / yr

        dy_dt[0] = drivers.emissions / GTC_PER_PPM - uptake; // ppm / yr
        dy_dt[1] = uptake * GTC_PER_PPM; // GtC / yr
        dy_dt[2] = drivers.emissions; // GtC / yr
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn component() -> CarbonCycle {
        CarbonCycle::from_parameters(CarbonCycleParameters::default(), SolverOptions::default())
    }

    #[test]
    fn equilibrium_without_emissions() {
        let component = component();
        let state = component
            .step(
                1750.0,
                &component.initial_state(),
                CarbonCycleDrivers {
                    emissions: 0.0,
                    temperature: 0.0,
                },
            )
            .unwrap();
        assert_relative_eq!(state[0], 278.0, epsilon = 1e-10);
        assert_relative_eq!(state[1], 0.0, epsilon = 1e-10);
    }

    #[test]
    fn emissions_raise_concentration_and_are_accumulated() {
        let component = component();
        let drivers = CarbonCycleDrivers {
            emissions: 10.0,
            temperature: 0.0,
        };
        let state = component
            .step(2000.0, &component.initial_state(), drivers)
            .unwrap();

        assert_relative_eq!(state[2], 10.0, max_relative = 1e-9);
        assert!(state[0] > 278.0);
        // Uptake only removes part of the pulse
        assert!(state[0] < 278.0 + 10.0 / GTC_PER_PPM);
        // Carbon is conserved between atmosphere and land
        let atmosphere = (state[0] - 278.0) * GTC_PER_PPM;
        assert_relative_eq!(atmosphere + state[1], state[2], max_relative = 1e-6);
    }

    #[test]
    fn warming_slows_uptake() {
        let component = component();
        let start = ModelState::new(400.0, 0.0, 0.0);
        let cold = component
            .step(
                2000.0,
                &start,
                CarbonCycleDrivers {
                    emissions: 0.0,
                    temperature: 0.0,
                },
            )
            .unwrap();
        let warm = component
            .step(
                2000.0,
                &start,
                CarbonCycleDrivers {
                    emissions: 0.0,
                    temperature: 2.0,
                },
            )
            .unwrap();
        assert!(warm[0] > cold[0]);
        assert!(warm[1] < cold[1]);
    }
}
