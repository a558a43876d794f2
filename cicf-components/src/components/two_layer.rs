//! Two-layer energy balance model

use crate::ivp::{IVPBuilder, ModelState, Time, IVP};
use crate::parameters::{SolverOptions, TwoLayerParameters};
use cicf_core::timeseries::FloatValue;
use serde::{Deserialize, Serialize};

/// Surface and deep-ocean temperature response to forcing
///
/// The state is `[surface temperature (K), deep ocean temperature (K),
/// heat content (W yr / m^2)]` and is carried from one year to the next.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TwoLayer {
    parameters: TwoLayerParameters,
    solver_options: SolverOptions,
}

// Create the set of ODEs to represent the two layer model
impl IVP<FloatValue> for TwoLayer {
    fn calculate_dy_dt(&self, _t: Time, erf: &FloatValue, y: &ModelState, dy_dt: &mut ModelState) {
        let temperature_surface = y[0];
        let temperature_deep = y[1];

        let temperature_difference = temperature_surface - temperature_deep;

        let lambda_eff = self.parameters.lambda0 - self.parameters.a * temperature_surface;
        let heat_exchange_surface =
            self.parameters.efficacy * self.parameters.eta * temperature_difference;
        let dtemperature_surface_dt =
            (erf - lambda_eff * temperature_surface - heat_exchange_surface)
                / self.parameters.heat_capacity_surface;

        let heat_exchange_deep = self.parameters.eta * temperature_difference;
        let dtemperature_deep_dt = heat_exchange_deep / self.parameters.heat_capacity_deep;

        dy_dt[0] = dtemperature_surface_dt;
        dy_dt[1] = dtemperature_deep_dt;
        dy_dt[2] = self.parameters.heat_capacity_surface * dtemperature_surface_dt
            + self.parameters.heat_capacity_deep * dtemperature_deep_dt;
    }
}

impl TwoLayer {
    pub fn from_parameters(parameters: TwoLayerParameters, solver_options: SolverOptions) -> Self {
        Self {
            parameters,
            solver_options,
        }
    }

    pub fn initial_state(&self) -> ModelState {
        ModelState::new(0.0, 0.0, 0.0)
    }

    /// Advance `state` by one year under a constant `erf` (W / m^2).
    pub fn step(&self, t_current: Time, state: &ModelState, erf: FloatValue) -> Result<ModelState, String> {
        IVPBuilder::new(self, erf, *state).solve_rk4(
            t_current,
            t_current + 1.0,
            self.solver_options.step_size,
        )
    }
}
