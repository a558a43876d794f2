//! Effective radiative forcing from concentrations and aerosol emissions

use crate::parameters::ForcingParameters;
use cicf_core::timeseries::FloatValue;
use serde::{Deserialize, Serialize};

/// Concentrations and emissions for one year
#[derive(Debug, Clone, Copy, Default)]
pub struct ForcingDrivers {
    /// unit: ppm
    pub co2: FloatValue,
    /// unit: ppb
    pub ch4: FloatValue,
    /// unit: ppb
    pub n2o: FloatValue,
    /// unit: Mt SO2 / yr
    pub sulfur: Option<FloatValue>,
    /// unit: Mt BC / yr
    pub bc: Option<FloatValue>,
    /// unit: Mt OC / yr
    pub oc: Option<FloatValue>,
}

/// Computes ERF using:
/// $$ ERF_{CO2} = \frac{ERF_{2xCO2}}{\log(2)} \cdot \log\left(1 + \frac{C - C_0}{C_0}\right) $$
/// $$ ERF_{CH4} = a_{CH4} (\sqrt{M} - \sqrt{M_0}) $$
/// $$ ERF_{N2O} = a_{N2O} (\sqrt{N} - \sqrt{N_0}) $$
/// and aerosol terms linear in emissions above pre-industrial. Aerosol species
/// that are not supplied contribute nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forcing {
    parameters: ForcingParameters,
}

impl Forcing {
    pub fn from_parameters(parameters: ForcingParameters) -> Self {
        Self { parameters }
    }

    pub fn co2(&self, concentration: FloatValue) -> FloatValue {
        self.parameters.erf_2xco2 / 2.0_f64.ln()
            * (1.0 + (concentration - self.parameters.co2_pi) / self.parameters.co2_pi).ln()
    }

    pub fn ch4(&self, concentration: FloatValue) -> FloatValue {
        self.parameters.ch4_coefficient * (concentration.sqrt() - self.parameters.ch4_pi.sqrt())
    }

    pub fn n2o(&self, concentration: FloatValue) -> FloatValue {
        self.parameters.n2o_coefficient * (concentration.sqrt() - self.parameters.n2o_pi.sqrt())
    }

    pub fn aerosols(&self, drivers: &ForcingDrivers) -> FloatValue {
        let p = &self.parameters;
        let term = |emissions: Option<FloatValue>, coefficient: FloatValue, pi: FloatValue| {
            emissions.map_or(0.0, |e| coefficient * (e - pi))
        };
        term(drivers.sulfur, p.sulfur_coefficient, p.sulfur_pi)
            + term(drivers.bc, p.bc_coefficient, p.bc_pi)
            + term(drivers.oc, p.oc_coefficient, p.oc_pi)
    }

    pub fn total(&self, drivers: &ForcingDrivers) -> FloatValue {
        self.co2(drivers.co2) + self.ch4(drivers.ch4) + self.n2o(drivers.n2o) + self.aerosols(drivers)
    }
}
