use cicf_core::timeseries::FloatValue;
use serde::{Deserialize, Serialize};

/// Parameters for effective radiative forcing
///
/// Greenhouse-gas forcing uses the simplified expressions of Myhre et al.
/// (1998). Aerosol forcing is linear in the emission anomaly relative to the
/// pre-industrial level of each species.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForcingParameters {
    /// ERF due to a doubling of atmospheric CO2 concentrations
    /// unit: W / m^2
    /// default: 3.93
    pub erf_2xco2: FloatValue,

    /// Pre-industrial CO2 concentration
    /// unit: ppm
    /// default: 278.0
    pub co2_pi: FloatValue,

    /// Square-root coefficient for CH4
    /// unit: W / m^2 / ppb^0.5
    /// default: 0.036
    pub ch4_coefficient: FloatValue,

    /// unit: ppb
    /// default: 722.0
    pub ch4_pi: FloatValue,

    /// Square-root coefficient for N2O
    /// unit: W / m^2 / ppb^0.5
    /// default: 0.12
    pub n2o_coefficient: FloatValue,

    /// unit: ppb
    /// default: 270.0
    pub n2o_pi: FloatValue,

    /// unit: W / m^2 / (Mt SO2 / yr)
    /// default: -0.0046
    pub sulfur_coefficient: FloatValue,

    /// unit: Mt SO2 / yr
    /// default: 2.44
    pub sulfur_pi: FloatValue,

    /// unit: W / m^2 / (Mt BC / yr)
    /// default: 0.0508
    pub bc_coefficient: FloatValue,

    /// unit: Mt BC / yr
    /// default: 2.1
    pub bc_pi: FloatValue,

    /// unit: W / m^2 / (Mt OC / yr)
    /// default: -0.0061
    pub oc_coefficient: FloatValue,

    /// unit: Mt OC / yr
    /// default: 15.5
    pub oc_pi: FloatValue,
}

impl Default for ForcingParameters {
    fn default() -> Self {
        Self {
            erf_2xco2: 3.93,
            co2_pi: 278.0,
            ch4_coefficient: 0.036,
            ch4_pi: 722.0,
            n2o_coefficient: 0.12,
            n2o_pi: 270.0,
            sulfur_coefficient: -0.0046,
            sulfur_pi: 2.44,
            bc_coefficient: 0.0508,
            bc_pi: 2.1,
            oc_coefficient: -0.0061,
            oc_pi: 15.5,
        }
    }
}
