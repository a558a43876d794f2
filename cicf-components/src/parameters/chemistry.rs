//! Single-box lifetimes for methane and nitrous oxide.
//!
//! Natural emissions are not modelled explicitly: the pre-industrial
//! concentration is taken as the equilibrium of the natural budget and only
//! the anomaly decays.

use crate::constants::{MT_CH4_PER_PPB, MT_N2O_PER_PPB};
use cicf_core::timeseries::FloatValue;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MethaneParameters {
    /// Pre-industrial CH4 concentration
    /// unit: ppb
    /// default: 722.0
    pub conc_pi: FloatValue,

    /// Atmospheric lifetime of the anomaly
    /// unit: yr
    /// default: 9.3
    pub tau: FloatValue,

    /// Conversion from burden to concentration
    /// unit: Mt CH4 / ppb
    /// default: 2.75
    pub mass_per_ppb: FloatValue,
}

impl Default for MethaneParameters {
    fn default() -> Self {
        Self {
            conc_pi: 722.0,
            tau: 9.3,
            mass_per_ppb: MT_CH4_PER_PPB,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NitrousOxideParameters {
    /// Pre-industrial N2O concentration
    /// unit: ppb
    /// default: 270.0
    pub conc_pi: FloatValue,

    /// Atmospheric lifetime of the anomaly
    /// unit: yr
    /// default: 109.0
    pub tau: FloatValue,

    /// Conversion from burden to concentration
    /// unit: Mt N2O / ppb
    /// default: 4.79
    pub mass_per_ppb: FloatValue,
}

impl Default for NitrousOxideParameters {
    fn default() -> Self {
        Self {
            conc_pi: 270.0,
            tau: 109.0,
            mass_per_ppb: MT_N2O_PER_PPB,
        }
    }
}
