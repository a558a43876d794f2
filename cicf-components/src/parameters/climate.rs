use cicf_core::timeseries::FloatValue;
use serde::{Deserialize, Serialize};

/// Parameters for the two-layer energy balance model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TwoLayerParameters {
    /// Climate feedback parameter
    /// unit: W / (m^2 K)
    /// default: 1.3
    pub lambda0: FloatValue,

    /// State dependence of the feedback parameter
    /// unit: W / (m^2 K^2)
    /// default: 0.0
    pub a: FloatValue,

    /// Ocean heat uptake efficacy
    /// unit: dimensionless
    /// default: 1.1
    pub efficacy: FloatValue,

    /// Heat exchange coefficient between the layers
    /// unit: W / (m^2 K)
    /// default: 0.7
    pub eta: FloatValue,

    /// unit: W yr / (m^2 K)
    /// default: 8.0
    pub heat_capacity_surface: FloatValue,

    /// unit: W yr / (m^2 K)
    /// default: 100.0
    pub heat_capacity_deep: FloatValue,
}

impl Default for TwoLayerParameters {
    fn default() -> Self {
        Self {
            lambda0: 1.3,
            a: 0.0,
            efficacy: 1.1,
            eta: 0.7,
            heat_capacity_surface: 8.0,
            heat_capacity_deep: 100.0,
        }
    }
}
