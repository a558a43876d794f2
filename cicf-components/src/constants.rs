//! Physical constants shared by the components.

use cicf_core::timeseries::FloatValue;

/// Mass of carbon in the atmosphere per ppm of CO2
/// unit: GtC / ppm
pub const GTC_PER_PPM: FloatValue = 2.123;

/// Mass of methane in the atmosphere per ppb
/// unit: Mt CH4 / ppb
pub const MT_CH4_PER_PPB: FloatValue = 2.75;

/// Mass of nitrous oxide in the atmosphere per ppb
/// unit: Mt N2O / ppb
pub const MT_N2O_PER_PPB: FloatValue = 4.79;
