//! Canonical species and indicator definitions.
//!
//! Variable names follow the MAGICC/RCMIP convention using `|` as a
//! hierarchical separator. Every series entering the pipeline is converted to
//! the canonical unit listed here.
//!
//! ## Emissions
//! - `VAR_CO2_EMISSIONS` - Mt CO2 / yr
//! - `VAR_CH4_EMISSIONS` - Mt CH4 / yr
//! - `VAR_N2O_EMISSIONS` - kt N2O / yr
//! - `VAR_SULFUR_EMISSIONS` - Mt SO2 / yr
//! - `VAR_BC_EMISSIONS` - Mt BC / yr
//! - `VAR_OC_EMISSIONS` - Mt OC / yr
//!
//! ## Concentrations
//! - `VAR_CO2_CONCENTRATION` - ppm
//! - `VAR_CH4_CONCENTRATION` - ppb
//! - `VAR_N2O_CONCENTRATION` - ppb
//!
//! ## Economic indicators
//! - `VAR_GDP` - trillion USD / yr
//! - `VAR_CARBON_INTENSITY` - kg CO2 / USD
//!
//! ## Climate response
//! - `VAR_SURFACE_TEMPERATURE` - K
//! - `VAR_TOTAL_ERF` - W / m^2

use crate::timeseries::QuantityKind;

/// A named quantity with its canonical unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VariableDefinition {
    pub name: &'static str,
    pub unit: &'static str,
    pub kind: QuantityKind,
    pub description: &'static str,
}

pub const VAR_CO2_EMISSIONS: VariableDefinition = VariableDefinition {
    name: "Emissions|CO2",
    unit: "Mt CO2/yr",
    kind: QuantityKind::Emissions,
    description: "Carbon dioxide emissions from fossil fuels, industry and land use",
};

pub const VAR_CH4_EMISSIONS: VariableDefinition = VariableDefinition {
    name: "Emissions|CH4",
    unit: "Mt CH4/yr",
    kind: QuantityKind::Emissions,
    description: "Methane emissions from all sources",
};

pub const VAR_N2O_EMISSIONS: VariableDefinition = VariableDefinition {
    name: "Emissions|N2O",
    unit: "kt N2O/yr",
    kind: QuantityKind::Emissions,
    description: "Nitrous oxide emissions from all sources",
};

pub const VAR_SULFUR_EMISSIONS: VariableDefinition = VariableDefinition {
    name: "Emissions|Sulfur",
    unit: "Mt SO2/yr",
    kind: QuantityKind::Emissions,
    description: "Sulfur dioxide emissions",
};

pub const VAR_BC_EMISSIONS: VariableDefinition = VariableDefinition {
    name: "Emissions|BC",
    unit: "Mt BC/yr",
    kind: QuantityKind::Emissions,
    description: "Black carbon aerosol emissions",
};

pub const VAR_OC_EMISSIONS: VariableDefinition = VariableDefinition {
    name: "Emissions|OC",
    unit: "Mt OC/yr",
    kind: QuantityKind::Emissions,
    description: "Organic carbon aerosol emissions",
};

pub const VAR_CO2_CONCENTRATION: VariableDefinition = VariableDefinition {
    name: "Atmospheric Concentration|CO2",
    unit: "ppm",
    kind: QuantityKind::Concentration,
    description: "Atmospheric carbon dioxide concentration",
};

pub const VAR_CH4_CONCENTRATION: VariableDefinition = VariableDefinition {
    name: "Atmospheric Concentration|CH4",
    unit: "ppb",
    kind: QuantityKind::Concentration,
    description: "Atmospheric methane concentration",
};

pub const VAR_N2O_CONCENTRATION: VariableDefinition = VariableDefinition {
    name: "Atmospheric Concentration|N2O",
    unit: "ppb",
    kind: QuantityKind::Concentration,
    description: "Atmospheric nitrous oxide concentration",
};

pub const VAR_GDP: VariableDefinition = VariableDefinition {
    name: "GDP",
    unit: "trillion USD/yr",
    kind: QuantityKind::Economic,
    description: "Global gross domestic product at constant prices",
};

pub const VAR_CARBON_INTENSITY: VariableDefinition = VariableDefinition {
    name: "Carbon Intensity|CO2",
    unit: "kg CO2/USD",
    kind: QuantityKind::Economic,
    description: "CO2 emissions per unit of GDP",
};

pub const VAR_SURFACE_TEMPERATURE: VariableDefinition = VariableDefinition {
    name: "Surface Temperature",
    unit: "K",
    kind: QuantityKind::Temperature,
    description: "Global mean surface temperature anomaly",
};

pub const VAR_TOTAL_ERF: VariableDefinition = VariableDefinition {
    name: "Effective Radiative Forcing",
    unit: "W/m^2",
    kind: QuantityKind::Forcing,
    description: "Total effective radiative forcing",
};

/// Every known definition.
pub const STANDARD_VARIABLES: &[VariableDefinition] = &[
    VAR_CO2_EMISSIONS,
    VAR_CH4_EMISSIONS,
    VAR_N2O_EMISSIONS,
    VAR_SULFUR_EMISSIONS,
    VAR_BC_EMISSIONS,
    VAR_OC_EMISSIONS,
    VAR_CO2_CONCENTRATION,
    VAR_CH4_CONCENTRATION,
    VAR_N2O_CONCENTRATION,
    VAR_GDP,
    VAR_CARBON_INTENSITY,
    VAR_SURFACE_TEMPERATURE,
    VAR_TOTAL_ERF,
];

/// Species an emissions-driven run needs.
pub const EMISSIONS_SPECIES: &[VariableDefinition] = &[
    VAR_CO2_EMISSIONS,
    VAR_CH4_EMISSIONS,
    VAR_N2O_EMISSIONS,
    VAR_SULFUR_EMISSIONS,
    VAR_BC_EMISSIONS,
    VAR_OC_EMISSIONS,
];

/// Look up a standard variable by name.
pub fn lookup(name: &str) -> Option<&'static VariableDefinition> {
    STANDARD_VARIABLES.iter().find(|v| v.name == name)
}
