//! Boundary between assembled scenarios and a climate-response engine.
//!
//! Engines are trait objects so the concrete physics can live in another
//! crate and be selected from configuration. They perform no validation of
//! their own; the pipeline validates inputs before and outputs after each run.

use crate::assemble::Scenario;
use crate::timeseries::{FloatValue, Year};
use ndarray::{Array1, ArrayView1};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Debug;
use thiserror::Error;

/// Equal-length arrays for every species on a shared year axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineInputs {
    pub years: Vec<Year>,
    pub species: BTreeMap<String, Array1<FloatValue>>,
    pub units: BTreeMap<String, String>,
}

impl EngineInputs {
    pub fn from_scenario(scenario: &Scenario) -> Self {
        let years = scenario.grid().years().collect();
        let mut species = BTreeMap::new();
        let mut units = BTreeMap::new();
        for series in scenario.iter() {
            species.insert(series.name().to_string(), series.values().to_owned());
            units.insert(series.name().to_string(), series.unit().to_string());
        }
        Self {
            years,
            species,
            units,
        }
    }

    pub fn len(&self) -> usize {
        self.years.len()
    }

    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<ArrayView1<'_, FloatValue>> {
        self.species.get(name).map(|v| v.view())
    }

    pub fn unit(&self, name: &str) -> Option<&str> {
        self.units.get(name).map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineOutput {
    pub unit: String,
    pub values: Array1<FloatValue>,
}

/// Named output arrays on the input year axis.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineOutputs {
    pub variables: BTreeMap<String, EngineOutput>,
}

impl EngineOutputs {
    pub fn insert(&mut self, name: &str, unit: &str, values: Array1<FloatValue>) {
        self.variables.insert(
            name.to_string(),
            EngineOutput {
                unit: unit.to_string(),
                values,
            },
        );
    }

    pub fn get(&self, name: &str) -> Option<&EngineOutput> {
        self.variables.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.variables.keys().map(String::as_str)
    }
}

/// Failure reported by an engine.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message}")]
pub struct EngineFault {
    /// Variable the failure relates to, if any.
    pub variable: Option<String>,
    pub message: String,
}

impl EngineFault {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            variable: None,
            message: message.into(),
        }
    }

    pub fn for_variable(variable: &str, message: impl Into<String>) -> Self {
        Self {
            variable: Some(variable.to_string()),
            message: message.into(),
        }
    }
}

/// A climate-response model driven by annual inputs.
#[typetag::serde(tag = "type")]
pub trait ClimateEngine: Debug + Send + Sync {
    /// Names and units of the variables [`ClimateEngine::run`] produces.
    fn outputs(&self) -> Vec<(String, String)>;

    /// Input species that must be present in every scenario handed to
    /// [`ClimateEngine::run`].
    fn required_inputs(&self) -> Vec<String> {
        Vec::new()
    }

    fn run(&self, inputs: &EngineInputs) -> Result<EngineOutputs, EngineFault>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assemble::ScenarioAssembler;
    use crate::errors::Stage;
    use crate::timeseries::{DenseSeries, QuantityKind, TimeGrid};
    use ndarray::array;
    use std::sync::Arc;

    #[test]
    fn inputs_follow_scenario() {
        let grid = Arc::new(TimeGrid::new(2000, 2002).unwrap());
        let co2 = DenseSeries::new(
            "Emissions|CO2",
            "Mt CO2/yr",
            QuantityKind::Emissions,
            grid,
            array![1.0, 2.0, 3.0],
            Stage::Interpolate,
        )
        .unwrap();
        let scenario = ScenarioAssembler::default()
            .baseline("historical", vec![co2])
            .unwrap();

        let inputs = EngineInputs::from_scenario(&scenario);
        assert_eq!(inputs.years, vec![2000, 2001, 2002]);
        assert_eq!(inputs.len(), 3);
        assert_eq!(inputs.get("Emissions|CO2").unwrap(), array![1.0, 2.0, 3.0]);
        assert_eq!(inputs.unit("Emissions|CO2"), Some("Mt CO2/yr"));
        assert!(inputs.get("Emissions|CH4").is_none());
    }

    #[test]
    fn fault_display() {
        let fault = EngineFault::for_variable("Surface Temperature", "diverged");
        assert_eq!(fault.to_string(), "diverged");
        assert_eq!(fault.variable.as_deref(), Some("Surface Temperature"));
    }
}
