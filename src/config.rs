//! TOML configuration for a pipeline run.
//!
//! ```toml
//! [grid]
//! start = 1750
//! end = 2023
//! boundary = "hold"
//!
//! [[sources]]
//! path = "emissions.csv"
//! layout = { kind = "columnar", year_column = "Year" }
//! mappings = [
//!     { source = "co2", species = "Emissions|CO2", unit = "Gt CO2/yr" },
//! ]
//!
//! [counterfactual]
//! anchor_year = 1975
//! method = "constant_intensity"
//!
//! [assembler]
//! policy = "clamp"
//!
//! [engine]
//! type = "ReducedComplexityEngine"
//!
//! [output]
//! directory = "out"
//! ```
//!
//! Every section other than `[[sources]]` is optional. Relative source and
//! output paths are resolved against the directory holding the configuration
//! file.

use crate::errors::{PipelineError, PipelineResult};
use cicf_components::ReducedComplexityEngine;
use cicf_core::assemble::ScenarioAssembler;
use cicf_core::compare::Comparator;
use cicf_core::counterfactual::{CounterfactualGenerator, CounterfactualMethod, DEFAULT_ANCHOR_YEAR};
use cicf_core::engine::ClimateEngine;
use cicf_core::errors::CICFResult;
use cicf_core::interpolate::BoundaryPolicy;
use cicf_core::normalize::{SpeciesMapping, TableLayout};
use cicf_core::standard_variables::{VAR_CARBON_INTENSITY, VAR_CO2_EMISSIONS, VAR_GDP};
use cicf_core::timeseries::{TimeGrid, Year};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Deserialise a TOML file into `T`.
pub fn read_toml<T: DeserializeOwned>(file_path: &Path) -> PipelineResult<T> {
    let contents = std::fs::read_to_string(file_path).map_err(|source| PipelineError::Io {
        path: file_path.to_path_buf(),
        source,
    })?;
    toml::from_str(&contents).map_err(|e| PipelineError::Config {
        path: file_path.display().to_string(),
        reason: e.to_string(),
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub start: Year,
    pub end: Year,
    pub boundary: BoundaryPolicy,
}

impl Default for GridConfig {
    fn default() -> Self {
        let grid = TimeGrid::historical();
        Self {
            start: grid.start(),
            end: grid.end(),
            boundary: BoundaryPolicy::default(),
        }
    }
}

impl GridConfig {
    pub fn grid(&self) -> CICFResult<TimeGrid> {
        TimeGrid::new(self.start, self.end)
    }
}

/// One input table and the species read from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    pub path: PathBuf,
    #[serde(default)]
    pub layout: TableLayout,
    pub mappings: Vec<SpeciesMapping>,
}

/// Names of the economic indicators feeding the counterfactual.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EconomicsConfig {
    pub intensity: String,
    pub gdp: String,
}

impl Default for EconomicsConfig {
    fn default() -> Self {
        Self {
            intensity: VAR_CARBON_INTENSITY.name.to_string(),
            gdp: VAR_GDP.name.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CounterfactualConfig {
    pub anchor_year: Year,
    pub method: CounterfactualMethod,
    /// Species replaced by the counterfactual
    pub replaced: String,
    pub baseline_name: String,
    pub counterfactual_name: String,
}

impl Default for CounterfactualConfig {
    fn default() -> Self {
        Self {
            anchor_year: DEFAULT_ANCHOR_YEAR,
            method: CounterfactualMethod::default(),
            replaced: VAR_CO2_EMISSIONS.name.to_string(),
            baseline_name: "historical".to_string(),
            counterfactual_name: "fixed-intensity".to_string(),
        }
    }
}

impl CounterfactualConfig {
    pub fn generator(&self) -> CounterfactualGenerator {
        CounterfactualGenerator::new(self.anchor_year, self.method)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Where comparison CSVs are written. Nothing is written if unset.
    pub directory: Option<PathBuf>,
}

fn default_engine() -> Box<dyn ClimateEngine> {
    Box::new(ReducedComplexityEngine::default())
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub grid: GridConfig,
    pub sources: Vec<SourceConfig>,
    #[serde(default)]
    pub economics: EconomicsConfig,
    #[serde(default)]
    pub counterfactual: CounterfactualConfig,
    #[serde(default)]
    pub assembler: ScenarioAssembler,
    #[serde(default)]
    pub comparator: Comparator,
    #[serde(default = "default_engine")]
    pub engine: Box<dyn ClimateEngine>,
    #[serde(default)]
    pub output: OutputConfig,
}

impl PipelineConfig {
    pub fn from_toml_str(contents: &str) -> PipelineResult<Self> {
        toml::from_str(contents).map_err(|e| PipelineError::Config {
            path: "<string>".to_string(),
            reason: e.to_string(),
        })
    }

    /// Read a configuration file, resolving relative paths against its directory.
    pub fn from_path<P: AsRef<Path>>(file_path: P) -> PipelineResult<Self> {
        let file_path = file_path.as_ref();
        let mut config: Self = read_toml(file_path)?;
        if let Some(base) = file_path.parent() {
            config.resolve_paths(base);
        }
        Ok(config)
    }

    fn resolve_paths(&mut self, base: &Path) {
        for source in &mut self.sources {
            if source.path.is_relative() {
                source.path = base.join(&source.path);
            }
        }
        if let Some(directory) = &self.output.directory {
            if directory.is_relative() {
                self.output.directory = Some(base.join(directory));
            }
        }
    }
}
