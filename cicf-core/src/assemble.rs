//! Assembly of baseline and counterfactual scenarios.
//!
//! A [`Scenario`] can only be produced by a [`ScenarioAssembler`], which
//! guarantees every series shares one grid, every required species is present
//! and the log-domain policy has been applied.

use crate::errors::{CICFError, CICFResult, Stage};
use crate::timeseries::{DenseSeries, FloatValue, QuantityKind, TimeGrid, Year};
use crate::validation::at_or_below;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScenarioKind {
    Baseline,
    Counterfactual,
}

impl fmt::Display for ScenarioKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScenarioKind::Baseline => f.write_str("baseline"),
            ScenarioKind::Counterfactual => f.write_str("counterfactual"),
        }
    }
}

/// A named set of dense series, one per species, on a single grid.
#[derive(Debug, Clone, PartialEq)]
pub struct Scenario {
    name: String,
    kind: ScenarioKind,
    grid: Arc<TimeGrid>,
    series: BTreeMap<String, DenseSeries>,
}

impl Scenario {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ScenarioKind {
        self.kind
    }

    pub fn grid(&self) -> &Arc<TimeGrid> {
        &self.grid
    }

    pub fn get(&self, species: &str) -> Option<&DenseSeries> {
        self.series.get(species)
    }

    pub fn contains(&self, species: &str) -> bool {
        self.series.contains_key(species)
    }

    pub fn species(&self) -> impl Iterator<Item = &str> {
        self.series.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &DenseSeries> {
        self.series.values()
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

/// The two scenarios handed to the comparator.
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioPair {
    pub baseline: Scenario,
    pub counterfactual: Scenario,
    /// Species that differs between the two.
    pub replaced: String,
}

/// How to treat values that would break a logarithm in the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DomainPolicy {
    /// Fail with [`CICFError::ScenarioConsistency`].
    #[default]
    Reject,
    /// Lift the values to the floor and log how many years were changed.
    Clamp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioAssembler {
    /// Species that must be present in every scenario.
    pub required_species: Vec<String>,
    /// Species guarded against non-positive values, in addition to every
    /// concentration series.
    pub log_domain_species: Vec<String>,
    pub policy: DomainPolicy,
    /// Values at or below this are outside the log domain.
    pub floor: FloatValue,
}

impl Default for ScenarioAssembler {
    fn default() -> Self {
        Self {
            required_species: vec!["Emissions|CO2".to_string()],
            log_domain_species: vec![],
            policy: DomainPolicy::Reject,
            floor: 1e-9,
        }
    }
}

impl ScenarioAssembler {
    /// Build the baseline scenario from dense series keyed by their names.
    pub fn baseline(
        &self,
        name: &str,
        series: impl IntoIterator<Item = DenseSeries>,
    ) -> CICFResult<Scenario> {
        let mut by_species = BTreeMap::new();
        let mut grid: Option<Arc<TimeGrid>> = None;
        for s in series {
            let species = s.name().to_string();
            if grid.is_none() {
                grid = Some(Arc::clone(s.grid()));
            }
            let guarded = self.guard(s)?;
            if by_species.insert(species.clone(), guarded).is_some() {
                return Err(CICFError::inconsistent(
                    &species,
                    format!("supplied more than once for scenario '{name}'"),
                ));
            }
        }
        let grid = grid.ok_or_else(|| {
            CICFError::inconsistent(name, "a scenario needs at least one series")
        })?;

        let scenario = Scenario {
            name: name.to_string(),
            kind: ScenarioKind::Baseline,
            grid,
            series: by_species,
        };
        self.validate(&scenario)?;
        info!(
            scenario = %scenario.name,
            species = scenario.len(),
            grid = %scenario.grid,
            "Assembled baseline scenario"
        );
        Ok(scenario)
    }

    /// Build the counterfactual by swapping `replacement` into `baseline`.
    ///
    /// `replacement` must name a species already in the baseline and share its
    /// grid and unit. Every other series is carried over untouched.
    pub fn assemble(
        &self,
        baseline: &Scenario,
        replacement: DenseSeries,
        name: &str,
    ) -> CICFResult<ScenarioPair> {
        self.validate(baseline)?;

        let species = replacement.name().to_string();
        let original = baseline.get(&species).ok_or_else(|| {
            CICFError::inconsistent(
                &species,
                format!("not present in baseline '{}'", baseline.name),
            )
        })?;
        if original.unit() != replacement.unit() {
            return Err(CICFError::inconsistent(
                &species,
                format!(
                    "replacement unit '{}' differs from baseline unit '{}'",
                    replacement.unit(),
                    original.unit()
                ),
            ));
        }

        let mut series = baseline.series.clone();
        series.insert(species.clone(), self.guard(replacement)?);
        let counterfactual = Scenario {
            name: name.to_string(),
            kind: ScenarioKind::Counterfactual,
            grid: Arc::clone(&baseline.grid),
            series,
        };
        self.validate(&counterfactual)?;

        info!(
            baseline = %baseline.name,
            counterfactual = %counterfactual.name,
            replaced = %species,
            "Assembled counterfactual scenario"
        );
        Ok(ScenarioPair {
            baseline: baseline.clone(),
            counterfactual,
            replaced: species,
        })
    }

    fn validate(&self, scenario: &Scenario) -> CICFResult<()> {
        let grid = &scenario.grid;
        for (species, series) in &scenario.series {
            if !Arc::ptr_eq(series.grid(), grid) && **series.grid() != **grid {
                return Err(CICFError::inconsistent(
                    species,
                    format!(
                        "grid {} differs from the grid of scenario '{}' ({grid})",
                        series.grid(),
                        scenario.name
                    ),
                ));
            }
            if series.len() != grid.len() {
                return Err(CICFError::inconsistent(
                    species,
                    format!("{} values for a grid of {} years", series.len(), grid.len()),
                ));
            }
        }
        for required in &self.required_species {
            if !scenario.contains(required) {
                return Err(CICFError::inconsistent(
                    required,
                    format!("required species missing from scenario '{}'", scenario.name),
                ));
            }
        }
        Ok(())
    }

    fn is_log_domain(&self, series: &DenseSeries) -> bool {
        series.kind() == QuantityKind::Concentration
            || self.log_domain_species.iter().any(|s| s == series.name())
    }

    fn guard(&self, series: DenseSeries) -> CICFResult<DenseSeries> {
        if !self.is_log_domain(&series) {
            return Ok(series);
        }
        let offending = at_or_below(series.values(), self.floor);
        let Some(&first) = offending.first() else {
            return Ok(series);
        };
        let year_of = |index: usize| series.grid().start() + index as Year;

        let guarded = match self.policy {
            DomainPolicy::Reject => Err(CICFError::inconsistent(
                series.name(),
                format!(
                    "value {} at {} is at or below the log-domain floor {}",
                    series.values()[first],
                    year_of(first),
                    self.floor
                ),
            )),
            DomainPolicy::Clamp => {
                let mut values = series.values().to_owned();
                for &i in &offending {
                    values[i] = self.floor;
                }
                warn!(
                    species = %series.name(),
                    clamped = offending.len(),
                    first_year = year_of(first),
                    floor = self.floor,
                    "Clamped values to the log-domain floor"
                );
                series.with_values(values, Stage::Assemble)
            }
        }?;
        debug!(species = %guarded.name(), "Applied log-domain policy");
        Ok(guarded)
    }
}
