//! Stage orchestration.
//!
//! A [`Pipeline`] holds only its configuration. Each call to
//! [`Pipeline::run`] threads the values produced by one stage into the next
//! and stops at the first failure.

use crate::config::PipelineConfig;
use crate::errors::{PipelineError, PipelineResult};
use cicf_core::assemble::ScenarioPair;
use cicf_core::compare::ComparisonResult;
use cicf_core::errors::{CICFError, CICFResult, Stage};
use cicf_core::interpolate::Interpolator;
use cicf_core::normalize::{Normalizer, RawTable};
use cicf_core::timeseries::{DenseSeries, QuantityKind, SparseSeries, TimeGrid};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

/// Everything produced by a run.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub grid: Arc<TimeGrid>,
    /// Every configured species on the grid, before assembly.
    pub dense: BTreeMap<String, DenseSeries>,
    pub counterfactual: DenseSeries,
    pub scenarios: ScenarioPair,
    pub comparison: ComparisonResult,
    /// Files written by the export step.
    pub exported: Vec<PathBuf>,
}

#[derive(Debug)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn from_path<P: AsRef<std::path::Path>>(file_path: P) -> PipelineResult<Self> {
        Ok(Self::new(PipelineConfig::from_path(file_path)?))
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Read every configured source table from disk.
    pub fn load_tables(&self) -> PipelineResult<Vec<RawTable>> {
        self.config
            .sources
            .iter()
            .map(|source| {
                debug!(path = %source.path.display(), "Reading source table");
                RawTable::from_path(&source.path).map_err(|e| match e {
                    CICFError::Io(source_error) => PipelineError::Io {
                        path: source.path.clone(),
                        source: source_error,
                    },
                    other => other.into(),
                })
            })
            .collect()
    }

    /// Load the configured tables, run every stage and export if an output
    /// directory is configured.
    pub fn run(&self) -> PipelineResult<PipelineOutput> {
        let tables = self.load_tables()?;
        let mut output = self.run_tables(&tables)?;
        if let Some(directory) = &self.config.output.directory {
            output.exported = output.comparison.export(directory)?;
        }
        Ok(output)
    }

    /// Run every stage on tables already in memory, one per configured source.
    pub fn run_tables(&self, tables: &[RawTable]) -> PipelineResult<PipelineOutput> {
        if tables.len() != self.config.sources.len() {
            return Err(PipelineError::SourceCount {
                expected: self.config.sources.len(),
                found: tables.len(),
            });
        }
        let grid = Arc::new(self.config.grid.grid()?);
        info!(grid = %grid, sources = tables.len(), "Starting counterfactual pipeline");

        let sparse = self.normalize(tables)?;
        info!(stage = %Stage::Normalize, series = sparse.len(), "Stage complete");

        let dense = self.densify(&sparse, &grid)?;
        info!(stage = %Stage::Interpolate, series = dense.len(), "Stage complete");

        let counterfactual = self.counterfactual(&dense)?;
        info!(stage = %Stage::Counterfactual, species = %counterfactual.name(), "Stage complete");

        let scenarios = self.assemble(&dense, counterfactual.clone())?;
        info!(
            stage = %Stage::Assemble,
            species = scenarios.baseline.len(),
            "Stage complete"
        );

        let comparison = self
            .config
            .comparator
            .compare(self.config.engine.as_ref(), &scenarios)?;
        info!(stage = %Stage::Compare, quantities = comparison.len(), "Stage complete");

        Ok(PipelineOutput {
            grid,
            dense,
            counterfactual,
            scenarios,
            comparison,
            exported: Vec::new(),
        })
    }

    /// Canonical sparse series for every mapping of every source.
    pub fn normalize(&self, tables: &[RawTable]) -> CICFResult<Vec<SparseSeries>> {
        let mut series: Vec<SparseSeries> = Vec::new();
        for (source, table) in self.config.sources.iter().zip(tables) {
            let normalizer = Normalizer::new(source.mappings.clone());
            for species in normalizer.species() {
                if series.iter().any(|s| s.name() == species) {
                    return Err(CICFError::MalformedInput {
                        source_name: table.name.clone(),
                        reason: format!("'{species}' is provided by more than one mapping"),
                    });
                }
                series.push(normalizer.normalize(table, &source.layout, species)?);
            }
        }
        Ok(series)
    }

    pub fn densify(
        &self,
        sparse: &[SparseSeries],
        grid: &Arc<TimeGrid>,
    ) -> CICFResult<BTreeMap<String, DenseSeries>> {
        let interpolator = Interpolator::new(self.config.grid.boundary);
        sparse
            .iter()
            .map(|s| Ok((s.name().to_string(), interpolator.densify(s, grid)?)))
            .collect()
    }

    pub fn counterfactual(&self, dense: &BTreeMap<String, DenseSeries>) -> CICFResult<DenseSeries> {
        let economics = &self.config.economics;
        let intensity = required(dense, &economics.intensity)?;
        let gdp = required(dense, &economics.gdp)?;
        let actual = required(dense, &self.config.counterfactual.replaced)?;
        self.config
            .counterfactual
            .generator()
            .generate(intensity, gdp, actual)
    }

    /// Baseline from every non-economic series plus the counterfactual pair.
    ///
    /// Species the engine needs are required in addition to the configured ones.
    pub fn assemble(
        &self,
        dense: &BTreeMap<String, DenseSeries>,
        counterfactual: DenseSeries,
    ) -> CICFResult<ScenarioPair> {
        let names = &self.config.counterfactual;
        let mut assembler = self.config.assembler.clone();
        for species in self.config.engine.required_inputs() {
            if !assembler.required_species.contains(&species) {
                assembler.required_species.push(species);
            }
        }
        let physical = dense
            .values()
            .filter(|s| s.kind() != QuantityKind::Economic)
            .cloned();
        let baseline = assembler.baseline(&names.baseline_name, physical)?;
        assembler.assemble(&baseline, counterfactual, &names.counterfactual_name)
    }
}

fn required<'a>(
    dense: &'a BTreeMap<String, DenseSeries>,
    species: &str,
) -> CICFResult<&'a DenseSeries> {
    dense.get(species).ok_or_else(|| CICFError::MalformedInput {
        source_name: "sources".to_string(),
        reason: format!("no source provides '{species}'"),
    })
}
