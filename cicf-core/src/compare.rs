//! Run an engine on both scenarios and difference the results.

use crate::assemble::{Scenario, ScenarioPair};
use crate::engine::{ClimateEngine, EngineInputs};
use crate::errors::{CICFError, CICFResult};
use crate::standard_variables::{VAR_CO2_CONCENTRATION, VAR_SURFACE_TEMPERATURE};
use crate::timeseries::{FloatValue, TimeGrid, Year};
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

const SUMMARY_FILE: &str = "summary.csv";

/// Per-year comparison of one quantity, `delta = counterfactual - baseline`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuantityComparison {
    pub quantity: String,
    pub unit: String,
    pub years: Vec<Year>,
    pub baseline: Array1<FloatValue>,
    pub counterfactual: Array1<FloatValue>,
    pub delta: Array1<FloatValue>,
    /// Largest delta; the earliest year wins ties.
    pub peak_delta: FloatValue,
    pub peak_delta_year: Year,
    pub final_delta: FloatValue,
    /// Sum of the annual deltas.
    pub cumulative_delta: FloatValue,
}

impl QuantityComparison {
    fn new(
        quantity: &str,
        unit: &str,
        years: Vec<Year>,
        baseline: Array1<FloatValue>,
        counterfactual: Array1<FloatValue>,
    ) -> Self {
        let delta = &counterfactual - &baseline;
        let (peak_index, peak_delta) = delta.iter().copied().enumerate().fold(
            (0, FloatValue::NEG_INFINITY),
            |(best_i, best), (i, d)| if d > best { (i, d) } else { (best_i, best) },
        );
        let final_delta = delta.iter().last().copied().unwrap_or(0.0);
        let cumulative_delta = delta.sum();
        Self {
            quantity: quantity.to_string(),
            unit: unit.to_string(),
            peak_delta_year: years[peak_index],
            years,
            baseline,
            counterfactual,
            delta,
            peak_delta,
            final_delta,
            cumulative_delta,
        }
    }

    /// Write `year,baseline,counterfactual,delta` rows.
    pub fn write_csv<W: Write>(&self, writer: W) -> CICFResult<()> {
        let mut writer = csv::Writer::from_writer(writer);
        writer.write_record(["year", "baseline", "counterfactual", "delta"])?;
        for (i, year) in self.years.iter().enumerate() {
            writer.write_record([
                year.to_string(),
                self.baseline[i].to_string(),
                self.counterfactual[i].to_string(),
                self.delta[i].to_string(),
            ])?;
        }
        writer.flush().map_err(csv::Error::from)?;
        Ok(())
    }

    /// File name used when exporting to a directory.
    pub fn file_name(&self) -> String {
        let stem: String = self
            .quantity
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
            .collect();
        format!("{stem}.csv")
    }
}

/// Comparison of a baseline and counterfactual run.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonResult {
    pub baseline: String,
    pub counterfactual: String,
    pub grid: Arc<TimeGrid>,
    quantities: Vec<QuantityComparison>,
}

impl ComparisonResult {
    pub fn get(&self, quantity: &str) -> Option<&QuantityComparison> {
        self.quantities.iter().find(|q| q.quantity == quantity)
    }

    pub fn iter(&self) -> impl Iterator<Item = &QuantityComparison> {
        self.quantities.iter()
    }

    pub fn len(&self) -> usize {
        self.quantities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quantities.is_empty()
    }

    /// Write one summary row per quantity.
    pub fn write_summary<W: Write>(&self, writer: W) -> CICFResult<()> {
        let mut writer = csv::Writer::from_writer(writer);
        writer.write_record([
            "quantity",
            "unit",
            "peak_delta",
            "peak_delta_year",
            "final_delta",
            "cumulative_delta",
        ])?;
        for q in &self.quantities {
            writer.write_record([
                q.quantity.clone(),
                q.unit.clone(),
                q.peak_delta.to_string(),
                q.peak_delta_year.to_string(),
                q.final_delta.to_string(),
                q.cumulative_delta.to_string(),
            ])?;
        }
        writer.flush().map_err(csv::Error::from)?;
        Ok(())
    }

    /// Write every quantity and `summary.csv` into `directory`.
    ///
    /// Returns the paths written.
    pub fn export<P: AsRef<Path>>(&self, directory: P) -> CICFResult<Vec<PathBuf>> {
        let directory = directory.as_ref();
        let failed = |target: &Path, e: std::io::Error| CICFError::Export {
            target: target.display().to_string(),
            reason: e.to_string(),
        };

        let mut claimed: BTreeMap<String, &str> = BTreeMap::new();
        claimed.insert(SUMMARY_FILE.to_string(), "the summary");
        for q in &self.quantities {
            if let Some(other) = claimed.insert(q.file_name(), &q.quantity) {
                return Err(CICFError::Export {
                    target: directory.join(q.file_name()).display().to_string(),
                    reason: format!("'{}' and {other} map to the same file", q.quantity),
                });
            }
        }

        std::fs::create_dir_all(directory).map_err(|e| failed(directory, e))?;
        let mut written = Vec::with_capacity(self.quantities.len() + 1);
        for q in &self.quantities {
            let path = directory.join(q.file_name());
            q.write_csv(std::fs::File::create(&path).map_err(|e| failed(path.as_path(), e))?)?;
            written.push(path);
        }
        let summary = directory.join(SUMMARY_FILE);
        self.write_summary(std::fs::File::create(&summary).map_err(|e| failed(summary.as_path(), e))?)?;
        written.push(summary);

        info!(directory = %directory.display(), files = written.len(), "Exported comparison");
        Ok(written)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Comparator {
    /// Engine outputs to difference.
    pub tracked: Vec<String>,
    /// Also difference the replaced input species.
    pub compare_inputs: bool,
}

impl Default for Comparator {
    fn default() -> Self {
        Self {
            tracked: vec![
                VAR_SURFACE_TEMPERATURE.name.to_string(),
                VAR_CO2_CONCENTRATION.name.to_string(),
            ],
            compare_inputs: true,
        }
    }
}

impl Comparator {
    pub fn new(tracked: Vec<String>) -> Self {
        Self {
            tracked,
            ..Self::default()
        }
    }

    /// Invoke `engine` once per scenario and compare the tracked outputs.
    pub fn compare(
        &self,
        engine: &dyn ClimateEngine,
        pair: &ScenarioPair,
    ) -> CICFResult<ComparisonResult> {
        let (baseline, counterfactual) = (&pair.baseline, &pair.counterfactual);
        if **baseline.grid() != **counterfactual.grid() {
            return Err(CICFError::inconsistent(
                &pair.replaced,
                format!(
                    "baseline grid {} differs from counterfactual grid {}",
                    baseline.grid(),
                    counterfactual.grid()
                ),
            ));
        }
        let years: Vec<Year> = baseline.grid().years().collect();

        info!(
            baseline = %baseline.name(),
            counterfactual = %counterfactual.name(),
            tracked = self.tracked.len(),
            "Running climate engine"
        );
        let baseline_outputs = self.run(engine, baseline)?;
        let counterfactual_outputs = self.run(engine, counterfactual)?;

        let mut quantities = Vec::new();
        if self.compare_inputs {
            if let (Some(b), Some(c)) = (baseline.get(&pair.replaced), counterfactual.get(&pair.replaced)) {
                quantities.push(QuantityComparison::new(
                    &pair.replaced,
                    b.unit(),
                    years.clone(),
                    b.values().to_owned(),
                    c.values().to_owned(),
                ));
            }
        }
        for ((name, unit, b), (_, c_unit, c)) in baseline_outputs.into_iter().zip(counterfactual_outputs) {
            if unit != c_unit {
                return Err(CICFError::EngineInvocation {
                    scenario: counterfactual.name().to_string(),
                    variable: name,
                    reason: format!("unit '{c_unit}' differs from baseline unit '{unit}'"),
                });
            }
            quantities.push(QuantityComparison::new(&name, &unit, years.clone(), b, c));
        }

        for q in &quantities {
            debug!(
                quantity = %q.quantity,
                unit = %q.unit,
                peak_delta = q.peak_delta,
                peak_delta_year = q.peak_delta_year,
                final_delta = q.final_delta,
                cumulative_delta = q.cumulative_delta,
                "Compared quantity"
            );
        }

        Ok(ComparisonResult {
            baseline: baseline.name().to_string(),
            counterfactual: counterfactual.name().to_string(),
            grid: Arc::clone(baseline.grid()),
            quantities,
        })
    }

    /// Tracked outputs of one run as `(name, unit, values)`.
    fn run(
        &self,
        engine: &dyn ClimateEngine,
        scenario: &Scenario,
    ) -> CICFResult<Vec<(String, String, Array1<FloatValue>)>> {
        let failure = |variable: &str, reason: String| CICFError::EngineInvocation {
            scenario: scenario.name().to_string(),
            variable: variable.to_string(),
            reason,
        };

        let inputs = EngineInputs::from_scenario(scenario);
        let outputs = engine.run(&inputs).map_err(|fault| {
            failure(fault.variable.as_deref().unwrap_or("<all>"), fault.message)
        })?;

        let grid = scenario.grid();
        let mut tracked = Vec::with_capacity(self.tracked.len());
        for name in &self.tracked {
            let output = outputs
                .get(name)
                .ok_or_else(|| failure(name, "output not produced".to_string()))?;
            if output.values.len() != grid.len() {
                return Err(failure(
                    name,
                    format!("{} values for a grid of {} years", output.values.len(), grid.len()),
                ));
            }
            if let Some(index) = output.values.iter().position(|v| !v.is_finite()) {
                return Err(failure(
                    name,
                    format!(
                        "value {} at {} is not finite",
                        output.values[index],
                        grid.start() + index as Year
                    ),
                ));
            }
            tracked.push((name.clone(), output.unit.clone(), output.values.clone()));
        }
        Ok(tracked)
    }
}
