//! Expansion of sparse series onto a dense annual grid.

use crate::errors::{CICFError, CICFResult, Stage};
use crate::timeseries::{DenseSeries, FloatValue, SparseSeries, TimeGrid, Year};
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// What to do for grid years outside the sampled range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryPolicy {
    /// Repeat the nearest sampled value.
    #[default]
    Hold,
    /// Fail with [`CICFError::ExtrapolationNotAllowed`].
    Forbid,
}

/// Linear interpolation between the nearest enclosing samples.
///
/// Sample years on the grid are reproduced exactly. Samples that fall outside
/// the grid still bound the interpolation of the years next to them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interpolator {
    #[serde(default)]
    policy: BoundaryPolicy,
}

impl Interpolator {
    pub fn new(policy: BoundaryPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> BoundaryPolicy {
        self.policy
    }

    pub fn densify(&self, series: &SparseSeries, grid: &Arc<TimeGrid>) -> CICFResult<DenseSeries> {
        let samples: Vec<(Year, FloatValue)> = series.iter().collect();
        if samples.len() < 2 {
            return Err(CICFError::InsufficientData {
                species: series.name().to_string(),
                samples: samples.len(),
            });
        }
        let (first, _) = samples[0];
        let (last, _) = samples[samples.len() - 1];

        let mut values = Vec::with_capacity(grid.len());
        let mut filled = 0usize;
        for year in grid.years() {
            let index = samples.partition_point(|(y, _)| *y < year);
            let value = match samples.get(index) {
                Some((y, v)) if *y == year => *v,
                _ if index == 0 || index == samples.len() => {
                    if self.policy == BoundaryPolicy::Forbid {
                        return Err(CICFError::ExtrapolationNotAllowed {
                            species: series.name().to_string(),
                            year,
                            first,
                            last,
                        });
                    }
                    filled += 1;
                    if index == 0 {
                        samples[0].1
                    } else {
                        samples[samples.len() - 1].1
                    }
                }
                _ => {
                    filled += 1;
                    let (y0, v0) = samples[index - 1];
                    let (y1, v1) = samples[index];
                    let fraction = (year - y0) as FloatValue / (y1 - y0) as FloatValue;
                    v0 + (v1 - v0) * fraction
                }
            };
            values.push(value);
        }

        if values.len() != grid.len() {
            return Err(CICFError::InvariantViolation {
                stage: Stage::Interpolate,
                species: series.name().to_string(),
                reason: format!("produced {} values for {grid}", values.len()),
            });
        }

        debug!(
            species = %series.name(),
            samples = samples.len(),
            filled,
            grid = %grid,
            "Densified series"
        );

        DenseSeries::new(
            series.name(),
            series.unit(),
            series.kind(),
            Arc::clone(grid),
            Array1::from(values),
            Stage::Interpolate,
        )
    }
}
