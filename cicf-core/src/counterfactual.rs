//! Counterfactual CO2 emissions under fixed carbon intensity of GDP.
//!
//! The counterfactual answers "what if the carbon intensity of the global
//! economy had stayed at its anchor-year level while GDP followed its actual
//! path". For every grid year `t`:
//!
//! ```text
//! counterfactual[t] = intensity[anchor] * gdp[t]
//! ```
//!
//! expressed in the unit of the actual CO2 emissions series.

use crate::errors::{CICFError, CICFResult, Stage};
use crate::timeseries::{DenseSeries, FloatValue, Year};
use crate::units::Unit;
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

pub const DEFAULT_ANCHOR_YEAR: Year = 1975;

/// Carbon intensity at the anchor year.
///
/// Only obtainable through [`CarbonIntensityAnchor::from_series`], so the value
/// is always finite and strictly positive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CarbonIntensityAnchor {
    year: Year,
    value: FloatValue,
}

impl CarbonIntensityAnchor {
    pub fn from_series(intensity: &DenseSeries, year: Year) -> CICFResult<Self> {
        match intensity.at(year) {
            Some(value) if value.is_finite() && value > 0.0 => Ok(Self { year, value }),
            value => Err(CICFError::InvalidAnchor { year, value }),
        }
    }

    pub fn year(&self) -> Year {
        self.year
    }

    pub fn value(&self) -> FloatValue {
        self.value
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CounterfactualMethod {
    /// `intensity[anchor] * gdp[t]` for every year.
    #[default]
    ConstantIntensity,
    /// `actual[t] + (intensity[anchor] - intensity[t]) * gdp[t]` after the
    /// anchor year, `actual[t]` up to and including it.
    ///
    /// Emissions in the actual series that are not explained by intensity
    /// (land use, for example) carry through unchanged.
    AnchoredAdjustment,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CounterfactualGenerator {
    pub anchor_year: Year,
    pub method: CounterfactualMethod,
}

impl Default for CounterfactualGenerator {
    fn default() -> Self {
        Self {
            anchor_year: DEFAULT_ANCHOR_YEAR,
            method: CounterfactualMethod::default(),
        }
    }
}

impl CounterfactualGenerator {
    pub fn new(anchor_year: Year, method: CounterfactualMethod) -> Self {
        Self {
            anchor_year,
            method,
        }
    }

    /// Derive the counterfactual for `actual`.
    ///
    /// The result has the name, unit, kind and grid of `actual`.
    pub fn generate(
        &self,
        intensity: &DenseSeries,
        gdp: &DenseSeries,
        actual: &DenseSeries,
    ) -> CICFResult<DenseSeries> {
        for other in [gdp, actual] {
            if !intensity.shares_grid(other) {
                return Err(CICFError::inconsistent(
                    other.name(),
                    format!(
                        "grid {} differs from the grid of '{}' ({})",
                        other.grid(),
                        intensity.name(),
                        intensity.grid()
                    ),
                ));
            }
        }

        let anchor = CarbonIntensityAnchor::from_series(intensity, self.anchor_year)?;
        let factor = product_factor(intensity, gdp, actual)?;

        let values: Array1<FloatValue> = match self.method {
            CounterfactualMethod::ConstantIntensity => {
                gdp.values().mapv(|g| anchor.value() * g * factor)
            }
            CounterfactualMethod::AnchoredAdjustment => actual
                .iter()
                .zip(intensity.values().iter().zip(gdp.values().iter()))
                .map(|((year, a), (ci, g))| {
                    if year <= anchor.year() {
                        a
                    } else {
                        a + (anchor.value() - ci) * g * factor
                    }
                })
                .collect(),
        };

        let counterfactual = DenseSeries::new(
            actual.name(),
            actual.unit(),
            actual.kind(),
            Arc::clone(actual.grid()),
            values,
            Stage::Counterfactual,
        )?;

        let adjustment = &counterfactual.values() - &actual.values();
        let adjusted = adjustment.iter().filter(|d| **d != 0.0).count();
        let cumulative = adjustment.sum();
        info!(
            species = %actual.name(),
            anchor_year = anchor.year(),
            anchor_intensity = anchor.value(),
            method = ?self.method,
            adjusted_years = adjusted,
            mean_adjustment = cumulative / adjustment.len() as FloatValue,
            cumulative_adjustment = cumulative,
            unit = %actual.unit(),
            "Derived counterfactual emissions"
        );

        Ok(counterfactual)
    }
}

/// Factor taking `intensity * gdp` into the unit of `actual`.
fn product_factor(
    intensity: &DenseSeries,
    gdp: &DenseSeries,
    actual: &DenseSeries,
) -> CICFResult<FloatValue> {
    let wrong_units = || CICFError::WrongUnits {
        variable: actual.name().to_string(),
        expected: actual.unit().to_string(),
        found: format!("({}) * ({})", intensity.unit(), gdp.unit()),
    };

    let product = Unit::parse(intensity.unit())
        .and_then(|ci| Unit::parse(gdp.unit()).and_then(|g| ci.product(&g)))
        .map_err(|_| wrong_units())?;
    let target = Unit::parse(actual.unit()).map_err(|_| wrong_units())?;
    product.conversion_factor(&target).map_err(|_| wrong_units())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeseries::{QuantityKind, TimeGrid};
    use approx::assert_relative_eq;
    use ndarray::array;

    fn grid() -> Arc<TimeGrid> {
        Arc::new(TimeGrid::new(1974, 1976).unwrap())
    }

    fn series(
        name: &str,
        unit: &str,
        kind: QuantityKind,
        grid: &Arc<TimeGrid>,
        values: Array1<FloatValue>,
    ) -> DenseSeries {
        DenseSeries::new(name, unit, kind, Arc::clone(grid), values, Stage::Interpolate).unwrap()
    }

    fn inputs(actual_unit: &str) -> (DenseSeries, DenseSeries, DenseSeries) {
        let grid = grid();
        (
            series(
                "Carbon Intensity|CO2",
                "kg CO2/USD",
                QuantityKind::Economic,
                &grid,
                array![0.5, 0.4, 0.3],
            ),
            series(
                "GDP",
                "trillion USD/yr",
                QuantityKind::Economic,
                &grid,
                array![100.0, 110.0, 121.0],
            ),
            series(
                "Emissions|CO2",
                actual_unit,
                QuantityKind::Emissions,
                &grid,
                array![50.0, 44.0, 36.3],
            ),
        )
    }

    #[test]
    fn holds_intensity_at_anchor() {
        let (ci, gdp, actual) = inputs("Gt CO2/yr");
        let cf = CounterfactualGenerator::default()
            .generate(&ci, &gdp, &actual)
            .unwrap();

        assert_eq!(cf.name(), "Emissions|CO2");
        assert_eq!(cf.unit(), "Gt CO2/yr");
        assert!(cf.shares_grid(&actual));
        assert_relative_eq!(cf.at(1974).unwrap(), 40.0, max_relative = 1e-12);
        assert_relative_eq!(cf.at(1975).unwrap(), 44.0, max_relative = 1e-12);
        assert_relative_eq!(cf.at(1976).unwrap(), 48.4, max_relative = 1e-12);

        for ((_, c), g) in cf.iter().zip(gdp.values().iter()) {
            assert_relative_eq!(c / g, 0.4, max_relative = 1e-12);
        }
    }

    #[test]
    fn independent_of_actual_values() {
        let (ci, gdp, actual) = inputs("Gt CO2/yr");
        let other_actual = actual.with_values(array![1.0, 2.0, 3.0], Stage::Interpolate).unwrap();
        let generator = CounterfactualGenerator::default();
        assert_eq!(
            generator.generate(&ci, &gdp, &actual).unwrap(),
            generator.generate(&ci, &gdp, &other_actual).unwrap()
        );
    }

    #[test]
    fn identical_inputs_give_identical_output() {
        let (ci, gdp, actual) = inputs("Gt CO2/yr");
        let generator = CounterfactualGenerator::default();
        let a = generator.generate(&ci, &gdp, &actual).unwrap();
        let b = generator.generate(&ci, &gdp, &actual).unwrap();
        let bits = |s: &DenseSeries| s.values().iter().map(|v| v.to_bits()).collect::<Vec<_>>();
        assert_eq!(bits(&a), bits(&b));
    }

    #[test]
    fn converts_into_actual_unit() {
        let (ci, gdp, actual) = inputs("Mt CO2/yr");
        let cf = CounterfactualGenerator::default()
            .generate(&ci, &gdp, &actual)
            .unwrap();
        assert_relative_eq!(cf.at(1976).unwrap(), 48_400.0, max_relative = 1e-12);
    }

    #[test]
    fn zero_anchor_is_rejected() {
        let (ci, gdp, actual) = inputs("Gt CO2/yr");
        let ci = ci.with_values(array![0.5, 0.0, 0.3], Stage::Interpolate).unwrap();
        let err = CounterfactualGenerator::default()
            .generate(&ci, &gdp, &actual)
            .unwrap_err();
        assert!(matches!(
            err,
            CICFError::InvalidAnchor {
                year: 1975,
                value: Some(v)
            } if v == 0.0
        ));
        assert!(err.to_string().contains("1975"), "{err}");
        assert_eq!(err.stage(), Stage::Counterfactual);
    }

    #[test]
    fn anchor_off_grid_is_rejected() {
        let (ci, gdp, actual) = inputs("Gt CO2/yr");
        let err = CounterfactualGenerator::new(1990, CounterfactualMethod::ConstantIntensity)
            .generate(&ci, &gdp, &actual)
            .unwrap_err();
        assert!(matches!(
            err,
            CICFError::InvalidAnchor {
                year: 1990,
                value: None
            }
        ));
    }

    #[test]
    fn incompatible_units() {
        let (ci, gdp, actual) = inputs("Mt CH4/yr");
        let err = CounterfactualGenerator::default()
            .generate(&ci, &gdp, &actual)
            .unwrap_err();
        match err {
            CICFError::WrongUnits {
                variable, expected, ..
            } => {
                assert_eq!(variable, "Emissions|CO2");
                assert_eq!(expected, "Mt CH4/yr");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn mismatched_grids() {
        let (ci, gdp, _) = inputs("Gt CO2/yr");
        let other_grid = Arc::new(TimeGrid::new(1975, 1977).unwrap());
        let actual = series(
            "Emissions|CO2",
            "Gt CO2/yr",
            QuantityKind::Emissions,
            &other_grid,
            array![1.0, 2.0, 3.0],
        );
        let err = CounterfactualGenerator::default()
            .generate(&ci, &gdp, &actual)
            .unwrap_err();
        assert!(matches!(err, CICFError::ScenarioConsistency { .. }));
    }

    #[test]
    fn anchored_adjustment_keeps_history_up_to_anchor() {
        let (ci, gdp, actual) = inputs("Gt CO2/yr");
        let cf = CounterfactualGenerator::new(1975, CounterfactualMethod::AnchoredAdjustment)
            .generate(&ci, &gdp, &actual)
            .unwrap();
        assert_eq!(cf.at(1974), actual.at(1974));
        assert_eq!(cf.at(1975), actual.at(1975));
        // 36.3 + (0.4 - 0.3) * 121
        assert_relative_eq!(cf.at(1976).unwrap(), 48.4, max_relative = 1e-12);
    }

    #[test]
    fn negative_counterfactual_is_an_invariant_violation() {
        let grid = grid();
        let ci = series(
            "Carbon Intensity|CO2",
            "kg CO2/USD",
            QuantityKind::Economic,
            &grid,
            array![0.5, 0.4, 0.9],
        );
        let (_, gdp, actual) = inputs("Gt CO2/yr");
        let err = CounterfactualGenerator::new(1975, CounterfactualMethod::AnchoredAdjustment)
            .generate(&ci, &gdp, &actual)
            .unwrap_err();
        assert!(matches!(
            err,
            CICFError::InvariantViolation {
                stage: Stage::Counterfactual,
                ..
            }
        ));
    }

    #[test]
    fn generator_defaults_from_partial_config() {
        let generator: CounterfactualGenerator =
            serde_json::from_str(r#"{"method": "anchored_adjustment"}"#).unwrap();
        assert_eq!(generator.anchor_year, 1975);
        assert_eq!(generator.method, CounterfactualMethod::AnchoredAdjustment);
    }
}
