//! Annual time grids and the sparse/dense series defined on them.
//!
//! A [`SparseSeries`] holds whatever samples a source table provided. A
//! [`DenseSeries`] holds exactly one value per year of a shared [`TimeGrid`] and
//! can only be constructed if its values are well formed, so any dense series
//! in hand is safe to pass on to a climate-response engine.

use crate::errors::{CICFError, CICFResult, Stage};
use crate::validation::{first_negative, first_non_finite};
use ndarray::{Array1, ArrayView1};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

pub type FloatValue = f64;
pub type Year = i32;

/// An inclusive, strictly increasing window of integer years.
///
/// Every series taking part in a model run shares a single grid through an
/// `Arc<TimeGrid>`; two grids are compatible only if their bounds are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawTimeGrid")]
pub struct TimeGrid {
    start: Year,
    end: Year,
}

#[derive(Deserialize)]
struct RawTimeGrid {
    start: Year,
    end: Year,
}

impl TryFrom<RawTimeGrid> for TimeGrid {
    type Error = CICFError;

    fn try_from(raw: RawTimeGrid) -> CICFResult<Self> {
        Self::new(raw.start, raw.end)
    }
}

impl TimeGrid {
    pub fn new(start: Year, end: Year) -> CICFResult<Self> {
        let violation = |reason: String| CICFError::InvariantViolation {
            stage: Stage::Interpolate,
            species: "TimeGrid".to_string(),
            reason,
        };
        if end < start {
            return Err(violation(format!("end year {end} precedes start year {start}")));
        }
        if end.checked_sub(start).is_none() {
            return Err(violation(format!("{start}-{end} spans too many years")));
        }
        Ok(Self { start, end })
    }

    /// The 1750-2023 window used for historical reconstructions (274 years).
    pub fn historical() -> Self {
        Self {
            start: 1750,
            end: 2023,
        }
    }

    pub fn start(&self) -> Year {
        self.start
    }

    pub fn end(&self) -> Year {
        self.end
    }

    pub fn len(&self) -> usize {
        (self.end - self.start) as usize + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn contains(&self, year: Year) -> bool {
        (self.start..=self.end).contains(&year)
    }

    /// Index of `year` on the grid, if present.
    pub fn index_of(&self, year: Year) -> Option<usize> {
        self.contains(year).then(|| (year - self.start) as usize)
    }

    pub fn year_at(&self, index: usize) -> Option<Year> {
        (index < self.len()).then(|| self.start + index as Year)
    }

    pub fn years(&self) -> impl Iterator<Item = Year> {
        self.start..=self.end
    }
}

impl fmt::Display for TimeGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{} ({} years)", self.start, self.end, self.len())
    }
}

/// What a series measures.
///
/// Emissions and concentrations can never be negative. Economic indicators,
/// temperature anomalies and forcings are only required to be finite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuantityKind {
    Emissions,
    Concentration,
    Economic,
    Temperature,
    Forcing,
}

impl QuantityKind {
    pub fn is_physical(&self) -> bool {
        matches!(self, QuantityKind::Emissions | QuantityKind::Concentration)
    }
}

/// Irregularly sampled values for a single quantity.
///
/// Samples are keyed by year so they are always ordered and never duplicated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SparseSeries {
    name: String,
    unit: String,
    kind: QuantityKind,
    samples: BTreeMap<Year, FloatValue>,
}

impl SparseSeries {
    /// Build a sparse series, rejecting non-finite samples.
    pub fn new(
        name: &str,
        unit: &str,
        kind: QuantityKind,
        samples: BTreeMap<Year, FloatValue>,
    ) -> CICFResult<Self> {
        if let Some((year, value)) = samples.iter().find(|(_, v)| !v.is_finite()) {
            return Err(CICFError::malformed(
                name,
                format!("sample for {year} is not finite ({value})"),
            ));
        }
        Ok(Self {
            name: name.to_string(),
            unit: unit.to_string(),
            kind,
            samples,
        })
    }

    pub fn from_pairs(
        name: &str,
        unit: &str,
        kind: QuantityKind,
        pairs: impl IntoIterator<Item = (Year, FloatValue)>,
    ) -> CICFResult<Self> {
        let mut samples = BTreeMap::new();
        for (year, value) in pairs {
            if samples.insert(year, value).is_some() {
                return Err(CICFError::malformed(
                    name,
                    format!("year {year} appears more than once"),
                ));
            }
        }
        Self::new(name, unit, kind, samples)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }

    pub fn kind(&self) -> QuantityKind {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn get(&self, year: Year) -> Option<FloatValue> {
        self.samples.get(&year).copied()
    }

    pub fn first_year(&self) -> Option<Year> {
        self.samples.keys().next().copied()
    }

    pub fn last_year(&self) -> Option<Year> {
        self.samples.keys().next_back().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Year, FloatValue)> + '_ {
        self.samples.iter().map(|(y, v)| (*y, *v))
    }
}

/// One finite value per year of a shared [`TimeGrid`].
///
/// Deserialisation goes through [`DenseSeries::new`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawDenseSeries")]
pub struct DenseSeries {
    name: String,
    unit: String,
    kind: QuantityKind,
    grid: Arc<TimeGrid>,
    values: Array1<FloatValue>,
}

#[derive(Deserialize)]
struct RawDenseSeries {
    name: String,
    unit: String,
    kind: QuantityKind,
    grid: Arc<TimeGrid>,
    values: Array1<FloatValue>,
}

impl TryFrom<RawDenseSeries> for DenseSeries {
    type Error = CICFError;

    fn try_from(raw: RawDenseSeries) -> CICFResult<Self> {
        Self::new(
            &raw.name,
            &raw.unit,
            raw.kind,
            raw.grid,
            raw.values,
            Stage::Normalize,
        )
    }
}

impl DenseSeries {
    /// Build a dense series on `grid`.
    ///
    /// Fails with [`CICFError::InvariantViolation`] (attributed to `stage`) when
    /// the number of values differs from the grid length, when a value is not
    /// finite, or when a physical quantity is negative.
    pub fn new(
        name: &str,
        unit: &str,
        kind: QuantityKind,
        grid: Arc<TimeGrid>,
        values: Array1<FloatValue>,
        stage: Stage,
    ) -> CICFResult<Self> {
        let violation = |reason: String| CICFError::InvariantViolation {
            stage,
            species: name.to_string(),
            reason,
        };

        if values.len() != grid.len() {
            return Err(violation(format!(
                "{} values for a grid of {} years ({grid})",
                values.len(),
                grid.len()
            )));
        }
        if let Some(index) = first_non_finite(values.view()) {
            return Err(violation(format!(
                "value {} at {} is not finite",
                values[index],
                grid.start() + index as Year
            )));
        }
        if kind.is_physical() {
            if let Some(index) = first_negative(values.view()) {
                return Err(violation(format!(
                    "value {} at {} is negative",
                    values[index],
                    grid.start() + index as Year
                )));
            }
        }

        Ok(Self {
            name: name.to_string(),
            unit: unit.to_string(),
            kind,
            grid,
            values,
        })
    }

    /// A new series with the same metadata and grid but different values.
    pub fn with_values(&self, values: Array1<FloatValue>, stage: Stage) -> CICFResult<Self> {
        Self::new(
            &self.name,
            &self.unit,
            self.kind,
            Arc::clone(&self.grid),
            values,
            stage,
        )
    }

    /// A copy of this series under a different name.
    pub fn renamed(&self, name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..self.clone()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }

    pub fn kind(&self) -> QuantityKind {
        self.kind
    }

    pub fn grid(&self) -> &Arc<TimeGrid> {
        &self.grid
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> ArrayView1<'_, FloatValue> {
        self.values.view()
    }

    pub fn at(&self, year: Year) -> Option<FloatValue> {
        self.grid.index_of(year).map(|i| self.values[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = (Year, FloatValue)> + '_ {
        self.grid.years().zip(self.values.iter().copied())
    }

    /// True if both series are defined on the same window of years.
    pub fn shares_grid(&self, other: &DenseSeries) -> bool {
        Arc::ptr_eq(&self.grid, &other.grid) || *self.grid == *other.grid
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn grid() -> Arc<TimeGrid> {
        Arc::new(TimeGrid::new(2000, 2003).unwrap())
    }

    #[test]
    fn historical_grid_has_274_years() {
        let grid = TimeGrid::historical();
        assert_eq!(grid.len(), 274);
        assert_eq!(grid.index_of(1750), Some(0));
        assert_eq!(grid.index_of(2023), Some(273));
        assert_eq!(grid.index_of(2024), None);
        assert_eq!(grid.year_at(273), Some(2023));
        assert_eq!(grid.year_at(274), None);
    }

    #[test]
    fn single_year_grid() {
        let grid = TimeGrid::new(1975, 1975).unwrap();
        assert_eq!(grid.len(), 1);
        assert_eq!(grid.years().collect::<Vec<_>>(), vec![1975]);
    }

    #[test]
    fn reversed_grid_is_rejected() {
        assert!(TimeGrid::new(2023, 1750).is_err());
    }

    #[test]
    fn sparse_rejects_duplicates_and_nan() {
        let dup = SparseSeries::from_pairs(
            "Emissions|CO2",
            "Mt CO2/yr",
            QuantityKind::Emissions,
            vec![(1990, 1.0), (1990, 2.0)],
        );
        assert!(matches!(dup, Err(CICFError::MalformedInput { .. })));

        let nan = SparseSeries::from_pairs(
            "Emissions|CO2",
            "Mt CO2/yr",
            QuantityKind::Emissions,
            vec![(1990, f64::NAN)],
        );
        assert!(matches!(nan, Err(CICFError::MalformedInput { .. })));
    }

    #[test]
    fn sparse_is_ordered() {
        let series = SparseSeries::from_pairs(
            "GDP",
            "trillion USD/yr",
            QuantityKind::Economic,
            vec![(2010, 3.0), (1990, 1.0), (2000, 2.0)],
        )
        .unwrap();
        assert_eq!(series.first_year(), Some(1990));
        assert_eq!(series.last_year(), Some(2010));
        assert_eq!(
            series.iter().map(|(y, _)| y).collect::<Vec<_>>(),
            vec![1990, 2000, 2010]
        );
    }

    #[test]
    fn dense_length_must_match_grid() {
        let res = DenseSeries::new(
            "Emissions|CO2",
            "Mt CO2/yr",
            QuantityKind::Emissions,
            grid(),
            array![1.0, 2.0, 3.0],
            Stage::Interpolate,
        );
        match res {
            Err(CICFError::InvariantViolation { species, reason, .. }) => {
                assert_eq!(species, "Emissions|CO2");
                assert!(reason.contains("3 values for a grid of 4 years"), "{reason}");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn dense_rejects_negative_physical_values() {
        let res = DenseSeries::new(
            "Emissions|CH4",
            "Mt CH4/yr",
            QuantityKind::Emissions,
            grid(),
            array![1.0, -2.0, 3.0, 4.0],
            Stage::Interpolate,
        );
        let err = res.unwrap_err();
        assert!(err.to_string().contains("2001"), "{err}");
    }

    #[test]
    fn dense_allows_negative_economic_values() {
        let series = DenseSeries::new(
            "Growth",
            "1",
            QuantityKind::Economic,
            grid(),
            array![1.0, -2.0, 3.0, 4.0],
            Stage::Interpolate,
        )
        .unwrap();
        assert_eq!(series.at(2001), Some(-2.0));
        assert_eq!(series.at(1999), None);
    }

    #[test]
    fn dense_rejects_nan_for_any_kind() {
        let res = DenseSeries::new(
            "GDP",
            "trillion USD/yr",
            QuantityKind::Economic,
            grid(),
            array![1.0, 2.0, f64::NAN, 4.0],
            Stage::Interpolate,
        );
        assert!(res.unwrap_err().to_string().contains("2002"));
    }

    #[test]
    fn grid_spanning_the_whole_year_range_is_rejected() {
        assert!(TimeGrid::new(Year::MIN, Year::MAX).is_err());
        assert!(TimeGrid::new(-1, Year::MAX).is_err());
        assert_eq!(TimeGrid::new(0, Year::MAX).unwrap().year_at(0), Some(0));
    }

    #[test]
    fn deserialising_a_grid_validates_it() {
        let grid: TimeGrid = serde_json::from_str(r#"{"start": 1750, "end": 2023}"#).unwrap();
        assert_eq!(grid, TimeGrid::historical());

        let err = serde_json::from_str::<TimeGrid>(r#"{"start": 2023, "end": 1750}"#).unwrap_err();
        assert!(err.to_string().contains("precedes start year"), "{err}");
    }

    #[test]
    fn deserialising_a_dense_series_validates_it() {
        let dense = DenseSeries::new(
            "Emissions|CO2",
            "Mt CO2/yr",
            QuantityKind::Emissions,
            grid(),
            array![1.0, 2.0, 3.0, 4.0],
            Stage::Interpolate,
        )
        .unwrap();
        let json = serde_json::to_string(&dense).unwrap();
        let restored: DenseSeries = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, dense);

        let mut value: serde_json::Value = serde_json::from_str(&json).unwrap();
        value["values"] = serde_json::to_value(array![-5.0, 1.0]).unwrap();
        let err = serde_json::from_value::<DenseSeries>(value.clone()).unwrap_err();
        assert!(err.to_string().contains("2 values for a grid of 4 years"), "{err}");

        value["values"] = serde_json::to_value(array![1.0, -5.0, 1.0, 1.0]).unwrap();
        let err = serde_json::from_value::<DenseSeries>(value).unwrap_err();
        assert!(err.to_string().contains("negative"), "{err}");
    }

    #[test]
    fn shares_grid_by_value() {
        let a = DenseSeries::new(
            "a",
            "1",
            QuantityKind::Economic,
            grid(),
            array![1.0, 2.0, 3.0, 4.0],
            Stage::Interpolate,
        )
        .unwrap();
        let b = a.renamed("b");
        let c = DenseSeries::new(
            "c",
            "1",
            QuantityKind::Economic,
            Arc::new(TimeGrid::new(2001, 2004).unwrap()),
            array![1.0, 2.0, 3.0, 4.0],
            Stage::Interpolate,
        )
        .unwrap();
        assert!(a.shares_grid(&b));
        assert!(!a.shares_grid(&c));
    }
}
