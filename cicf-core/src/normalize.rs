//! Reduce heterogeneous source tables to canonical sparse series.
//!
//! Two table layouts are understood:
//!
//! - [`TableLayout::Columnar`]: one row per year, a year column and one value
//!   column per source variable (historical record tables).
//! - [`TableLayout::Wide`]: one row per variable with `Scenario`, `Variable`,
//!   `Unit` (and optionally `Region`) metadata and one column per year
//!   (model-native scenario tables).
//!
//! Which source column or variable feeds which canonical species is
//! configuration ([`SpeciesMapping`]), not code.

use crate::errors::{CICFError, CICFResult};
use crate::standard_variables;
use crate::timeseries::{FloatValue, QuantityKind, SparseSeries, Year};
use crate::units;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;
use tracing::{debug, warn};

/// Cell contents treated as a missing sample rather than a parse failure.
const MISSING_MARKERS: &[&str] = &["", "NaN", "nan", "NAN", "NA", "N/A", "null"];

/// A table as read from disk: a header row and rows of raw string cells.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    /// Identifies the table in error messages, usually the file path.
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(name: &str, headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self {
            name: name.to_string(),
            headers,
            rows,
        }
    }

    /// Read a CSV table. The first record is the header row.
    pub fn from_reader<R: Read>(name: &str, reader: R) -> CICFResult<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = reader
            .headers()
            .map_err(|e| CICFError::malformed(name, e.to_string()))?
            .iter()
            .map(str::to_string)
            .collect();
        let rows = reader
            .records()
            .map(|record| record.map(|r| r.iter().map(str::to_string).collect()))
            .collect::<Result<Vec<Vec<String>>, csv::Error>>()
            .map_err(|e| CICFError::malformed(name, e.to_string()))?;

        Ok(Self::new(name, headers, rows))
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> CICFResult<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)?;
        Self::from_reader(&path.display().to_string(), file)
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    fn require_column(&self, name: &str) -> CICFResult<usize> {
        self.column_index(name)
            .ok_or_else(|| CICFError::malformed(&self.name, format!("missing column '{name}'")))
    }

    fn cell<'a>(&self, row: &'a [String], index: usize) -> &'a str {
        row.get(index).map(String::as_str).unwrap_or("")
    }
}

/// Maps a source-specific name onto a canonical species.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeciesMapping {
    /// Column name (columnar layout) or `Variable` value (wide layout).
    pub source: String,
    /// Canonical species identifier, e.g. `Emissions|CO2`.
    pub species: String,
    /// Unit of the source values. Required for columnar tables. In wide
    /// tables a row's unit cell takes precedence and this is the fallback.
    #[serde(default)]
    pub unit: Option<String>,
    /// Canonical unit for species that are not standard variables.
    #[serde(default)]
    pub canonical_unit: Option<String>,
    /// Quantity kind for species that are not standard variables.
    #[serde(default)]
    pub kind: Option<QuantityKind>,
}

impl SpeciesMapping {
    pub fn new(source: &str, species: &str, unit: Option<&str>) -> Self {
        Self {
            source: source.to_string(),
            species: species.to_string(),
            unit: unit.map(str::to_string),
            canonical_unit: None,
            kind: None,
        }
    }
}

/// Splices a historical and a projection scenario at a cutover year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioStitch {
    pub historical: String,
    pub projection: String,
    /// First year taken from the projection scenario.
    pub cutover: Year,
}

/// Options for one-row-per-variable tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WideLayout {
    pub variable_column: String,
    pub unit_column: String,
    pub scenario_column: String,
    /// Region filter is skipped if the table has no such column.
    pub region_column: String,
    pub region: String,
    /// Only use rows from this scenario.
    pub scenario: Option<String>,
    pub stitch: Option<ScenarioStitch>,
}

impl Default for WideLayout {
    fn default() -> Self {
        Self {
            variable_column: "Variable".to_string(),
            unit_column: "Unit".to_string(),
            scenario_column: "Scenario".to_string(),
            region_column: "Region".to_string(),
            region: "World".to_string(),
            scenario: None,
            stitch: None,
        }
    }
}

fn default_year_column() -> String {
    "Year".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TableLayout {
    Columnar {
        #[serde(default = "default_year_column")]
        year_column: String,
    },
    Wide(WideLayout),
}

impl Default for TableLayout {
    fn default() -> Self {
        TableLayout::Columnar {
            year_column: default_year_column(),
        }
    }
}

/// Produces canonical sparse series from raw tables.
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    mappings: Vec<SpeciesMapping>,
}

impl Normalizer {
    pub fn new(mappings: Vec<SpeciesMapping>) -> Self {
        Self { mappings }
    }

    pub fn mapping_for(&self, species: &str) -> Option<&SpeciesMapping> {
        self.mappings.iter().find(|m| m.species == species)
    }

    pub fn species(&self) -> impl Iterator<Item = &str> {
        self.mappings.iter().map(|m| m.species.as_str())
    }

    /// Extract `species` from `table`, converted to its canonical unit.
    pub fn normalize(
        &self,
        table: &RawTable,
        layout: &TableLayout,
        species: &str,
    ) -> CICFResult<SparseSeries> {
        let mapping = self.mapping_for(species).ok_or_else(|| {
            CICFError::malformed(&table.name, format!("no mapping configured for '{species}'"))
        })?;
        let (canonical_unit, kind) = canonical_definition(table, mapping)?;

        let samples = match layout {
            TableLayout::Columnar { year_column } => {
                read_columnar(table, mapping, year_column, &canonical_unit)?
            }
            TableLayout::Wide(wide) => read_wide(table, mapping, wide, &canonical_unit)?,
        };

        debug!(
            table = %table.name,
            source = %mapping.source,
            species = %species,
            samples = samples.len(),
            unit = %canonical_unit,
            "Normalized series"
        );
        SparseSeries::new(species, &canonical_unit, kind, samples)
    }
}

fn canonical_definition(
    table: &RawTable,
    mapping: &SpeciesMapping,
) -> CICFResult<(String, QuantityKind)> {
    let standard = standard_variables::lookup(&mapping.species);
    let unit = mapping
        .canonical_unit
        .clone()
        .or_else(|| standard.map(|v| v.unit.to_string()));
    let kind = mapping.kind.or_else(|| standard.map(|v| v.kind));
    match (unit, kind) {
        (Some(unit), Some(kind)) => Ok((unit, kind)),
        _ => Err(CICFError::malformed(
            &table.name,
            format!(
                "'{}' is not a standard variable and its mapping declares no canonical unit and kind",
                mapping.species
            ),
        )),
    }
}

fn unit_factor(table: &RawTable, source_unit: &str, canonical_unit: &str) -> CICFResult<FloatValue> {
    units::conversion_factor(source_unit, canonical_unit).map_err(|e| {
        CICFError::malformed(
            &table.name,
            format!("cannot convert '{source_unit}' to '{canonical_unit}': {e}"),
        )
    })
}

fn parse_year(table: &RawTable, cell: &str) -> CICFResult<Year> {
    if let Ok(year) = cell.parse::<Year>() {
        return Ok(year);
    }
    match cell.parse::<f64>() {
        Ok(v) if v.fract() == 0.0 && v.abs() < Year::MAX as f64 => Ok(v as Year),
        _ => Err(CICFError::malformed(
            &table.name,
            format!("'{cell}' is not an integer year"),
        )),
    }
}

fn parse_value(table: &RawTable, cell: &str, context: &str) -> CICFResult<Option<FloatValue>> {
    if MISSING_MARKERS.contains(&cell) {
        return Ok(None);
    }
    let value = cell.parse::<f64>().map_err(|_| {
        CICFError::malformed(&table.name, format!("non-numeric value '{cell}' for {context}"))
    })?;
    if !value.is_finite() {
        return Err(CICFError::malformed(
            &table.name,
            format!("non-finite value '{cell}' for {context}"),
        ));
    }
    Ok(Some(value))
}

fn insert_sample(
    table: &RawTable,
    samples: &mut BTreeMap<Year, FloatValue>,
    source: &str,
    year: Year,
    value: FloatValue,
) -> CICFResult<()> {
    if samples.insert(year, value).is_some() {
        return Err(CICFError::malformed(
            &table.name,
            format!("year {year} appears more than once for '{source}'"),
        ));
    }
    Ok(())
}

fn read_columnar(
    table: &RawTable,
    mapping: &SpeciesMapping,
    year_column: &str,
    canonical_unit: &str,
) -> CICFResult<BTreeMap<Year, FloatValue>> {
    let year_index = table.require_column(year_column)?;
    let value_index = table.require_column(&mapping.source)?;
    let source_unit = mapping.unit.as_deref().ok_or_else(|| {
        CICFError::malformed(
            &table.name,
            format!("no unit declared for column '{}'", mapping.source),
        )
    })?;
    let factor = unit_factor(table, source_unit, canonical_unit)?;

    let mut samples = BTreeMap::new();
    let mut dropped = 0usize;
    for row in &table.rows {
        let year_cell = table.cell(row, year_index);
        if MISSING_MARKERS.contains(&year_cell) {
            dropped += 1;
            continue;
        }
        let year = parse_year(table, year_cell)?;
        let context = format!("'{}' in {year}", mapping.source);
        let Some(value) = parse_value(table, table.cell(row, value_index), &context)? else {
            continue;
        };
        if year <= 0 {
            dropped += 1;
            continue;
        }
        insert_sample(table, &mut samples, &mapping.source, year, value * factor)?;
    }

    if dropped > 0 {
        warn!(
            table = %table.name,
            source = %mapping.source,
            dropped,
            "Dropped records without a positive year"
        );
    }
    Ok(samples)
}

/// A wide-table row selected for a mapping, with the years it contributes.
struct WideRow<'a> {
    row: &'a [String],
    years: Box<dyn Fn(Year) -> bool + 'a>,
}

fn read_wide(
    table: &RawTable,
    mapping: &SpeciesMapping,
    layout: &WideLayout,
    canonical_unit: &str,
) -> CICFResult<BTreeMap<Year, FloatValue>> {
    let variable_index = table.require_column(&layout.variable_column)?;
    let region_index = table.column_index(&layout.region_column);

    let year_columns = year_columns(table)?;
    let matching: Vec<&[String]> = table
        .rows
        .iter()
        .map(Vec::as_slice)
        .filter(|row| table.cell(row, variable_index) == mapping.source)
        .filter(|row| match region_index {
            Some(i) => table.cell(row, i) == layout.region,
            None => true,
        })
        .collect();

    let selected = select_rows(table, mapping, layout, &matching)?;

    let mut samples = BTreeMap::new();
    for WideRow { row, years } in selected {
        let row_unit = table
            .column_index(&layout.unit_column)
            .map(|i| table.cell(row, i))
            .filter(|unit| !MISSING_MARKERS.contains(unit));
        let source_unit = match (row_unit, &mapping.unit) {
            (Some(unit), _) => unit.to_string(),
            (None, Some(unit)) => unit.clone(),
            (None, None) => {
                return Err(CICFError::malformed(
                    &table.name,
                    format!(
                        "no unit for '{}' in column '{}' or its mapping",
                        mapping.source, layout.unit_column
                    ),
                ))
            }
        };
        let factor = unit_factor(table, &source_unit, canonical_unit)?;

        for (column, year) in &year_columns {
            if !years(*year) {
                continue;
            }
            let context = format!("'{}' in {year}", mapping.source);
            if let Some(value) = parse_value(table, table.cell(row, *column), &context)? {
                insert_sample(table, &mut samples, &mapping.source, *year, value * factor)?;
            }
        }
    }
    Ok(samples)
}

/// Header positions that name a positive year.
fn year_columns(table: &RawTable) -> CICFResult<Vec<(usize, Year)>> {
    let mut columns = Vec::new();
    let mut dropped = 0usize;
    for (index, header) in table.headers.iter().enumerate() {
        let looks_numeric = header
            .trim_start_matches('-')
            .chars()
            .all(|c| c.is_ascii_digit() || c == '.');
        if header.is_empty() || !looks_numeric {
            continue;
        }
        let year = parse_year(table, header)?;
        if year <= 0 {
            dropped += 1;
            continue;
        }
        columns.push((index, year));
    }
    if dropped > 0 {
        warn!(table = %table.name, dropped, "Dropped year columns without a positive year");
    }
    Ok(columns)
}

fn select_rows<'a>(
    table: &RawTable,
    mapping: &SpeciesMapping,
    layout: &WideLayout,
    matching: &[&'a [String]],
) -> CICFResult<Vec<WideRow<'a>>> {
    let scenario_of = |row: &[String]| -> CICFResult<String> {
        let index = table.require_column(&layout.scenario_column)?;
        Ok(table.cell(row, index).to_string())
    };
    let single = |rows: Vec<&'a [String]>, label: &str| -> CICFResult<Option<&'a [String]>> {
        match rows.len() {
            0 => Ok(None),
            1 => Ok(Some(rows[0])),
            n => Err(CICFError::malformed(
                &table.name,
                format!("{n} rows match '{}'{label}", mapping.source),
            )),
        }
    };

    if let Some(stitch) = &layout.stitch {
        let mut historical = Vec::new();
        let mut projection = Vec::new();
        for row in matching {
            let scenario = scenario_of(*row)?;
            if scenario == stitch.historical {
                historical.push(*row);
            } else if scenario == stitch.projection {
                projection.push(*row);
            }
        }
        let historical = single(historical, &format!(" in scenario '{}'", stitch.historical))?;
        let projection = single(projection, &format!(" in scenario '{}'", stitch.projection))?;
        if historical.is_none() && projection.is_none() {
            return Err(CICFError::malformed(
                &table.name,
                format!(
                    "no rows for '{}' in scenarios '{}' or '{}'",
                    mapping.source, stitch.historical, stitch.projection
                ),
            ));
        }

        let cutover = stitch.cutover;
        let mut rows = Vec::new();
        if let Some(row) = historical {
            rows.push(WideRow {
                row,
                years: Box::new(move |year| year < cutover),
            });
        }
        if let Some(row) = projection {
            rows.push(WideRow {
                row,
                years: Box::new(move |year| year >= cutover),
            });
        }
        return Ok(rows);
    }

    let candidates = match &layout.scenario {
        Some(wanted) => {
            let mut filtered = Vec::new();
            for row in matching {
                if &scenario_of(*row)? == wanted {
                    filtered.push(*row);
                }
            }
            filtered
        }
        None => matching.to_vec(),
    };
    let row = single(candidates, "")?.ok_or_else(|| {
        CICFError::malformed(
            &table.name,
            format!("no row for variable '{}'", mapping.source),
        )
    })?;
    Ok(vec![WideRow {
        row,
        years: Box::new(|_| true),
    }])
}
