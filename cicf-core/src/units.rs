//! Unit parsing and conversion for emissions, concentrations and economic series.
//!
//! Source tables disagree on notation (`GtC/yr`, `Mt CO2 / yr`, `kt N2O/yr`,
//! `trillion USD/yr`, ...). This module parses those strings into a
//! dimension plus a scale factor so that values can be brought onto the
//! canonical unit of each species.
//!
//! # Species mass
//!
//! Mass units may carry a substance, either attached (`GtC`) or as a separate
//! token (`Gt C`). Substances in the same family convert through their
//! molecular weight ratio, so `GtC` and `MtCO2` are compatible (factor
//! `1000 * 44/12`) while `MtCO2` and `MtCH4` are not.
//!
//! ```
//! use cicf_core::units::Unit;
//!
//! let gtc = Unit::parse("GtC/yr").unwrap();
//! let mtco2 = Unit::parse("Mt CO2 / yr").unwrap();
//! let factor = gtc.conversion_factor(&mtco2).unwrap();
//! assert!((factor - 3666.67).abs() < 0.01);
//! ```
//!
//! Power and length (`W/m^2`) are supported for forcing outputs.
//!
//! # Syntax
//!
//! ```text
//! unit_expr = term ('/' term)*
//! term      = factor ((' ' | '*') factor)*
//! factor    = token (('^' | '**') exponent)?
//! ```
//!
//! Every term after a `/` is a denominator. `per` is accepted as a synonym for
//! `/`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Error type for unit parsing and conversion failures.
#[derive(Debug, Clone, PartialEq)]
pub enum UnitError {
    /// Empty unit string.
    EmptyUnit,
    /// Unknown unit symbol.
    UnknownUnit(String),
    /// Invalid exponent format.
    InvalidExponent(String),
    /// More than one substance in a single unit.
    AmbiguousSubstance(String),
    /// Units describe different physical quantities.
    Incompatible { from: String, to: String },
}

impl fmt::Display for UnitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyUnit => write!(f, "empty unit string"),
            Self::UnknownUnit(u) => write!(f, "unknown unit: '{u}'"),
            Self::InvalidExponent(e) => write!(f, "invalid exponent: '{e}'"),
            Self::AmbiguousSubstance(u) => write!(f, "more than one substance in '{u}'"),
            Self::Incompatible { from, to } => {
                write!(f, "cannot convert from '{from}' to '{to}'")
            }
        }
    }
}

impl std::error::Error for UnitError {}

/// Exponents of the base dimensions a unit is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Dimension {
    pub mass: i8,
    pub length: i8,
    pub time: i8,
    pub currency: i8,
    pub temperature: i8,
}

impl Dimension {
    const MASS: Dimension = Dimension {
        mass: 1,
        length: 0,
        time: 0,
        currency: 0,
        temperature: 0,
    };
    const TIME: Dimension = Dimension {
        mass: 0,
        length: 0,
        time: 1,
        currency: 0,
        temperature: 0,
    };
    const CURRENCY: Dimension = Dimension {
        mass: 0,
        length: 0,
        time: 0,
        currency: 1,
        temperature: 0,
    };
    const POWER: Dimension = Dimension {
        mass: 1,
        length: 2,
        time: -3,
        currency: 0,
        temperature: 0,
    };
    const LENGTH: Dimension = Dimension {
        mass: 0,
        length: 1,
        time: 0,
        currency: 0,
        temperature: 0,
    };
    const TEMPERATURE: Dimension = Dimension {
        mass: 0,
        length: 0,
        time: 0,
        currency: 0,
        temperature: 1,
    };

    fn scaled(self, exponent: i8) -> Self {
        Self {
            mass: self.mass * exponent,
            length: self.length * exponent,
            time: self.time * exponent,
            currency: self.currency * exponent,
            temperature: self.temperature * exponent,
        }
    }

    fn add(self, other: Self) -> Self {
        Self {
            mass: self.mass + other.mass,
            length: self.length + other.length,
            time: self.time + other.time,
            currency: self.currency + other.currency,
            temperature: self.temperature + other.temperature,
        }
    }

    pub fn is_dimensionless(&self) -> bool {
        *self == Dimension::default()
    }
}

/// Chemical species a mass can be expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Substance {
    C,
    CO2,
    CH4,
    N,
    N2O,
    S,
    SO2,
    BC,
    OC,
    NOx,
    CO,
    NMVOC,
    NH3,
}

impl Substance {
    fn parse(token: &str) -> Option<Self> {
        let substance = match token {
            "C" => Self::C,
            "CO2" => Self::CO2,
            "CH4" => Self::CH4,
            "N" => Self::N,
            "N2O" => Self::N2O,
            "S" => Self::S,
            "SO2" => Self::SO2,
            "BC" => Self::BC,
            "OC" => Self::OC,
            "NOx" => Self::NOx,
            "CO" => Self::CO,
            "NMVOC" | "VOC" => Self::NMVOC,
            "NH3" => Self::NH3,
            _ => return None,
        };
        Some(substance)
    }

    /// Substances that convert into each other share a family.
    fn family(self) -> Self {
        match self {
            Self::C | Self::CO2 => Self::C,
            Self::N | Self::N2O => Self::N,
            Self::S | Self::SO2 => Self::S,
            other => other,
        }
    }

    /// Mass of this substance per unit mass of its family's base element.
    fn mass_per_base(self) -> f64 {
        match self {
            Self::CO2 => 44.0 / 12.0,
            Self::N2O => 44.0 / 28.0,
            Self::SO2 => 64.0 / 32.0,
            _ => 1.0,
        }
    }
}

const SECONDS_PER_YEAR: f64 = 365.25 * 24.0 * 3600.0;

/// Mass tokens, longest first so that prefixed masses win over `t`/`g`.
const MASS_UNITS: &[(&str, f64)] = &[
    ("Gt", 1e12),
    ("Pg", 1e12),
    ("Mt", 1e9),
    ("Tg", 1e9),
    ("kt", 1e6),
    ("Gg", 1e6),
    ("Mg", 1e3),
    ("kg", 1.0),
    ("t", 1e3),
    ("g", 1e-3),
];

fn simple_token(token: &str) -> Option<(f64, Dimension)> {
    if let Some((_, factor)) = MASS_UNITS.iter().find(|(symbol, _)| *symbol == token) {
        return Some((*factor, Dimension::MASS));
    }
    let entry = match token {
        "yr" | "year" | "a" => (SECONDS_PER_YEAR, Dimension::TIME),
        "day" => (86400.0, Dimension::TIME),
        "h" => (3600.0, Dimension::TIME),
        "s" => (1.0, Dimension::TIME),
        "USD" | "$" => (1.0, Dimension::CURRENCY),
        "K" | "degC" => (1.0, Dimension::TEMPERATURE),
        "W" => (1.0, Dimension::POWER),
        "m" => (1.0, Dimension::LENGTH),
        "km" => (1e3, Dimension::LENGTH),
        "thousand" => (1e3, Dimension::default()),
        "million" => (1e6, Dimension::default()),
        "billion" => (1e9, Dimension::default()),
        "trillion" => (1e12, Dimension::default()),
        "ppm" => (1e-6, Dimension::default()),
        "ppb" => (1e-9, Dimension::default()),
        "ppt" => (1e-12, Dimension::default()),
        "1" | "dimensionless" => (1.0, Dimension::default()),
        _ => {
            // Currency with a base year attached, e.g. `2015USD`
            let stripped = token.trim_start_matches(|c: char| c.is_ascii_digit());
            if stripped != token && (stripped == "USD" || stripped == "$") {
                (1.0, Dimension::CURRENCY)
            } else {
                return None;
            }
        }
    };
    Some(entry)
}

/// A parsed unit: a scale factor relative to the base units (kg, s, USD, K)
/// and the dimension it measures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Unit {
    original: String,
    factor: f64,
    dimension: Dimension,
    substance: Option<Substance>,
    /// 1 when the substance is in the numerator, -1 in the denominator.
    substance_side: i8,
}

impl PartialEq for Unit {
    fn eq(&self, other: &Self) -> bool {
        self.dimension == other.dimension
            && self.substance == other.substance
            && self.substance_side == other.substance_side
            && self.factor == other.factor
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.original)
    }
}

impl Unit {
    pub fn parse(input: &str) -> Result<Self, UnitError> {
        let cleaned = input.trim().replace(" per ", "/");
        if cleaned.is_empty() {
            return Err(UnitError::EmptyUnit);
        }

        let mut factor = 1.0;
        let mut dimension = Dimension::default();
        let mut substance: Option<Substance> = None;
        let mut substance_side = 0;

        for (term_index, term) in cleaned.split('/').enumerate() {
            let sign: i8 = if term_index == 0 { 1 } else { -1 };
            let tokens = term
                .split(|c: char| c.is_whitespace() || c == '*' || c == '·')
                .filter(|t| !t.is_empty());

            for token in tokens {
                let (symbol, exponent) = split_exponent(token)?;
                let exponent = exponent * sign;
                let (token_factor, token_dimension, token_substance) = parse_token(symbol)?;

                if let Some(found) = token_substance {
                    if substance.replace(found).is_some() {
                        return Err(UnitError::AmbiguousSubstance(input.to_string()));
                    }
                    substance_side = sign;
                }
                factor *= token_factor.powi(exponent as i32);
                dimension = dimension.add(token_dimension.scaled(exponent));
            }
        }

        if factor == 1.0 && dimension.is_dimensionless() && substance.is_none() {
            // Nothing but separators, e.g. "/"
            if !cleaned.chars().any(|c| c.is_alphanumeric() || c == '$') {
                return Err(UnitError::EmptyUnit);
            }
        }

        Ok(Self {
            original: input.trim().to_string(),
            factor,
            dimension,
            substance,
            substance_side,
        })
    }

    pub fn original(&self) -> &str {
        &self.original
    }

    pub fn dimension(&self) -> Dimension {
        self.dimension
    }

    pub fn is_dimensionless(&self) -> bool {
        self.dimension.is_dimensionless()
    }

    /// Returns true if values in this unit can be converted to `other`.
    pub fn is_compatible(&self, other: &Self) -> bool {
        if self.dimension != other.dimension {
            return false;
        }
        if self.dimension.mass == 0 {
            return true;
        }
        match (self.substance, other.substance) {
            (Some(a), Some(b)) => {
                a.family() == b.family() && self.substance_side == other.substance_side
            }
            (None, None) => true,
            _ => false,
        }
    }

    /// Factor that converts a value in `self` into a value in `other`.
    pub fn conversion_factor(&self, other: &Self) -> Result<f64, UnitError> {
        if !self.is_compatible(other) {
            return Err(UnitError::Incompatible {
                from: self.original.clone(),
                to: other.original.clone(),
            });
        }
        Ok(self.base_factor() / other.base_factor())
    }

    pub fn convert_to(&self, value: f64, other: &Self) -> Result<f64, UnitError> {
        Ok(value * self.conversion_factor(other)?)
    }

    /// The unit of the product of a value in `self` and a value in `other`.
    pub fn product(&self, other: &Self) -> Result<Self, UnitError> {
        let (substance, substance_side) = match (self.substance, other.substance) {
            (Some(a), Some(b)) if a != b || self.substance_side != other.substance_side => {
                return Err(UnitError::AmbiguousSubstance(format!(
                    "({}) * ({})",
                    self.original, other.original
                )))
            }
            (Some(a), _) => (Some(a), self.substance_side),
            (None, b) => (b, other.substance_side),
        };
        Ok(Self {
            original: format!("({}) * ({})", self.original, other.original),
            factor: self.factor * other.factor,
            dimension: self.dimension.add(other.dimension),
            substance,
            substance_side,
        })
    }

    /// Scale factor expressed in mass of the substance family's base element.
    fn base_factor(&self) -> f64 {
        let per_base = self.substance.map(Substance::mass_per_base).unwrap_or(1.0);
        self.factor / per_base.powi(self.dimension.mass as i32)
    }
}

fn split_exponent(token: &str) -> Result<(&str, i8), UnitError> {
    let (symbol, exponent) = if let Some((symbol, exponent)) = token.split_once("**") {
        (symbol, Some(exponent))
    } else if let Some((symbol, exponent)) = token.split_once('^') {
        (symbol, Some(exponent))
    } else {
        (token, None)
    };

    match exponent {
        None => Ok((symbol, 1)),
        Some(e) => e
            .parse::<i8>()
            .map(|value| (symbol, value))
            .map_err(|_| UnitError::InvalidExponent(e.to_string())),
    }
}

fn parse_token(token: &str) -> Result<(f64, Dimension, Option<Substance>), UnitError> {
    if let Some((factor, dimension)) = simple_token(token) {
        return Ok((factor, dimension, None));
    }
    if let Some(substance) = Substance::parse(token) {
        return Ok((1.0, Dimension::default(), Some(substance)));
    }
    // Mass with an attached substance, e.g. `GtC` or `ktN2O`
    for (symbol, factor) in MASS_UNITS {
        if let Some(rest) = token.strip_prefix(symbol) {
            if let Some(substance) = Substance::parse(rest) {
                return Ok((*factor, Dimension::MASS, Some(substance)));
            }
        }
    }
    Err(UnitError::UnknownUnit(token.to_string()))
}

/// True if both strings describe the same unit.
pub fn units_equal(a: &str, b: &str) -> bool {
    a.trim() == b.trim() || matches!((Unit::parse(a), Unit::parse(b)), (Ok(x), Ok(y)) if x == y)
}

/// Factor converting a value in unit `from` into unit `to`.
pub fn conversion_factor(from: &str, to: &str) -> Result<f64, UnitError> {
    if from.trim() == to.trim() {
        return Ok(1.0);
    }
    Unit::parse(from)?.conversion_factor(&Unit::parse(to)?)
}
