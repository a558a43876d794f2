use crate::timeseries::{FloatValue, Year};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Pipeline stage that raised an error.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stage {
    Normalize,
    Interpolate,
    Counterfactual,
    Assemble,
    Compare,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Normalize => "normalize",
            Stage::Interpolate => "interpolate",
            Stage::Counterfactual => "counterfactual",
            Stage::Assemble => "assemble",
            Stage::Compare => "compare",
        };
        f.write_str(name)
    }
}

/// Error type for invalid operations.
#[derive(Error, Debug)]
pub enum CICFError {
    #[error("Malformed input in '{source_name}': {reason}")]
    MalformedInput { source_name: String, reason: String },

    #[error("Insufficient data to interpolate '{species}': {samples} sample(s), at least 2 required")]
    InsufficientData { species: String, samples: usize },

    #[error("Extrapolation is not allowed for '{species}'. Year {year} lies outside the sampled range {first}-{last}")]
    ExtrapolationNotAllowed {
        species: String,
        year: Year,
        first: Year,
        last: Year,
    },

    #[error("Invalid carbon-intensity anchor at {year}: {}", describe_anchor(.value))]
    InvalidAnchor {
        year: Year,
        value: Option<FloatValue>,
    },

    #[error("Wrong units for '{variable}'. Expected {expected}, got {found}")]
    WrongUnits {
        variable: String,
        expected: String,
        found: String,
    },

    #[error("Scenario consistency violated for '{species}': {reason}")]
    ScenarioConsistency { species: String, reason: String },

    #[error("Invariant violated during {stage} for '{species}': {reason}")]
    InvariantViolation {
        stage: Stage,
        species: String,
        reason: String,
    },

    #[error("Climate engine failed for scenario '{scenario}' (variable '{variable}'): {reason}")]
    EngineInvocation {
        scenario: String,
        variable: String,
        reason: String,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cannot export '{target}': {reason}")]
    Export { target: String, reason: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

fn describe_anchor(value: &Option<FloatValue>) -> String {
    match value {
        Some(v) => format!("intensity {v} must be finite and strictly positive"),
        None => "anchor year is not on the time grid".to_string(),
    }
}

impl CICFError {
    /// The stage this error is reported against.
    ///
    /// Raw I/O errors only come from reading source tables and raw CSV errors
    /// only from writing comparison tables, so they are attributed to the
    /// normalizer and comparator boundaries respectively.
    pub fn stage(&self) -> Stage {
        match self {
            CICFError::MalformedInput { .. } | CICFError::Io(_) => Stage::Normalize,
            CICFError::InsufficientData { .. } | CICFError::ExtrapolationNotAllowed { .. } => {
                Stage::Interpolate
            }
            CICFError::InvalidAnchor { .. } | CICFError::WrongUnits { .. } => {
                Stage::Counterfactual
            }
            CICFError::ScenarioConsistency { .. } => Stage::Assemble,
            CICFError::InvariantViolation { stage, .. } => *stage,
            CICFError::EngineInvocation { .. } | CICFError::Export { .. } | CICFError::Csv(_) => {
                Stage::Compare
            }
        }
    }

    pub(crate) fn malformed(source_name: &str, reason: impl Into<String>) -> Self {
        CICFError::MalformedInput {
            source_name: source_name.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn inconsistent(species: &str, reason: impl Into<String>) -> Self {
        CICFError::ScenarioConsistency {
            species: species.to_string(),
            reason: reason.into(),
        }
    }
}

/// Convenience type for `Result<T, CICFError>`.
pub type CICFResult<T> = Result<T, CICFError>;
