use cicf_core::errors::{CICFError, Stage};
use std::path::PathBuf;
use thiserror::Error;

/// Error type for a pipeline run.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Stage(#[from] CICFError),

    #[error("Invalid configuration in {path}: {reason}")]
    Config { path: String, reason: String },

    #[error("Cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration lists {expected} source(s) but {found} table(s) were supplied")]
    SourceCount { expected: usize, found: usize },
}

impl PipelineError {
    /// Stage that failed, if the failure happened inside the pipeline proper.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            PipelineError::Stage(e) => Some(e.stage()),
            _ => None,
        }
    }
}

pub type PipelineResult<T> = Result<T, PipelineError>;
