//! Typed failures raised by the pipeline stages.
//!
//! Loading, schema validation, enrichment and filter validation each report
//! through [`PipelineError`] so the command layer can tell a missing input
//! apart from a bad filter. Recoverable conditions (empty selections) are
//! not errors; see [`crate::filter::SelectionWarning`].

use std::path::PathBuf;

use thiserror::Error;

pub type PipelineResult<T> = std::result::Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Input file for table '{table}' not found at {path:?}")]
    MissingInput { table: String, path: PathBuf },

    #[error("Reading table '{table}' from {path:?}")]
    Read {
        table: String,
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Opening {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Table '{table}' row {row}: failed to decode text with encoding {encoding}")]
    Decode {
        table: String,
        row: usize,
        encoding: &'static str,
    },

    #[error("Table '{table}' row {row}: {message}")]
    Parse {
        table: String,
        row: usize,
        message: String,
    },

    #[error("Table '{table}' is missing required column '{column}'")]
    MissingColumn { table: String, column: String },

    #[error("Cannot parse purchase timestamp '{value}' of order '{order_id}'")]
    Timestamp { order_id: String, value: String },

    #[error("Decimal overflow while summing {0}")]
    Overflow(String),

    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl PipelineError {
    /// True when the failure means the dataset files are not where we looked.
    pub fn is_missing_input(&self) -> bool {
        matches!(
            self,
            PipelineError::MissingInput { .. } | PipelineError::Io { .. }
        )
    }
}
