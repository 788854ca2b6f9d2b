//! Typed failure reasons for the library seams.
//!
//! Fetch errors are fatal to a run. Everything downstream (derivation and
//! rendering) is contained and surfaces as a value in the run reports.

use std::{io, path::PathBuf};

use thiserror::Error;

/// Invariant violations of the in-memory table.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TableError {
    #[error("Column '{0}' already exists in the table")]
    DuplicateColumn(String),

    #[error("Column '{column}' has {found} row(s) but the table has {expected}")]
    LengthMismatch {
        column: String,
        expected: usize,
        found: usize,
    },

    #[error("Row {row} has {found} value(s) but {expected} column(s) were named")]
    RowWidth {
        row: usize,
        expected: usize,
        found: usize,
    },
}

/// Failure of the external row-fetch collaborator.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Query execution failed: {0}")]
    Query(#[from] duckdb::Error),

    #[error("Query result is not a valid table: {0}")]
    Shape(#[from] TableError),

    #[error("Reading query source failed: {0}")]
    Io(#[from] io::Error),

    #[error("{0}")]
    Other(String),
}

/// Failure that turns a whole derivation pass into a no-op.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DeriveError {
    #[error("Column '{column}' holds non-numeric value '{value}' and cannot be divided")]
    NonNumericOperand { column: String, value: String },

    #[error("Column '{0}' disappeared during derivation")]
    MissingOperand(String),

    #[error(transparent)]
    Table(#[from] TableError),
}

/// Why a single derived metric was not added.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DeriveSkip {
    #[error("required column '{0}' is missing")]
    MissingColumn(String),

    #[error("output column '{0}' already exists")]
    NameTaken(String),
}

/// Failure producing one chart artifact.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Drawing failed: {0}")]
    Draw(String),

    #[error("Writing chart failed: {0}")]
    Io(#[from] io::Error),
}

/// Failure that aborts a pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("Creating output directory {path:?} failed: {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
