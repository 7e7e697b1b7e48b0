//! Error types for loading and comparing tables

use std::fmt;

use thiserror::Error;

use crate::loader::{Delimiter, Encoding};

pub type Result<T> = std::result::Result<T, Error>;

/// Which of the two compared files an error belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Left => write!(f, "left"),
            Side::Right => write!(f, "right"),
        }
    }
}

fn join(names: &[String]) -> String {
    names.join(", ")
}

fn join_failures(failures: &[LoadFailure]) -> String {
    failures
        .iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// A file could not be loaded into a table
#[derive(Error, Debug)]
pub enum IngestionError {
    #[error("unsupported file type `{name}` (expected .csv or .txt)")]
    UnsupportedFileType { name: String },

    #[error("file is empty")]
    Empty,

    #[error("delimiter {delimiter} not found in the first {sample_len} bytes decoded as {encoding}")]
    DelimiterNotFound {
        delimiter: Delimiter,
        encoding: Encoding,
        sample_len: usize,
    },

    #[error("trial parse found no columns")]
    NoColumns,

    #[error("trial parse found no data rows")]
    NoRows,

    #[error("invalid {encoding} byte sequence at byte offset {offset}")]
    Decode { encoding: Encoding, offset: u64 },

    #[error("row at line {line} has {found} fields, header has {expected}")]
    TooManyFields {
        line: u64,
        expected: usize,
        found: usize,
    },

    #[error("malformed CSV: {0}")]
    Malformed(#[source] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// The two tables share no column, so no merge diff can be built
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("tables share no columns (left: [{}], right: [{}])", join(.left_columns), join(.right_columns))]
pub struct IncompatibleSchemaError {
    pub left_columns: Vec<String>,
    pub right_columns: Vec<String>,
}

/// The explanation service failed for one pair
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AdapterError {
    #[error("explanation service unavailable: {0}")]
    Unavailable(String),

    #[error("explanation request failed: {0}")]
    Failed(String),

    #[error("explanation service returned no text")]
    Empty,
}

/// One side's load failure, tagged with the file it came from
#[derive(Error, Debug)]
#[error("failed to load {side} file `{name}`: {source}")]
pub struct LoadFailure {
    pub side: Side,
    pub name: String,
    #[source]
    pub source: IngestionError,
}

/// Errors surfaced by a full comparison request
#[derive(Error, Debug)]
pub enum Error {
    #[error("{}", join_failures(.0))]
    Ingestion(Vec<LoadFailure>),

    #[error(transparent)]
    IncompatibleSchema(#[from] IncompatibleSchemaError),
}

impl Error {
    /// The load failures, if this is an ingestion error
    pub fn load_failures(&self) -> &[LoadFailure] {
        match self {
            Error::Ingestion(failures) => failures,
            _ => &[],
        }
    }
}
