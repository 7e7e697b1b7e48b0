//! tabcompare - compare two delimited text tables
//!
//! Loads two CSV/TXT files into tables, reports whether they are identical,
//! and otherwise which rows are common, unique to either side, and which
//! unique rows look like edited versions of each other.

pub mod config;
pub mod diff;
pub mod error;
pub mod explain;
pub mod loader;
pub mod model;
pub mod output;
pub mod pipeline;
pub mod similarity;

pub use config::Config;
pub use diff::{compare, DiffResult};
pub use error::{AdapterError, Error, IncompatibleSchemaError, IngestionError, Result};
pub use explain::Explainer;
pub use loader::TableLoader;
pub use model::Table;
pub use pipeline::ComparisonReport;
pub use similarity::{SimilarityMatcher, SimilarityPair};
