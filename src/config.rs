//! Configuration handling for tabcompare

use std::path::PathBuf;

use serde::Serialize;

use crate::loader::{Delimiter, Encoding, LoadOptions, DEFAULT_CHUNK_SIZE};

/// Default similarity threshold; pairs must score strictly above it
pub const DEFAULT_THRESHOLD: f64 = 0.8;

/// Default number of concurrent explanation calls
pub const DEFAULT_EXPLAIN_CONCURRENCY: usize = 4;

/// Output format for comparison reports
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Terminal,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "terminal" => Ok(OutputFormat::Terminal),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown output format: {}", s)),
        }
    }
}

/// How similar rows are paired up
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Pairing {
    /// Every pair above the threshold; a row may appear in several pairs
    #[default]
    AllPairs,
    /// Greedy one-to-one assignment, best ratio first
    Exclusive,
}

/// Restricts which rows are compared at all
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Blocking {
    #[default]
    None,
    /// Only compare rows whose first value is the same
    LeadingToken,
}

/// Similarity matcher settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SimilarityConfig {
    pub threshold: f64,
    pub pairing: Pairing,
    /// Skip pairs whose cheap upper bound cannot beat the threshold
    pub prefilter: bool,
    pub blocking: Blocking,
}

impl Default for SimilarityConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            pairing: Pairing::default(),
            prefilter: true,
            blocking: Blocking::default(),
        }
    }
}

impl SimilarityConfig {
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_pairing(mut self, pairing: Pairing) -> Self {
        self.pairing = pairing;
        self
    }

    pub fn with_prefilter(mut self, prefilter: bool) -> Self {
        self.prefilter = prefilter;
        self
    }

    pub fn with_blocking(mut self, blocking: Blocking) -> Self {
        self.blocking = blocking;
        self
    }
}

/// One input file and how to read it
#[derive(Debug, Clone, Default)]
pub struct SourceConfig {
    pub path: PathBuf,
    pub delimiter: Delimiter,
    pub encoding: Encoding,
}

impl SourceConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    pub fn with_delimiter(mut self, delimiter: Delimiter) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }
}

/// Configuration for a comparison request
#[derive(Debug, Clone)]
pub struct Config {
    /// Left/original file
    pub left: SourceConfig,
    /// Right/new file
    pub right: SourceConfig,
    /// Rows per parse chunk
    pub chunk_size: usize,
    pub similarity: SimilarityConfig,
    /// Ask the explainer to describe similar pairs
    pub explain: bool,
    /// Upper bound on concurrent explanation calls
    pub explain_concurrency: usize,
    /// Output format
    pub output_format: OutputFormat,
    /// Only show statistics, not detailed rows
    pub stats_only: bool,
    /// Rows of each table to preview; 0 disables the preview
    pub preview_rows: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            left: SourceConfig::default(),
            right: SourceConfig::default(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            similarity: SimilarityConfig::default(),
            explain: false,
            explain_concurrency: DEFAULT_EXPLAIN_CONCURRENCY,
            output_format: OutputFormat::default(),
            stats_only: false,
            preview_rows: 0,
        }
    }
}

impl Config {
    /// Create a new Config with file paths
    pub fn new(left: impl Into<PathBuf>, right: impl Into<PathBuf>) -> Self {
        Self {
            left: SourceConfig::new(left),
            right: SourceConfig::new(right),
            ..Default::default()
        }
    }

    pub fn with_left(mut self, left: SourceConfig) -> Self {
        self.left = left;
        self
    }

    pub fn with_right(mut self, right: SourceConfig) -> Self {
        self.right = right;
        self
    }

    /// Use the same delimiter for both files
    pub fn with_delimiter(mut self, delimiter: Delimiter) -> Self {
        self.left.delimiter = delimiter;
        self.right.delimiter = delimiter;
        self
    }

    /// Use the same encoding for both files
    pub fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.left.encoding = encoding;
        self.right.encoding = encoding;
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn with_similarity(mut self, similarity: SimilarityConfig) -> Self {
        self.similarity = similarity;
        self
    }

    pub fn with_explain(mut self, explain: bool) -> Self {
        self.explain = explain;
        self
    }

    pub fn with_explain_concurrency(mut self, concurrency: usize) -> Self {
        self.explain_concurrency = concurrency;
        self
    }

    /// Set output format
    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = format;
        self
    }

    /// Enable stats-only mode
    pub fn with_stats_only(mut self, stats_only: bool) -> Self {
        self.stats_only = stats_only;
        self
    }

    pub fn with_preview_rows(mut self, rows: usize) -> Self {
        self.preview_rows = rows;
        self
    }

    /// Loader options for the left file
    pub fn left_load_options(&self) -> LoadOptions {
        LoadOptions::new(self.left.delimiter, self.left.encoding).with_chunk_size(self.chunk_size)
    }

    /// Loader options for the right file
    pub fn right_load_options(&self) -> LoadOptions {
        LoadOptions::new(self.right.delimiter, self.right.encoding).with_chunk_size(self.chunk_size)
    }
}
