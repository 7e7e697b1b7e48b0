//! One comparison request: load both files, diff, then pair and explain leftovers

use std::path::Path;

use serde::Serialize;

use crate::config::Config;
use crate::diff::{compare, DiffResult};
use crate::error::{Error, IngestionError, LoadFailure, Result, Side};
use crate::explain::{explain_pairs, ExplainedPair, Explainer};
use crate::loader::{LoadOptions, ProgressSink, TableLoader};
use crate::model::{Column, Row, Table};
use crate::similarity::SimilarityMatcher;

/// What the report says about each input table
#[derive(Debug, Clone, Serialize)]
pub struct TableSummary {
    pub name: String,
    pub row_count: usize,
    pub columns: Vec<Column>,
    /// First rows of the table, when a preview was requested
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub preview: Vec<Row>,
}

impl TableSummary {
    pub fn new(name: impl Into<String>, table: &Table, preview_rows: usize) -> Self {
        Self {
            name: name.into(),
            row_count: table.row_count(),
            columns: table.columns().to_vec(),
            preview: table.head(preview_rows).to_vec(),
        }
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }
}

/// Everything a comparison produced
#[derive(Debug, Clone, Serialize)]
pub struct ComparisonReport {
    pub left: TableSummary,
    pub right: TableSummary,
    pub diff: DiffResult,
    pub similar_pairs: Vec<ExplainedPair>,
}

impl ComparisonReport {
    pub fn identical(&self) -> bool {
        self.diff.identical
    }
}

fn display_name(path: &Path) -> String {
    path.display().to_string()
}

fn load_side(
    side: Side,
    path: &Path,
    options: LoadOptions,
    progress: &mut dyn ProgressSink,
) -> std::result::Result<Table, LoadFailure> {
    TableLoader::new(options)
        .load_path(path, progress)
        .map_err(|source: IngestionError| LoadFailure {
            side,
            name: display_name(path),
            source,
        })
}

/// Load both files concurrently.
///
/// Each load succeeds or fails on its own; all failures are reported.
pub fn load_tables(
    config: &Config,
    left_progress: &mut (dyn ProgressSink + Send),
    right_progress: &mut (dyn ProgressSink + Send),
) -> Result<(Table, Table)> {
    let (left, right) = rayon::join(
        || {
            load_side(
                Side::Left,
                &config.left.path,
                config.left_load_options(),
                left_progress,
            )
        },
        || {
            load_side(
                Side::Right,
                &config.right.path,
                config.right_load_options(),
                right_progress,
            )
        },
    );

    match (left, right) {
        (Ok(left), Ok(right)) => Ok((left, right)),
        (left, right) => {
            let failures: Vec<LoadFailure> =
                [left.err(), right.err()].into_iter().flatten().collect();
            for failure in &failures {
                log::error!("{}", failure);
            }
            Err(Error::Ingestion(failures))
        }
    }
}

/// Compare two loaded tables and pair up the rows unique to each side.
///
/// Similar pairs are explained only when an explainer is given.
pub fn compare_tables(
    config: &Config,
    left: &Table,
    right: &Table,
    explainer: Option<&dyn Explainer>,
) -> Result<ComparisonReport> {
    let diff = compare(left, right)?;

    let similar_pairs = if diff.identical {
        Vec::new()
    } else {
        let pairs = SimilarityMatcher::new(config.similarity)
            .match_rows(&diff.partition.only_left, &diff.partition.only_right);
        log::info!("{} similar row pairs", pairs.len());

        match explainer {
            Some(explainer) => explain_pairs(pairs, explainer, config.explain_concurrency),
            None => pairs.into_iter().map(ExplainedPair::from).collect(),
        }
    };

    Ok(ComparisonReport {
        left: TableSummary::new(display_name(&config.left.path), left, config.preview_rows),
        right: TableSummary::new(display_name(&config.right.path), right, config.preview_rows),
        diff,
        similar_pairs,
    })
}

/// Load, compare and pair in one call
pub fn run(
    config: &Config,
    explainer: Option<&dyn Explainer>,
    left_progress: &mut (dyn ProgressSink + Send),
    right_progress: &mut (dyn ProgressSink + Send),
) -> Result<ComparisonReport> {
    let (left, right) = load_tables(config, left_progress, right_progress)?;
    compare_tables(config, &left, &right, explainer)
}
