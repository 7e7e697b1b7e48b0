//! Diff engine for comparing tables

mod merge;
mod partition;
mod schema_diff;

use std::time::Instant;

use serde::Serialize;

use crate::error::IncompatibleSchemaError;
use crate::model::Table;

pub use merge::{MergeDiff, MergeRow, Provenance};
pub use partition::RowPartition;
pub use schema_diff::{SchemaChange, SchemaDiff};

/// Descriptive counts reported with every comparison
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct DiffStats {
    pub left_row_count: usize,
    pub right_row_count: usize,
    pub left_column_count: usize,
    pub right_column_count: usize,
    /// `right_row_count - left_row_count`
    pub row_count_delta: i64,
    /// `right_column_count - left_column_count`
    pub column_count_delta: i64,
    pub common_rows: usize,
    pub only_left_rows: usize,
    pub only_right_rows: usize,
    pub merge_diff_rows: usize,
}

impl DiffStats {
    fn new(left: &Table, right: &Table) -> Self {
        Self {
            left_row_count: left.row_count(),
            right_row_count: right.row_count(),
            left_column_count: left.column_count(),
            right_column_count: right.column_count(),
            row_count_delta: right.row_count() as i64 - left.row_count() as i64,
            column_count_delta: right.column_count() as i64 - left.column_count() as i64,
            ..Default::default()
        }
    }
}

/// Result of comparing two tables
#[derive(Debug, Clone, Serialize)]
pub struct DiffResult {
    /// Same columns and same rows in the same order
    pub identical: bool,
    pub stats: DiffStats,
    /// Schema changes between tables
    pub schema_changes: Vec<SchemaChange>,
    pub partition: RowPartition,
    pub merge_diff: MergeDiff,
}

impl DiffResult {
    fn identical(stats: DiffStats) -> Self {
        Self {
            identical: true,
            stats,
            schema_changes: Vec::new(),
            partition: RowPartition {
                schema_aligned: true,
                ..Default::default()
            },
            merge_diff: MergeDiff::default(),
        }
    }

    /// Check if there are any changes
    pub fn has_changes(&self) -> bool {
        !self.identical
    }
}

/// Order-, value- and type-sensitive equality of columns and rows.
///
/// Unlike the partition, `1` and `1.0` are not the same cell here.
pub fn tables_identical(left: &Table, right: &Table) -> bool {
    left.same_columns(right)
        && left.row_count() == right.row_count()
        && left
            .rows()
            .iter()
            .zip(right.rows())
            .all(|(a, b)| {
                a.values().len() == b.values().len()
                    && a.values().iter().zip(b.values()).all(|(x, y)| x.strict_eq(y))
            })
}

/// Compare two tables.
///
/// Identical tables short-circuit. Otherwise rows are partitioned by tuple
/// membership and an outer merge on the shared columns yields the rows
/// unique to either side. Tables without a shared column cannot be merged.
pub fn compare(left: &Table, right: &Table) -> Result<DiffResult, IncompatibleSchemaError> {
    let started = Instant::now();
    let mut stats = DiffStats::new(left, right);

    if tables_identical(left, right) {
        log::info!("Tables are identical ({} rows)", left.row_count());
        return Ok(DiffResult::identical(stats));
    }

    let schema_changes = SchemaDiff::compare(left, right);
    let merge_diff = MergeDiff::compute(left, right)?;
    let partition = RowPartition::compute(left, right);

    stats.common_rows = partition.common.len();
    stats.only_left_rows = partition.only_left.len();
    stats.only_right_rows = partition.only_right.len();
    stats.merge_diff_rows = merge_diff.len();

    log::info!(
        "Tables differ: {} common, {} only left, {} only right, {} merge diff rows ({:?})",
        stats.common_rows,
        stats.only_left_rows,
        stats.only_right_rows,
        stats.merge_diff_rows,
        started.elapsed()
    );

    Ok(DiffResult {
        identical: false,
        stats,
        schema_changes,
        partition,
        merge_diff,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CellValue;

    fn table(rows: &[(i64, &str)]) -> Table {
        Table::from_records(
            &["id", "name"],
            rows.iter()
                .map(|(id, name)| vec![CellValue::Int(*id), CellValue::from(*name)]),
        )
    }

    #[test]
    fn test_identical_tables() {
        let a = table(&[(1, "a"), (2, "b")]);
        let b = table(&[(1, "a"), (2, "b")]);

        let result = compare(&a, &b).unwrap();
        assert!(result.identical);
        assert!(!result.has_changes());
        assert!(result.partition.only_left.is_empty());
        assert!(result.partition.only_right.is_empty());
        assert!(result.merge_diff.is_empty());
        assert_eq!(result.stats.row_count_delta, 0);
    }

    #[test]
    fn test_row_order_matters_for_identity() {
        let a = table(&[(1, "a"), (2, "b")]);
        let b = table(&[(2, "b"), (1, "a")]);

        let result = compare(&a, &b).unwrap();
        assert!(!result.identical);
        assert_eq!(result.stats.common_rows, 2);
        assert!(result.partition.is_balanced());
        assert!(result.merge_diff.is_empty());
    }

    #[test]
    fn test_int_and_float_cells_are_not_identical() {
        let a = Table::from_records(&["id", "v"], vec![vec![CellValue::Int(1), CellValue::Int(1)]]);
        let b = Table::from_records(
            &["id", "v"],
            vec![vec![CellValue::Int(1), CellValue::Float(1.0)]],
        );

        let result = compare(&a, &b).unwrap();
        assert!(!result.identical);
        assert_eq!(result.stats.common_rows, 1);
        assert!(result.partition.is_balanced());
        assert!(result.merge_diff.is_empty());
    }

    #[test]
    fn test_removed_row() {
        let a = table(&[(1, "a"), (2, "b"), (3, "c")]);
        let b = table(&[(1, "a"), (2, "b")]);

        let result = compare(&a, &b).unwrap();
        assert!(!result.identical);
        assert_eq!(result.stats.row_count_delta, -1);
        assert_eq!(result.stats.column_count_delta, 0);
        assert_eq!(result.partition.common.len(), 2);
        assert_eq!(result.partition.only_left.len(), 1);
        assert_eq!(
            result.partition.only_left[0].cells,
            vec![CellValue::Int(3), CellValue::from("c")]
        );
        assert!(result.partition.only_right.is_empty());
        assert_eq!(result.merge_diff.len(), 1);
        assert_eq!(result.merge_diff.rows[0].provenance, Provenance::LeftOnly);
    }

    #[test]
    fn test_column_delta_and_schema_changes() {
        let a = table(&[(1, "a")]);
        let b = Table::from_records(
            &["id", "name", "extra"],
            vec![vec![CellValue::Int(1), CellValue::from("a"), CellValue::Int(9)]],
        );

        let result = compare(&a, &b).unwrap();
        assert_eq!(result.stats.column_count_delta, 1);
        assert_eq!(result.schema_changes.len(), 1);
        assert!(!result.partition.schema_aligned);
        // joined on id and name, so the row is shared
        assert!(result.merge_diff.is_empty());
    }

    #[test]
    fn test_incompatible_schema() {
        let a = Table::from_records(&["a"], vec![vec![CellValue::Int(1)]]);
        let b = Table::from_records(&["b"], vec![vec![CellValue::Int(1)]]);
        assert!(compare(&a, &b).is_err());
    }
}
