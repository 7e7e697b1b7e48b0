//! Outer merge of two tables with provenance tags

use indexmap::IndexSet;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::Serialize;

use crate::error::IncompatibleSchemaError;
use crate::model::{CellValue, Row, Table};

use super::schema_diff::SchemaDiff;

/// Where a merged row came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    LeftOnly,
    RightOnly,
    Both,
}

impl std::fmt::Display for Provenance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Provenance::LeftOnly => write!(f, "left_only"),
            Provenance::RightOnly => write!(f, "right_only"),
            Provenance::Both => write!(f, "both"),
        }
    }
}

/// A row of the merged table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergeRow {
    pub provenance: Provenance,
    /// Values aligned to `MergeDiff::columns`
    pub cells: Vec<CellValue>,
    /// Line of the originating row in its source file
    pub source_line: usize,
}

/// Divergent rows of the outer merge; rows found on both sides are dropped
#[derive(Debug, Clone, Default, Serialize)]
pub struct MergeDiff {
    /// Left columns followed by right-only columns
    pub columns: Vec<String>,
    /// Columns the merge joined on
    pub join_columns: Vec<String>,
    pub rows: Vec<MergeRow>,
}

impl MergeDiff {
    /// Merge on the shared column names and keep only divergent rows
    pub fn compute(left: &Table, right: &Table) -> Result<Self, IncompatibleSchemaError> {
        let merged = OuterMerge::new(left, right)?;
        let rows = merged
            .tagged_rows()
            .into_iter()
            .filter(|row| row.provenance != Provenance::Both)
            .collect();

        Ok(Self {
            columns: merged.columns.iter().map(|c| c.to_string()).collect(),
            join_columns: merged.join_columns.iter().map(|c| c.to_string()).collect(),
            rows,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Rows with the given provenance
    pub fn rows_from(&self, provenance: Provenance) -> impl Iterator<Item = &MergeRow> {
        self.rows.iter().filter(move |r| r.provenance == provenance)
    }
}

/// Column layout of an outer merge between two tables
struct OuterMerge<'a> {
    left: &'a Table,
    right: &'a Table,
    columns: IndexSet<&'a str>,
    join_columns: Vec<&'a str>,
    left_keys: Vec<usize>,
    right_keys: Vec<usize>,
    /// Position of each right column in `columns`
    right_positions: Vec<usize>,
}

impl<'a> OuterMerge<'a> {
    fn new(left: &'a Table, right: &'a Table) -> Result<Self, IncompatibleSchemaError> {
        let join_columns = SchemaDiff::shared_columns(left, right);
        if join_columns.is_empty() {
            return Err(IncompatibleSchemaError {
                left_columns: left.column_names().iter().map(|c| c.to_string()).collect(),
                right_columns: right.column_names().iter().map(|c| c.to_string()).collect(),
            });
        }

        let columns: IndexSet<&str> = left
            .column_names()
            .into_iter()
            .chain(right.column_names())
            .collect();

        let left_keys = join_columns
            .iter()
            .filter_map(|name| left.column_index(name))
            .collect();
        let right_keys = join_columns
            .iter()
            .filter_map(|name| right.column_index(name))
            .collect();
        let right_positions = right
            .column_names()
            .iter()
            .filter_map(|name| columns.get_index_of(name))
            .collect();

        Ok(Self {
            left,
            right,
            columns,
            join_columns,
            left_keys,
            right_keys,
            right_positions,
        })
    }

    fn key<'r>(row: &'r Row, indices: &[usize]) -> Vec<&'r CellValue> {
        indices.iter().filter_map(|&i| row.get(i)).collect()
    }

    /// Every row of the outer union, tagged with its provenance.
    ///
    /// A left row matching right rows is emitted once, with the right-only
    /// columns taken from its first match.
    fn tagged_rows(&self) -> Vec<MergeRow> {
        let mut right_index: FxHashMap<Vec<&CellValue>, usize> = FxHashMap::default();
        for (idx, row) in self.right.rows().iter().enumerate() {
            right_index
                .entry(Self::key(row, &self.right_keys))
                .or_insert(idx);
        }
        let left_index: FxHashSet<Vec<&CellValue>> = self
            .left
            .rows()
            .iter()
            .map(|row| Self::key(row, &self.left_keys))
            .collect();

        let mut rows = Vec::with_capacity(self.left.row_count());
        for row in self.left.rows() {
            let mut cells = row.cells.clone();
            cells.resize(self.columns.len(), CellValue::Null);

            let provenance = match right_index.get(&Self::key(row, &self.left_keys)) {
                Some(&right_idx) => {
                    let matched = &self.right.rows()[right_idx];
                    for (value, &pos) in matched.cells.iter().zip(&self.right_positions) {
                        if pos >= self.left.column_count() {
                            cells[pos] = value.clone();
                        }
                    }
                    Provenance::Both
                }
                None => Provenance::LeftOnly,
            };

            rows.push(MergeRow {
                provenance,
                cells,
                source_line: row.source_line,
            });
        }

        for row in self.right.rows() {
            if left_index.contains(&Self::key(row, &self.right_keys)) {
                continue;
            }
            let mut cells = vec![CellValue::Null; self.columns.len()];
            for (value, &pos) in row.cells.iter().zip(&self.right_positions) {
                cells[pos] = value.clone();
            }
            rows.push(MergeRow {
                provenance: Provenance::RightOnly,
                cells,
                source_line: row.source_line,
            });
        }

        rows
    }
}
