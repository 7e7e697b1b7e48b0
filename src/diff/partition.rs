//! Set-based row decomposition

use rustc_hash::FxHashSet;
use serde::Serialize;

use crate::model::{CellValue, Row, Table};

/// Rows split by whether their full tuple occurs in the other table.
///
/// Membership ignores multiplicity: a tuple repeated three times on the
/// left and once on the right puts all three left copies in `common`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RowPartition {
    /// Left rows whose tuple also occurs on the right
    pub common: Vec<Row>,
    /// Left rows whose tuple is absent on the right
    pub only_left: Vec<Row>,
    /// Right rows whose tuple is absent on the left
    pub only_right: Vec<Row>,
    /// False when the column sequences differ; tuples of differently shaped
    /// tables rarely line up, so the split says little in that case
    pub schema_aligned: bool,
}

impl RowPartition {
    pub fn compute(left: &Table, right: &Table) -> Self {
        let left_set: FxHashSet<&[CellValue]> = left.rows().iter().map(Row::values).collect();
        let right_set: FxHashSet<&[CellValue]> = right.rows().iter().map(Row::values).collect();

        let (common, only_left): (Vec<&Row>, Vec<&Row>) = left
            .rows()
            .iter()
            .partition(|row| right_set.contains(row.values()));

        let only_right = right
            .rows()
            .iter()
            .filter(|row| !left_set.contains(row.values()))
            .cloned()
            .collect();

        let schema_aligned = left.same_columns(right);
        if !schema_aligned {
            log::warn!("Column sets differ; row partition compares tuples of different shapes");
        }

        Self {
            common: common.into_iter().cloned().collect(),
            only_left: only_left.into_iter().cloned().collect(),
            only_right,
            schema_aligned,
        }
    }

    /// True when no row is unmatched on either side
    pub fn is_balanced(&self) -> bool {
        self.only_left.is_empty() && self.only_right.is_empty()
    }
}
