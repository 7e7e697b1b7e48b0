//! Local, column-by-column explanation of a row pair

use serde::Serialize;

use crate::error::AdapterError;
use crate::model::{CellValue, Row};

use super::Explainer;

/// A change to a single cell
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CellChange {
    /// Column name
    pub column: String,
    /// Left value
    pub old_value: CellValue,
    /// Right value
    pub new_value: CellValue,
}

impl std::fmt::Display for CellChange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: '{}' → '{}'",
            self.column,
            self.old_value.display(),
            self.new_value.display()
        )?;
        if let Some(pct) = percentage_change(&self.old_value, &self.new_value) {
            write!(f, " ({:+.1}%)", pct)?;
        }
        Ok(())
    }
}

/// Calculate percentage change for numeric values
pub fn percentage_change(old: &CellValue, new: &CellValue) -> Option<f64> {
    let old_num = old.as_f64()?;
    let new_num = new.as_f64()?;

    if old_num == 0.0 {
        if new_num == 0.0 {
            Some(0.0)
        } else {
            None // Infinite change
        }
    } else {
        Some((new_num - old_num) / old_num * 100.0)
    }
}

/// Explains a pair by listing the columns whose values differ.
///
/// Needs no external service; columns are matched by name, so it also
/// copes with the two tables ordering their columns differently.
#[derive(Debug, Clone)]
pub struct CellDiffExplainer {
    left_columns: Vec<String>,
    right_columns: Vec<String>,
}

impl CellDiffExplainer {
    pub fn new(left_columns: Vec<String>, right_columns: Vec<String>) -> Self {
        Self {
            left_columns,
            right_columns,
        }
    }

    /// Cell changes between the two rows, in left column order
    pub fn changes(&self, left: &Row, right: &Row) -> Vec<CellChange> {
        let mut changes = Vec::new();

        for (left_idx, name) in self.left_columns.iter().enumerate() {
            if let Some(right_idx) = self.right_columns.iter().position(|n| n == name) {
                let old_value = left.get(left_idx).cloned().unwrap_or(CellValue::Null);
                let new_value = right.get(right_idx).cloned().unwrap_or(CellValue::Null);

                if old_value != new_value {
                    changes.push(CellChange {
                        column: name.clone(),
                        old_value,
                        new_value,
                    });
                }
            }
        }

        changes
    }
}

impl Explainer for CellDiffExplainer {
    fn explain(&self, left: &Row, right: &Row) -> Result<String, AdapterError> {
        let changes = self.changes(left, right);
        if changes.is_empty() {
            return Err(AdapterError::Failed(
                "no shared column differs between the rows".to_string(),
            ));
        }

        Ok(changes
            .iter()
            .map(|c| c.to_string())
            .collect::<Vec<_>>()
            .join("; "))
    }
}
