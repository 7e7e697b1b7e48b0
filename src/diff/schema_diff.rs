//! Schema comparison logic

use serde::Serialize;

use crate::model::Table;

/// Column-level differences between two tables, by name
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SchemaChange {
    /// Column only present in the right table
    ColumnAdded { name: String, index: usize },
    /// Column only present in the left table
    ColumnRemoved { name: String, index: usize },
}

impl std::fmt::Display for SchemaChange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchemaChange::ColumnAdded { name, index } => {
                write!(f, "+ {} (only in right, position {})", name, index)
            }
            SchemaChange::ColumnRemoved { name, index } => {
                write!(f, "- {} (only in left, position {})", name, index)
            }
        }
    }
}

/// Schema comparison engine
pub struct SchemaDiff;

impl SchemaDiff {
    /// Compare schemas of two tables
    pub fn compare(left: &Table, right: &Table) -> Vec<SchemaChange> {
        let mut changes = Vec::new();

        let left_names = left.column_names();
        let right_names = right.column_names();

        for (idx, name) in left_names.iter().enumerate() {
            if !right_names.contains(name) {
                changes.push(SchemaChange::ColumnRemoved {
                    name: name.to_string(),
                    index: idx,
                });
            }
        }

        for (idx, name) in right_names.iter().enumerate() {
            if !left_names.contains(name) {
                changes.push(SchemaChange::ColumnAdded {
                    name: name.to_string(),
                    index: idx,
                });
            }
        }

        changes
    }

    /// Names present in both tables, in left column order
    pub fn shared_columns<'a>(left: &'a Table, right: &Table) -> Vec<&'a str> {
        left.columns()
            .iter()
            .map(|c| c.name.as_str())
            .filter(|name| right.column_index(name).is_some())
            .collect()
    }
}
