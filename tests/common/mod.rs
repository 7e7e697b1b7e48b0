//! Shared helpers for integration tests

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// Temporary directory holding the files under comparison
pub struct Fixture {
    pub temp_dir: TempDir,
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().unwrap(),
        }
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Write rows joined by `delimiter`, one line each
    pub fn create_delimited(&self, name: &str, delimiter: &str, rows: &[&[&str]]) -> PathBuf {
        let mut content = String::new();
        for row in rows {
            content.push_str(&row.join(delimiter));
            content.push('\n');
        }
        self.create_bytes(name, content.as_bytes())
    }

    pub fn create_csv(&self, name: &str, rows: &[&[&str]]) -> PathBuf {
        self.create_delimited(name, ",", rows)
    }

    pub fn create_bytes(&self, name: &str, bytes: &[u8]) -> PathBuf {
        let path = self.root().join(name);
        fs::write(&path, bytes).unwrap();
        path
    }
}

pub const PEOPLE: &[&[&str]] = &[
    &["id", "name", "city"],
    &["1", "Ann Lee", "Oslo"],
    &["2", "Bob Stone", "Rome"],
    &["123", "Jon Smith", "Paris"],
];

pub const PEOPLE_EDITED: &[&[&str]] = &[
    &["id", "name", "city"],
    &["1", "Ann Lee", "Oslo"],
    &["2", "Bob Stone", "Rome"],
    &["123", "John Smith", "Paris"],
];
