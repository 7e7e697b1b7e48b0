//! JSON output format

use std::io::Write;

use anyhow::Result;
use termcolor::WriteColor;

use crate::pipeline::ComparisonReport;

use super::OutputFormatter;

/// JSON output formatter
pub struct JsonOutput {
    pretty: bool,
}

impl JsonOutput {
    pub fn new() -> Self {
        Self { pretty: true }
    }

    pub fn compact() -> Self {
        Self { pretty: false }
    }
}

impl Default for JsonOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputFormatter for JsonOutput {
    fn render(&self, report: &ComparisonReport, writer: &mut dyn WriteColor) -> Result<()> {
        if self.pretty {
            serde_json::to_writer_pretty(&mut *writer, report)?;
        } else {
            serde_json::to_writer(&mut *writer, report)?;
        }
        writeln!(writer)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::model::{CellValue, Table};
    use crate::pipeline::compare_tables;
    use termcolor::NoColor;

    #[test]
    fn test_json_report_shape() {
        let left = Table::from_records(
            &["id", "name"],
            vec![
                vec![CellValue::Int(1), CellValue::from("a")],
                vec![CellValue::Int(123), CellValue::from("Jon Smith")],
            ],
        );
        let right = Table::from_records(
            &["id", "name"],
            vec![
                vec![CellValue::Int(1), CellValue::from("a")],
                vec![CellValue::Int(123), CellValue::from("John Smith")],
            ],
        );
        let report = compare_tables(&Config::default(), &left, &right, None).unwrap();

        let mut out = NoColor::new(Vec::new());
        JsonOutput::compact().render(&report, &mut out).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out.into_inner()).unwrap();

        assert_eq!(value["diff"]["identical"], false);
        assert_eq!(value["diff"]["stats"]["row_count_delta"], 0);
        assert_eq!(value["diff"]["merge_diff"]["rows"][0]["provenance"], "left_only");
        assert_eq!(value["diff"]["merge_diff"]["rows"][1]["provenance"], "right_only");
        assert_eq!(value["similar_pairs"][0]["left"]["cells"][1], "Jon Smith");
        assert!(value["similar_pairs"][0].get("explanation").is_none());
    }
}
