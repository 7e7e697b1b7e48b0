//! Colored terminal output

use std::io::Write;

use anyhow::Result;
use termcolor::{Color, ColorSpec, WriteColor};

use crate::diff::{DiffResult, MergeDiff, SchemaChange};
use crate::explain::{ExplainedPair, Explanation};
use crate::model::{Column, Row};
use crate::pipeline::{ComparisonReport, TableSummary};

use super::OutputFormatter;

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";

/// Terminal output with colors
#[derive(Default)]
pub struct TerminalOutput {
    stats_only: bool,
}

impl TerminalOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only print counts, not the rows themselves
    pub fn with_stats_only(mut self, stats_only: bool) -> Self {
        self.stats_only = stats_only;
        self
    }

    fn heading(&self, writer: &mut dyn WriteColor, text: &str, color: Color) -> Result<()> {
        writer.set_color(ColorSpec::new().set_fg(Some(color)).set_bold(true))?;
        writeln!(writer, "{}", text)?;
        writer.reset()?;
        Ok(())
    }

    fn write_header(&self, writer: &mut dyn WriteColor, report: &ComparisonReport) -> Result<()> {
        writeln!(writer, "{}", RULE)?;
        writeln!(
            writer,
            " tabcompare: {} → {}",
            report.left.name, report.right.name
        )?;
        writeln!(writer, "{}", RULE)?;
        writeln!(writer)?;
        Ok(())
    }

    fn write_table_summary(
        &self,
        writer: &mut dyn WriteColor,
        label: &str,
        summary: &TableSummary,
    ) -> Result<()> {
        self.heading(writer, &format!("{} table: {}", label, summary.name), Color::Cyan)?;
        writeln!(writer, "  Rows: {}", summary.row_count)?;
        let columns: Vec<String> = summary
            .columns
            .iter()
            .map(|c| format!("{} ({})", c.name, c.inferred_type))
            .collect();
        writeln!(writer, "  Columns: {}", columns.join(", "))?;

        if !summary.preview.is_empty() {
            let rows: Vec<&Row> = summary.preview.iter().collect();
            write_rows_table(writer, &rows, &summary.columns)?;
        }
        writeln!(writer)?;
        Ok(())
    }

    fn write_summary(&self, writer: &mut dyn WriteColor, diff: &DiffResult) -> Result<()> {
        let stats = &diff.stats;
        writeln!(
            writer,
            "Row count delta: {:+} ({} → {})",
            stats.row_count_delta, stats.left_row_count, stats.right_row_count
        )?;
        writeln!(
            writer,
            "Column count delta: {:+} ({} → {})",
            stats.column_count_delta, stats.left_column_count, stats.right_column_count
        )?;
        writeln!(
            writer,
            "Rows: {} common, {} only in left, {} only in right",
            stats.common_rows, stats.only_left_rows, stats.only_right_rows
        )?;
        writeln!(writer)?;

        if !diff.partition.schema_aligned {
            self.heading(
                writer,
                "Warning: column sets differ, row partition compares rows of different shapes",
                Color::Yellow,
            )?;
            writeln!(writer)?;
        }
        Ok(())
    }

    fn write_schema_changes(
        &self,
        writer: &mut dyn WriteColor,
        changes: &[SchemaChange],
    ) -> Result<()> {
        if changes.is_empty() {
            return Ok(());
        }

        writeln!(writer, "Schema Changes:")?;
        for change in changes {
            writeln!(writer, "  {}", change)?;
        }
        writeln!(writer)?;
        Ok(())
    }

    fn write_rows_section(
        &self,
        writer: &mut dyn WriteColor,
        title: &str,
        color: Color,
        rows: &[Row],
        columns: &[Column],
    ) -> Result<()> {
        if rows.is_empty() {
            return Ok(());
        }

        self.heading(writer, &format!("{} ({}):", title, rows.len()), color)?;
        let rows: Vec<&Row> = rows.iter().collect();
        write_rows_table(writer, &rows, columns)?;
        writeln!(writer)?;
        Ok(())
    }

    fn write_merge_diff(&self, writer: &mut dyn WriteColor, merge: &MergeDiff) -> Result<()> {
        if merge.is_empty() {
            return Ok(());
        }

        self.heading(writer, &format!("Merge diff ({} rows):", merge.len()), Color::Magenta)?;
        let mut data: Vec<Vec<String>> = Vec::with_capacity(merge.len() + 1);
        let mut header = vec!["_merge".to_string()];
        header.extend(merge.columns.iter().cloned());
        data.push(header);

        for row in &merge.rows {
            let mut line = vec![row.provenance.to_string()];
            line.extend(row.cells.iter().map(|c| c.display().into_owned()));
            data.push(line);
        }

        writeln!(writer, "{}", build_table(&data))?;
        Ok(())
    }

    fn write_similar_pairs(&self, writer: &mut dyn WriteColor, pairs: &[ExplainedPair]) -> Result<()> {
        if pairs.is_empty() {
            return Ok(());
        }

        self.heading(writer, &format!("Similar rows ({}):", pairs.len()), Color::Yellow)?;
        for explained in pairs {
            let pair = &explained.pair;
            writeln!(
                writer,
                "  [{:.3}] line {} ↔ line {}",
                pair.ratio, pair.left.source_line, pair.right.source_line
            )?;
            writeln!(writer, "    - {}", pair.left.text())?;
            writeln!(writer, "    + {}", pair.right.text())?;
            match &explained.explanation {
                Some(Explanation::Available(text)) => writeln!(writer, "    {}", text)?,
                Some(Explanation::Unavailable(reason)) => {
                    writer.set_color(ColorSpec::new().set_fg(Some(Color::Red)))?;
                    writeln!(writer, "    explanation unavailable: {}", reason)?;
                    writer.reset()?;
                }
                None => {}
            }
        }
        writeln!(writer)?;
        Ok(())
    }
}

impl OutputFormatter for TerminalOutput {
    fn render(&self, report: &ComparisonReport, writer: &mut dyn WriteColor) -> Result<()> {
        self.write_header(writer, report)?;
        self.write_table_summary(writer, "Left", &report.left)?;
        self.write_table_summary(writer, "Right", &report.right)?;

        let diff = &report.diff;
        if diff.identical {
            self.heading(writer, "The files are identical.", Color::Green)?;
            return Ok(());
        }

        self.heading(writer, "The files differ.", Color::Yellow)?;
        writeln!(writer)?;
        self.write_schema_changes(writer, &diff.schema_changes)?;
        self.write_summary(writer, diff)?;

        if self.stats_only {
            writeln!(writer, "Merge diff rows: {}", diff.stats.merge_diff_rows)?;
            writeln!(writer, "Similar row pairs: {}", report.similar_pairs.len())?;
            return Ok(());
        }

        self.write_rows_section(
            writer,
            "Common",
            Color::Blue,
            &diff.partition.common,
            &report.left.columns,
        )?;
        self.write_rows_section(
            writer,
            "Only in left",
            Color::Red,
            &diff.partition.only_left,
            &report.left.columns,
        )?;
        self.write_rows_section(
            writer,
            "Only in right",
            Color::Green,
            &diff.partition.only_right,
            &report.right.columns,
        )?;
        self.write_merge_diff(writer, &diff.merge_diff)?;
        self.write_similar_pairs(writer, &report.similar_pairs)?;

        Ok(())
    }
}

fn write_rows_table(writer: &mut dyn WriteColor, rows: &[&Row], columns: &[Column]) -> Result<()> {
    if rows.is_empty() {
        return Ok(());
    }

    let mut table_data: Vec<Vec<String>> = Vec::with_capacity(rows.len() + 1);
    table_data.push(columns.iter().map(|c| c.name.clone()).collect());

    for row in rows {
        table_data.push(row.cells.iter().map(|c| c.display().into_owned()).collect());
    }

    writeln!(writer, "{}", build_table(&table_data))?;
    Ok(())
}

/// Build a formatted table from data
fn build_table(data: &[Vec<String>]) -> String {
    if data.is_empty() || data[0].is_empty() {
        return String::new();
    }

    let col_count = data[0].len();

    let mut col_widths: Vec<usize> = vec![0; col_count];
    for row in data {
        for (i, cell) in row.iter().enumerate() {
            if i < col_widths.len() {
                col_widths[i] = col_widths[i].max(cell.chars().count());
            }
        }
    }

    let border = |left: char, mid: char, right: char| {
        let mut line = String::new();
        line.push(left);
        for (i, width) in col_widths.iter().enumerate() {
            line.push_str(&"─".repeat(*width + 2));
            if i < col_widths.len() - 1 {
                line.push(mid);
            }
        }
        line.push(right);
        line.push('\n');
        line
    };
    let cells = |row: &[String]| {
        let mut line = String::from("│");
        for (i, cell) in row.iter().enumerate() {
            let width = col_widths.get(i).copied().unwrap_or(0);
            line.push_str(&format!(" {:width$} │", cell, width = width));
        }
        line.push('\n');
        line
    };

    let mut output = border('┌', '┬', '┐');
    output.push_str(&cells(&data[0]));
    output.push_str(&border('├', '┼', '┤'));
    for row in data.iter().skip(1) {
        output.push_str(&cells(row));
    }
    output.push_str(&border('└', '┴', '┘'));

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::model::{CellValue, Table};
    use crate::pipeline::compare_tables;
    use termcolor::NoColor;

    fn render(left: &Table, right: &Table, output: TerminalOutput) -> String {
        let report = compare_tables(&Config::new("left.csv", "right.csv"), left, right, None).unwrap();
        let mut out = NoColor::new(Vec::new());
        output.render(&report, &mut out).unwrap();
        String::from_utf8(out.into_inner()).unwrap()
    }

    fn table(rows: &[(i64, &str)]) -> Table {
        Table::from_records(
            &["id", "name"],
            rows.iter()
                .map(|(id, name)| vec![CellValue::Int(*id), CellValue::from(*name)]),
        )
    }

    #[test]
    fn test_identical_banner() {
        let t = table(&[(1, "a")]);
        let text = render(&t, &t.clone(), TerminalOutput::new());
        assert!(text.contains("tabcompare: left.csv → right.csv"));
        assert!(text.contains("The files are identical."));
    }

    #[test]
    fn test_differences_listed() {
        let left = table(&[(1, "a"), (123, "Jon Smith")]);
        let right = table(&[(1, "a"), (123, "John Smith")]);
        let text = render(&left, &right, TerminalOutput::new());

        assert!(text.contains("The files differ."));
        assert!(text.contains("Common (1):"));
        assert!(text.contains("Only in left (1):"));
        assert!(text.contains("Merge diff (2 rows):"));
        assert!(text.contains("left_only"));
        assert!(text.contains("Similar rows (1):"));
        assert!(text.contains("- 123|Jon Smith"));
    }

    #[test]
    fn test_stats_only_skips_rows() {
        let left = table(&[(1, "a"), (2, "b")]);
        let right = table(&[(1, "a")]);
        let text = render(&left, &right, TerminalOutput::new().with_stats_only(true));

        assert!(text.contains("Row count delta: -1 (2 → 1)"));
        assert!(!text.contains("Only in left"));
        assert!(!text.contains("Common ("));
    }

    #[test]
    fn test_build_table() {
        let data = vec![
            vec!["id".to_string(), "name".to_string()],
            vec!["1".to_string(), "é".to_string()],
        ];
        let table = build_table(&data);
        assert!(table.starts_with("┌────┬──────┐"));
        assert!(table.contains("│ 1  │ é    │"));
    }
}
