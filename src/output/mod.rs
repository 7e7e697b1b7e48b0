//! Output formatting for comparison reports

mod json;
mod terminal;

use anyhow::Result;
use termcolor::{ColorChoice, StandardStream, WriteColor};

use crate::config::OutputFormat;
use crate::pipeline::ComparisonReport;

pub use json::JsonOutput;
pub use terminal::TerminalOutput;

/// Trait for output formatters
pub trait OutputFormatter {
    /// Render a report to a writer
    fn render(&self, report: &ComparisonReport, writer: &mut dyn WriteColor) -> Result<()>;
}

/// Factory for creating output formatters
pub struct OutputFactory;

impl OutputFactory {
    /// Create an output formatter based on format type
    pub fn create(format: OutputFormat, stats_only: bool) -> Box<dyn OutputFormatter> {
        match format {
            OutputFormat::Terminal => Box::new(TerminalOutput::new().with_stats_only(stats_only)),
            OutputFormat::Json => Box::new(JsonOutput::new()),
        }
    }
}

/// Render a report to stdout
pub fn render_to_stdout(
    report: &ComparisonReport,
    format: OutputFormat,
    stats_only: bool,
) -> Result<()> {
    let formatter = OutputFactory::create(format, stats_only);
    let mut stdout = StandardStream::stdout(ColorChoice::Auto);
    formatter.render(report, &mut stdout)
}
