//! tabcompare - compare two delimited text tables

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

use tabcompare::config::{Blocking, Config, OutputFormat, Pairing, SimilarityConfig, SourceConfig};
use tabcompare::config::{DEFAULT_EXPLAIN_CONCURRENCY, DEFAULT_THRESHOLD};
use tabcompare::explain::{CellDiffExplainer, Explainer};
use tabcompare::loader::{Delimiter, Encoding, NoProgress, DEFAULT_CHUNK_SIZE};
use tabcompare::output::render_to_stdout;
use tabcompare::pipeline::{compare_tables, load_tables};

/// Progress bar resolution; load fractions are scaled to this many steps
const PROGRESS_STEPS: u64 = 1000;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliOutputFormat {
    Terminal,
    Json,
}

impl From<CliOutputFormat> for OutputFormat {
    fn from(f: CliOutputFormat) -> Self {
        match f {
            CliOutputFormat::Terminal => OutputFormat::Terminal,
            CliOutputFormat::Json => OutputFormat::Json,
        }
    }
}

/// Compare two CSV/TXT tables: exact check, row partitions, merge diff and similar rows
#[derive(Parser, Debug)]
#[command(name = "tabcompare")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Left/original file
    left: PathBuf,

    /// Right/new file
    right: PathBuf,

    /// Delimiter for both files: comma, pipe, semicolon or tab
    #[arg(short, long, default_value = ",")]
    delimiter: Delimiter,

    /// Delimiter for the left file (overrides --delimiter)
    #[arg(long)]
    left_delimiter: Option<Delimiter>,

    /// Delimiter for the right file (overrides --delimiter)
    #[arg(long)]
    right_delimiter: Option<Delimiter>,

    /// Encoding for both files: utf-8, latin-1 or cp1252
    #[arg(short, long, default_value = "utf-8")]
    encoding: Encoding,

    /// Encoding for the left file (overrides --encoding)
    #[arg(long)]
    left_encoding: Option<Encoding>,

    /// Encoding for the right file (overrides --encoding)
    #[arg(long)]
    right_encoding: Option<Encoding>,

    /// Similarity ratio a row pair must exceed to be reported
    #[arg(long, default_value_t = DEFAULT_THRESHOLD, value_parser = parse_threshold)]
    threshold: f64,

    /// Pair each unique row with at most one row on the other side
    #[arg(long)]
    exclusive_pairs: bool,

    /// Score every candidate pair, even those that cannot reach the threshold
    #[arg(long)]
    no_prefilter: bool,

    /// Only compare rows whose first value matches
    #[arg(long)]
    block_by_leading_token: bool,

    /// Rows parsed between progress updates
    #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
    chunk_size: usize,

    /// Output format
    #[arg(short, long, value_enum, default_value = "terminal")]
    format: CliOutputFormat,

    /// Only show statistics, not detailed rows
    #[arg(long)]
    stats_only: bool,

    /// Describe how each similar pair differs
    #[arg(long)]
    explain: bool,

    /// Maximum concurrent explanation calls
    #[arg(long, default_value_t = DEFAULT_EXPLAIN_CONCURRENCY)]
    explain_concurrency: usize,

    /// Show the first N rows of each table
    #[arg(long, default_value_t = 0)]
    preview: usize,

    /// Hide load progress bars
    #[arg(long)]
    no_progress: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn parse_threshold(s: &str) -> Result<f64, String> {
    let value: f64 = s.parse().map_err(|_| format!("'{}' is not a number", s))?;
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(format!("threshold must be between 0 and 1, got {}", value))
    }
}

impl Cli {
    fn config(&self) -> Config {
        let left = SourceConfig::new(&self.left)
            .with_delimiter(self.left_delimiter.unwrap_or(self.delimiter))
            .with_encoding(self.left_encoding.unwrap_or(self.encoding));
        let right = SourceConfig::new(&self.right)
            .with_delimiter(self.right_delimiter.unwrap_or(self.delimiter))
            .with_encoding(self.right_encoding.unwrap_or(self.encoding));

        let similarity = SimilarityConfig::default()
            .with_threshold(self.threshold)
            .with_pairing(if self.exclusive_pairs {
                Pairing::Exclusive
            } else {
                Pairing::AllPairs
            })
            .with_prefilter(!self.no_prefilter)
            .with_blocking(if self.block_by_leading_token {
                Blocking::LeadingToken
            } else {
                Blocking::None
            });

        Config::new(&self.left, &self.right)
            .with_left(left)
            .with_right(right)
            .with_chunk_size(self.chunk_size)
            .with_similarity(similarity)
            .with_explain(self.explain)
            .with_explain_concurrency(self.explain_concurrency)
            .with_output_format(self.format.into())
            .with_stats_only(self.stats_only)
            .with_preview_rows(self.preview)
    }
}

/// Create a load progress bar for one file
fn create_load_progress(multi: &MultiProgress, message: &str) -> ProgressBar {
    let pb = multi.add(ProgressBar::new(PROGRESS_STEPS));
    if let Ok(style) = ProgressStyle::with_template(
        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {percent:>3}% {msg}",
    ) {
        pb.set_style(style.progress_chars("#>-"));
    }
    pb.set_message(message.to_string());
    pb
}

fn progress_sink(pb: ProgressBar) -> impl FnMut(f64) + Send {
    move |fraction: f64| pb.set_position((fraction * PROGRESS_STEPS as f64).round() as u64)
}

fn main() -> ExitCode {
    match run() {
        Ok(identical) => {
            if identical {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(1)
            }
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(2)
        }
    }
}

fn run() -> Result<bool> {
    let cli = Cli::parse();

    env_logger::Builder::from_default_env()
        .filter_level(if cli.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        })
        .init();

    let config = cli.config();
    let show_progress = !cli.no_progress && config.output_format == OutputFormat::Terminal;

    let (left, right) = if show_progress {
        let multi = MultiProgress::new();
        let left_pb = create_load_progress(&multi, &cli.left.display().to_string());
        let right_pb = create_load_progress(&multi, &cli.right.display().to_string());
        let mut left_sink = progress_sink(left_pb.clone());
        let mut right_sink = progress_sink(right_pb.clone());

        let loaded = load_tables(&config, &mut left_sink, &mut right_sink);
        left_pb.finish_and_clear();
        right_pb.finish_and_clear();
        loaded?
    } else {
        let mut left_sink = NoProgress;
        let mut right_sink = NoProgress;
        load_tables(&config, &mut left_sink, &mut right_sink)?
    };

    let explainer = config.explain.then(|| {
        CellDiffExplainer::new(
            left.column_names().iter().map(|s| s.to_string()).collect(),
            right.column_names().iter().map(|s| s.to_string()).collect(),
        )
    });
    let explainer_ref = explainer.as_ref().map(|e| e as &dyn Explainer);

    let report = compare_tables(&config, &left, &right, explainer_ref)?;
    render_to_stdout(&report, config.output_format, config.stats_only)
        .context("Failed to write report")?;

    Ok(report.identical())
}
