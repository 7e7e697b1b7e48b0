//! Table loader: validates a delimited text stream and parses it into a table

mod decode;
mod format;
mod progress;

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;
use std::time::Instant;

use csv::StringRecord;
use indexmap::IndexSet;

use crate::error::IngestionError;
use crate::model::{CellValue, Column, Table};

use self::decode::{DecodingReader, UndefinedByte};

pub use self::format::{Delimiter, Encoding, FileKind};
pub use self::progress::{NoProgress, ProgressSink};

use self::progress::ProgressTracker;

/// Bytes inspected by the delimiter check
pub const SAMPLE_SIZE: u64 = 1024;

/// Rows read by the trial parse
pub const TRIAL_ROWS: usize = 10;

/// Default number of rows between progress reports
pub const DEFAULT_CHUNK_SIZE: usize = 1000;

/// Values read as missing, as common CSV readers do
const NULL_MARKERS: &[&str] = &[
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// How a stream should be read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadOptions {
    pub delimiter: Delimiter,
    pub encoding: Encoding,
    /// Rows per chunk; progress is reported after each chunk
    pub chunk_size: usize,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            delimiter: Delimiter::default(),
            encoding: Encoding::default(),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl LoadOptions {
    pub fn new(delimiter: Delimiter, encoding: Encoding) -> Self {
        Self {
            delimiter,
            encoding,
            ..Default::default()
        }
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }
}

/// Loads CSV/TXT streams into tables
#[derive(Debug, Clone, Default)]
pub struct TableLoader {
    options: LoadOptions,
}

impl TableLoader {
    pub fn new(options: LoadOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &LoadOptions {
        &self.options
    }

    /// Load a file from disk
    pub fn load_path(
        &self,
        path: &Path,
        progress: &mut dyn ProgressSink,
    ) -> Result<Table, IngestionError> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        FileKind::from_name(&name)?;

        let file = File::open(path)?;
        self.load(&name, BufReader::new(file), progress)
    }

    /// Load a named byte stream.
    ///
    /// The name is only used for its extension. The stream is validated
    /// by sampling and a trial parse before the chunked full parse, and is
    /// rewound to the start before each pass.
    pub fn load<R: Read + Seek>(
        &self,
        name: &str,
        mut reader: R,
        progress: &mut dyn ProgressSink,
    ) -> Result<Table, IngestionError> {
        let started = Instant::now();
        FileKind::from_name(name)?;

        let total_bytes = reader.seek(SeekFrom::End(0))?;
        if total_bytes == 0 {
            return Err(IngestionError::Empty);
        }

        reader.seek(SeekFrom::Start(0))?;
        self.check_sample(&mut reader)?;

        reader.seek(SeekFrom::Start(0))?;
        self.trial_parse(&mut reader)?;

        reader.seek(SeekFrom::Start(0))?;
        let table = self.parse_chunked(&mut reader, total_bytes, progress)?;

        log::info!(
            "Loaded {}: {} rows x {} columns in {:?}",
            name,
            table.row_count(),
            table.column_count(),
            started.elapsed()
        );
        Ok(table)
    }

    /// Reject the stream early when the delimiter is absent from its prefix
    fn check_sample<R: Read>(&self, reader: R) -> Result<(), IngestionError> {
        let mut sample = Vec::with_capacity(SAMPLE_SIZE as usize);
        reader.take(SAMPLE_SIZE).read_to_end(&mut sample)?;

        let text = self.options.encoding.decode_sample(&sample)?;
        if !text.contains(self.options.delimiter.as_char()) {
            return Err(IngestionError::DelimiterNotFound {
                delimiter: self.options.delimiter,
                encoding: self.options.encoding,
                sample_len: sample.len(),
            });
        }
        Ok(())
    }

    fn trial_parse<R: Read>(&self, reader: R) -> Result<(), IngestionError> {
        let mut csv_reader = self.open_csv(reader);
        let columns = self.read_columns(&mut csv_reader)?;
        if columns.is_empty() {
            return Err(IngestionError::NoColumns);
        }

        let mut record = StringRecord::new();
        let mut rows = 0;
        while rows < TRIAL_ROWS && self.read_record(&mut csv_reader, &mut record)? {
            rows += 1;
        }
        if rows == 0 {
            return Err(IngestionError::NoRows);
        }

        log::debug!("Trial parse: {} columns, {} rows", columns.len(), rows);
        Ok(())
    }

    fn parse_chunked<R: Read>(
        &self,
        reader: R,
        total_bytes: u64,
        progress: &mut dyn ProgressSink,
    ) -> Result<Table, IngestionError> {
        let mut csv_reader = self.open_csv(reader);
        let columns = self.read_columns(&mut csv_reader)?;
        let width = columns.len();
        let mut table = Table::new(columns);

        let mut tracker = ProgressTracker::new(progress, total_bytes);
        let mut record = StringRecord::new();
        let mut in_chunk = 0;
        let mut chunks = 0;

        while self.read_record(&mut csv_reader, &mut record)? {
            let line = record.position().map(|p| p.line()).unwrap_or(0);
            if record.len() > width {
                return Err(IngestionError::TooManyFields {
                    line,
                    expected: width,
                    found: record.len(),
                });
            }

            let mut cells: Vec<CellValue> = record.iter().map(parse_cell_value).collect();
            // Pad with nulls if row has fewer columns
            cells.resize(width, CellValue::Null);
            table.push_row(cells, line as usize);

            in_chunk += 1;
            if in_chunk == self.options.chunk_size {
                in_chunk = 0;
                chunks += 1;
                let consumed = csv_reader.get_ref().bytes_read();
                log::debug!("Chunk {}: {} of {} bytes read", chunks, consumed, total_bytes);
                tracker.update(consumed);
            }
        }

        table.infer_column_types();
        tracker.finish();
        Ok(table)
    }

    fn open_csv<R: Read>(&self, reader: R) -> csv::Reader<DecodingReader<R>> {
        csv::ReaderBuilder::new()
            .delimiter(self.options.delimiter.as_byte())
            .has_headers(true)
            .flexible(true)
            .from_reader(DecodingReader::new(reader, self.options.encoding))
    }

    fn read_columns<R: Read>(
        &self,
        csv_reader: &mut csv::Reader<DecodingReader<R>>,
    ) -> Result<Vec<Column>, IngestionError> {
        let headers = csv_reader
            .headers()
            .map_err(|e| self.map_csv_error(e))?
            .clone();
        if headers.is_empty() {
            return Ok(Vec::new());
        }

        Ok(column_names(&headers)
            .into_iter()
            .enumerate()
            .map(|(i, name)| Column::new(name, i))
            .collect())
    }

    fn read_record<R: Read>(
        &self,
        csv_reader: &mut csv::Reader<DecodingReader<R>>,
        record: &mut StringRecord,
    ) -> Result<bool, IngestionError> {
        csv_reader
            .read_record(record)
            .map_err(|e| self.map_csv_error(e))
    }

    fn map_csv_error(&self, err: csv::Error) -> IngestionError {
        let encoding = self.options.encoding;
        if let csv::ErrorKind::Utf8 { pos, err: utf8 } = err.kind() {
            return IngestionError::Decode {
                encoding,
                offset: pos.as_ref().map(|p| p.byte()).unwrap_or(0) + utf8.valid_up_to() as u64,
            };
        }
        if let csv::ErrorKind::Io(io) = err.kind() {
            if let Some(undefined) = io.get_ref().and_then(|e| e.downcast_ref::<UndefinedByte>()) {
                return IngestionError::Decode {
                    encoding,
                    offset: undefined.offset,
                };
            }
        }
        if err.is_io_error() {
            return IngestionError::Io(err.into());
        }
        IngestionError::Malformed(err)
    }
}

/// Name columns from the header row.
///
/// A leading byte-order mark is dropped, blank names become `Unnamed: {i}`
/// and repeated names get a `.1`, `.2`, ... suffix.
fn column_names(headers: &StringRecord) -> Vec<String> {
    let mut names: IndexSet<String> = IndexSet::with_capacity(headers.len());
    for (i, raw) in headers.iter().enumerate() {
        let raw = if i == 0 { raw.trim_start_matches('\u{feff}') } else { raw };
        let base = if raw.is_empty() {
            format!("Unnamed: {}", i)
        } else {
            raw.to_string()
        };

        let mut name = base.clone();
        let mut suffix = 1;
        while names.contains(&name) {
            name = format!("{}.{}", base, suffix);
            suffix += 1;
        }
        names.insert(name);
    }
    names.into_iter().collect()
}

/// Parse a field into a CellValue
fn parse_cell_value(s: &str) -> CellValue {
    let trimmed = s.trim();

    // Check for empty/null
    if trimmed.is_empty() || NULL_MARKERS.contains(&trimmed) {
        return CellValue::Null;
    }

    match trimmed {
        "True" | "true" | "TRUE" => return CellValue::Bool(true),
        "False" | "false" | "FALSE" => return CellValue::Bool(false),
        _ => {}
    }

    if let Ok(i) = trimmed.parse::<i64>() {
        return CellValue::Int(i);
    }

    if let Ok(f) = trimmed.parse::<f64>() {
        return CellValue::Float(f);
    }

    CellValue::String(s.to_string())
}
