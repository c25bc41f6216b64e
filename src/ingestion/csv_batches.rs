//! CSV batch reader - bounded slices of a CSV file as DataFrames
//!
//! Records are pulled from the file with the `csv` crate, `batch_size` at a
//! time, and each slice is parsed by polars so column dtypes are inferred per
//! batch. Only one batch is held in memory at once.

use crate::error::{Result, TransferError};
use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use polars::prelude::{CsvReadOptions, DataFrame, DataType, SerReader, Series};
use std::fs::File;
use std::io::Cursor;
use std::path::Path;

/// Default number of rows per batch
pub const DEFAULT_BATCH_SIZE: usize = 10_000;

pub struct CsvBatchReader {
    reader: csv::Reader<File>,
    headers: StringRecord,
    batch_size: usize,
    batches_read: usize,
    finished: bool,
}

impl CsvBatchReader {
    /// Open `path`; the first record is always treated as the header.
    pub fn open(path: &Path, batch_size: usize) -> Result<Self> {
        let mut reader = ReaderBuilder::new().has_headers(true).from_path(path)?;
        let headers = reader.headers()?.clone();
        if headers.is_empty() {
            return Err(TransferError::Csv(csv::Error::from(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("{} has no header row", path.display()),
            ))));
        }

        Ok(Self {
            reader,
            headers,
            batch_size: batch_size.max(1),
            batches_read: 0,
            finished: false,
        })
    }

    pub fn headers(&self) -> Vec<String> {
        self.headers.iter().map(|h| h.to_string()).collect()
    }

    /// Next batch of at most `batch_size` rows. A header-only file yields a
    /// single empty batch so callers can still provision the table.
    pub fn next_batch(&mut self) -> Result<Option<DataFrame>> {
        if self.finished {
            return Ok(None);
        }

        let mut records = Vec::with_capacity(self.batch_size.min(DEFAULT_BATCH_SIZE));
        let mut record = StringRecord::new();
        while records.len() < self.batch_size {
            if !self.reader.read_record(&mut record)? {
                self.finished = true;
                break;
            }
            records.push(record.clone());
        }

        if records.is_empty() {
            if self.batches_read > 0 {
                return Ok(None);
            }
            self.batches_read += 1;
            return Ok(Some(self.empty_batch()?));
        }

        self.batches_read += 1;
        Ok(Some(self.parse(&records)?))
    }

    fn empty_batch(&self) -> Result<DataFrame> {
        let columns = self
            .headers
            .iter()
            .map(|name| Series::new_empty(name, &DataType::String))
            .collect::<Vec<_>>();
        Ok(DataFrame::new(columns)?)
    }

    fn parse(&self, records: &[StringRecord]) -> Result<DataFrame> {
        let mut writer = WriterBuilder::new().from_writer(Vec::new());
        writer.write_record(&self.headers)?;
        for record in records {
            writer.write_record(record)?;
        }
        let buffer = writer
            .into_inner()
            .map_err(|e| TransferError::Io(e.into_error()))?;

        let batch = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(None)
            .map_parse_options(|opts| opts.with_try_parse_dates(true))
            .into_reader_with_file_handle(Cursor::new(buffer))
            .finish()?;
        Ok(batch)
    }
}

impl Iterator for CsvBatchReader {
    type Item = Result<DataFrame>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_batch().transpose()
    }
}
