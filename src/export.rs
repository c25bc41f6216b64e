//! Export - query results into a CSV file
//!
//! Rows are streamed from the warehouse and written in batches. The file is
//! created on the first batch, so a query that fails before returning any row
//! leaves no file behind. A failure mid-stream leaves the rows written so far.
//! A query with no rows still produces a file, holding only the header when
//! one is requested.

use crate::db::{TextRow, Warehouse};
use crate::error::Result;
use crate::ingestion::DEFAULT_BATCH_SIZE;
use csv::{Writer, WriterBuilder};
use futures::stream::{TryChunksError, TryStreamExt};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportOptions {
    pub batch_size: usize,
    pub write_header: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            write_header: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    pub destination: PathBuf,
    pub batches: usize,
    pub rows: u64,
}

fn create_destination(destination: &Path) -> Result<Writer<File>> {
    if let Some(parent) = destination.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(WriterBuilder::new()
        .has_headers(false)
        .from_path(destination)?)
}

fn write_batch(writer: &mut Writer<File>, batch: &[TextRow], header: bool) -> Result<()> {
    if header {
        if let Some(first) = batch.first() {
            writer.write_record(first.columns.iter())?;
        }
    }
    for row in batch {
        writer.write_record(row.values.iter().map(|v| v.as_deref().unwrap_or("")))?;
    }
    writer.flush()?;
    Ok(())
}

/// Run `query` and store every row in `destination`, overwriting it.
pub async fn store_query_results<W: Warehouse + ?Sized>(
    warehouse: &mut W,
    query: &str,
    destination: &Path,
    options: &ExportOptions,
) -> Result<ExportSummary> {
    let mut batches = warehouse
        .query_rows(query)
        .try_chunks(options.batch_size.max(1));

    let mut writer: Option<Writer<File>> = None;
    let mut batch_count = 0;
    let mut rows = 0u64;

    while let Some(batch) = batches
        .try_next()
        .await
        .map_err(|TryChunksError(_, e)| e)?
    {
        let first = writer.is_none();
        if first {
            writer = Some(create_destination(destination)?);
        }
        if let Some(sink) = writer.as_mut() {
            write_batch(sink, &batch, first && options.write_header)?;
        }

        rows += batch.len() as u64;
        batch_count += 1;
        debug!("Batch {}: {} rows written to {}", batch_count, batch.len(), destination.display());
    }

    drop(batches);

    if writer.is_none() {
        let mut sink = create_destination(destination)?;
        if options.write_header {
            let columns = warehouse.query_columns(query).await?;
            sink.write_record(&columns)?;
        }
        sink.flush()?;
        warn!("Query returned no rows; {} has no data lines", destination.display());
    }

    info!("Stored {} rows in {} batches as {}", rows, batch_count, destination.display());

    Ok(ExportSummary {
        destination: destination.to_path_buf(),
        batches: batch_count,
        rows,
    })
}
