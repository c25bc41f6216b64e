//! Upload - CSV files into warehouse tables
//!
//! Each file is read in batches. The caller's conflict policy is applied once,
//! when the first batch provisions the destination; every later batch of the
//! same file is appended. When a non-default schema is requested the rows are
//! staged in a same-named table in the default schema, copied across, and the
//! staging table is dropped.

use crate::config::DEFAULT_SCHEMA;
use crate::db::{ColumnDef, TableRef, Warehouse};
use crate::error::{Result, TransferError};
use crate::ingestion::csv_batches::{CsvBatchReader, DEFAULT_BATCH_SIZE};
use crate::ingestion::type_mapping::column_defs;
use clap::ValueEnum;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// What to do when the destination table already exists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ConflictPolicy {
    /// Refuse to write into a table that already holds rows
    Fail,
    /// Drop and recreate the table
    Replace,
    /// Insert alongside existing rows
    #[default]
    Append,
}

/// Destination of an import
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferTarget {
    pub table: String,
    /// Non-default schema, if one was requested
    pub schema: Option<String>,
    pub policy: ConflictPolicy,
}

impl TransferTarget {
    /// An empty schema or the default schema both mean "no schema".
    pub fn new(table: impl Into<String>, schema: Option<&str>, policy: ConflictPolicy) -> Self {
        let schema = schema
            .map(str::trim)
            .filter(|s| !s.is_empty() && *s != DEFAULT_SCHEMA)
            .map(String::from);
        Self {
            table: table.into(),
            schema,
            policy,
        }
    }

    /// Table the batches are written into
    pub fn write_table(&self) -> TableRef {
        TableRef::in_default_schema(&self.table)
    }

    /// Table that holds the rows once the import finishes
    pub fn final_table(&self) -> TableRef {
        match &self.schema {
            Some(schema) => TableRef::new(schema, &self.table),
            None => self.write_table(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadOptions {
    pub batch_size: usize,
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

/// Where a file's import stands with respect to the conflict policy.
///
/// `Initial` carries the caller's policy and applies to batch 0 only; after
/// the first batch is written the phase is `Established` and every further
/// batch appends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchPhase {
    Initial(ConflictPolicy),
    Established,
}

impl BatchPhase {
    pub fn effective_policy(self) -> ConflictPolicy {
        match self {
            BatchPhase::Initial(policy) => policy,
            BatchPhase::Established => ConflictPolicy::Append,
        }
    }

    pub fn advance(self) -> Self {
        BatchPhase::Established
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadSummary {
    pub source: PathBuf,
    pub table: TableRef,
    pub batches: usize,
    pub rows: u64,
}

/// Create `table` according to `policy`.
async fn provision_table<W: Warehouse + ?Sized>(
    warehouse: &mut W,
    table: &TableRef,
    columns: &[ColumnDef],
    policy: ConflictPolicy,
) -> Result<()> {
    match policy {
        ConflictPolicy::Fail => {
            if let Some(rows) = warehouse.row_count(table).await? {
                if rows > 0 {
                    return Err(TransferError::storage(
                        table,
                        format!("table already exists with {} rows", rows),
                    ));
                }
            }
            warehouse.create_table(table, columns).await
        }
        ConflictPolicy::Replace => {
            debug!("Replacing {}", table);
            warehouse.drop_table(table).await?;
            warehouse.create_table(table, columns).await
        }
        ConflictPolicy::Append => warehouse.create_table(table, columns).await,
    }
}

/// Import one CSV file into `target`.
pub async fn upload_file<W: Warehouse + ?Sized>(
    warehouse: &mut W,
    source: &Path,
    target: &TransferTarget,
    options: &UploadOptions,
) -> Result<UploadSummary> {
    let mut reader = CsvBatchReader::open(source, options.batch_size)?;
    let write_table = target.write_table();
    let final_table = target.final_table();

    if let Some(schema) = &target.schema {
        warehouse.create_schema(schema).await?;
    }

    let mut phase = BatchPhase::Initial(target.policy);
    let mut batches = 0;
    let mut rows = 0;
    let mut columns = Vec::new();

    while let Some(batch) = reader.next_batch()? {
        if let BatchPhase::Initial(policy) = phase {
            columns = column_defs(&batch);
            // final table first, so a refused import leaves no staging table
            if target.schema.is_some() {
                provision_table(&mut *warehouse, &final_table, &columns, policy).await?;
            }
            provision_table(&mut *warehouse, &write_table, &columns, policy).await?;
        }

        let written = warehouse.insert_batch(&write_table, &batch).await?;
        debug!(
            "Batch {} of {}: {} rows into {} ({:?})",
            batches,
            source.display(),
            written,
            write_table,
            phase.effective_policy()
        );
        rows += written;
        batches += 1;
        phase = phase.advance();
    }

    if target.schema.is_some() && phase == BatchPhase::Established {
        info!("Copying table into {}", final_table);
        warehouse.copy_rows(&write_table, &final_table).await?;
        warehouse.drop_table(&write_table).await?;
    }

    info!(
        "{} uploaded to {} ({} rows, {} columns, {} batches)",
        source.display(),
        final_table,
        rows,
        columns.len(),
        batches
    );

    Ok(UploadSummary {
        source: source.to_path_buf(),
        table: final_table,
        batches,
        rows,
    })
}

/// Import several files one after another. Each file is an independent
/// import, so the conflict policy is re-applied to every file's first batch.
/// The first failing file aborts the rest.
pub async fn upload_files<W: Warehouse + ?Sized>(
    warehouse: &mut W,
    sources: &[PathBuf],
    target: &TransferTarget,
    options: &UploadOptions,
) -> Result<Vec<UploadSummary>> {
    let mut summaries = Vec::with_capacity(sources.len());
    for (index, source) in sources.iter().enumerate() {
        debug!("File {}/{}: {}", index + 1, sources.len(), source.display());
        summaries.push(upload_file(&mut *warehouse, source, target, options).await?);
    }
    Ok(summaries)
}
