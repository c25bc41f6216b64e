//! Ingestion Module
//!
//! CSV files into warehouse tables:
//! - Bounded batch reading
//! - Type mapping for table auto-creation
//! - Conflict policies and schema staging

pub mod csv_batches;
pub mod type_mapping;
pub mod upload;

pub use csv_batches::{CsvBatchReader, DEFAULT_BATCH_SIZE};
pub use type_mapping::{column_defs, map_type, ColumnTypeTag};
pub use upload::{
    upload_file, upload_files, BatchPhase, ConflictPolicy, TransferTarget, UploadOptions,
    UploadSummary,
};
