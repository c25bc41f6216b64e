pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod export;
pub mod ingestion;
pub mod paths;

pub use config::{ConnectionDescriptor, ConnectionParams};
pub use db::{RedshiftWarehouse, TableRef, Warehouse};
pub use error::{Result, TransferError};
pub use export::{store_query_results, ExportOptions, ExportSummary};
pub use ingestion::{upload_file, upload_files, ConflictPolicy, TransferTarget, UploadOptions};
