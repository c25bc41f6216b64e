use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransferError {
    /// Missing or contradictory connection parameters
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The warehouse could not be reached or refused the session
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Query error: {0}")]
    Query(String),

    /// DDL/DML failure while provisioning or writing a table
    #[error("Storage error on {table}: {message}")]
    Storage { table: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Polars error: {0}")]
    Polars(String),

    #[error("Invalid file name pattern: {0}")]
    Pattern(#[from] regex::Error),
}

impl TransferError {
    pub fn storage(table: impl ToString, message: impl ToString) -> Self {
        TransferError::Storage {
            table: table.to_string(),
            message: message.to_string(),
        }
    }
}

impl From<polars::error::PolarsError> for TransferError {
    fn from(err: polars::error::PolarsError) -> Self {
        TransferError::Polars(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, TransferError>;
