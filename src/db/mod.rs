//! Warehouse access
//!
//! The pipelines talk to the warehouse only through the `Warehouse` trait so
//! that table provisioning and batch writes stay independent of the driver.

pub mod connection;
pub mod sql;

pub use connection::RedshiftWarehouse;

use crate::config::DEFAULT_SCHEMA;
use crate::error::Result;
use async_trait::async_trait;
use futures::stream::BoxStream;
use polars::prelude::DataFrame;
use std::fmt;
use std::sync::Arc;

/// Schema-qualified table name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableRef {
    pub schema: String,
    pub name: String,
}

impl TableRef {
    pub fn new(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
        }
    }

    /// Table in the warehouse default schema
    pub fn in_default_schema(name: impl Into<String>) -> Self {
        Self::new(DEFAULT_SCHEMA, name)
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.schema, self.name)
    }
}

/// Column definition used when auto-creating a table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: String,
    pub sql_type: &'static str,
}

/// One result row rendered as text. `None` is SQL NULL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextRow {
    /// Column names, shared by every row of one result set
    pub columns: Arc<[String]>,
    pub values: Vec<Option<String>>,
}

/// Operations the transfer pipelines need from a warehouse session
#[async_trait]
pub trait Warehouse: Send {
    /// `CREATE SCHEMA IF NOT EXISTS`
    async fn create_schema(&mut self, schema: &str) -> Result<()>;

    /// Number of rows in `table`, or `None` when the table does not exist
    async fn row_count(&mut self, table: &TableRef) -> Result<Option<u64>>;

    /// `CREATE TABLE IF NOT EXISTS` with the given columns
    async fn create_table(&mut self, table: &TableRef, columns: &[ColumnDef]) -> Result<()>;

    /// `DROP TABLE IF EXISTS`
    async fn drop_table(&mut self, table: &TableRef) -> Result<()>;

    /// Append every row of `batch`; returns the number of rows written
    async fn insert_batch(&mut self, table: &TableRef, batch: &DataFrame) -> Result<u64>;

    /// `INSERT INTO target SELECT * FROM source`; returns rows copied
    async fn copy_rows(&mut self, source: &TableRef, target: &TableRef) -> Result<u64>;

    /// Column names `query` would return, without running it
    async fn query_columns(&mut self, query: &str) -> Result<Vec<String>>;

    /// Stream the rows of `query` in cursor order
    fn query_rows<'a>(&'a mut self, query: &'a str) -> BoxStream<'a, Result<TextRow>>;
}
