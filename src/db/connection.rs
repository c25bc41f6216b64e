//! Warehouse session over sqlx
//!
//! A single connection per run. Rows for export are read through the simple
//! query protocol, which returns every column in its text form.

use crate::config::ConnectionDescriptor;
use crate::db::{sql, ColumnDef, TableRef, TextRow, Warehouse};
use crate::error::{Result, TransferError};
use async_trait::async_trait;
use futures::stream::{BoxStream, StreamExt};
use polars::prelude::DataFrame;
use sqlx::postgres::{PgConnection, PgRow};
use sqlx::{Column, Connection, Executor, Row, Statement};
use std::sync::Arc;
use tracing::{debug, info};

/// SQLSTATE for "relation does not exist"
const UNDEFINED_TABLE: &str = "42P01";

/// Default number of rows packed into one `INSERT` statement
pub const DEFAULT_ROWS_PER_STATEMENT: usize = 1000;

pub struct RedshiftWarehouse {
    conn: PgConnection,
    rows_per_statement: usize,
}

impl RedshiftWarehouse {
    /// Open a session and check it with `SELECT 1`
    pub async fn connect(descriptor: &ConnectionDescriptor) -> Result<Self> {
        info!("Connecting to {}", descriptor);
        let options = descriptor.connect_options()?;
        let mut conn = PgConnection::connect_with(&options)
            .await
            .map_err(|e| TransferError::Connection(e.to_string()))?;

        sqlx::query("SELECT 1")
            .execute(&mut conn)
            .await
            .map_err(|e| TransferError::Connection(e.to_string()))?;

        Ok(Self {
            conn,
            rows_per_statement: DEFAULT_ROWS_PER_STATEMENT,
        })
    }

    pub fn with_rows_per_statement(mut self, rows: usize) -> Self {
        self.rows_per_statement = rows.max(1);
        self
    }

    pub async fn close(self) -> Result<()> {
        self.conn
            .close()
            .await
            .map_err(|e| TransferError::Connection(e.to_string()))
    }

    async fn execute(&mut self, statement: &str, table: &(dyn std::fmt::Display + Sync)) -> Result<u64> {
        debug!("Executing: {}", statement.lines().next().unwrap_or_default());
        let done = (&mut self.conn)
            .execute(sqlx::raw_sql(statement))
            .await
            .map_err(|e| TransferError::storage(table, e))?;
        Ok(done.rows_affected())
    }
}

fn text_row(row: &PgRow, columns: &mut Option<Arc<[String]>>) -> Result<TextRow> {
    let columns = columns
        .get_or_insert_with(|| row.columns().iter().map(|c| c.name().to_string()).collect())
        .clone();

    // Simple-protocol values are text, so every type decodes as a string.
    let values = (0..row.len())
        .map(|i| row.try_get_unchecked::<Option<String>, _>(i))
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| TransferError::Query(e.to_string()))?;

    Ok(TextRow { columns, values })
}

#[async_trait]
impl Warehouse for RedshiftWarehouse {
    async fn create_schema(&mut self, schema: &str) -> Result<()> {
        self.execute(&sql::create_schema(schema), &schema).await?;
        Ok(())
    }

    async fn row_count(&mut self, table: &TableRef) -> Result<Option<u64>> {
        let counted: std::result::Result<(i64,), sqlx::Error> =
            sqlx::query_as(&sql::count_rows(table))
                .fetch_one(&mut self.conn)
                .await;

        match counted {
            Ok((count,)) => Ok(Some(count.max(0) as u64)),
            Err(sqlx::Error::Database(db)) if db.code().as_deref() == Some(UNDEFINED_TABLE) => {
                Ok(None)
            }
            Err(e) => Err(TransferError::storage(table, e)),
        }
    }

    async fn create_table(&mut self, table: &TableRef, columns: &[ColumnDef]) -> Result<()> {
        self.execute(&sql::create_table(table, columns), table).await?;
        Ok(())
    }

    async fn drop_table(&mut self, table: &TableRef) -> Result<()> {
        self.execute(&sql::drop_table(table), table).await?;
        Ok(())
    }

    async fn insert_batch(&mut self, table: &TableRef, batch: &DataFrame) -> Result<u64> {
        let mut written = 0;
        for rows in sql::statement_ranges(batch.height(), self.rows_per_statement) {
            let statement = sql::insert_values(table, batch, rows)?;
            written += self.execute(&statement, table).await?;
        }
        Ok(written)
    }

    async fn copy_rows(&mut self, source: &TableRef, target: &TableRef) -> Result<u64> {
        self.execute(&sql::copy_rows(source, target), target).await
    }

    async fn query_columns(&mut self, query: &str) -> Result<Vec<String>> {
        let statement = (&mut self.conn)
            .prepare(query)
            .await
            .map_err(|e| TransferError::Query(e.to_string()))?;
        Ok(statement
            .columns()
            .iter()
            .map(|c| c.name().to_string())
            .collect())
    }

    fn query_rows<'a>(&'a mut self, query: &'a str) -> BoxStream<'a, Result<TextRow>> {
        let mut columns = None;
        sqlx::raw_sql(query)
            .fetch(&mut self.conn)
            .map(move |row| {
                let row = row.map_err(|e| TransferError::Query(e.to_string()))?;
                text_row(&row, &mut columns)
            })
            .boxed()
    }
}
