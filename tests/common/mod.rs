//! In-memory warehouse used by the pipeline tests

#![allow(dead_code)]

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use polars::prelude::DataFrame;
use redshift_transfer::db::sql::literal;
use redshift_transfer::db::{ColumnDef, TableRef, TextRow, Warehouse};
use redshift_transfer::{Result, TransferError};
use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct MemoryTable {
    pub columns: Vec<ColumnDef>,
    /// Cells in SQL literal form
    pub rows: Vec<Vec<String>>,
}

#[derive(Default)]
pub struct MemoryWarehouse {
    pub schemas: BTreeSet<String>,
    pub tables: HashMap<TableRef, MemoryTable>,
    /// Operations in the order they were issued
    pub log: Vec<String>,
    /// Columns reported by `query_columns`
    pub result_columns: Vec<String>,
    /// Rows returned by `query_rows`
    pub result_rows: Vec<TextRow>,
    /// Fail the query after yielding this many rows
    pub fail_query_after: Option<usize>,
    /// Fail the n-th (0-based) `insert_batch` call
    pub fail_insert_call: Option<usize>,
    insert_calls: usize,
}

impl MemoryWarehouse {
    pub fn new() -> Self {
        let mut warehouse = Self::default();
        warehouse.schemas.insert("public".to_string());
        warehouse
    }

    pub fn with_result(columns: &[&str], rows: Vec<Vec<Option<&str>>>) -> Self {
        let columns: Arc<[String]> = columns.iter().map(|c| c.to_string()).collect();
        let mut warehouse = Self::new();
        warehouse.result_columns = columns.to_vec();
        warehouse.result_rows = rows
            .into_iter()
            .map(|values| TextRow {
                columns: columns.clone(),
                values: values.into_iter().map(|v| v.map(String::from)).collect(),
            })
            .collect();
        warehouse
    }

    pub fn table(&self, schema: &str, name: &str) -> Option<&MemoryTable> {
        self.tables.get(&TableRef::new(schema, name))
    }

    pub fn row_total(&self, schema: &str, name: &str) -> usize {
        self.table(schema, name).map_or(0, |t| t.rows.len())
    }
}

#[async_trait]
impl Warehouse for MemoryWarehouse {
    async fn create_schema(&mut self, schema: &str) -> Result<()> {
        self.log.push(format!("create_schema {}", schema));
        self.schemas.insert(schema.to_string());
        Ok(())
    }

    async fn row_count(&mut self, table: &TableRef) -> Result<Option<u64>> {
        self.log.push(format!("row_count {}", table));
        Ok(self.tables.get(table).map(|t| t.rows.len() as u64))
    }

    async fn create_table(&mut self, table: &TableRef, columns: &[ColumnDef]) -> Result<()> {
        self.log.push(format!("create_table {}", table));
        if !self.schemas.contains(&table.schema) {
            return Err(TransferError::storage(table, "schema does not exist"));
        }
        self.tables.entry(table.clone()).or_insert_with(|| MemoryTable {
            columns: columns.to_vec(),
            rows: Vec::new(),
        });
        Ok(())
    }

    async fn drop_table(&mut self, table: &TableRef) -> Result<()> {
        self.log.push(format!("drop_table {}", table));
        self.tables.remove(table);
        Ok(())
    }

    async fn insert_batch(&mut self, table: &TableRef, batch: &DataFrame) -> Result<u64> {
        self.log.push(format!("insert {} {}", table, batch.height()));
        let call = self.insert_calls;
        self.insert_calls += 1;
        if self.fail_insert_call == Some(call) {
            return Err(TransferError::storage(table, "injected insert failure"));
        }

        let target = self
            .tables
            .get_mut(table)
            .ok_or_else(|| TransferError::storage(table, "relation does not exist"))?;
        if target.columns.len() != batch.width() {
            return Err(TransferError::storage(table, "column count mismatch"));
        }

        for row in 0..batch.height() {
            let mut cells = Vec::with_capacity(batch.width());
            for series in batch.get_columns() {
                cells.push(literal(&series.get(row)?));
            }
            target.rows.push(cells);
        }
        Ok(batch.height() as u64)
    }

    async fn copy_rows(&mut self, source: &TableRef, target: &TableRef) -> Result<u64> {
        self.log.push(format!("copy {} -> {}", source, target));
        let rows = self
            .tables
            .get(source)
            .ok_or_else(|| TransferError::storage(source, "relation does not exist"))?
            .rows
            .clone();
        let destination = self
            .tables
            .get_mut(target)
            .ok_or_else(|| TransferError::storage(target, "relation does not exist"))?;
        let copied = rows.len() as u64;
        destination.rows.extend(rows);
        Ok(copied)
    }

    async fn query_columns(&mut self, query: &str) -> Result<Vec<String>> {
        self.log.push(format!("describe {}", query));
        Ok(self.result_columns.clone())
    }

    fn query_rows<'a>(&'a mut self, query: &'a str) -> BoxStream<'a, Result<TextRow>> {
        self.log.push(format!("query {}", query));
        let fail_after = self.fail_query_after;
        let rows = self.result_rows.clone();
        let mut items: Vec<Result<TextRow>> = match fail_after {
            Some(n) => rows.into_iter().take(n).map(Ok).collect(),
            None => rows.into_iter().map(Ok).collect(),
        };
        if fail_after.is_some() {
            items.push(Err(TransferError::Query("connection reset".to_string())));
        }
        stream::iter(items).boxed()
    }
}

/// Write a CSV with an `id,name,score` header and `rows` data lines.
pub fn write_csv(path: &Path, first_id: usize, rows: usize) {
    let mut contents = String::from("id,name,score\n");
    for id in first_id..first_id + rows {
        contents.push_str(&format!("{},name_{},{}.5\n", id, id, id));
    }
    std::fs::write(path, contents).unwrap();
}

/// The `id` column of a table, in stored order
pub fn ids(table: &MemoryTable) -> Vec<String> {
    table.rows.iter().map(|r| r[0].clone()).collect()
}
