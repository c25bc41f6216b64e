//! SQL text generation
//!
//! Identifiers are always double-quoted and literals single-quoted, so table,
//! column and value text coming from CSV headers or flags cannot break out of
//! the statement.

use crate::db::{ColumnDef, TableRef};
use crate::error::Result;
use polars::prelude::*;
use std::ops::Range;

pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

pub fn qualified(table: &TableRef) -> String {
    format!("{}.{}", quote_ident(&table.schema), quote_ident(&table.name))
}

pub fn create_schema(schema: &str) -> String {
    format!("CREATE SCHEMA IF NOT EXISTS {}", quote_ident(schema))
}

pub fn create_table(table: &TableRef, columns: &[ColumnDef]) -> String {
    let columns = columns
        .iter()
        .map(|c| format!(" {} {}", quote_ident(&c.name), c.sql_type))
        .collect::<Vec<_>>()
        .join(",\n");
    format!("CREATE TABLE IF NOT EXISTS {} (\n{}\n)", qualified(table), columns)
}

pub fn drop_table(table: &TableRef) -> String {
    format!("DROP TABLE IF EXISTS {}", qualified(table))
}

pub fn count_rows(table: &TableRef) -> String {
    format!("SELECT COUNT(*) FROM {}", qualified(table))
}

pub fn copy_rows(source: &TableRef, target: &TableRef) -> String {
    format!(
        "INSERT INTO {} (SELECT * FROM {})",
        qualified(target),
        qualified(source)
    )
}

/// Render one cell as a SQL literal.
pub fn literal(value: &AnyValue) -> String {
    match value {
        AnyValue::Null => "NULL".to_string(),
        AnyValue::Boolean(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
        AnyValue::String(s) => quote_literal(s),
        AnyValue::StringOwned(s) => quote_literal(s.as_str()),
        AnyValue::Int8(v) => v.to_string(),
        AnyValue::Int16(v) => v.to_string(),
        AnyValue::Int32(v) => v.to_string(),
        AnyValue::Int64(v) => v.to_string(),
        AnyValue::UInt8(v) => v.to_string(),
        AnyValue::UInt16(v) => v.to_string(),
        AnyValue::UInt32(v) => v.to_string(),
        AnyValue::UInt64(v) => v.to_string(),
        AnyValue::Float32(v) if v.is_finite() => v.to_string(),
        AnyValue::Float64(v) if v.is_finite() => v.to_string(),
        AnyValue::Float32(_) | AnyValue::Float64(_) => "NULL".to_string(),
        // dates, datetimes, durations and anything else go through their display form
        other => quote_literal(&other.to_string()),
    }
}

/// Row ranges of a `height`-row batch, at most `per_statement` rows each.
pub fn statement_ranges(height: usize, per_statement: usize) -> impl Iterator<Item = Range<usize>> {
    let step = per_statement.max(1);
    (0..height)
        .step_by(step)
        .map(move |start| start..(start + step).min(height))
}

/// Multi-row `INSERT ... VALUES` for the given row range of `batch`.
pub fn insert_values(table: &TableRef, batch: &DataFrame, rows: Range<usize>) -> Result<String> {
    let column_list = batch
        .get_column_names()
        .iter()
        .map(|name| quote_ident(name))
        .collect::<Vec<_>>()
        .join(", ");

    let columns = batch.get_columns();
    let mut tuples = Vec::with_capacity(rows.len());
    for row in rows {
        let mut cells = Vec::with_capacity(columns.len());
        for series in columns {
            cells.push(literal(&series.get(row)?));
        }
        tuples.push(format!("({})", cells.join(", ")));
    }

    Ok(format!(
        "INSERT INTO {} ({}) VALUES\n{}",
        qualified(table),
        column_list,
        tuples.join(",\n")
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statement_ranges() {
        let ranges: Vec<Range<usize>> = statement_ranges(2500, 1000).collect();
        assert_eq!(ranges, vec![0..1000, 1000..2000, 2000..2500]);

        // exact multiple has no trailing empty statement
        let ranges: Vec<Range<usize>> = statement_ranges(2000, 1000).collect();
        assert_eq!(ranges, vec![0..1000, 1000..2000]);

        assert_eq!(statement_ranges(0, 1000).count(), 0);
        assert_eq!(statement_ranges(3, 1).collect::<Vec<_>>(), vec![0..1, 1..2, 2..3]);
        assert_eq!(statement_ranges(3, 0).count(), 3);
        assert_eq!(statement_ranges(5, 1000).collect::<Vec<_>>(), vec![0..5]);
    }

    #[test]
    fn test_quoting() {
        assert_eq!(quote_ident("order"), "\"order\"");
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
        assert_eq!(quote_literal("O'Brien"), "'O''Brien'");
    }

    #[test]
    fn test_create_table() {
        let table = TableRef::new("public", "sales");
        let columns = vec![
            ColumnDef { name: "id".to_string(), sql_type: "INT" },
            ColumnDef { name: "region".to_string(), sql_type: "VARCHAR(255)" },
        ];
        assert_eq!(
            create_table(&table, &columns),
            "CREATE TABLE IF NOT EXISTS \"public\".\"sales\" (\n \"id\" INT,\n \"region\" VARCHAR(255)\n)"
        );
    }

    #[test]
    fn test_ddl_statements() {
        let staging = TableRef::new("public", "sales");
        let target = TableRef::new("analytics", "sales");
        assert_eq!(create_schema("analytics"), "CREATE SCHEMA IF NOT EXISTS \"analytics\"");
        assert_eq!(drop_table(&staging), "DROP TABLE IF EXISTS \"public\".\"sales\"");
        assert_eq!(count_rows(&staging), "SELECT COUNT(*) FROM \"public\".\"sales\"");
        assert_eq!(
            copy_rows(&staging, &target),
            "INSERT INTO \"analytics\".\"sales\" (SELECT * FROM \"public\".\"sales\")"
        );
    }

    #[test]
    fn test_literals() {
        assert_eq!(literal(&AnyValue::Null), "NULL");
        assert_eq!(literal(&AnyValue::Boolean(true)), "TRUE");
        assert_eq!(literal(&AnyValue::Int64(-42)), "-42");
        assert_eq!(literal(&AnyValue::Float64(2.5)), "2.5");
        assert_eq!(literal(&AnyValue::Float64(f64::NAN)), "NULL");
        assert_eq!(literal(&AnyValue::String("it's")), "'it''s'");
    }

    #[test]
    fn test_insert_values() {
        let batch = df![
            "id" => [1i64, 2],
            "name" => [Some("a"), None]
        ]
        .unwrap();
        let table = TableRef::new("public", "t");
        let sql = insert_values(&table, &batch, 0..2).unwrap();
        assert_eq!(
            sql,
            "INSERT INTO \"public\".\"t\" (\"id\", \"name\") VALUES\n(1, 'a'),\n(2, NULL)"
        );

        let tail = insert_values(&table, &batch, 1..2).unwrap();
        assert!(tail.ends_with("VALUES\n(2, NULL)"));
    }
}
