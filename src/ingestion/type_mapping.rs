//! Type mapping - column type tags to warehouse SQL types
//!
//! The mapping is deliberately coarse: every integer width lands in `INT` and
//! every float in `FLOAT`. Callers that need exact types create the table
//! themselves before importing.

use crate::db::ColumnDef;
use polars::prelude::{DataFrame, DataType};

/// In-memory type of a column, as seen in the first batch of a file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnTypeTag {
    Text,
    Int64,
    Float64,
    Boolean,
    Datetime,
    Duration,
    Other,
}

impl ColumnTypeTag {
    /// Parse a dtype name (`object`, `int64`, `datetime64[ns]`, `str`, ...).
    pub fn from_dtype_name(name: &str) -> Self {
        let name = name.trim().to_ascii_lowercase();
        match name.as_str() {
            "object" | "category" | "str" | "string" | "utf8" | "categorical" => Self::Text,
            "int64" | "i64" => Self::Int64,
            "float64" | "f64" => Self::Float64,
            "bool" | "boolean" => Self::Boolean,
            n if n.starts_with("datetime") => Self::Datetime,
            n if n.starts_with("timedelta") || n.starts_with("duration") => Self::Duration,
            _ => Self::Other,
        }
    }

    pub fn sql_type(self) -> &'static str {
        match self {
            Self::Text => "VARCHAR(255)",
            Self::Int64 => "INT",
            Self::Float64 => "FLOAT",
            Self::Boolean => "BOOLEAN",
            Self::Datetime => "DATETIME",
            Self::Duration => "INTERVAL",
            Self::Other => "VARCHAR(255)",
        }
    }
}

impl From<&DataType> for ColumnTypeTag {
    fn from(dtype: &DataType) -> Self {
        match dtype {
            DataType::String => Self::Text,
            DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64 => Self::Int64,
            DataType::Float32 | DataType::Float64 => Self::Float64,
            DataType::Boolean => Self::Boolean,
            DataType::Datetime(_, _) | DataType::Date => Self::Datetime,
            DataType::Duration(_) => Self::Duration,
            _ => Self::Other,
        }
    }
}

/// Map a dtype name straight to its SQL type literal.
pub fn map_type(dtype_name: &str) -> &'static str {
    ColumnTypeTag::from_dtype_name(dtype_name).sql_type()
}

/// Column definitions for auto-creating a table from a batch.
pub fn column_defs(batch: &DataFrame) -> Vec<ColumnDef> {
    batch
        .get_columns()
        .iter()
        .map(|series| ColumnDef {
            name: series.name().to_string(),
            sql_type: ColumnTypeTag::from(series.dtype()).sql_type(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    #[test]
    fn test_map_type_names() {
        assert_eq!(map_type("object"), "VARCHAR(255)");
        assert_eq!(map_type("int64"), "INT");
        assert_eq!(map_type("float64"), "FLOAT");
        assert_eq!(map_type("bool"), "BOOLEAN");
        assert_eq!(map_type("datetime64"), "DATETIME");
        assert_eq!(map_type("datetime64[ns]"), "DATETIME");
        assert_eq!(map_type("timedelta[ns]"), "INTERVAL");
        assert_eq!(map_type("category"), "VARCHAR(255)");
        assert_eq!(map_type("unknown_tag"), "VARCHAR(255)");
    }

    #[test]
    fn test_narrow_ints_are_not_int64_by_name() {
        // only the 64-bit name is recognised; everything else falls back to text
        assert_eq!(ColumnTypeTag::from_dtype_name("int32"), ColumnTypeTag::Other);
    }

    #[test]
    fn test_from_polars_dtype() {
        assert_eq!(ColumnTypeTag::from(&DataType::Int64), ColumnTypeTag::Int64);
        assert_eq!(ColumnTypeTag::from(&DataType::Float64), ColumnTypeTag::Float64);
        assert_eq!(ColumnTypeTag::from(&DataType::String), ColumnTypeTag::Text);
        assert_eq!(ColumnTypeTag::from(&DataType::Boolean), ColumnTypeTag::Boolean);
        assert_eq!(
            ColumnTypeTag::from(&DataType::Datetime(TimeUnit::Microseconds, None)),
            ColumnTypeTag::Datetime
        );
        assert_eq!(
            ColumnTypeTag::from(&DataType::Duration(TimeUnit::Milliseconds)),
            ColumnTypeTag::Duration
        );
        assert_eq!(ColumnTypeTag::from(&DataType::Null), ColumnTypeTag::Other);
    }

    #[test]
    fn test_column_defs() {
        let batch = df![
            "id" => [1i64, 2],
            "price" => [1.5f64, 2.0],
            "name" => ["a", "b"],
            "active" => [true, false]
        ]
        .unwrap();
        let defs = column_defs(&batch);
        let types: Vec<_> = defs.iter().map(|d| (d.name.as_str(), d.sql_type)).collect();
        assert_eq!(
            types,
            vec![
                ("id", "INT"),
                ("price", "FLOAT"),
                ("name", "VARCHAR(255)"),
                ("active", "BOOLEAN"),
            ]
        );
    }
}
