//! Row decoding into `SqlValue` cells.
//!
//! Cells are decoded by the type the database reports for the value. SQLite
//! reports the storage class, so JSON and BOOLEAN columns come back as text
//! and integers; the decode pass of `crossql-core` turns them back.

use crossql_core::SqlValue;
use sqlx::postgres::PgRow;
use sqlx::sqlite::SqliteRow;
use sqlx::types::Decimal;
use sqlx::{Column, Row, TypeInfo, ValueRef};

pub(crate) fn column_names<R: Row>(row: &R) -> Vec<String> {
    row.columns().iter().map(|c| c.name().to_string()).collect()
}

pub(crate) fn sqlite_cells(row: &SqliteRow) -> Result<Vec<SqlValue>, sqlx::Error> {
    (0..row.len()).map(|index| sqlite_cell(row, index)).collect()
}

fn sqlite_cell(row: &SqliteRow, index: usize) -> Result<SqlValue, sqlx::Error> {
    let raw = row.try_get_raw(index)?;
    if raw.is_null() {
        return Ok(SqlValue::Null);
    }
    let value = match raw.type_info().name() {
        "INTEGER" | "BOOLEAN" => SqlValue::Int(row.try_get_unchecked(index)?),
        "REAL" => SqlValue::Float(row.try_get_unchecked(index)?),
        "BLOB" => SqlValue::Blob(row.try_get_unchecked(index)?),
        _ => SqlValue::Text(row.try_get_unchecked(index)?),
    };
    Ok(value)
}

pub(crate) fn postgres_cells(row: &PgRow) -> Result<Vec<SqlValue>, sqlx::Error> {
    (0..row.len()).map(|index| postgres_cell(row, index)).collect()
}

fn postgres_cell(row: &PgRow, index: usize) -> Result<SqlValue, sqlx::Error> {
    let raw = row.try_get_raw(index)?;
    if raw.is_null() {
        return Ok(SqlValue::Null);
    }
    let value = match raw.type_info().name() {
        "BOOL" => SqlValue::Bool(row.try_get_unchecked(index)?),
        "INT2" => SqlValue::Int(i64::from(row.try_get_unchecked::<i16, _>(index)?)),
        "INT4" => SqlValue::Int(i64::from(row.try_get_unchecked::<i32, _>(index)?)),
        "INT8" => SqlValue::Int(row.try_get_unchecked(index)?),
        "FLOAT4" => SqlValue::Float(f64::from(row.try_get_unchecked::<f32, _>(index)?)),
        "FLOAT8" => SqlValue::Float(row.try_get_unchecked(index)?),
        // Text keeps every digit.
        "NUMERIC" => SqlValue::Text(row.try_get_unchecked::<Decimal, _>(index)?.to_string()),
        "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" | "CITEXT" => {
            SqlValue::Text(row.try_get_unchecked(index)?)
        }
        "BYTEA" => SqlValue::Blob(row.try_get_unchecked(index)?),
        "JSON" | "JSONB" => SqlValue::Json(row.try_get_unchecked(index)?),
        "TIMESTAMP" => SqlValue::Timestamp(row.try_get_unchecked(index)?),
        "TIMESTAMPTZ" => SqlValue::TimestampTz(row.try_get_unchecked(index)?),
        "DATE" => SqlValue::Date(row.try_get_unchecked(index)?),
        "TIME" => SqlValue::Time(row.try_get_unchecked(index)?),
        other => {
            return Err(sqlx::Error::ColumnDecode {
                index: row.column(index).name().to_string(),
                source: format!("unsupported PostgreSQL type {other}").into(),
            })
        }
    };
    Ok(value)
}
