//! Cell decoding for dialect type gaps.
//!
//! SQLite stores JSON as text and booleans as integers. Before rows are
//! shaped, cells in such columns are decoded back into the value the
//! caller stored.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::dialect::{Dialect, DriverKind};
use crate::error::{Error, Result};
use crate::schema::TableSchema;
use crate::types::{convert_columntype_to_dialect, ColumnType};
use crate::value::SqlValue;

/// Rows as returned by a driver: column names plus positional cells.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRows {
    /// Column names, in result order.
    pub columns: Vec<String>,
    /// Rows; each has one cell per column.
    pub rows: Vec<Vec<SqlValue>>,
}

impl RawRows {
    /// Creates a result set.
    #[must_use]
    pub const fn new(columns: Vec<String>, rows: Vec<Vec<SqlValue>>) -> Self {
        Self { columns, rows }
    }

    /// Returns the number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if there are no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns the position of column `name`.
    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }
}

/// How to decode the cells of one column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecodeColumn {
    /// Parse text cells as JSON.
    Json,
    /// Coerce integer cells to booleans.
    Boolean,
    /// Coerce text and float cells to integers.
    Integer,
    /// Leave cells as they are.
    #[default]
    None,
}

/// Decodes one cell. `Null` and empty-text cells are returned untouched.
///
/// # Errors
///
/// Returns [`Error::Decode`] for text that is not JSON (`Json`), integers
/// other than 0 and 1 (`Boolean`), and text or fractional floats that are
/// not integers (`Integer`).
pub fn decode_cell(value: SqlValue, how: DecodeColumn) -> Result<SqlValue> {
    if value.is_null() || value.as_str() == Some("") {
        return Ok(value);
    }
    match (how, value) {
        (DecodeColumn::Json, SqlValue::Text(text)) => {
            let parsed: serde_json::Value = serde_json::from_str(&text)?;
            Ok(SqlValue::from(parsed))
        }
        (DecodeColumn::Boolean, SqlValue::Int(n)) => match n {
            0 => Ok(SqlValue::Bool(false)),
            1 => Ok(SqlValue::Bool(true)),
            _ => Err(Error::Decode(format!("{n} is not a boolean"))),
        },
        (DecodeColumn::Integer, SqlValue::Text(text)) => text
            .trim()
            .parse::<i64>()
            .map(SqlValue::Int)
            .map_err(|_| Error::Decode(format!("{text:?} is not an integer"))),
        (DecodeColumn::Integer, SqlValue::Float(f)) => float_to_int(f),
        (_, value) => Ok(value),
    }
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::float_cmp
)]
fn float_to_int(f: f64) -> Result<SqlValue> {
    let n = f as i64;
    if f.fract() == 0.0 && n as f64 == f {
        Ok(SqlValue::Int(n))
    } else {
        Err(Error::Decode(format!("{f} is not an integer")))
    }
}

/// Decodes the columns named in `decode`. Columns not in the map, and names
/// not in the result, are ignored.
///
/// # Errors
///
/// Propagates [`decode_cell`] errors.
pub fn decode_rows(mut rows: RawRows, decode: &BTreeMap<String, DecodeColumn>) -> Result<RawRows> {
    let plan: Vec<(usize, DecodeColumn)> = decode
        .iter()
        .filter(|(_, how)| **how != DecodeColumn::None)
        .filter_map(|(name, how)| rows.column_index(name).map(|i| (i, *how)))
        .collect();
    if plan.is_empty() {
        return Ok(rows);
    }
    for row in &mut rows.rows {
        for &(i, how) in &plan {
            if let Some(cell) = row.get_mut(i) {
                *cell = decode_cell(std::mem::replace(cell, SqlValue::Null), how)?;
            }
        }
    }
    Ok(rows)
}

/// Picks the decode tag for a column of type `column_type` read through
/// `driver` from `dialect`.
///
/// PostgreSQL has native JSON and boolean types, so only SQLite columns
/// need decoding.
#[must_use]
pub fn infer_decode_column(
    dialect: Dialect,
    driver: DriverKind,
    column_type: &ColumnType,
) -> DecodeColumn {
    match (dialect, driver) {
        (Dialect::Postgres, _) => DecodeColumn::None,
        (Dialect::Sqlite, DriverKind::Sqlx | DriverKind::SqlxBlocking) => {
            match convert_columntype_to_dialect(column_type, Dialect::Sqlite).as_deref() {
                Ok("JSON") => DecodeColumn::Json,
                Ok("BOOLEAN") => DecodeColumn::Boolean,
                _ => DecodeColumn::None,
            }
        }
    }
}

/// Picks decode tags for every column of `table` that needs one.
#[must_use]
pub fn infer_decode_columns(
    dialect: Dialect,
    driver: DriverKind,
    table: &TableSchema,
) -> BTreeMap<String, DecodeColumn> {
    table
        .columns
        .iter()
        .map(|c| (c.name.clone(), infer_decode_column(dialect, driver, &c.column_type)))
        .filter(|(_, how)| *how != DecodeColumn::None)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ColumnSchema;
    use crate::types::{GenericType, ScalarType};

    #[test]
    fn test_json_cells() {
        assert_eq!(
            decode_cell(SqlValue::from(r#"{"hp": 45}"#), DecodeColumn::Json).unwrap(),
            SqlValue::Json(serde_json::json!({"hp": 45}))
        );
        assert_eq!(
            decode_cell(SqlValue::Null, DecodeColumn::Json).unwrap(),
            SqlValue::Null
        );
        assert_eq!(
            decode_cell(SqlValue::from(""), DecodeColumn::Json).unwrap(),
            SqlValue::from("")
        );
        assert!(matches!(
            decode_cell(SqlValue::from("{oops"), DecodeColumn::Json),
            Err(Error::Decode(_))
        ));
    }

    #[test]
    fn test_boolean_and_integer_cells() {
        assert_eq!(
            decode_cell(SqlValue::Int(1), DecodeColumn::Boolean).unwrap(),
            SqlValue::Bool(true)
        );
        assert!(decode_cell(SqlValue::Int(2), DecodeColumn::Boolean).is_err());
        assert_eq!(
            decode_cell(SqlValue::from("42"), DecodeColumn::Integer).unwrap(),
            SqlValue::Int(42)
        );
        assert_eq!(
            decode_cell(SqlValue::Float(3.0), DecodeColumn::Integer).unwrap(),
            SqlValue::Int(3)
        );
        assert!(decode_cell(SqlValue::Float(3.5), DecodeColumn::Integer).is_err());
    }

    #[test]
    fn test_decode_rows() {
        let rows = RawRows::new(
            vec![String::from("id"), String::from("stats")],
            vec![
                vec![SqlValue::Int(1), SqlValue::from("[1, 2]")],
                vec![SqlValue::Int(2), SqlValue::Null],
            ],
        );
        let decode = BTreeMap::from([(String::from("stats"), DecodeColumn::Json)]);
        let rows = decode_rows(rows, &decode).unwrap();
        assert_eq!(rows.rows[0][1], SqlValue::Json(serde_json::json!([1, 2])));
        assert_eq!(rows.rows[1][1], SqlValue::Null);
    }

    #[test]
    fn test_infer_decode_columns() {
        let table = TableSchema {
            name: String::from("pokemon"),
            description: None,
            columns: vec![
                ColumnSchema::new("stats", ColumnType::Scalar(ScalarType::Mapping)),
                ColumnSchema::new("legendary", ColumnType::Generic(GenericType::Boolean)),
                ColumnSchema::new("name", ColumnType::Native(String::from("TEXT"))),
                ColumnSchema::new("extra", ColumnType::Native(String::from("JSONB"))),
            ],
            constraints: vec![],
            indices: vec![],
        };
        let sqlite = infer_decode_columns(Dialect::Sqlite, DriverKind::Sqlx, &table);
        assert_eq!(
            sqlite,
            BTreeMap::from([
                (String::from("extra"), DecodeColumn::Json),
                (String::from("legendary"), DecodeColumn::Boolean),
                (String::from("stats"), DecodeColumn::Json),
            ])
        );
        assert!(infer_decode_columns(Dialect::Postgres, DriverKind::Sqlx, &table).is_empty());
    }
}
