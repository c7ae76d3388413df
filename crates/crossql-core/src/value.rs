//! SQL values and parameter handling.
//!
//! Every builder returns its parameters as `SqlValue`s, in placeholder order.
//! Result cells decoded by a driver come back as `SqlValue`s too.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::dialect::Dialect;

/// A SQL value that can be bound as a parameter or read back as a cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "serde_json::Value", into = "serde_json::Value")]
pub enum SqlValue {
    /// NULL value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Float value.
    Float(f64),
    /// Text value.
    Text(String),
    /// Binary blob value.
    Blob(Vec<u8>),
    /// Structured value (mapping or sequence) stored as JSON.
    Json(serde_json::Value),
    /// Date and time without a zone (`TIMESTAMP`, SQLite `DATETIME`).
    Timestamp(NaiveDateTime),
    /// Instant in UTC (`TIMESTAMPTZ`).
    TimestampTz(DateTime<Utc>),
    /// Calendar date.
    Date(NaiveDate),
    /// Time of day.
    Time(NaiveTime),
}

impl SqlValue {
    /// Returns true for `Null`.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the text if this is a `Text` value.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the integer if this is an `Int` value.
    #[must_use]
    pub const fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Encodes the value for binding on `dialect`.
    ///
    /// SQLite has no JSON column type, so structured values are serialized
    /// to JSON text. PostgreSQL keeps them as `Json` and the driver binds them
    /// through its JSON wrapper.
    #[must_use]
    pub fn encode_for(self, dialect: Dialect) -> Self {
        match (self, dialect) {
            (Self::Json(value), Dialect::Sqlite) => Self::Text(value.to_string()),
            (other, _) => other,
        }
    }
}

impl From<serde_json::Value> for SqlValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => n
                .as_i64()
                .map_or_else(|| Self::Float(n.as_f64().unwrap_or(f64::NAN)), Self::Int),
            serde_json::Value::String(s) => Self::Text(s),
            structured @ (serde_json::Value::Array(_) | serde_json::Value::Object(_)) => {
                Self::Json(structured)
            }
        }
    }
}

impl From<SqlValue> for serde_json::Value {
    fn from(value: SqlValue) -> Self {
        match value {
            SqlValue::Null => Self::Null,
            SqlValue::Bool(b) => Self::Bool(b),
            SqlValue::Int(n) => Self::from(n),
            SqlValue::Float(f) => Self::from(f),
            SqlValue::Text(s) => Self::String(s),
            // Blobs serialize as 0x-prefixed lowercase hex.
            SqlValue::Blob(bytes) => {
                let mut hex = String::with_capacity(2 + bytes.len() * 2);
                hex.push_str("0x");
                for byte in bytes {
                    let _ = write!(hex, "{byte:02x}");
                }
                Self::String(hex)
            }
            SqlValue::Json(v) => v,
            SqlValue::Timestamp(ts) => Self::String(ts.to_string()),
            SqlValue::TimestampTz(ts) => Self::String(ts.to_rfc3339()),
            SqlValue::Date(d) => Self::String(d.to_string()),
            SqlValue::Time(t) => Self::String(t.to_string()),
        }
    }
}

/// Trait for types that can be converted to SQL values.
pub trait ToSqlValue {
    /// Converts the value to a `SqlValue`.
    fn to_sql_value(self) -> SqlValue;
}

impl ToSqlValue for SqlValue {
    fn to_sql_value(self) -> SqlValue {
        self
    }
}

impl ToSqlValue for bool {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Bool(self)
    }
}

impl ToSqlValue for i64 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Int(self)
    }
}

impl ToSqlValue for i32 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Int(i64::from(self))
    }
}

impl ToSqlValue for u32 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Int(i64::from(self))
    }
}

impl ToSqlValue for f64 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Float(self)
    }
}

impl ToSqlValue for String {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Text(self)
    }
}

impl ToSqlValue for &str {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Text(String::from(self))
    }
}

impl ToSqlValue for Vec<u8> {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Blob(self)
    }
}

impl ToSqlValue for serde_json::Value {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Json(self)
    }
}

impl ToSqlValue for NaiveDateTime {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Timestamp(self)
    }
}

impl ToSqlValue for DateTime<Utc> {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::TimestampTz(self)
    }
}

impl ToSqlValue for NaiveDate {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Date(self)
    }
}

impl ToSqlValue for NaiveTime {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Time(self)
    }
}

impl<T: ToSqlValue> ToSqlValue for BTreeMap<String, T> {
    fn to_sql_value(self) -> SqlValue {
        let object = self
            .into_iter()
            .map(|(k, v)| (k, serde_json::Value::from(v.to_sql_value())))
            .collect();
        SqlValue::Json(serde_json::Value::Object(object))
    }
}

impl<T: ToSqlValue> ToSqlValue for Option<T> {
    fn to_sql_value(self) -> SqlValue {
        match self {
            Some(v) => v.to_sql_value(),
            None => SqlValue::Null,
        }
    }
}

macro_rules! impl_from_for_sql_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for SqlValue {
                fn from(value: $ty) -> Self {
                    value.to_sql_value()
                }
            }
        )*
    };
}

impl_from_for_sql_value!(
    bool,
    i64,
    i32,
    u32,
    f64,
    String,
    &str,
    Vec<u8>,
    NaiveDateTime,
    DateTime<Utc>,
    NaiveDate,
    NaiveTime,
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_values_map_to_variants() {
        assert_eq!(SqlValue::from(serde_json::json!(null)), SqlValue::Null);
        assert_eq!(SqlValue::from(serde_json::json!(3)), SqlValue::Int(3));
        assert_eq!(SqlValue::from(serde_json::json!(1.5)), SqlValue::Float(1.5));
        assert_eq!(
            SqlValue::from(serde_json::json!("x")),
            SqlValue::Text(String::from("x"))
        );
        assert_eq!(
            SqlValue::from(serde_json::json!({"a": 1})),
            SqlValue::Json(serde_json::json!({"a": 1}))
        );
    }

    #[test]
    fn test_encode_for_sqlite_serializes_json() {
        let value = SqlValue::Json(serde_json::json!({"k": [1, 2]}));
        assert_eq!(
            value.clone().encode_for(Dialect::Sqlite),
            SqlValue::Text(String::from(r#"{"k":[1,2]}"#))
        );
        assert_eq!(value.clone().encode_for(Dialect::Postgres), value);
    }

    #[test]
    fn test_blob_serializes_as_hex() {
        let json = serde_json::to_string(&SqlValue::Blob(vec![0xde, 0xad])).unwrap();
        assert_eq!(json, r#""0xdead""#);
    }

    #[test]
    fn test_temporal_values_serialize_as_text() {
        let date = NaiveDate::from_ymd_opt(1996, 2, 27).unwrap();
        let at = date.and_hms_opt(9, 30, 0).unwrap();
        assert_eq!(SqlValue::from(at), SqlValue::Timestamp(at));
        assert_eq!(
            serde_json::Value::from(SqlValue::Timestamp(at)),
            serde_json::json!("1996-02-27 09:30:00")
        );
        assert_eq!(
            serde_json::Value::from(SqlValue::TimestampTz(at.and_utc())),
            serde_json::json!("1996-02-27T09:30:00+00:00")
        );
        assert_eq!(
            serde_json::Value::from(SqlValue::Date(date)),
            serde_json::json!("1996-02-27")
        );
        assert_eq!(
            serde_json::Value::from(SqlValue::Time(at.time())),
            serde_json::json!("09:30:00")
        );
    }

    #[test]
    fn test_from_conversions() {
        assert_eq!(SqlValue::from(7_i64), SqlValue::Int(7));
        assert_eq!(SqlValue::from("GROUND"), SqlValue::Text(String::from("GROUND")));
        assert_eq!(Some(true).to_sql_value(), SqlValue::Bool(true));
        assert_eq!(None::<i64>.to_sql_value(), SqlValue::Null);
    }
}
