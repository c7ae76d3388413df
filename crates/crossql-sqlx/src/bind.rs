//! Parameter binding and placeholder rewriting.

use std::fmt::Write as _;

use crossql_core::{Error, Result, SqlValue};
use sqlx::postgres::{PgArguments, Postgres};
use sqlx::query::Query;
use sqlx::sqlite::{Sqlite, SqliteArguments};
use sqlx::types::Json;

/// Rewrites the `%s` placeholders of a PostgreSQL statement to `$1, $2, ...`.
///
/// sqlx has no untyped NULL parameter, so NULL values are written into the
/// statement as `NULL` and left out of the returned parameters. The rest
/// keep their order. Placeholders inside string literals are left alone.
///
/// # Errors
///
/// Returns [`Error::Schema`] when the statement has a different number of
/// placeholders than `params`.
pub fn postgres_statement<'p>(
    sql: &str,
    params: &'p [SqlValue],
) -> Result<(String, Vec<&'p SqlValue>)> {
    let mut out = String::with_capacity(sql.len() + params.len());
    let mut bound = Vec::with_capacity(params.len());
    let mut remaining = params.iter();
    let mut placeholders = 0usize;
    let mut in_literal = false;

    let mut chars = sql.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '\'' => {
                in_literal = !in_literal;
                out.push(ch);
            }
            '%' if !in_literal && chars.peek() == Some(&'s') => {
                chars.next();
                placeholders += 1;
                match remaining.next() {
                    Some(SqlValue::Null) => out.push_str("NULL"),
                    Some(value) => {
                        bound.push(value);
                        let _ = write!(out, "${}", bound.len());
                    }
                    None => {}
                }
            }
            _ => out.push(ch),
        }
    }

    if placeholders != params.len() {
        return Err(Error::Schema(format!(
            "statement has {placeholders} placeholders for {} parameters",
            params.len()
        )));
    }
    Ok((out, bound))
}

pub(crate) fn bind_sqlite<'q>(
    mut query: Query<'q, Sqlite, SqliteArguments<'q>>,
    params: &[SqlValue],
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    for value in params {
        query = match value {
            SqlValue::Null => query.bind(None::<String>),
            SqlValue::Bool(b) => query.bind(*b),
            SqlValue::Int(n) => query.bind(*n),
            SqlValue::Float(f) => query.bind(*f),
            SqlValue::Text(s) => query.bind(s.clone()),
            SqlValue::Blob(b) => query.bind(b.clone()),
            SqlValue::Json(v) => query.bind(v.to_string()),
            SqlValue::Timestamp(ts) => query.bind(*ts),
            SqlValue::TimestampTz(ts) => query.bind(*ts),
            SqlValue::Date(d) => query.bind(*d),
            SqlValue::Time(t) => query.bind(*t),
        };
    }
    query
}

pub(crate) fn bind_postgres<'q>(
    mut query: Query<'q, Postgres, PgArguments>,
    params: &[&SqlValue],
) -> Query<'q, Postgres, PgArguments> {
    for value in params {
        query = match value {
            SqlValue::Null => query.bind(None::<String>),
            SqlValue::Bool(b) => query.bind(*b),
            SqlValue::Int(n) => query.bind(*n),
            SqlValue::Float(f) => query.bind(*f),
            SqlValue::Text(s) => query.bind(s.clone()),
            SqlValue::Blob(b) => query.bind(b.clone()),
            SqlValue::Json(v) => query.bind(Json(v.clone())),
            SqlValue::Timestamp(ts) => query.bind(*ts),
            SqlValue::TimestampTz(ts) => query.bind(*ts),
            SqlValue::Date(d) => query.bind(*d),
            SqlValue::Time(t) => query.bind(*t),
        };
    }
    query
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numbered_placeholders() {
        let params = vec![SqlValue::from("GROUND"), SqlValue::Int(3)];
        let (sql, bound) =
            postgres_statement("SELECT * FROM pokemon WHERE primary_type = %s AND height > %s", &params)
                .unwrap();
        assert_eq!(sql, "SELECT * FROM pokemon WHERE primary_type = $1 AND height > $2");
        assert_eq!(bound, vec![&params[0], &params[1]]);
    }

    #[test]
    fn test_nulls_are_inlined() {
        let params = vec![SqlValue::Int(1), SqlValue::Null, SqlValue::from("x")];
        let (sql, bound) =
            postgres_statement("INSERT INTO t (a, b, c) VALUES (%s, %s, %s)", &params).unwrap();
        assert_eq!(sql, "INSERT INTO t (a, b, c) VALUES ($1, NULL, $2)");
        assert_eq!(bound, vec![&params[0], &params[2]]);
    }

    #[test]
    fn test_temporal_values_stay_bound() {
        let day = chrono::NaiveDate::from_ymd_opt(1996, 2, 27).unwrap();
        let params = vec![
            SqlValue::Timestamp(day.and_hms_opt(9, 30, 0).unwrap()),
            SqlValue::Date(day),
        ];
        let (sql, bound) =
            postgres_statement("UPDATE t SET caught_at = %s WHERE released = %s", &params).unwrap();
        assert_eq!(sql, "UPDATE t SET caught_at = $1 WHERE released = $2");
        assert_eq!(bound, vec![&params[0], &params[1]]);
    }

    #[test]
    fn test_literals_untouched() {
        let (sql, bound) =
            postgres_statement("SELECT '%s' AS fmt, a FROM t WHERE b = %s", &[SqlValue::Int(1)])
                .unwrap();
        assert_eq!(sql, "SELECT '%s' AS fmt, a FROM t WHERE b = $1");
        assert_eq!(bound.len(), 1);
    }

    #[test]
    fn test_count_mismatch() {
        assert!(matches!(
            postgres_statement("SELECT %s, %s", &[SqlValue::Int(1)]),
            Err(Error::Schema(_))
        ));
        assert!(postgres_statement("SELECT 1", &[SqlValue::Int(1)]).is_err());
    }
}
