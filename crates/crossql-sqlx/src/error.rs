//! Capture of sqlx errors.

use std::borrow::Cow;

use crossql_core::{translate, Dialect, DriverKind, Error, NativeError};

/// Describes a sqlx error as a [`NativeError`] and translates it.
pub(crate) fn capture(error: sqlx::Error, dialect: Dialect, driver: DriverKind) -> Error {
    let (code, message) = match &error {
        sqlx::Error::Database(db) => (db.code().map(Cow::into_owned), db.message().to_string()),
        other => (None, other.to_string()),
    };
    translate(NativeError::new(driver, dialect, code, message).with_source(error))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_database_errors_pass_through() {
        let err = capture(sqlx::Error::RowNotFound, Dialect::Sqlite, DriverKind::Sqlx);
        assert!(matches!(err, Error::Driver(_)));
        assert!(err.to_string().contains("no rows returned"), "{err}");
    }

    #[test]
    fn test_message_rules_apply_without_a_code() {
        let err = capture(
            sqlx::Error::Protocol(String::from("no such table: pokemon")),
            Dialect::Sqlite,
            DriverKind::SqlxBlocking,
        );
        assert!(err.is_table_missing(), "{err}");
    }
}
