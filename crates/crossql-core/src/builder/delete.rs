//! DELETE.

use tracing::debug;

use super::finish;
use crate::dialect::Dialect;
use crate::error::{Error, Result};
use crate::filter::WhereGroup;
use crate::ident::validate_identifier;
use crate::schema::TableSchema;
use crate::value::{SqlValue, ToSqlValue};

/// A DELETE statement builder.
///
/// Without a where-group every row is deleted, which must be confirmed with
/// [`Delete::all_rows`].
#[derive(Debug, Clone, Default)]
pub struct Delete<'a> {
    table: String,
    filter: WhereGroup,
    all_rows: bool,
    single_line: bool,
    context: Option<&'a TableSchema>,
}

impl<'a> Delete<'a> {
    /// Creates a DELETE from `table`.
    #[must_use]
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            ..Self::default()
        }
    }

    /// Replaces the where-group.
    #[must_use]
    pub fn filter(mut self, filter: WhereGroup) -> Self {
        self.filter = filter;
        self
    }

    /// Adds `column = value` to the where-group.
    #[must_use]
    pub fn where_equals<V: ToSqlValue>(mut self, column: &str, value: V) -> Self {
        self.filter = self.filter.equals(column, value);
        self
    }

    /// Adds `column IN (values...)` to the where-group.
    #[must_use]
    pub fn where_in<V: ToSqlValue>(mut self, column: &str, values: Vec<V>) -> Self {
        self.filter = self.filter.in_list(column, values);
        self
    }

    /// Confirms deleting every row.
    #[must_use]
    pub const fn all_rows(mut self) -> Self {
        self.all_rows = true;
        self
    }

    /// Checks where-group columns against `table`.
    #[must_use]
    pub const fn context(mut self, table: &'a TableSchema) -> Self {
        self.context = Some(table);
        self
    }

    /// Renders the statement on a single line.
    #[must_use]
    pub const fn single_line(mut self) -> Self {
        self.single_line = true;
        self
    }

    /// Builds the statement and its parameters.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfirmationRequired`] for an unconfirmed DELETE of
    /// every row, plus identifier and where-group errors.
    pub fn build(&self, dialect: Dialect) -> Result<(String, Vec<SqlValue>)> {
        validate_identifier(&self.table)?;
        let (where_sql, params) = self.filter.compile(dialect, self.context)?;
        let mut sql = format!("DELETE FROM {}", self.table);
        if where_sql.is_empty() {
            if !self.all_rows {
                return Err(Error::ConfirmationRequired(format!(
                    "DELETE FROM {} without WHERE",
                    self.table
                )));
            }
        } else {
            sql.push_str("\nWHERE ");
            sql.push_str(&where_sql);
        }

        debug!(table = %self.table, params = params.len(), "Built DELETE");
        Ok((finish(sql, self.single_line), params))
    }
}
