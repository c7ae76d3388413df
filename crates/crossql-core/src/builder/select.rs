//! SELECT.

use tracing::debug;

use super::finish;
use crate::dialect::Dialect;
use crate::error::Result;
use crate::expr::{compile_columns, compile_order_by, ColumnSpec, OrderSpec};
use crate::filter::WhereGroup;
use crate::ident::{join_identifiers, validate_identifier};
use crate::schema::TableSchema;
use crate::value::{SqlValue, ToSqlValue};

/// A SELECT statement builder.
#[derive(Debug, Clone, Default)]
pub struct Select<'a> {
    table: String,
    columns: Vec<ColumnSpec>,
    filter: WhereGroup,
    order_by: Vec<OrderSpec>,
    group_by: Vec<String>,
    limit: Option<u64>,
    offset: Option<u64>,
    distinct: bool,
    single_line: bool,
    context: Option<&'a TableSchema>,
}

impl<'a> Select<'a> {
    /// Creates a `SELECT *` from `table`.
    #[must_use]
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            ..Self::default()
        }
    }

    /// Adds a column (bare name, aggregate or expression).
    #[must_use]
    pub fn column(mut self, column: impl Into<ColumnSpec>) -> Self {
        self.columns.push(column.into());
        self
    }

    /// Adds several columns.
    #[must_use]
    pub fn columns<I, C>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<ColumnSpec>,
    {
        self.columns.extend(columns.into_iter().map(Into::into));
        self
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

    /// Adds an ordering term.
    #[must_use]
    pub fn order_by(mut self, order: impl Into<OrderSpec>) -> Self {
        self.order_by.push(order.into());
        self
    }

    /// Adds a GROUP BY column.
    #[must_use]
    pub fn group_by(mut self, column: impl Into<String>) -> Self {
        self.group_by.push(column.into());
        self
    }

    /// Sets LIMIT.
    #[must_use]
    pub const fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Sets OFFSET.
    #[must_use]
    pub const fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Selects DISTINCT rows.
    #[must_use]
    pub const fn distinct(mut self) -> Self {
        self.distinct = true;
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
    /// Propagates column, where-group and order-by compilation errors.
    pub fn build(&self, dialect: Dialect) -> Result<(String, Vec<SqlValue>)> {
        validate_identifier(&self.table)?;
        let mut sql = String::from("SELECT ");
        if self.distinct {
            sql.push_str("DISTINCT ");
        }
        sql.push_str(&compile_columns(&self.columns, dialect)?);
        sql.push_str("\nFROM ");
        sql.push_str(&self.table);

        let (where_sql, params) = self.filter.compile(dialect, self.context)?;
        if !where_sql.is_empty() {
            sql.push_str("\nWHERE ");
            sql.push_str(&where_sql);
        }
        if !self.group_by.is_empty() {
            sql.push_str("\nGROUP BY ");
            sql.push_str(&join_identifiers(self.group_by.iter().map(String::as_str))?);
        }
        if !self.order_by.is_empty() {
            sql.push_str("\nORDER BY ");
            sql.push_str(&compile_order_by(&self.order_by)?);
        }
        match (self.limit, self.offset, dialect) {
            (Some(limit), _, _) => sql.push_str(&format!("\nLIMIT {limit}")),
            // SQLite only accepts OFFSET after a LIMIT.
            (None, Some(_), Dialect::Sqlite) => sql.push_str("\nLIMIT -1"),
            _ => {}
        }
        if let Some(offset) = self.offset {
            sql.push_str(&format!("\nOFFSET {offset}"));
        }

        debug!(table = %self.table, params = params.len(), "Built SELECT");
        Ok((finish(sql, self.single_line), params))
    }
}
