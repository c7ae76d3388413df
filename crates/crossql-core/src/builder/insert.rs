//! INSERT, including conflict handling.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::finish;
use crate::dialect::Dialect;
use crate::error::{Error, Result};
use crate::ident::{join_identifiers, validate_identifier};
use crate::schema::TableSchema;
use crate::value::SqlValue;

/// What to do when an inserted row conflicts with an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OnConflict {
    /// Keep the existing row.
    Ignore,
    /// Replace the existing row's values.
    Update,
}

/// Rows to insert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InsertRows {
    /// Positional rows, matched against the column list.
    Tuples(Vec<Vec<SqlValue>>),
    /// Rows keyed by column name; every row must have the same keys.
    Dicts(Vec<BTreeMap<String, SqlValue>>),
}

impl InsertRows {
    fn len(&self) -> usize {
        match self {
            Self::Tuples(rows) => rows.len(),
            Self::Dicts(rows) => rows.len(),
        }
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// An INSERT statement builder.
#[derive(Debug, Clone)]
pub struct Insert<'a> {
    table: String,
    columns: Option<Vec<String>>,
    rows: InsertRows,
    on_conflict: Option<OnConflict>,
    conflict_target: Option<Vec<String>>,
    context: Option<&'a TableSchema>,
    single_line: bool,
}

impl<'a> Insert<'a> {
    /// Creates an INSERT into `table` with no rows yet.
    #[must_use]
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: None,
            rows: InsertRows::Tuples(Vec::new()),
            on_conflict: None,
            conflict_target: None,
            context: None,
            single_line: false,
        }
    }

    /// Sets the column list for positional rows.
    #[must_use]
    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Adds one positional row. Replaces mapping rows, if any.
    #[must_use]
    pub fn row(mut self, row: Vec<SqlValue>) -> Self {
        match &mut self.rows {
            InsertRows::Tuples(rows) => rows.push(row),
            InsertRows::Dicts(_) => self.rows = InsertRows::Tuples(vec![row]),
        }
        self
    }

    /// Adds one mapping row. Replaces positional rows, if any.
    #[must_use]
    pub fn dict_row(mut self, row: BTreeMap<String, SqlValue>) -> Self {
        match &mut self.rows {
            InsertRows::Dicts(rows) => rows.push(row),
            InsertRows::Tuples(_) => self.rows = InsertRows::Dicts(vec![row]),
        }
        self
    }

    /// Replaces all rows.
    #[must_use]
    pub fn rows(mut self, rows: InsertRows) -> Self {
        self.rows = rows;
        self
    }

    /// Sets the conflict behavior.
    #[must_use]
    pub const fn on_conflict(mut self, on_conflict: OnConflict) -> Self {
        self.on_conflict = Some(on_conflict);
        self
    }

    /// Sets the PostgreSQL conflict target. Defaults to the primary key of the
    /// context table.
    #[must_use]
    pub fn conflict_target<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.conflict_target = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Supplies the table schema, used for the default column list and
    /// conflict target.
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
    /// Structured cells are encoded for `dialect` before placeholders are
    /// generated: JSON text on SQLite, JSON binding on PostgreSQL.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Schema`] for an empty insert, rows whose width or
    /// keys disagree with the column list, and a PostgreSQL
    /// `OnConflict::Update` with no resolvable conflict target or column
    /// list. Returns [`Error::InvalidIdentifier`] for unsafe names.
    pub fn build(&self, dialect: Dialect) -> Result<(String, Vec<SqlValue>)> {
        validate_identifier(&self.table)?;
        if self.rows.is_empty() {
            return Err(Error::schema(format!("no rows to insert into {}", self.table)));
        }

        let (columns, rows) = self.resolve_rows()?;
        let width = rows[0].len();
        if width == 0 {
            return Err(Error::schema(format!("no values to insert into {}", self.table)));
        }

        let mut sql = String::from(match (dialect, self.on_conflict) {
            (Dialect::Sqlite, Some(OnConflict::Ignore)) => "INSERT OR IGNORE INTO ",
            (Dialect::Sqlite, Some(OnConflict::Update)) => "INSERT OR REPLACE INTO ",
            _ => "INSERT INTO ",
        });
        sql.push_str(&self.table);
        if let Some(columns) = &columns {
            sql.push_str(" (");
            sql.push_str(&join_identifiers(columns.iter().map(String::as_str))?);
            sql.push(')');
        }
        sql.push_str("\nVALUES");

        let tuples: Vec<String> = rows
            .iter()
            .map(|_| format!("\n    ({})", dialect.placeholders(width)))
            .collect();
        sql.push_str(&tuples.join(","));

        if dialect == Dialect::Postgres {
            match self.on_conflict {
                Some(OnConflict::Ignore) => sql.push_str("\nON CONFLICT DO NOTHING"),
                Some(OnConflict::Update) => {
                    sql.push('\n');
                    sql.push_str(&self.postgres_upsert(columns.as_deref())?);
                }
                None => {}
            }
        }

        let params: Vec<SqlValue> = rows
            .into_iter()
            .flatten()
            .map(|v| v.encode_for(dialect))
            .collect();

        debug!(
            table = %self.table,
            rows = self.rows.len(),
            params = params.len(),
            "Built INSERT"
        );
        Ok((finish(sql, self.single_line), params))
    }

    /// Returns the column list (if known) and the rows as positional values.
    fn resolve_rows(&self) -> Result<(Option<Vec<String>>, Vec<Vec<SqlValue>>)> {
        match &self.rows {
            InsertRows::Tuples(rows) => {
                let columns = self.columns.clone().or_else(|| {
                    self.context
                        .map(|t| t.column_names().map(str::to_string).collect())
                });
                let width = columns.as_ref().map_or(rows[0].len(), Vec::len);
                if let Some(bad) = rows.iter().find(|r| r.len() != width) {
                    return Err(Error::schema(format!(
                        "row has {} values, expected {width}",
                        bad.len()
                    )));
                }
                Ok((columns, rows.clone()))
            }
            InsertRows::Dicts(rows) => {
                let columns: Vec<String> = rows[0].keys().cloned().collect();
                if let Some(explicit) = &self.columns {
                    let mut sorted = explicit.clone();
                    sorted.sort();
                    if sorted != columns {
                        return Err(Error::schema(
                            "explicit columns do not match the keys of the rows",
                        ));
                    }
                }
                let order = self.columns.clone().unwrap_or(columns);
                let mut positional = Vec::with_capacity(rows.len());
                for row in rows {
                    if row.len() != order.len() || !order.iter().all(|c| row.contains_key(c)) {
                        return Err(Error::schema("every row must have the same keys"));
                    }
                    positional.push(order.iter().map(|c| row[c].clone()).collect());
                }
                Ok((Some(order), positional))
            }
        }
    }

    fn postgres_upsert(&self, columns: Option<&[String]>) -> Result<String> {
        let target: Vec<String> = match (&self.conflict_target, self.context) {
            (Some(target), _) => target.clone(),
            (None, Some(table)) => table.primary_key().into_iter().map(str::to_string).collect(),
            (None, None) => Vec::new(),
        };
        if target.is_empty() {
            return Err(Error::schema(format!(
                "ON CONFLICT update on {} needs a conflict target or a table with a primary key",
                self.table
            )));
        }
        let columns = columns.ok_or_else(|| {
            Error::schema(format!(
                "ON CONFLICT update on {} needs an explicit column list",
                self.table
            ))
        })?;

        let target_sql = join_identifiers(target.iter().map(String::as_str))?;
        let updates: Vec<String> = columns
            .iter()
            .filter(|c| !target.contains(c))
            .map(|c| format!("{c} = EXCLUDED.{c}"))
            .collect();
        if updates.is_empty() {
            return Ok(format!("ON CONFLICT ({target_sql}) DO NOTHING"));
        }
        Ok(format!(
            "ON CONFLICT ({target_sql}) DO UPDATE SET {}",
            updates.join(", ")
        ))
    }
}
