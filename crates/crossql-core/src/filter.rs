//! Where-groups and their compilation to SQL.
//!
//! A [`WhereGroup`] holds per-operator `column -> value` lists that are
//! AND-combined, plus nested groups that are OR-combined with each other:
//!
//! ```ignore
//! use crossql_core::{Dialect, WhereGroup};
//!
//! let group = WhereGroup::new()
//!     .equals("primary_type", "GROUND")
//!     .gt("height", 10)
//!     .or(WhereGroup::new().equals("legendary", true))
//!     .or(WhereGroup::new().lt("weight", 5).lt("height", 1));
//! let (sql, params) = group.compile(Dialect::Sqlite, None)?;
//! // primary_type = ? AND height > ? AND (legendary = ? OR (weight < ? AND height < ?))
//! ```
//!
//! Fragments are emitted in a fixed operator order (equals, gt, gte, lt, lte,
//! like, ilike, in, then the OR groups), and parameters are collected in
//! exactly that order, so they always line up with their placeholders.

use serde::{Deserialize, Serialize};

use crate::dialect::Dialect;
use crate::error::{Error, Result};
use crate::ident::validate_identifier;
use crate::ordered::OrderedMap;
use crate::schema::TableSchema;
use crate::value::{SqlValue, ToSqlValue};

/// Comparison operators usable in a where-group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    /// Equal (=)
    Equals,
    /// Greater than (>)
    Gt,
    /// Greater than or equal (>=)
    Gte,
    /// Less than (<)
    Lt,
    /// Less than or equal (<=)
    Lte,
    /// Case-sensitive pattern match
    Like,
    /// Case-insensitive pattern match
    Ilike,
}

impl CompareOp {
    /// Returns the operator text on `dialect`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedOperation`] for a case-sensitive `LIKE` on
    /// SQLite, whose `LIKE` ignores case.
    pub fn to_sql(self, dialect: Dialect) -> Result<&'static str> {
        Ok(match self {
            Self::Equals => "=",
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::Lt => "<",
            Self::Lte => "<=",
            Self::Like if dialect.supports_case_sensitive_like() => "LIKE",
            Self::Like => {
                return Err(Error::unsupported(format!(
                    "case-sensitive LIKE is not available on {dialect}"
                )))
            }
            Self::Ilike if dialect == Dialect::Postgres => "ILIKE",
            Self::Ilike => "LIKE",
        })
    }
}

/// A recursive predicate tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WhereGroup {
    pub equals: OrderedMap<SqlValue>,
    pub gt: OrderedMap<SqlValue>,
    pub gte: OrderedMap<SqlValue>,
    pub lt: OrderedMap<SqlValue>,
    pub lte: OrderedMap<SqlValue>,
    pub like: OrderedMap<SqlValue>,
    pub ilike: OrderedMap<SqlValue>,
    #[serde(rename = "in")]
    pub in_list: OrderedMap<Vec<SqlValue>>,
    /// Branches combined with OR; each branch is itself AND-combined.
    pub or: Vec<WhereGroup>,
}

impl WhereGroup {
    /// Creates an empty group.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the group has no conditions at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.equals.is_empty()
            && self.gt.is_empty()
            && self.gte.is_empty()
            && self.lt.is_empty()
            && self.lte.is_empty()
            && self.like.is_empty()
            && self.ilike.is_empty()
            && self.in_list.is_empty()
            && self.or.is_empty()
    }

    /// Adds `column = value`.
    #[must_use]
    pub fn equals<V: ToSqlValue>(mut self, column: &str, value: V) -> Self {
        self.equals.push(column, value.to_sql_value());
        self
    }

    /// Adds `column > value`.
    #[must_use]
    pub fn gt<V: ToSqlValue>(mut self, column: &str, value: V) -> Self {
        self.gt.push(column, value.to_sql_value());
        self
    }

    /// Adds `column >= value`.
    #[must_use]
    pub fn gte<V: ToSqlValue>(mut self, column: &str, value: V) -> Self {
        self.gte.push(column, value.to_sql_value());
        self
    }

    /// Adds `column < value`.
    #[must_use]
    pub fn lt<V: ToSqlValue>(mut self, column: &str, value: V) -> Self {
        self.lt.push(column, value.to_sql_value());
        self
    }

    /// Adds `column <= value`.
    #[must_use]
    pub fn lte<V: ToSqlValue>(mut self, column: &str, value: V) -> Self {
        self.lte.push(column, value.to_sql_value());
        self
    }

    /// Adds a case-sensitive `column LIKE pattern`.
    #[must_use]
    pub fn like(mut self, column: &str, pattern: &str) -> Self {
        self.like.push(column, pattern.to_sql_value());
        self
    }

    /// Adds a case-insensitive pattern match.
    #[must_use]
    pub fn ilike(mut self, column: &str, pattern: &str) -> Self {
        self.ilike.push(column, pattern.to_sql_value());
        self
    }

    /// Adds `column IN (values...)`.
    #[must_use]
    pub fn in_list<V: ToSqlValue>(mut self, column: &str, values: Vec<V>) -> Self {
        self.in_list.push(
            column,
            values.into_iter().map(ToSqlValue::to_sql_value).collect(),
        );
        self
    }

    /// Adds an OR branch.
    #[must_use]
    pub fn or(mut self, branch: Self) -> Self {
        self.or.push(branch);
        self
    }

    /// Compiles the group into a WHERE-clause body (without the `WHERE`
    /// keyword) and its parameters. An empty group compiles to `""`.
    ///
    /// When `table` is given, every referenced column must exist in it.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidIdentifier`] for unsafe column names;
    /// - [`Error::InvalidPredicate`] for empty `in` lists, empty OR branches
    ///   and columns missing from `table`;
    /// - [`Error::UnsupportedOperation`] for `like` on SQLite.
    pub fn compile(
        &self,
        dialect: Dialect,
        table: Option<&TableSchema>,
    ) -> Result<(String, Vec<SqlValue>)> {
        let mut params = Vec::new();
        let fragments = self.fragments(dialect, table, &mut params)?;
        Ok((fragments.join(" AND "), params))
    }

    fn fragments(
        &self,
        dialect: Dialect,
        table: Option<&TableSchema>,
        params: &mut Vec<SqlValue>,
    ) -> Result<Vec<String>> {
        let mut fragments = Vec::new();
        let comparisons = [
            (CompareOp::Equals, &self.equals),
            (CompareOp::Gt, &self.gt),
            (CompareOp::Gte, &self.gte),
            (CompareOp::Lt, &self.lt),
            (CompareOp::Lte, &self.lte),
            (CompareOp::Like, &self.like),
            (CompareOp::Ilike, &self.ilike),
        ];
        for (op, conditions) in comparisons {
            for (column, value) in conditions.iter() {
                check_column(column, table)?;
                let op_sql = op.to_sql(dialect)?;
                fragments.push(format!(
                    "{column} {op_sql} {}",
                    dialect.parameter_placeholder()
                ));
                params.push(value.clone().encode_for(dialect));
            }
        }

        for (column, values) in self.in_list.iter() {
            check_column(column, table)?;
            if values.is_empty() {
                return Err(Error::predicate(format!("empty IN list for {column}")));
            }
            fragments.push(format!(
                "{column} IN ({})",
                dialect.placeholders(values.len())
            ));
            params.extend(values.iter().map(|v| v.clone().encode_for(dialect)));
        }

        if !self.or.is_empty() {
            let mut branches = Vec::with_capacity(self.or.len());
            for branch in &self.or {
                let inner = branch.fragments(dialect, table, params)?;
                match inner.len() {
                    0 => return Err(Error::predicate("empty OR branch")),
                    1 => branches.extend(inner),
                    _ => branches.push(format!("({})", inner.join(" AND "))),
                }
            }
            fragments.push(format!("({})", branches.join(" OR ")));
        }

        Ok(fragments)
    }
}

fn check_column(column: &str, table: Option<&TableSchema>) -> Result<()> {
    validate_identifier(column)?;
    if let Some(table) = table {
        if !table.has_column(column) {
            return Err(Error::predicate(format!(
                "column {column} does not exist in {}",
                table.name
            )));
        }
    }
    Ok(())
}
