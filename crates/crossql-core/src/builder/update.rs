//! UPDATE.

use std::collections::BTreeMap;

use tracing::debug;

use super::finish;
use crate::dialect::Dialect;
use crate::error::{Error, Result};
use crate::filter::WhereGroup;
use crate::ident::validate_identifier;
use crate::schema::TableSchema;
use crate::value::{SqlValue, ToSqlValue};

/// An UPDATE statement builder.
///
/// Without a where-group the statement touches every row and must be
/// confirmed with [`Update::all_rows`].
#[derive(Debug, Clone, Default)]
pub struct Update<'a> {
    table: String,
    assignments: Vec<(String, SqlValue)>,
    /// Column and value counts of the first `set_columns` call that did not
    /// pair up.
    mismatch: Option<(usize, usize)>,
    filter: WhereGroup,
    all_rows: bool,
    single_line: bool,
    context: Option<&'a TableSchema>,
}

impl<'a> Update<'a> {
    /// Creates an UPDATE of `table` with no assignments yet.
    #[must_use]
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            ..Self::default()
        }
    }

    /// Adds `column = value`.
    #[must_use]
    pub fn set<V: ToSqlValue>(mut self, column: impl Into<String>, value: V) -> Self {
        self.assignments.push((column.into(), value.to_sql_value()));
        self
    }

    /// Adds one assignment per entry of `values`.
    #[must_use]
    pub fn set_map(mut self, values: BTreeMap<String, SqlValue>) -> Self {
        self.assignments.extend(values);
        self
    }

    /// Pairs `columns` with `values` positionally. Each call must supply as
    /// many values as columns; a mismatch is reported by [`Update::build`]
    /// and nothing from that call is assigned.
    #[must_use]
    pub fn set_columns<I, S>(mut self, columns: I, values: Vec<SqlValue>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        if columns.len() == values.len() {
            self.assignments.extend(columns.into_iter().zip(values));
        } else if self.mismatch.is_none() {
            self.mismatch = Some((columns.len(), values.len()));
        }
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

    /// Confirms an UPDATE without a where-group.
    #[must_use]
    pub const fn all_rows(mut self) -> Self {
        self.all_rows = true;
        self
    }

    /// Checks assigned and filtered columns against `table`.
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

    /// Builds the statement. Parameters are the assigned values followed by
    /// the where-group parameters.
    ///
    /// # Errors
    ///
    /// - [`Error::Schema`] with no assignments, or when a
    ///   [`Update::set_columns`] call had a column and value list of
    ///   different lengths;
    /// - [`Error::ConfirmationRequired`] for an unconfirmed UPDATE of every
    ///   row;
    /// - identifier and where-group errors.
    pub fn build(&self, dialect: Dialect) -> Result<(String, Vec<SqlValue>)> {
        validate_identifier(&self.table)?;
        if let Some((columns, values)) = self.mismatch {
            return Err(Error::schema(format!(
                "{columns} columns but {values} values to update in {}",
                self.table
            )));
        }
        if self.assignments.is_empty() {
            return Err(Error::schema(format!("nothing to update in {}", self.table)));
        }

        let mut assignments = Vec::with_capacity(self.assignments.len());
        for (column, _) in &self.assignments {
            validate_identifier(column)?;
            if let Some(table) = self.context {
                if !table.has_column(column) {
                    return Err(Error::schema(format!(
                        "column {column} does not exist in {}",
                        table.name
                    )));
                }
            }
            assignments.push(format!("{column} = {}", dialect.parameter_placeholder()));
        }

        let (where_sql, where_params) = self.filter.compile(dialect, self.context)?;
        if where_sql.is_empty() && !self.all_rows {
            return Err(Error::ConfirmationRequired(format!(
                "UPDATE {} without WHERE",
                self.table
            )));
        }

        let mut sql = format!("UPDATE {}\nSET {}", self.table, assignments.join(", "));
        if !where_sql.is_empty() {
            sql.push_str("\nWHERE ");
            sql.push_str(&where_sql);
        }

        let mut params: Vec<SqlValue> = self
            .assignments
            .iter()
            .map(|(_, v)| v.clone().encode_for(dialect))
            .collect();
        params.extend(where_params);

        debug!(table = %self.table, params = params.len(), "Built UPDATE");
        Ok((finish(sql, self.single_line), params))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_with_where() {
        let (sql, params) = Update::new("pokemon")
            .set("height", 2)
            .set("name", "Onix")
            .where_equals("id", 95)
            .build(Dialect::Sqlite)
            .unwrap();
        assert_eq!(sql, "UPDATE pokemon\nSET height = ?, name = ?\nWHERE id = ?");
        assert_eq!(
            params,
            vec![
                SqlValue::Int(2),
                SqlValue::Text(String::from("Onix")),
                SqlValue::Int(95)
            ]
        );
    }

    #[test]
    fn test_set_columns_length_mismatch() {
        let update = Update::new("t")
            .set_columns(["a", "b"], vec![SqlValue::Int(1)])
            .all_rows();
        assert!(matches!(update.build(Dialect::Sqlite), Err(Error::Schema(_))));
    }

    #[test]
    fn test_set_columns_checked_per_call() {
        // Three columns and three values overall, but the calls do not pair up.
        let update = Update::new("t")
            .set_columns(["a", "b"], vec![SqlValue::Int(1)])
            .set_columns(["c"], vec![SqlValue::Int(2), SqlValue::Int(3)])
            .where_equals("id", 9);
        let err = update.build(Dialect::Sqlite).unwrap_err();
        assert!(
            matches!(err, Error::Schema(ref m) if m.contains("2 columns but 1 values")),
            "{err:?}"
        );

        let (sql, params) = Update::new("t")
            .set_columns(["a", "b"], vec![SqlValue::Int(1), SqlValue::Int(2)])
            .set_columns(["c"], vec![SqlValue::Int(3)])
            .where_equals("id", 9)
            .single_line()
            .build(Dialect::Sqlite)
            .unwrap();
        assert_eq!(sql, "UPDATE t SET a = ?, b = ?, c = ? WHERE id = ?");
        assert_eq!(
            params,
            vec![SqlValue::Int(1), SqlValue::Int(2), SqlValue::Int(3), SqlValue::Int(9)]
        );
    }

    #[test]
    fn test_every_row_requires_confirmation() {
        let update = Update::new("t").set("a", 1);
        assert!(matches!(
            update.clone().build(Dialect::Postgres),
            Err(Error::ConfirmationRequired(_))
        ));
        let (sql, _) = update.all_rows().single_line().build(Dialect::Postgres).unwrap();
        assert_eq!(sql, "UPDATE t SET a = %s");
    }

    #[test]
    fn test_set_map_is_sorted_and_json_encoded() {
        let values = BTreeMap::from([
            (String::from("stats"), SqlValue::Json(serde_json::json!([1, 2]))),
            (String::from("name"), SqlValue::from("Mew")),
        ]);
        let (sql, params) = Update::new("pokemon")
            .set_map(values)
            .where_equals("id", 151)
            .single_line()
            .build(Dialect::Sqlite)
            .unwrap();
        assert_eq!(sql, "UPDATE pokemon SET name = ?, stats = ? WHERE id = ?");
        assert_eq!(params[1], SqlValue::Text(String::from("[1,2]")));
    }

    #[test]
    fn test_empty_assignments() {
        assert!(matches!(
            Update::new("t").all_rows().build(Dialect::Sqlite),
            Err(Error::Schema(_))
        ));
    }
}
