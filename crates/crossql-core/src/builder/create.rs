//! CREATE TABLE and CREATE INDEX.

use tracing::debug;

use super::finish;
use crate::dialect::Dialect;
use crate::error::{Error, Result};
use crate::ident::{join_identifiers, validate_identifier};
use crate::schema::{index_name, ColumnSchema, ConstraintKind, IndexSchema, TableSchema};
use crate::types::{convert_columntype_to_dialect, TypeFamily};

/// Renders one column definition, e.g. `id INTEGER PRIMARY KEY AUTOINCREMENT`.
///
/// `inline_primary` is true when the column is the table's only primary-key
/// column; composite keys are rendered as a table constraint instead.
///
/// # Errors
///
/// Returns [`Error::InvalidIdentifier`] for an unsafe name and
/// [`Error::Schema`] for an unknown type or an autoincrement column that is
/// not an inline integer primary key.
pub fn column_definition(
    column: &ColumnSchema,
    dialect: Dialect,
    inline_primary: bool,
) -> Result<String> {
    validate_identifier(&column.name)?;
    let type_name = convert_columntype_to_dialect(&column.column_type, dialect)?;

    if column.autoincrement
        && (!inline_primary || column.column_type.family()? != TypeFamily::Integer)
    {
        return Err(Error::schema(format!(
            "autoincrement column {} must be the single integer primary key",
            column.name
        )));
    }

    let mut sql = column.name.clone();
    sql.push(' ');
    match (dialect, column.autoincrement) {
        (Dialect::Sqlite, true) => sql.push_str("INTEGER PRIMARY KEY AUTOINCREMENT"),
        (Dialect::Postgres, true) => {
            let serial = match type_name.as_str() {
                "SMALLINT" | "INTEGER" => "SERIAL",
                _ => "BIGSERIAL",
            };
            sql.push_str(serial);
            sql.push_str(" PRIMARY KEY");
        }
        (_, false) => {
            sql.push_str(&type_name);
            if inline_primary {
                sql.push_str(" PRIMARY KEY");
            }
        }
    }

    // PostgreSQL primary keys and the SQLite rowid alias (`INTEGER PRIMARY
    // KEY`) reject NULL on their own. Any other SQLite primary key accepts
    // NULL unless told otherwise.
    let implied_not_null = inline_primary
        && match dialect {
            Dialect::Postgres => true,
            Dialect::Sqlite => column.autoincrement || type_name == "INTEGER",
        };
    if !column.nullable && !implied_not_null {
        sql.push_str(" NOT NULL");
    }
    if column.unique && !column.primary {
        sql.push_str(" UNIQUE");
    }
    if let Some(default) = &column.default {
        sql.push_str(" DEFAULT ");
        sql.push_str(&default.to_sql());
    }
    Ok(sql)
}

/// Builds `CREATE TABLE` for a schema.
#[derive(Debug, Clone)]
pub struct CreateTable<'a> {
    table: &'a TableSchema,
    if_not_exists: bool,
    single_line: bool,
}

impl<'a> CreateTable<'a> {
    /// Creates a builder for `table`.
    #[must_use]
    pub const fn new(table: &'a TableSchema) -> Self {
        Self {
            table,
            if_not_exists: false,
            single_line: false,
        }
    }

    /// Adds `IF NOT EXISTS`.
    #[must_use]
    pub const fn if_not_exists(mut self) -> Self {
        self.if_not_exists = true;
        self
    }

    /// Renders the statement on a single line.
    #[must_use]
    pub const fn single_line(mut self) -> Self {
        self.single_line = true;
        self
    }

    /// Builds the statement.
    ///
    /// # Errors
    ///
    /// See [`column_definition`]; also [`Error::Schema`] for a table without
    /// columns or a constraint naming an unknown column.
    pub fn build(&self, dialect: Dialect) -> Result<String> {
        let table = self.table;
        validate_identifier(&table.name)?;
        if table.columns.is_empty() {
            return Err(Error::schema(format!("table {} has no columns", table.name)));
        }

        let primary_key = table.primary_key();
        let inline_primary = primary_key.len() == 1;

        let mut lines = table
            .columns
            .iter()
            .map(|c| column_definition(c, dialect, inline_primary && c.primary))
            .collect::<Result<Vec<_>>>()?;

        if primary_key.len() > 1 {
            lines.push(format!(
                "PRIMARY KEY ({})",
                join_identifiers(primary_key.iter().copied())?
            ));
        }
        for constraint in &table.constraints {
            if let Some(missing) = constraint.columns.iter().find(|c| !table.has_column(c)) {
                return Err(Error::schema(format!(
                    "constraint on {} references unknown column {missing}",
                    table.name
                )));
            }
            match constraint.kind {
                ConstraintKind::Unique => lines.push(format!(
                    "UNIQUE ({})",
                    join_identifiers(constraint.columns.iter().map(String::as_str))?
                )),
            }
        }

        let mut sql = String::from("CREATE TABLE ");
        if self.if_not_exists {
            sql.push_str("IF NOT EXISTS ");
        }
        sql.push_str(&table.name);
        sql.push_str(" (\n    ");
        sql.push_str(&lines.join(",\n    "));
        sql.push_str("\n)");

        debug!(table = %table.name, dialect = %dialect, "Built CREATE TABLE");
        Ok(finish(sql, self.single_line))
    }
}

/// Builds one `CREATE INDEX` statement.
#[derive(Debug, Clone)]
pub struct CreateIndex<'a> {
    table: &'a str,
    index: &'a IndexSchema,
    if_not_exists: bool,
    single_line: bool,
}

impl<'a> CreateIndex<'a> {
    /// Creates a builder for `index` on `table`.
    #[must_use]
    pub const fn new(table: &'a str, index: &'a IndexSchema) -> Self {
        Self {
            table,
            index,
            if_not_exists: false,
            single_line: false,
        }
    }

    /// Adds `IF NOT EXISTS`.
    #[must_use]
    pub const fn if_not_exists(mut self) -> Self {
        self.if_not_exists = true;
        self
    }

    /// Renders the statement on a single line.
    #[must_use]
    pub const fn single_line(mut self) -> Self {
        self.single_line = true;
        self
    }

    /// Builds the statement.
    ///
    /// A unique index with `nulls_equal` renders `NULLS NOT DISTINCT` on
    /// PostgreSQL (15+). SQLite has no such clause, so each column is
    /// indexed as `COALESCE(col, x'')`, which makes NULLs collide.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidIdentifier`] for unsafe names and
    /// [`Error::Schema`] for an index without columns.
    pub fn build(&self, dialect: Dialect) -> Result<String> {
        let index = self.index;
        validate_identifier(self.table)?;
        validate_identifier(&index.name)?;
        if index.columns.is_empty() {
            return Err(Error::schema(format!("index {} has no columns", index.name)));
        }
        let columns = join_identifiers(index.columns.iter().map(String::as_str))?;
        let null_equating = index.unique && index.nulls_equal;

        let mut sql = String::from("CREATE ");
        if index.unique {
            sql.push_str("UNIQUE ");
        }
        sql.push_str("INDEX ");
        if self.if_not_exists {
            sql.push_str("IF NOT EXISTS ");
        }
        sql.push_str(&index.name);
        sql.push_str("\nON ");
        sql.push_str(self.table);
        sql.push_str(" (");
        match dialect {
            Dialect::Sqlite if null_equating => {
                let wrapped: Vec<String> = index
                    .columns
                    .iter()
                    .map(|c| format!("COALESCE({c}, x'')"))
                    .collect();
                sql.push_str(&wrapped.join(", "));
                sql.push(')');
            }
            Dialect::Postgres if null_equating => {
                sql.push_str(&columns);
                sql.push_str(") NULLS NOT DISTINCT");
            }
            _ => {
                sql.push_str(&columns);
                sql.push(')');
            }
        }
        Ok(finish(sql, self.single_line))
    }
}

/// Builds every `CREATE INDEX` a table needs: one per column flagged `index`
/// that is neither primary nor unique (those are indexed implicitly), then
/// one per explicit index.
#[derive(Debug, Clone)]
pub struct CreateIndexes<'a> {
    table: &'a TableSchema,
    if_not_exists: bool,
    single_line: bool,
}

impl<'a> CreateIndexes<'a> {
    /// Creates a builder for the indices of `table`.
    #[must_use]
    pub const fn new(table: &'a TableSchema) -> Self {
        Self {
            table,
            if_not_exists: false,
            single_line: false,
        }
    }

    /// Adds `IF NOT EXISTS` to every statement.
    #[must_use]
    pub const fn if_not_exists(mut self) -> Self {
        self.if_not_exists = true;
        self
    }

    /// Renders each statement on a single line.
    #[must_use]
    pub const fn single_line(mut self) -> Self {
        self.single_line = true;
        self
    }

    /// Returns the index schemas that will be created, column-level first.
    #[must_use]
    pub fn indices(&self) -> Vec<IndexSchema> {
        let table = self.table;
        table
            .columns
            .iter()
            .filter(|c| c.index && !c.primary && !c.unique)
            .map(|c| IndexSchema {
                name: index_name(&table.name, &[c.name.as_str()]),
                columns: vec![c.name.clone()],
                unique: false,
                nulls_equal: false,
            })
            .chain(table.indices.iter().cloned())
            .collect()
    }

    /// Builds the statements.
    ///
    /// # Errors
    ///
    /// See [`CreateIndex::build`]; also [`Error::Schema`] for an index naming
    /// an unknown column.
    pub fn build(&self, dialect: Dialect) -> Result<Vec<String>> {
        self.indices()
            .iter()
            .map(|index| {
                if let Some(missing) = index.columns.iter().find(|c| !self.table.has_column(c)) {
                    return Err(Error::schema(format!(
                        "index {} references unknown column {missing}",
                        index.name
                    )));
                }
                let mut builder = CreateIndex::new(&self.table.name, index);
                builder.if_not_exists = self.if_not_exists;
                builder.single_line = self.single_line;
                builder.build(dialect)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{normalize_table, ColumnPartial, ConstraintSchema, DefaultValue, IndexInput, TableInput};
    use crate::types::{ColumnType, ScalarType};

    fn int() -> ColumnType {
        ColumnType::Scalar(ScalarType::Int)
    }

    fn text() -> ColumnType {
        ColumnType::Scalar(ScalarType::Str)
    }

    #[test]
    fn test_create_table_sqlite() {
        let table = normalize_table(
            TableInput::new("pokemon")
                .column("id", ColumnPartial::of(int()).primary(true).autoincrement(true))
                .column("name", ColumnPartial::of(text()).nullable(false).unique(true))
                .column(
                    "primary_type",
                    ColumnPartial::of(text()).default_value(DefaultValue::Text(String::from("NORMAL"))),
                )
                .column("stats", ColumnType::Scalar(ScalarType::Mapping)),
        )
        .unwrap();
        let sql = CreateTable::new(&table).build(Dialect::Sqlite).unwrap();
        assert_eq!(
            sql,
            "CREATE TABLE pokemon (\n    \
             id INTEGER PRIMARY KEY AUTOINCREMENT,\n    \
             name TEXT NOT NULL UNIQUE,\n    \
             primary_type TEXT DEFAULT 'NORMAL',\n    \
             stats JSON\n)"
        );
    }

    #[test]
    fn test_create_table_postgres() {
        let table = normalize_table(
            TableInput::new("pokemon")
                .column("id", ColumnPartial::of(int()).primary(true).autoincrement(true))
                .column("stats", ColumnType::Scalar(ScalarType::Mapping)),
        )
        .unwrap();
        let sql = CreateTable::new(&table)
            .if_not_exists()
            .single_line()
            .build(Dialect::Postgres)
            .unwrap();
        assert_eq!(
            sql,
            "CREATE TABLE IF NOT EXISTS pokemon (id BIGSERIAL PRIMARY KEY, stats JSONB)"
        );
    }

    #[test]
    fn test_text_primary_key_is_not_null_on_sqlite() {
        let table = normalize_table(
            TableInput::new("codes")
                .column("code", ColumnPartial::of(text()).primary(true))
                .column("v", int()),
        )
        .unwrap();
        assert_eq!(
            CreateTable::new(&table)
                .single_line()
                .build(Dialect::Sqlite)
                .unwrap(),
            "CREATE TABLE codes (code TEXT PRIMARY KEY NOT NULL, v INTEGER)"
        );
        assert_eq!(
            CreateTable::new(&table)
                .single_line()
                .build(Dialect::Postgres)
                .unwrap(),
            "CREATE TABLE codes (code TEXT PRIMARY KEY, v BIGINT)"
        );

        let rowid = normalize_table(
            TableInput::new("t").column("id", ColumnPartial::of(int()).primary(true)),
        )
        .unwrap();
        assert_eq!(
            CreateTable::new(&rowid)
                .single_line()
                .build(Dialect::Sqlite)
                .unwrap(),
            "CREATE TABLE t (id INTEGER PRIMARY KEY)"
        );
    }

    #[test]
    fn test_composite_primary_key_and_unique_constraint() {
        let table = normalize_table(
            TableInput::new("evolutions")
                .column("from_id", ColumnPartial::of(int()).primary(true))
                .column("to_id", ColumnPartial::of(int()).primary(true))
                .column("level", int())
                .column("item", text())
                .constraint(ConstraintSchema::unique(["level", "item"])),
        )
        .unwrap();
        let sql = CreateTable::new(&table)
            .single_line()
            .build(Dialect::Sqlite)
            .unwrap();
        assert_eq!(
            sql,
            "CREATE TABLE evolutions (from_id INTEGER NOT NULL, to_id INTEGER NOT NULL, \
             level INTEGER, item TEXT, PRIMARY KEY (from_id, to_id), UNIQUE (level, item))"
        );
    }

    #[test]
    fn test_create_indexes() {
        let table = normalize_table(
            TableInput::new("pokemon")
                .column("id", ColumnPartial::of(int()).primary(true))
                .column("name", ColumnPartial::of(text()).unique(true))
                .column("height", ColumnPartial::of(int()).index(true))
                .column("a", int())
                .column("b", int())
                .index(IndexInput::on(["a", "b"]).unique(true)),
        )
        .unwrap();

        let sqlite = CreateIndexes::new(&table)
            .single_line()
            .build(Dialect::Sqlite)
            .unwrap();
        assert_eq!(
            sqlite,
            vec![
                "CREATE INDEX index__pokemon__height ON pokemon (height)".to_string(),
                "CREATE UNIQUE INDEX index__pokemon__a__b ON pokemon (COALESCE(a, x''), COALESCE(b, x''))"
                    .to_string(),
            ]
        );

        let postgres = CreateIndexes::new(&table)
            .if_not_exists()
            .single_line()
            .build(Dialect::Postgres)
            .unwrap();
        assert_eq!(
            postgres[1],
            "CREATE UNIQUE INDEX IF NOT EXISTS index__pokemon__a__b ON pokemon (a, b) NULLS NOT DISTINCT"
        );
    }

    #[test]
    fn test_unique_index_without_nulls_equal() {
        let index = IndexSchema {
            name: String::from("ix"),
            columns: vec![String::from("a"), String::from("b")],
            unique: true,
            nulls_equal: false,
        };
        let sql = CreateIndex::new("t", &index)
            .single_line()
            .build(Dialect::Sqlite)
            .unwrap();
        assert_eq!(sql, "CREATE UNIQUE INDEX ix ON t (a, b)");
    }

    #[test]
    fn test_invalid_names_rejected() {
        let mut table = normalize_table(TableInput::new("t").column("a", int())).unwrap();
        table.columns[0].name = String::from("a;--");
        assert!(matches!(
            CreateTable::new(&table).build(Dialect::Sqlite),
            Err(Error::InvalidIdentifier(_))
        ));
    }

    #[test]
    fn test_unknown_type_rejected() {
        let mut table = normalize_table(TableInput::new("t").column("a", int())).unwrap();
        table.columns[0].column_type = ColumnType::Native(String::from("GEOMETRY"));
        assert!(matches!(
            CreateTable::new(&table).build(Dialect::Postgres),
            Err(Error::Schema(_))
        ));
    }
}
