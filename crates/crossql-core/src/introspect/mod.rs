//! Schema introspection.
//!
//! The core holds the catalog query text for each dialect and turns the rows
//! those queries return into a canonical [`TableSchema`]. Running the
//! queries is left to a driver crate, which implements [`Introspect`] for
//! its connections.
//!
//! Single-column indices that follow the normalizer's naming scheme
//! (`index__{table}__{column}`) fold back into the column's `index` flag,
//! so a table created from a schema introspects back to an equivalent
//! schema. See [`comparable`] for what "equivalent" means.

pub mod postgres;
pub mod sqlite;

use std::sync::LazyLock;

use regex::Regex;

use crate::dialect::Dialect;
use crate::error::Result;
use crate::ident::is_valid_identifier;
use crate::schema::{
    index_name, normalize_table, ColumnSchema, ConstraintSchema, IndexSchema, TableInput,
    TableSchema,
};
use crate::types::{convert_columntype_to_dialect, ColumnType};

/// Reads table schemas out of a live database.
pub trait Introspect {
    /// Error type for introspection failures.
    type Error: std::error::Error;

    /// Returns the names of the user tables, sorted.
    fn table_names(&self) -> std::result::Result<Vec<String>, Self::Error>;

    /// Reads the schema of `table`.
    fn introspect_table(&self, table: &str) -> std::result::Result<TableSchema, Self::Error>;
}

/// Returns the query listing user tables. It takes no parameters and
/// returns a single text column.
#[must_use]
pub const fn list_tables_query(dialect: Dialect) -> &'static str {
    match dialect {
        Dialect::Sqlite => sqlite::LIST_TABLES,
        Dialect::Postgres => postgres::LIST_TABLES,
    }
}

/// Rewrites `table` into the form introspection on `dialect` returns: every
/// column type native to `dialect`, no description, indices sorted by name.
///
/// Comparing `comparable(&schema, d)` with what introspection reads back
/// after creating `schema` on `d` is the round-trip check.
///
/// # Errors
///
/// Returns [`crate::Error::Schema`] for column types with no mapping to
/// `dialect`.
pub fn comparable(table: &TableSchema, dialect: Dialect) -> Result<TableSchema> {
    let mut table = table.clone();
    table.description = None;
    for column in &mut table.columns {
        column.column_type = ColumnType::native(&convert_columntype_to_dialect(
            &column.column_type,
            dialect,
        )?)?;
        column.description = None;
    }
    table.indices.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(table)
}

/// An index as read from a catalog, before folding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CatalogIndex {
    pub name: String,
    pub columns: Vec<String>,
    pub unique: bool,
    pub nulls_equal: bool,
}

/// Column list and null handling recovered from `CREATE INDEX` text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ParsedIndex {
    pub columns: Vec<String>,
    /// At least one column is wrapped in `COALESCE(col, ...)`.
    pub coalesced: bool,
    pub nulls_not_distinct: bool,
}

static INDEX_COLUMNS_START: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)\bON\s+[\w."]+\s*(?:USING\s+\w+\s*)?\("#).expect("valid regex")
});

static COALESCE_COLUMN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)^COALESCE\s*\(\s*"?(\w+)"?\s*,"#).expect("valid regex")
});

static NULLS_NOT_DISTINCT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bNULLS\s+NOT\s+DISTINCT\b").expect("valid regex"));

/// Parses the column list of a `CREATE INDEX` statement as stored by either
/// catalog. Returns `None` when an indexed expression is not a plain column
/// or a `COALESCE` around one.
pub(crate) fn parse_index_definition(sql: &str) -> Option<ParsedIndex> {
    let start = INDEX_COLUMNS_START.find(sql)?.end();
    let body = &sql[start..];
    let end = closing_paren(body)?;

    let mut columns = Vec::new();
    let mut coalesced = false;
    for item in split_top_level(&body[..end]) {
        let item = item.trim();
        let column = if let Some(caps) = COALESCE_COLUMN.captures(item) {
            coalesced = true;
            caps[1].to_string()
        } else {
            item.split_whitespace().next()?.trim_matches('"').to_string()
        };
        if !is_valid_identifier(&column) {
            return None;
        }
        columns.push(column);
    }
    if columns.is_empty() {
        return None;
    }

    Some(ParsedIndex {
        columns,
        coalesced,
        nulls_not_distinct: NULLS_NOT_DISTINCT.is_match(&body[end..]),
    })
}

/// Position of the parenthesis closing an already opened group.
fn closing_paren(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut quoted = false;
    for (i, ch) in text.char_indices() {
        match ch {
            '\'' => quoted = !quoted,
            '(' if !quoted => depth += 1,
            ')' if !quoted => {
                if depth == 0 {
                    return Some(i);
                }
                depth -= 1;
            }
            _ => {}
        }
    }
    None
}

/// Splits on commas outside parentheses and quotes.
pub(crate) fn split_top_level(text: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quoted = false;
    let mut start = 0;
    for (i, ch) in text.char_indices() {
        match ch {
            '\'' => quoted = !quoted,
            '(' if !quoted => depth += 1,
            ')' if !quoted => depth = depth.saturating_sub(1),
            ',' if !quoted && depth == 0 => {
                parts.push(&text[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&text[start..]);
    parts
}

/// Folds single-column unique sets into the column's `unique` flag and
/// returns the remaining multi-column sets as constraints.
pub(crate) fn fold_unique(
    columns: &mut [ColumnSchema],
    unique_sets: Vec<Vec<String>>,
) -> Vec<ConstraintSchema> {
    let mut constraints = Vec::new();
    for set in unique_sets {
        if let [name] = set.as_slice() {
            if let Some(column) = columns.iter_mut().find(|c| &c.name == name) {
                column.unique = true;
                column.index = true;
                continue;
            }
        }
        constraints.push(ConstraintSchema::unique(set));
    }
    constraints
}

/// Folds normalizer-named single-column indices into the column's `index`
/// flag and returns the rest, sorted by name.
///
/// For a non-unique index `nulls_equal` has no effect in the database, so
/// the normalizer's default (`columns > 1`) is reported.
pub(crate) fn fold_indices(
    table: &str,
    columns: &mut [ColumnSchema],
    found: Vec<CatalogIndex>,
) -> Vec<IndexSchema> {
    let mut indices = Vec::new();
    for index in found {
        if let [name] = index.columns.as_slice() {
            if !index.unique && index.name == index_name(table, &index.columns) {
                if let Some(column) = columns.iter_mut().find(|c| &c.name == name) {
                    column.index = true;
                    continue;
                }
            }
        }
        let nulls_equal = if index.unique {
            index.nulls_equal
        } else {
            index.columns.len() > 1
        };
        indices.push(IndexSchema {
            name: index.name,
            columns: index.columns,
            unique: index.unique,
            nulls_equal,
        });
    }
    indices.sort_by(|a, b| a.name.cmp(&b.name));
    indices
}

/// Runs the assembled parts through the normalizer so introspected schemas
/// satisfy the same checks as declared ones.
pub(crate) fn finish_table(
    table: &str,
    columns: Vec<ColumnSchema>,
    constraints: Vec<ConstraintSchema>,
    indices: Vec<IndexSchema>,
) -> Result<TableSchema> {
    normalize_table(TableInput::from(TableSchema {
        name: table.to_string(),
        description: None,
        columns,
        constraints,
        indices,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::GenericType;

    #[test]
    fn test_parse_plain_index() {
        let parsed =
            parse_index_definition("CREATE INDEX index__t__a__b ON t (a, b)").unwrap();
        assert_eq!(parsed.columns, vec!["a", "b"]);
        assert!(!parsed.coalesced);
        assert!(!parsed.nulls_not_distinct);
    }

    #[test]
    fn test_parse_coalesce_index() {
        let parsed = parse_index_definition(
            "CREATE UNIQUE INDEX index__t__a__b\nON t (COALESCE(a, x''), COALESCE(b, x''))",
        )
        .unwrap();
        assert_eq!(parsed.columns, vec!["a", "b"]);
        assert!(parsed.coalesced);
    }

    #[test]
    fn test_parse_postgres_coalesce_indexdef() {
        let parsed = parse_index_definition(
            "CREATE UNIQUE INDEX ix ON public.t USING btree \
             (COALESCE(a, ''::text), COALESCE(\"b\", ''::text))",
        )
        .unwrap();
        assert_eq!(parsed.columns, vec!["a", "b"]);
        assert!(parsed.coalesced);
        assert!(!parsed.nulls_not_distinct);
    }

    #[test]
    fn test_parse_postgres_indexdef() {
        let parsed = parse_index_definition(
            "CREATE UNIQUE INDEX ix ON public.t USING btree (a, \"b\") NULLS NOT DISTINCT",
        )
        .unwrap();
        assert_eq!(parsed.columns, vec!["a", "b"]);
        assert!(parsed.nulls_not_distinct);
    }

    #[test]
    fn test_parse_rejects_expressions() {
        assert!(parse_index_definition("CREATE INDEX ix ON t (lower(name))").is_none());
        assert!(parse_index_definition("CREATE INDEX ix ON t").is_none());
    }

    #[test]
    fn test_split_top_level() {
        assert_eq!(
            split_top_level("COALESCE(a, ','), b"),
            vec!["COALESCE(a, ',')", " b"]
        );
    }

    #[test]
    fn test_fold_indices() {
        let mut columns = vec![
            ColumnSchema::new("a", ColumnType::Generic(GenericType::Integer)),
            ColumnSchema::new("b", ColumnType::Generic(GenericType::Integer)),
        ];
        let indices = fold_indices(
            "t",
            &mut columns,
            vec![
                CatalogIndex {
                    name: String::from("index__t__a"),
                    columns: vec![String::from("a")],
                    unique: false,
                    nulls_equal: false,
                },
                CatalogIndex {
                    name: String::from("custom"),
                    columns: vec![String::from("b")],
                    unique: false,
                    nulls_equal: false,
                },
            ],
        );
        assert!(columns[0].index);
        assert!(!columns[1].index);
        assert_eq!(indices.len(), 1);
        assert_eq!(indices[0].name, "custom");
    }

    #[test]
    fn test_fold_unique() {
        let mut columns = vec![
            ColumnSchema::new("a", ColumnType::Generic(GenericType::Text)),
            ColumnSchema::new("b", ColumnType::Generic(GenericType::Text)),
        ];
        let constraints = fold_unique(
            &mut columns,
            vec![
                vec![String::from("a")],
                vec![String::from("a"), String::from("b")],
            ],
        );
        assert!(columns[0].unique && columns[0].index);
        assert_eq!(constraints, vec![ConstraintSchema::unique(["a", "b"])]);
    }

    #[test]
    fn test_list_tables_query() {
        assert!(list_tables_query(Dialect::Sqlite).contains("sqlite_master"));
        assert!(list_tables_query(Dialect::Postgres).contains("information_schema.tables"));
    }
}
