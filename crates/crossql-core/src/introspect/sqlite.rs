//! SQLite catalog queries and assembly.
//!
//! The `PRAGMA` table-valued functions are used instead of the `PRAGMA`
//! statements so the table name can be bound as a parameter.

use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

use super::{finish_table, fold_indices, fold_unique, parse_index_definition, CatalogIndex};
use crate::error::{Error, Result};
use crate::ident::validate_identifier;
use crate::schema::{ColumnSchema, DefaultValue, TableSchema};
use crate::types::ColumnType;

/// Lists user tables.
pub const LIST_TABLES: &str = "SELECT name FROM sqlite_master \
     WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name";

/// Columns of a table: `cid, name, type, notnull, dflt_value, pk`.
pub const TABLE_INFO: &str =
    "SELECT cid, name, type, \"notnull\", dflt_value, pk FROM pragma_table_info(?) ORDER BY cid";

/// Indices of a table: `name, unique, origin`.
pub const INDEX_LIST: &str = "SELECT name, \"unique\", origin FROM pragma_index_list(?)";

/// Columns of an index: `seqno, name`. `name` is NULL for an expression.
pub const INDEX_INFO: &str = "SELECT seqno, name FROM pragma_index_info(?) ORDER BY seqno";

/// Stored `CREATE TABLE` text of a table.
pub const TABLE_SQL: &str = "SELECT sql FROM sqlite_master WHERE type = 'table' AND name = ?";

/// Stored `CREATE INDEX` text of an index. NULL for automatic indices.
pub const INDEX_SQL: &str = "SELECT sql FROM sqlite_master WHERE type = 'index' AND name = ?";

static AUTOINCREMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bAUTOINCREMENT\b").expect("valid regex"));

/// One row of `pragma_table_info`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRow {
    pub cid: i64,
    pub name: String,
    pub type_name: String,
    pub notnull: bool,
    pub default: Option<String>,
    /// 1-based position in the primary key, 0 if not part of it.
    pub pk: i64,
}

/// One index of the table, combining `pragma_index_list`,
/// `pragma_index_info` and the stored SQL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexRow {
    pub name: String,
    pub unique: bool,
    /// `c` for `CREATE INDEX`, `u` for a UNIQUE constraint, `pk` for the
    /// primary key.
    pub origin: String,
    pub columns: Vec<Option<String>>,
    pub sql: Option<String>,
}

/// Everything read from the catalog for one table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    pub table_sql: Option<String>,
    pub columns: Vec<ColumnRow>,
    pub indices: Vec<IndexRow>,
}

/// Assembles the catalog rows of `table` into a canonical schema.
///
/// # Errors
///
/// Returns [`Error::TableDoesNotExist`] when the catalog has no columns
/// for the table, [`Error::Schema`] for column types neither dialect knows.
pub fn assemble(table: &str, catalog: Catalog) -> Result<TableSchema> {
    validate_identifier(table)?;
    if catalog.columns.is_empty() {
        return Err(Error::TableDoesNotExist {
            table: table.to_string(),
            source: None,
        });
    }

    let pk_count = catalog.columns.iter().filter(|c| c.pk > 0).count();
    let autoincrement = pk_count == 1
        && catalog
            .table_sql
            .as_deref()
            .is_some_and(|sql| AUTOINCREMENT.is_match(sql));

    let mut rows = catalog.columns;
    rows.sort_by_key(|c| c.cid);
    let mut columns = Vec::with_capacity(rows.len());
    for row in rows {
        let primary = row.pk > 0;
        // Only the rowid alias is NOT NULL without saying so.
        let rowid = primary && pk_count == 1 && row.type_name.eq_ignore_ascii_case("INTEGER");
        columns.push(ColumnSchema {
            column_type: ColumnType::native(&row.type_name)?,
            nullable: !row.notnull && !rowid,
            primary,
            unique: false,
            index: primary,
            autoincrement: primary && autoincrement,
            default: row.default.as_deref().and_then(DefaultValue::from_catalog),
            description: None,
            name: row.name,
        });
    }

    let mut unique_sets = Vec::new();
    let mut found = Vec::new();
    for index in catalog.indices {
        match index.origin.as_str() {
            "pk" => {}
            "u" => match resolve_columns(&index) {
                Some((names, _)) => unique_sets.push(names),
                None => warn!(index = %index.name, "Skipping unreadable unique constraint"),
            },
            _ => match resolve_columns(&index) {
                Some((names, nulls_equal)) => found.push(CatalogIndex {
                    name: index.name,
                    columns: names,
                    unique: index.unique,
                    nulls_equal,
                }),
                None => warn!(index = %index.name, "Skipping expression index"),
            },
        }
    }

    let constraints = fold_unique(&mut columns, unique_sets);
    let indices = fold_indices(table, &mut columns, found);
    debug!(table, columns = columns.len(), indices = indices.len(), "Introspected SQLite table");
    finish_table(table, columns, constraints, indices)
}

/// Column names of an index and whether it equates NULLs. Falls back to
/// the stored SQL when `pragma_index_info` reports an expression.
fn resolve_columns(index: &IndexRow) -> Option<(Vec<String>, bool)> {
    if let Some(names) = index.columns.iter().cloned().collect::<Option<Vec<String>>>() {
        if !names.is_empty() {
            return Some((names, false));
        }
    }
    let parsed = parse_index_definition(index.sql.as_deref()?)?;
    Some((parsed.columns, parsed.coalesced))
}
