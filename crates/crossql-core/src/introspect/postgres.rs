//! PostgreSQL catalog queries and assembly.
//!
//! Every query is scoped to `current_schema()` and takes the table name as
//! its only parameter. Catalog columns of domain types (`sql_identifier`,
//! `cardinal_number`) are cast to plain `text` and `int4`.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

use super::{finish_table, fold_indices, fold_unique, parse_index_definition, CatalogIndex};
use crate::error::{Error, Result};
use crate::ident::validate_identifier;
use crate::schema::{ColumnSchema, DefaultValue, TableSchema};
use crate::types::ColumnType;

/// Lists user tables.
pub const LIST_TABLES: &str = "SELECT table_name::text FROM information_schema.tables \
     WHERE table_schema = current_schema() AND table_type = 'BASE TABLE' \
     ORDER BY table_name";

/// Columns: `column_name, data_type, is_nullable, column_default,
/// character_maximum_length`.
pub const COLUMNS: &str = "SELECT column_name::text, data_type::text, is_nullable::text, \
     column_default::text, character_maximum_length::int4 \
     FROM information_schema.columns \
     WHERE table_schema = current_schema() AND table_name = %s \
     ORDER BY ordinal_position";

/// Primary-key columns in key order: `attname`.
pub const PRIMARY_KEY: &str = "SELECT a.attname::text \
     FROM pg_catalog.pg_index ix \
     JOIN pg_catalog.pg_attribute a ON a.attrelid = ix.indrelid AND a.attnum = ANY(ix.indkey) \
     WHERE ix.indrelid = %s::text::regclass AND ix.indisprimary \
     ORDER BY array_position(ix.indkey, a.attnum)";

/// Primary-key and unique constraints: `conname, contype, definition`.
pub const CONSTRAINTS: &str = "SELECT con.conname::text, con.contype::text, \
     pg_catalog.pg_get_constraintdef(con.oid) AS definition \
     FROM pg_catalog.pg_constraint con \
     WHERE con.conrelid = %s::text::regclass AND con.contype IN ('p', 'u') \
     ORDER BY con.conname";

/// Indices: `indexname, indexdef`.
pub const INDEXES: &str = "SELECT indexname::text, indexdef FROM pg_catalog.pg_indexes \
     WHERE schemaname = current_schema() AND tablename = %s \
     ORDER BY indexname";

static CONSTRAINT_COLUMNS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^UNIQUE(?:\s+NULLS\s+NOT\s+DISTINCT)?\s*\((.+)\)$").expect("valid regex")
});

/// One row of `information_schema.columns`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRow {
    pub name: String,
    pub data_type: String,
    /// `YES` or `NO`.
    pub is_nullable: String,
    pub default: Option<String>,
    pub character_maximum_length: Option<i32>,
}

/// One row of `pg_constraint`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstraintRow {
    pub name: String,
    /// `p` or `u`.
    pub kind: String,
    /// Output of `pg_get_constraintdef`, e.g. `UNIQUE (a, b)`.
    pub definition: String,
}

/// One row of `pg_indexes`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexRow {
    pub name: String,
    pub definition: String,
}

/// Everything read from the catalog for one table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    pub columns: Vec<ColumnRow>,
    pub primary_key: Vec<String>,
    pub constraints: Vec<ConstraintRow>,
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

    let single_key = catalog.primary_key.len() == 1;
    let mut columns = Vec::with_capacity(catalog.columns.len());
    for row in catalog.columns {
        let primary = catalog.primary_key.contains(&row.name);
        let type_name = match row.character_maximum_length {
            Some(length) => format!("{}({length})", row.data_type),
            None => row.data_type.clone(),
        };
        let sequence = row
            .default
            .as_deref()
            .is_some_and(|d| d.trim_start().starts_with("nextval("));
        if sequence && !(primary && single_key) {
            warn!(table, column = %row.name, "Ignoring sequence default outside a single primary key");
        }
        columns.push(ColumnSchema {
            column_type: ColumnType::native(&type_name)?,
            nullable: row.is_nullable.eq_ignore_ascii_case("YES") && !primary,
            primary,
            unique: false,
            index: primary,
            autoincrement: sequence && primary && single_key,
            default: row.default.as_deref().and_then(DefaultValue::from_catalog),
            description: None,
            name: row.name,
        });
    }

    let backing: HashSet<&str> = catalog.constraints.iter().map(|c| c.name.as_str()).collect();
    let mut unique_sets = Vec::new();
    for constraint in catalog.constraints.iter().filter(|c| c.kind == "u") {
        match constraint_columns(&constraint.definition) {
            Some(names) => unique_sets.push(names),
            None => warn!(constraint = %constraint.name, "Skipping unreadable unique constraint"),
        }
    }

    let mut found = Vec::new();
    for index in &catalog.indices {
        if backing.contains(index.name.as_str()) {
            continue;
        }
        match parse_index_definition(&index.definition) {
            Some(parsed) => found.push(CatalogIndex {
                name: index.name.clone(),
                columns: parsed.columns,
                unique: index.definition.trim_start().to_uppercase().starts_with("CREATE UNIQUE"),
                nulls_equal: parsed.nulls_not_distinct || parsed.coalesced,
            }),
            None => warn!(index = %index.name, "Skipping expression index"),
        }
    }

    let constraints = fold_unique(&mut columns, unique_sets);
    let indices = fold_indices(table, &mut columns, found);
    debug!(table, columns = columns.len(), indices = indices.len(), "Introspected PostgreSQL table");
    finish_table(table, columns, constraints, indices)
}

fn constraint_columns(definition: &str) -> Option<Vec<String>> {
    let caps = CONSTRAINT_COLUMNS.captures(definition.trim())?;
    let names: Vec<String> = caps[1]
        .split(',')
        .map(|c| c.trim().trim_matches('"').to_string())
        .collect();
    names
        .iter()
        .all(|n| validate_identifier(n).is_ok())
        .then_some(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ConstraintSchema, IndexSchema};

    fn column(name: &str, data_type: &str, nullable: bool, default: Option<&str>) -> ColumnRow {
        ColumnRow {
            name: name.to_string(),
            data_type: data_type.to_string(),
            is_nullable: String::from(if nullable { "YES" } else { "NO" }),
            default: default.map(str::to_string),
            character_maximum_length: None,
        }
    }

    fn constraint(name: &str, kind: &str, definition: &str) -> ConstraintRow {
        ConstraintRow {
            name: name.to_string(),
            kind: kind.to_string(),
            definition: definition.to_string(),
        }
    }

    fn index(name: &str, definition: &str) -> IndexRow {
        IndexRow {
            name: name.to_string(),
            definition: definition.to_string(),
        }
    }

    #[test]
    fn test_missing_table() {
        assert!(assemble("nope", Catalog::default())
            .unwrap_err()
            .is_table_missing());
    }

    #[test]
    fn test_bigserial_primary_key() {
        let catalog = Catalog {
            columns: vec![
                column("id", "bigint", false, Some("nextval('pokemon_id_seq'::regclass)")),
                column("name", "character varying", true, Some("'unknown'::character varying")),
                column("caught_at", "timestamp without time zone", true, None),
            ],
            primary_key: vec![String::from("id")],
            constraints: vec![constraint("pokemon_pkey", "p", "PRIMARY KEY (id)")],
            indices: vec![index(
                "pokemon_pkey",
                "CREATE UNIQUE INDEX pokemon_pkey ON public.pokemon USING btree (id)",
            )],
        };
        let table = assemble("pokemon", catalog).unwrap();
        let id = table.column("id").unwrap();
        assert!(id.primary && id.autoincrement && !id.nullable);
        assert_eq!(id.default, None);
        assert_eq!(id.column_type, ColumnType::Native(String::from("BIGINT")));
        let name = table.column("name").unwrap();
        assert_eq!(name.column_type, ColumnType::Native(String::from("VARCHAR")));
        assert_eq!(name.default, Some(DefaultValue::Text(String::from("unknown"))));
        assert_eq!(
            table.column("caught_at").unwrap().column_type,
            ColumnType::Native(String::from("TIMESTAMP"))
        );
        assert!(table.indices.is_empty());
    }

    #[test]
    fn test_varchar_length() {
        let mut code = column("code", "character varying", false, None);
        code.character_maximum_length = Some(8);
        let catalog = Catalog {
            columns: vec![code],
            ..Catalog::default()
        };
        let table = assemble("t", catalog).unwrap();
        assert_eq!(
            table.columns[0].column_type,
            ColumnType::Native(String::from("VARCHAR(8)"))
        );
    }

    #[test]
    fn test_constraints_and_indices() {
        let catalog = Catalog {
            columns: vec![
                column("a", "text", false, None),
                column("b", "text", true, None),
                column("c", "integer", true, Some("0")),
            ],
            primary_key: vec![],
            constraints: vec![
                constraint("t_a_key", "u", "UNIQUE (a)"),
                constraint("t_b_c_key", "u", "UNIQUE (b, c)"),
            ],
            indices: vec![
                index("t_a_key", "CREATE UNIQUE INDEX t_a_key ON public.t USING btree (a)"),
                index("t_b_c_key", "CREATE UNIQUE INDEX t_b_c_key ON public.t USING btree (b, c)"),
                index("index__t__c", "CREATE INDEX index__t__c ON public.t USING btree (c)"),
                index(
                    "index__t__b__c",
                    "CREATE UNIQUE INDEX index__t__b__c ON public.t USING btree (b, c) NULLS NOT DISTINCT",
                ),
            ],
        };
        let table = assemble("t", catalog).unwrap();
        assert!(table.column("a").unwrap().unique);
        assert!(table.column("c").unwrap().index);
        assert_eq!(table.column("c").unwrap().default, Some(DefaultValue::Integer(0)));
        assert_eq!(table.constraints, vec![ConstraintSchema::unique(["b", "c"])]);
        assert_eq!(
            table.indices,
            vec![IndexSchema {
                name: String::from("index__t__b__c"),
                columns: vec![String::from("b"), String::from("c")],
                unique: true,
                nulls_equal: true,
            }]
        );
    }

    #[test]
    fn test_unique_index_without_nulls_not_distinct() {
        let catalog = Catalog {
            columns: vec![column("a", "text", true, None), column("b", "text", true, None)],
            indices: vec![index(
                "ix",
                "CREATE UNIQUE INDEX ix ON public.t USING btree (a, b)",
            )],
            ..Catalog::default()
        };
        let table = assemble("t", catalog).unwrap();
        assert!(!table.indices[0].nulls_equal);
    }

    #[test]
    fn test_coalesce_index_reads_as_nulls_equal() {
        let catalog = Catalog {
            columns: vec![column("a", "text", true, None), column("b", "text", true, None)],
            indices: vec![index(
                "ix",
                "CREATE UNIQUE INDEX ix ON public.t USING btree \
                 (COALESCE(a, ''::text), COALESCE(b, ''::text))",
            )],
            ..Catalog::default()
        };
        let table = assemble("t", catalog).unwrap();
        assert_eq!(
            table.indices,
            vec![IndexSchema {
                name: String::from("ix"),
                columns: vec![String::from("a"), String::from("b")],
                unique: true,
                nulls_equal: true,
            }]
        );
    }

    #[test]
    fn test_constraint_columns() {
        assert_eq!(
            constraint_columns("UNIQUE NULLS NOT DISTINCT (a, \"b\")"),
            Some(vec![String::from("a"), String::from("b")])
        );
        assert_eq!(constraint_columns("CHECK (a > 0)"), None);
    }
}
