//! Shorthand input to canonical `TableSchema`.

use std::collections::HashSet;

use tracing::debug;

use super::input::{ColumnInput, ColumnPartial, ColumnsInput, IndexInput, TableInput};
use super::{ColumnSchema, ConstraintSchema, DefaultValue, IndexSchema, TableSchema};
use crate::error::{Error, Result};
use crate::ident::validate_identifier;
use crate::types::TypeFamily;

/// Returns the synthesized name of an index over `columns` of `table`:
/// `index__{table}__{col1}__{col2}...`.
#[must_use]
pub fn index_name<S: AsRef<str>>(table: &str, columns: &[S]) -> String {
    let mut name = format!("index__{table}");
    for column in columns {
        name.push_str("__");
        name.push_str(column.as_ref());
    }
    name
}

/// Normalizes shorthand table input into a canonical schema.
///
/// Defaults applied to each column: `primary = false`,
/// `nullable = !primary`, `unique = false`, `autoincrement = false` and
/// `index = unique || primary`. Indices get a synthesized name when unnamed,
/// `unique = false` and `nulls_equal = columns.len() > 1`.
///
/// Normalizing an already canonical schema (converted back with
/// `TableInput::from`) yields the same schema.
///
/// # Errors
///
/// Returns [`Error::Schema`] for malformed input (unknown types, duplicate
/// or missing column names, conflicting names, invalid autoincrement,
/// references to missing columns) and [`Error::InvalidIdentifier`] for
/// names that fail the identifier check. Nothing is returned on error.
pub fn normalize_table(input: TableInput) -> Result<TableSchema> {
    let TableInput {
        name,
        description,
        columns,
        constraints,
        indices,
    } = input;
    validate_identifier(&name)?;

    let columns = normalize_columns(columns)?;
    check_autoincrement(&name, &columns)?;

    let known: HashSet<&str> = columns.iter().map(|c| c.name.as_str()).collect();
    let constraints = constraints
        .into_iter()
        .map(|c| normalize_constraint(&name, c, &known))
        .collect::<Result<Vec<_>>>()?;
    let indices = indices
        .into_iter()
        .map(|i| normalize_index(&name, i, &known))
        .collect::<Result<Vec<_>>>()?;

    debug!(
        table = %name,
        columns = columns.len(),
        indices = indices.len(),
        "Normalized table schema"
    );

    Ok(TableSchema {
        name,
        description,
        columns,
        constraints,
        indices,
    })
}

fn normalize_columns(input: ColumnsInput) -> Result<Vec<ColumnSchema>> {
    let named: Vec<(Option<String>, ColumnInput)> = match input {
        ColumnsInput::List(list) => list.into_iter().map(|c| (None, c)).collect(),
        ColumnsInput::Map(map) => map.into_iter().map(|(k, c)| (Some(k), c)).collect(),
    };
    if named.is_empty() {
        return Err(Error::schema("table has no columns"));
    }

    let mut seen = HashSet::new();
    let mut columns = Vec::with_capacity(named.len());
    for (key, column) in named {
        let column = normalize_column(key, column)?;
        if !seen.insert(column.name.clone()) {
            return Err(Error::schema(format!("duplicate column: {}", column.name)));
        }
        columns.push(column);
    }
    Ok(columns)
}

fn normalize_column(key: Option<String>, input: ColumnInput) -> Result<ColumnSchema> {
    let partial = match input {
        ColumnInput::Ref(column_type) => ColumnPartial::of(column_type),
        ColumnInput::Partial(partial) => partial,
        ColumnInput::Full(column) => ColumnPartial {
            name: Some(column.name),
            column_type: Some(column.column_type),
            nullable: Some(column.nullable),
            primary: Some(column.primary),
            unique: Some(column.unique),
            index: Some(column.index),
            autoincrement: Some(column.autoincrement),
            default: column.default,
            description: column.description,
        },
    };

    let name = match (key, partial.name) {
        (Some(key), Some(explicit)) if key != explicit => {
            return Err(Error::schema(format!(
                "column key {key} conflicts with explicit name {explicit}"
            )));
        }
        (Some(name), _) | (None, Some(name)) => name,
        (None, None) => return Err(Error::schema("column in sequence form has no name")),
    };
    validate_identifier(&name)?;

    let column_type = partial
        .column_type
        .ok_or_else(|| Error::schema(format!("column {name} has no type")))?
        .canonical()?;

    if let Some(DefaultValue::Float(f)) = &partial.default {
        if !f.is_finite() {
            return Err(Error::schema(format!(
                "default of column {name} must be a finite number, got {f}"
            )));
        }
    }

    let primary = partial.primary.unwrap_or(false);
    let unique = partial.unique.unwrap_or(false);
    Ok(ColumnSchema {
        name,
        column_type,
        nullable: partial.nullable.unwrap_or(!primary),
        primary,
        unique,
        index: partial.index.unwrap_or(unique || primary),
        autoincrement: partial.autoincrement.unwrap_or(false),
        default: partial.default,
        description: partial.description,
    })
}

fn check_autoincrement(table: &str, columns: &[ColumnSchema]) -> Result<()> {
    let primary_count = columns.iter().filter(|c| c.primary).count();
    for column in columns.iter().filter(|c| c.autoincrement) {
        if !column.primary || primary_count != 1 {
            return Err(Error::schema(format!(
                "autoincrement column {table}.{} must be the single primary key",
                column.name
            )));
        }
        if column.column_type.family()? != TypeFamily::Integer {
            return Err(Error::schema(format!(
                "autoincrement column {table}.{} must be an integer",
                column.name
            )));
        }
    }
    Ok(())
}

fn check_columns(table: &str, what: &str, columns: &[String], known: &HashSet<&str>) -> Result<()> {
    if columns.is_empty() {
        return Err(Error::schema(format!("{what} on {table} has no columns")));
    }
    for column in columns {
        if !known.contains(column.as_str()) {
            return Err(Error::schema(format!(
                "{what} on {table} references unknown column {column}"
            )));
        }
    }
    Ok(())
}

fn normalize_constraint(
    table: &str,
    constraint: ConstraintSchema,
    known: &HashSet<&str>,
) -> Result<ConstraintSchema> {
    check_columns(table, "constraint", &constraint.columns, known)?;
    Ok(constraint)
}

fn normalize_index(table: &str, index: IndexInput, known: &HashSet<&str>) -> Result<IndexSchema> {
    check_columns(table, "index", &index.columns, known)?;
    let name = index
        .name
        .unwrap_or_else(|| index_name(table, &index.columns));
    validate_identifier(&name)?;
    let nulls_equal = index.nulls_equal.unwrap_or(index.columns.len() > 1);
    Ok(IndexSchema {
        name,
        unique: index.unique.unwrap_or(false),
        nulls_equal,
        columns: index.columns,
    })
}
