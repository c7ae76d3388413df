//! Canonical schema representation.
//!
//! These types describe tables the way every other component consumes them:
//! the statement builders render them, the introspector reads them back out
//! of a live catalog, and the normalizer produces them from shorthand input.
//! A `TableSchema` produced by [`normalize_table`] is fully resolved: every
//! flag is explicit and every index has a name.

mod input;
mod normalize;

use serde::{Deserialize, Serialize};

use crate::types::ColumnType;

pub use input::{ColumnInput, ColumnPartial, ColumnsInput, IndexInput, TableInput};
pub use normalize::{index_name, normalize_table};

/// Default value of a column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DefaultValue {
    /// NULL default.
    Null,
    /// Boolean default.
    Bool(bool),
    /// Integer default.
    Integer(i64),
    /// Float default.
    Float(f64),
    /// Text default, rendered as a quoted literal.
    Text(String),
    /// SQL expression rendered verbatim (e.g. `CURRENT_TIMESTAMP`).
    Expression(String),
}

impl DefaultValue {
    /// Returns the SQL representation of this default value.
    #[must_use]
    pub fn to_sql(&self) -> String {
        match self {
            Self::Null => "NULL".to_string(),
            Self::Bool(b) => (if *b { "TRUE" } else { "FALSE" }).to_string(),
            Self::Integer(i) => i.to_string(),
            // Debug keeps a decimal point or exponent, so `1.0` reads back
            // as a float.
            Self::Float(f) => format!("{f:?}"),
            Self::Text(s) => format!("'{}'", s.replace('\'', "''")),
            Self::Expression(expr) => expr.clone(),
        }
    }

    /// Parses a default as reported by a catalog (`dflt_value` in SQLite,
    /// `column_default` in PostgreSQL).
    ///
    /// Returns `None` for sequence defaults (`nextval(...)`), which mark an
    /// autoincrement column rather than a default.
    #[must_use]
    pub fn from_catalog(text: &str) -> Option<Self> {
        let text = text.trim();
        if text.starts_with("nextval(") {
            return None;
        }
        // PostgreSQL reports negative numbers as `'-1'::integer` or `(-1)`.
        let unwrapped = text
            .strip_prefix('(')
            .and_then(|t| t.strip_suffix(')'))
            .unwrap_or(text);
        let (literal, cast) = split_cast(unwrapped);

        if literal.eq_ignore_ascii_case("null") {
            return Some(Self::Null);
        }
        if literal.eq_ignore_ascii_case("true") {
            return Some(Self::Bool(true));
        }
        if literal.eq_ignore_ascii_case("false") {
            return Some(Self::Bool(false));
        }
        if let Some(quoted) = literal
            .strip_prefix('\'')
            .and_then(|t| t.strip_suffix('\''))
        {
            let inner = quoted.replace("''", "'");
            let numeric_cast = cast.is_some_and(|c| {
                matches!(
                    c,
                    "integer" | "bigint" | "smallint" | "numeric" | "double precision" | "real"
                )
            });
            if numeric_cast {
                if let Some(number) = parse_number(&inner) {
                    return Some(number);
                }
            }
            return Some(Self::Text(inner));
        }
        if cast.is_none() {
            if let Some(number) = parse_number(literal) {
                return Some(number);
            }
        }
        Some(Self::Expression(text.to_string()))
    }
}

fn split_cast(text: &str) -> (&str, Option<&str>) {
    // A cast follows the closing quote of a literal; `::` inside the literal
    // is part of the value.
    let search_from = if text.starts_with('\'') {
        text.rfind('\'').unwrap_or(0)
    } else {
        0
    };
    text[search_from..].find("::").map_or((text, None), |pos| {
        let pos = search_from + pos;
        (&text[..pos], Some(text[pos + 2..].trim()))
    })
}

fn parse_number(text: &str) -> Option<DefaultValue> {
    text.parse::<i64>()
        .map(DefaultValue::Integer)
        .ok()
        .or_else(|| {
            text.parse::<f64>()
                .ok()
                .filter(|f| f.is_finite())
                .map(DefaultValue::Float)
        })
}

/// A column of a table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ColumnSchema {
    /// Column name.
    pub name: String,
    /// Column type, native or generic once normalized.
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    /// Whether the column allows NULL values.
    pub nullable: bool,
    /// Whether this column is part of the primary key.
    pub primary: bool,
    /// Whether this column has a UNIQUE constraint.
    pub unique: bool,
    /// Whether this column is indexed.
    pub index: bool,
    /// Whether this column auto-increments.
    pub autoincrement: bool,
    /// Default value.
    #[serde(default)]
    pub default: Option<DefaultValue>,
    /// Free-form description.
    #[serde(default)]
    pub description: Option<String>,
}

impl ColumnSchema {
    /// Creates a nullable, unindexed column.
    #[must_use]
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            nullable: true,
            primary: false,
            unique: false,
            index: false,
            autoincrement: false,
            default: None,
            description: None,
        }
    }

    /// Marks the column as NOT NULL.
    #[must_use]
    pub const fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// Marks the column as (part of) the primary key.
    #[must_use]
    pub const fn primary_key(mut self) -> Self {
        self.primary = true;
        self.nullable = false;
        self.index = true;
        self
    }

    /// Marks the column as unique.
    #[must_use]
    pub const fn unique(mut self) -> Self {
        self.unique = true;
        self.index = true;
        self
    }

    /// Marks the column as indexed.
    #[must_use]
    pub const fn indexed(mut self) -> Self {
        self.index = true;
        self
    }

    /// Marks the column as auto-incrementing.
    #[must_use]
    pub const fn autoincrement(mut self) -> Self {
        self.autoincrement = true;
        self
    }

    /// Sets the default value.
    #[must_use]
    pub fn default_value(mut self, default: DefaultValue) -> Self {
        self.default = Some(default);
        self
    }
}

/// An explicit index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IndexSchema {
    /// Index name.
    pub name: String,
    /// Indexed columns, in order.
    pub columns: Vec<String>,
    /// Whether the index enforces uniqueness.
    pub unique: bool,
    /// Whether NULLs compare equal for uniqueness.
    pub nulls_equal: bool,
}

/// Kind of a table-level constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConstraintKind {
    /// UNIQUE over one or more columns.
    Unique,
}

/// A table-level constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConstraintSchema {
    /// Constraint kind.
    pub kind: ConstraintKind,
    /// Constrained columns, in order.
    pub columns: Vec<String>,
}

impl ConstraintSchema {
    /// Creates a UNIQUE constraint.
    #[must_use]
    pub fn unique<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            kind: ConstraintKind::Unique,
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }
}

/// A table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TableSchema {
    /// Table name.
    pub name: String,
    /// Free-form description.
    #[serde(default)]
    pub description: Option<String>,
    /// Columns, in declaration order.
    pub columns: Vec<ColumnSchema>,
    /// Table-level constraints.
    #[serde(default)]
    pub constraints: Vec<ConstraintSchema>,
    /// Explicit indices.
    #[serde(default)]
    pub indices: Vec<IndexSchema>,
}

impl TableSchema {
    /// Looks up a column by name.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&ColumnSchema> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Returns true if the table has a column named `name`.
    #[must_use]
    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// Returns the column names in declaration order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    /// Returns the primary-key column names in declaration order.
    #[must_use]
    pub fn primary_key(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| c.primary)
            .map(|c| c.name.as_str())
            .collect()
    }
}
