//! Shorthand schema input accepted by the normalizer.

use serde::{Deserialize, Serialize};

use super::{ColumnSchema, ConstraintSchema, DefaultValue, IndexSchema, TableSchema};
use crate::ordered::OrderedMap;
use crate::types::ColumnType;

/// A table description in shorthand form.
///
/// ```json
/// {"name": "pokemon", "columns": {"id": {"type": "int", "primary": true}, "name": "str"}}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TableInput {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub columns: ColumnsInput,
    #[serde(default)]
    pub constraints: Vec<ConstraintSchema>,
    #[serde(default)]
    pub indices: Vec<IndexInput>,
}

impl TableInput {
    /// Creates a table input with no columns, in mapping form.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            columns: ColumnsInput::Map(OrderedMap::new()),
            constraints: Vec::new(),
            indices: Vec::new(),
        }
    }

    /// Adds a column. Switches a sequence-form input to carry the name
    /// explicitly.
    #[must_use]
    pub fn column(mut self, name: impl Into<String>, column: impl Into<ColumnInput>) -> Self {
        let name = name.into();
        let column = column.into();
        match &mut self.columns {
            ColumnsInput::Map(map) => map.push(name, column),
            ColumnsInput::List(list) => list.push(column.with_name(name)),
        }
        self
    }

    /// Adds a table-level constraint.
    #[must_use]
    pub fn constraint(mut self, constraint: ConstraintSchema) -> Self {
        self.constraints.push(constraint);
        self
    }

    /// Adds an index.
    #[must_use]
    pub fn index(mut self, index: IndexInput) -> Self {
        self.indices.push(index);
        self
    }
}

/// Columns as a sequence (each entry names itself) or as an ordered
/// `name -> column` mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColumnsInput {
    List(Vec<ColumnInput>),
    Map(OrderedMap<ColumnInput>),
}

/// One column in shorthand form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColumnInput {
    /// A bare type token, e.g. `"int"`.
    Ref(ColumnType),
    /// A fully specified column, e.g. a previously normalized one.
    Full(ColumnSchema),
    /// A column with some attributes left to defaults.
    Partial(ColumnPartial),
}

impl ColumnInput {
    fn with_name(self, name: String) -> Self {
        match self {
            Self::Ref(column_type) => Self::Partial(ColumnPartial {
                name: Some(name),
                column_type: Some(column_type),
                ..ColumnPartial::default()
            }),
            Self::Full(mut column) => {
                column.name = name;
                Self::Full(column)
            }
            Self::Partial(mut partial) => {
                partial.name = Some(name);
                Self::Partial(partial)
            }
        }
    }
}

impl From<ColumnType> for ColumnInput {
    fn from(column_type: ColumnType) -> Self {
        Self::Ref(column_type)
    }
}

impl From<ColumnSchema> for ColumnInput {
    fn from(column: ColumnSchema) -> Self {
        Self::Full(column)
    }
}

impl From<ColumnPartial> for ColumnInput {
    fn from(partial: ColumnPartial) -> Self {
        Self::Partial(partial)
    }
}

/// Column attributes, any of which may be omitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ColumnPartial {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub column_type: Option<ColumnType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nullable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unique: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub autoincrement: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<DefaultValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ColumnPartial {
    /// Creates a partial column of the given type.
    #[must_use]
    pub fn of(column_type: ColumnType) -> Self {
        Self {
            column_type: Some(column_type),
            ..Self::default()
        }
    }

    /// Sets `primary`.
    #[must_use]
    pub const fn primary(mut self, primary: bool) -> Self {
        self.primary = Some(primary);
        self
    }

    /// Sets `nullable`.
    #[must_use]
    pub const fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = Some(nullable);
        self
    }

    /// Sets `unique`.
    #[must_use]
    pub const fn unique(mut self, unique: bool) -> Self {
        self.unique = Some(unique);
        self
    }

    /// Sets `index`.
    #[must_use]
    pub const fn index(mut self, index: bool) -> Self {
        self.index = Some(index);
        self
    }

    /// Sets `autoincrement`.
    #[must_use]
    pub const fn autoincrement(mut self, autoincrement: bool) -> Self {
        self.autoincrement = Some(autoincrement);
        self
    }

    /// Sets the default value.
    #[must_use]
    pub fn default_value(mut self, default: DefaultValue) -> Self {
        self.default = Some(default);
        self
    }
}

/// An index in shorthand form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IndexInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub columns: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nulls_equal: Option<bool>,
}

impl IndexInput {
    /// Creates an unnamed index over `columns`.
    #[must_use]
    pub fn on<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Sets `unique`.
    #[must_use]
    pub const fn unique(mut self, unique: bool) -> Self {
        self.unique = Some(unique);
        self
    }

    /// Sets `nulls_equal`.
    #[must_use]
    pub const fn nulls_equal(mut self, nulls_equal: bool) -> Self {
        self.nulls_equal = Some(nulls_equal);
        self
    }
}

impl From<IndexSchema> for IndexInput {
    fn from(index: IndexSchema) -> Self {
        Self {
            name: Some(index.name),
            columns: index.columns,
            unique: Some(index.unique),
            nulls_equal: Some(index.nulls_equal),
        }
    }
}

impl From<TableSchema> for TableInput {
    fn from(table: TableSchema) -> Self {
        Self {
            name: table.name,
            description: table.description,
            columns: ColumnsInput::List(table.columns.into_iter().map(ColumnInput::Full).collect()),
            constraints: table.constraints,
            indices: table.indices.into_iter().map(IndexInput::from).collect(),
        }
    }
}
