//! Column expressions and ordering.
//!
//! A selected column is either a bare string (a column name or an aggregate
//! such as `COUNT(DISTINCT name)`) or a [`ColumnExpression`] that can add
//! hex encoding, a cast and an alias.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::dialect::Dialect;
use crate::error::{Error, Result};
use crate::ident::validate_identifier;
use crate::types::{convert_columntype_to_dialect, ColumnType};

static COUNT_ALL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^count\(\s*\*\s*\)$").expect("valid regex"));

static COUNT_DISTINCT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^count\(\s*distinct\s+([A-Za-z0-9_]+)\s*\)$").expect("valid regex")
});

static AGGREGATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(count|min|max|avg|sum)\(\s*([A-Za-z0-9_]+)\s*\)$").expect("valid regex")
});

/// Aggregate functions recognized in bare column strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Aggregate {
    /// COUNT aggregate
    Count {
        /// Column to count, or "*" for all rows
        column: String,
        /// Whether to count only distinct values
        distinct: bool,
    },
    /// SUM aggregate
    Sum { column: String },
    /// AVG aggregate
    Avg { column: String },
    /// MAX aggregate
    Max { column: String },
    /// MIN aggregate
    Min { column: String },
}

impl Aggregate {
    /// Recognizes `COUNT(*)`, `COUNT(DISTINCT col)` and
    /// `COUNT|MIN|MAX|AVG|SUM(col)`, with case-insensitive function names.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if COUNT_ALL.is_match(text) {
            return Some(Self::Count {
                column: "*".to_string(),
                distinct: false,
            });
        }
        if let Some(caps) = COUNT_DISTINCT.captures(text) {
            return Some(Self::Count {
                column: caps[1].to_string(),
                distinct: true,
            });
        }
        let caps = AGGREGATE.captures(text)?;
        let column = caps[2].to_string();
        Some(match caps[1].to_ascii_lowercase().as_str() {
            "count" => Self::Count {
                column,
                distinct: false,
            },
            "min" => Self::Min { column },
            "max" => Self::Max { column },
            "avg" => Self::Avg { column },
            _ => Self::Sum { column },
        })
    }

    /// Returns the SQL for this aggregate.
    #[must_use]
    pub fn to_sql(&self) -> String {
        match self {
            Self::Count { column, distinct } => {
                if *distinct {
                    format!("COUNT(DISTINCT {column})")
                } else {
                    format!("COUNT({column})")
                }
            }
            Self::Sum { column } => format!("SUM({column})"),
            Self::Avg { column } => format!("AVG({column})"),
            Self::Max { column } => format!("MAX({column})"),
            Self::Min { column } => format!("MIN({column})"),
        }
    }
}

/// Hex encoding applied to a selected column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Encoding {
    /// Lowercase hex digits.
    RawHex,
    /// Lowercase hex digits prefixed with `0x`.
    PrefixHex,
}

/// A selected column with optional encoding, cast and alias.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ColumnExpression {
    /// Column name or aggregate; `None` selects `*`.
    pub column: Option<String>,
    pub cast: Option<ColumnType>,
    pub alias: Option<String>,
    pub encode: Option<Encoding>,
}

impl ColumnExpression {
    /// Creates an expression over `column`.
    #[must_use]
    pub fn column(column: impl Into<String>) -> Self {
        Self {
            column: Some(column.into()),
            ..Self::default()
        }
    }

    /// Casts the result to `column_type`.
    #[must_use]
    pub fn cast(mut self, column_type: ColumnType) -> Self {
        self.cast = Some(column_type);
        self
    }

    /// Aliases the result.
    #[must_use]
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Hex-encodes the column.
    #[must_use]
    pub const fn encode(mut self, encoding: Encoding) -> Self {
        self.encode = Some(encoding);
        self
    }

    /// Compiles the expression for `dialect`.
    ///
    /// Encoding wraps the column first, the cast wraps the encoded value and
    /// the alias names the result. An encoded plain column without an alias
    /// keeps its own name as alias.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidIdentifier`] for unsafe names,
    /// [`Error::Schema`] for an unknown cast type, and
    /// [`Error::InvalidPredicate`] for `*` combined with anything else or an
    /// encoded aggregate without an alias.
    pub fn compile(&self, dialect: Dialect) -> Result<String> {
        let Some(column) = &self.column else {
            if self.cast.is_some() || self.alias.is_some() || self.encode.is_some() {
                return Err(Error::predicate(
                    "a column expression without a column cannot have cast, alias or encode",
                ));
            }
            return Ok("*".to_string());
        };

        let mut sql = compile_bare_column(column)?;
        if let Some(encoding) = self.encode {
            let hex = match dialect {
                Dialect::Sqlite => format!("lower(hex({sql}))"),
                Dialect::Postgres => format!("encode({sql}::bytea, 'hex')"),
            };
            sql = match encoding {
                Encoding::RawHex => hex,
                Encoding::PrefixHex => format!("'0x' || {hex}"),
            };
        }
        if let Some(cast) = &self.cast {
            let type_name = convert_columntype_to_dialect(cast, dialect)?;
            sql = format!("CAST({sql} AS {type_name})");
        }
        let alias = match (&self.alias, self.encode) {
            (Some(alias), _) => Some(alias.as_str()),
            (None, Some(_)) if validate_identifier(column).is_ok() => Some(column.as_str()),
            (None, Some(_)) => {
                return Err(Error::predicate(format!(
                    "encoded expression {column} needs an alias"
                )))
            }
            (None, None) => None,
        };
        if let Some(alias) = alias {
            validate_identifier(alias)?;
            sql.push_str(" AS ");
            sql.push_str(alias);
        }
        Ok(sql)
    }
}

/// A selected column: bare string or full expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColumnSpec {
    Bare(String),
    Expression(ColumnExpression),
}

impl ColumnSpec {
    /// Compiles the column for `dialect`.
    ///
    /// # Errors
    ///
    /// See [`ColumnExpression::compile`].
    pub fn compile(&self, dialect: Dialect) -> Result<String> {
        match self {
            Self::Bare(column) => compile_bare_column(column),
            Self::Expression(expr) => expr.compile(dialect),
        }
    }
}

impl From<&str> for ColumnSpec {
    fn from(column: &str) -> Self {
        Self::Bare(column.to_string())
    }
}

impl From<String> for ColumnSpec {
    fn from(column: String) -> Self {
        Self::Bare(column)
    }
}

impl From<ColumnExpression> for ColumnSpec {
    fn from(expr: ColumnExpression) -> Self {
        Self::Expression(expr)
    }
}

fn compile_bare_column(column: &str) -> Result<String> {
    if column == "*" {
        return Ok(column.to_string());
    }
    if let Some(aggregate) = Aggregate::parse(column) {
        return Ok(aggregate.to_sql());
    }
    validate_identifier(column).map(str::to_string)
}

/// Compiles a select list. An empty list selects `*`.
///
/// # Errors
///
/// Returns the first error of [`ColumnSpec::compile`].
pub fn compile_columns(columns: &[ColumnSpec], dialect: Dialect) -> Result<String> {
    if columns.is_empty() {
        return Ok("*".to_string());
    }
    let compiled = columns
        .iter()
        .map(|c| c.compile(dialect))
        .collect::<Result<Vec<_>>>()?;
    Ok(compiled.join(", "))
}

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderDirection {
    /// Ascending order (default).
    #[default]
    Asc,
    /// Descending order.
    Desc,
}

impl OrderDirection {
    /// Returns the SQL representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// A resolved ordering term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    /// Column to order by
    pub column: String,
    /// Order direction
    pub direction: OrderDirection,
}

impl OrderBy {
    /// Creates an ascending ordering.
    #[must_use]
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: OrderDirection::Asc,
        }
    }

    /// Creates a descending ordering.
    #[must_use]
    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: OrderDirection::Desc,
        }
    }

    /// Renders `column ASC|DESC`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidIdentifier`] for an unsafe column name.
    pub fn to_sql(&self) -> Result<String> {
        let column = compile_bare_column(&self.column)?;
        Ok(format!("{column} {}", self.direction.as_str()))
    }
}

/// An ordering term as written by callers: a column name, or a column with
/// `asc` / `desc` flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OrderSpec {
    Column(String),
    Flags {
        column: String,
        #[serde(default)]
        asc: bool,
        #[serde(default)]
        desc: bool,
    },
}

impl OrderSpec {
    /// Resolves the flags into a direction; ascending by default.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPredicate`] when both `asc` and `desc` are set.
    pub fn resolve(&self) -> Result<OrderBy> {
        match self {
            Self::Column(column) => Ok(OrderBy::asc(column.as_str())),
            Self::Flags {
                column,
                asc: true,
                desc: true,
            } => Err(Error::predicate(format!(
                "order by {column} cannot be both ascending and descending"
            ))),
            Self::Flags {
                column,
                desc: true,
                ..
            } => Ok(OrderBy::desc(column.as_str())),
            Self::Flags { column, .. } => Ok(OrderBy::asc(column.as_str())),
        }
    }
}

impl From<&str> for OrderSpec {
    fn from(column: &str) -> Self {
        Self::Column(column.to_string())
    }
}

impl From<OrderBy> for OrderSpec {
    fn from(order: OrderBy) -> Self {
        Self::Flags {
            column: order.column,
            asc: order.direction == OrderDirection::Asc,
            desc: order.direction == OrderDirection::Desc,
        }
    }
}

/// Compiles an ORDER BY list (without the keyword).
///
/// # Errors
///
/// See [`OrderSpec::resolve`] and [`OrderBy::to_sql`].
pub fn compile_order_by(order: &[OrderSpec]) -> Result<String> {
    let terms = order
        .iter()
        .map(|o| o.resolve()?.to_sql())
        .collect::<Result<Vec<_>>>()?;
    Ok(terms.join(", "))
}
