//! Column type tiers and the mapping tables between them.
//!
//! A column type is one of three tiers:
//!
//! - **native**: a type name of a concrete dialect, e.g. `BIGINT` or `BLOB`;
//! - **generic**: a dialect-neutral category, e.g. [`GenericType::Json`];
//! - **scalar**: a host-language value type, e.g. [`ScalarType::Mapping`].
//!
//! Conversion is table-driven. Native names map between dialects lossily
//! (PostgreSQL's three integer widths all become SQLite `INTEGER`, which maps
//! back to `BIGINT`), but always within the same [`TypeFamily`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::dialect::Dialect;
use crate::error::{Error, Result};

/// Broad category used to decide whether two native types are compatible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeFamily {
    Integer,
    Float,
    Decimal,
    Text,
    Binary,
    Boolean,
    Json,
    Timestamp,
    Date,
    Time,
}

/// Dialect-neutral column type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenericType {
    Binary,
    Boolean,
    Integer,
    Float,
    Text,
    Json,
    Timestamp,
    Decimal,
}

/// Host value type usable as a column type shorthand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarType {
    Int,
    Float,
    Str,
    Bytes,
    Bool,
    Datetime,
    Decimal,
    /// Key/value mapping, stored as JSON.
    #[serde(alias = "dict")]
    Mapping,
}

/// A column type from any of the three tiers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "ColumnTypeRepr")]
pub enum ColumnType {
    /// Upper-cased dialect-native name, possibly with parameters
    /// (`VARCHAR(20)`).
    Native(String),
    Generic(GenericType),
    Scalar(ScalarType),
}

/// Accepted serialized forms: a bare token (`"int"`, `"bigint"`) or the
/// tagged form produced by serialization (`{"native": "BIGINT"}`).
#[derive(Deserialize)]
#[serde(untagged)]
enum ColumnTypeRepr {
    Token(String),
    Tagged(TaggedColumnType),
}

#[derive(Deserialize)]
#[serde(rename_all = "lowercase")]
enum TaggedColumnType {
    Native(String),
    Generic(GenericType),
    Scalar(ScalarType),
}

impl TryFrom<ColumnTypeRepr> for ColumnType {
    type Error = Error;

    fn try_from(repr: ColumnTypeRepr) -> Result<Self> {
        match repr {
            ColumnTypeRepr::Token(token) => token.parse(),
            ColumnTypeRepr::Tagged(TaggedColumnType::Native(name)) => Self::native(&name),
            ColumnTypeRepr::Tagged(TaggedColumnType::Generic(g)) => Ok(Self::Generic(g)),
            ColumnTypeRepr::Tagged(TaggedColumnType::Scalar(s)) => Ok(Self::Scalar(s)),
        }
    }
}

const SQLITE_TYPES: &[(&str, TypeFamily)] = &[
    ("INTEGER", TypeFamily::Integer),
    ("REAL", TypeFamily::Float),
    ("NUMERIC", TypeFamily::Decimal),
    ("TEXT", TypeFamily::Text),
    ("BLOB", TypeFamily::Binary),
    ("BOOLEAN", TypeFamily::Boolean),
    ("JSON", TypeFamily::Json),
    ("DATETIME", TypeFamily::Timestamp),
    ("DATE", TypeFamily::Date),
    ("TIME", TypeFamily::Time),
];

const POSTGRES_TYPES: &[(&str, TypeFamily)] = &[
    ("SMALLINT", TypeFamily::Integer),
    ("INTEGER", TypeFamily::Integer),
    ("BIGINT", TypeFamily::Integer),
    ("REAL", TypeFamily::Float),
    ("DOUBLE PRECISION", TypeFamily::Float),
    ("NUMERIC", TypeFamily::Decimal),
    ("DECIMAL", TypeFamily::Decimal),
    ("TEXT", TypeFamily::Text),
    ("VARCHAR", TypeFamily::Text),
    ("CHAR", TypeFamily::Text),
    ("BYTEA", TypeFamily::Binary),
    ("BOOLEAN", TypeFamily::Boolean),
    ("JSON", TypeFamily::Json),
    ("JSONB", TypeFamily::Json),
    ("TIMESTAMP", TypeFamily::Timestamp),
    ("TIMESTAMPTZ", TypeFamily::Timestamp),
    ("DATE", TypeFamily::Date),
    ("TIME", TypeFamily::Time),
];

const SQLITE_TO_POSTGRES: &[(&str, &str)] = &[
    ("INTEGER", "BIGINT"),
    ("REAL", "DOUBLE PRECISION"),
    ("NUMERIC", "NUMERIC"),
    ("TEXT", "TEXT"),
    ("BLOB", "BYTEA"),
    ("BOOLEAN", "BOOLEAN"),
    ("JSON", "JSONB"),
    ("DATETIME", "TIMESTAMP"),
    ("DATE", "DATE"),
    ("TIME", "TIME"),
];

const POSTGRES_TO_SQLITE: &[(&str, &str)] = &[
    ("SMALLINT", "INTEGER"),
    ("INTEGER", "INTEGER"),
    ("BIGINT", "INTEGER"),
    ("REAL", "REAL"),
    ("DOUBLE PRECISION", "REAL"),
    ("NUMERIC", "NUMERIC"),
    ("DECIMAL", "NUMERIC"),
    ("TEXT", "TEXT"),
    ("VARCHAR", "TEXT"),
    ("CHAR", "TEXT"),
    ("BYTEA", "BLOB"),
    ("BOOLEAN", "BOOLEAN"),
    ("JSON", "JSON"),
    ("JSONB", "JSON"),
    ("TIMESTAMP", "DATETIME"),
    ("TIMESTAMPTZ", "DATETIME"),
    ("DATE", "DATE"),
    ("TIME", "TIME"),
];

/// (generic, SQLite name, PostgreSQL name)
const GENERIC_TYPES: &[(GenericType, &str, &str)] = &[
    (GenericType::Binary, "BLOB", "BYTEA"),
    (GenericType::Boolean, "BOOLEAN", "BOOLEAN"),
    (GenericType::Integer, "INTEGER", "BIGINT"),
    (GenericType::Float, "REAL", "DOUBLE PRECISION"),
    (GenericType::Text, "TEXT", "TEXT"),
    (GenericType::Json, "JSON", "JSONB"),
    (GenericType::Timestamp, "DATETIME", "TIMESTAMP"),
    (GenericType::Decimal, "NUMERIC", "NUMERIC"),
];

const SCALAR_TO_SQLITE: &[(ScalarType, &str)] = &[
    (ScalarType::Int, "INTEGER"),
    (ScalarType::Float, "REAL"),
    (ScalarType::Str, "TEXT"),
    (ScalarType::Bytes, "BLOB"),
    (ScalarType::Bool, "BOOLEAN"),
    (ScalarType::Datetime, "DATETIME"),
    (ScalarType::Decimal, "NUMERIC"),
    (ScalarType::Mapping, "JSON"),
];

/// Spellings reported by catalogs or commonly written by hand, folded onto
/// the canonical native name.
const NATIVE_ALIASES: &[(&str, &str)] = &[
    ("INT", "INTEGER"),
    ("INT2", "SMALLINT"),
    ("INT4", "INTEGER"),
    ("INT8", "BIGINT"),
    ("SERIAL", "INTEGER"),
    ("BIGSERIAL", "BIGINT"),
    ("SMALLSERIAL", "SMALLINT"),
    ("FLOAT4", "REAL"),
    ("FLOAT8", "DOUBLE PRECISION"),
    ("DOUBLE", "DOUBLE PRECISION"),
    ("BOOL", "BOOLEAN"),
    ("CHARACTER VARYING", "VARCHAR"),
    ("CHARACTER", "CHAR"),
    ("TIMESTAMP WITHOUT TIME ZONE", "TIMESTAMP"),
    ("TIMESTAMP WITH TIME ZONE", "TIMESTAMPTZ"),
    ("TIME WITHOUT TIME ZONE", "TIME"),
];

/// Native names whose round trip through the other dialect comes back under
/// a different name. Each pair is `(dialect, name)`; the round-tripped name
/// is always in the same [`TypeFamily`].
pub const LOSSY_ROUND_TRIPS: &[(Dialect, &str)] = &[
    (Dialect::Postgres, "SMALLINT"),
    (Dialect::Postgres, "INTEGER"),
    (Dialect::Postgres, "REAL"),
    (Dialect::Postgres, "DECIMAL"),
    (Dialect::Postgres, "VARCHAR"),
    (Dialect::Postgres, "CHAR"),
    (Dialect::Postgres, "JSON"),
    (Dialect::Postgres, "TIMESTAMPTZ"),
];

const fn vocabulary(dialect: Dialect) -> &'static [(&'static str, TypeFamily)] {
    match dialect {
        Dialect::Sqlite => SQLITE_TYPES,
        Dialect::Postgres => POSTGRES_TYPES,
    }
}

/// Returns the native type names of `dialect`.
pub fn native_types(dialect: Dialect) -> impl Iterator<Item = &'static str> {
    vocabulary(dialect).iter().map(|(name, _)| *name)
}

/// Splits `VARCHAR(20)` into `("VARCHAR", "(20)")`, upper-cases the base,
/// collapses inner whitespace and resolves aliases.
fn split_native(raw: &str) -> (String, String) {
    let raw = raw.trim();
    let (base, params) = raw
        .find('(')
        .map_or((raw, ""), |pos| (&raw[..pos], raw[pos..].trim()));
    let base = base
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_ascii_uppercase();
    let base = NATIVE_ALIASES
        .iter()
        .find(|(alias, _)| *alias == base)
        .map_or(base, |(_, canonical)| (*canonical).to_string());
    (base, params.replace(' ', ""))
}

fn lookup(dialect: Dialect, base: &str) -> Option<(&'static str, TypeFamily)> {
    vocabulary(dialect)
        .iter()
        .find(|(name, _)| *name == base)
        .copied()
}

/// Returns true if `name` (case-insensitive, aliases allowed) is a native type
/// of `dialect`.
#[must_use]
pub fn is_native_type(name: &str, dialect: Dialect) -> bool {
    lookup(dialect, &split_native(name).0).is_some()
}

/// Returns the family of a native type name known to either dialect.
#[must_use]
pub fn native_family(name: &str) -> Option<TypeFamily> {
    let (base, _) = split_native(name);
    Dialect::ALL
        .iter()
        .find_map(|d| lookup(*d, &base))
        .map(|(_, family)| family)
}

/// Converts a native type name of `from` into the corresponding name of `to`.
///
/// Parameters such as `(20)` survive only when the target dialect has the
/// same base type.
///
/// # Errors
///
/// Returns [`Error::Schema`] if `name` is not a native type of `from`.
pub fn convert_native_type(name: &str, from: Dialect, to: Dialect) -> Result<String> {
    let (base, params) = split_native(name);
    let (canonical, _) = lookup(from, &base)
        .ok_or_else(|| Error::schema(format!("unknown {from} type: {name}")))?;
    if from == to {
        return Ok(format!("{canonical}{params}"));
    }
    let table = match from {
        Dialect::Sqlite => SQLITE_TO_POSTGRES,
        Dialect::Postgres => POSTGRES_TO_SQLITE,
    };
    table
        .iter()
        .find(|(src, _)| *src == canonical)
        .map(|(_, dst)| {
            if *dst == canonical {
                format!("{dst}{params}")
            } else {
                (*dst).to_string()
            }
        })
        .ok_or_else(|| Error::schema(format!("no {to} mapping for {from} type {canonical}")))
}

/// Converts any column type into the native type name of `dialect`.
///
/// # Errors
///
/// Returns [`Error::Schema`] for native names unknown to both dialects.
/// There is no fallback type.
pub fn convert_columntype_to_dialect(column_type: &ColumnType, dialect: Dialect) -> Result<String> {
    match column_type {
        ColumnType::Native(name) => {
            let (base, _) = split_native(name);
            if lookup(dialect, &base).is_some() {
                convert_native_type(name, dialect, dialect)
            } else if lookup(dialect.other(), &base).is_some() {
                convert_native_type(name, dialect.other(), dialect)
            } else {
                Err(Error::schema(format!("unknown column type: {name}")))
            }
        }
        ColumnType::Generic(generic) => Ok(generic.native_name(dialect).to_string()),
        ColumnType::Scalar(scalar) => {
            let sqlite = scalar.sqlite_name();
            match dialect {
                Dialect::Sqlite => Ok(sqlite.to_string()),
                Dialect::Postgres => convert_native_type(sqlite, Dialect::Sqlite, Dialect::Postgres),
            }
        }
    }
}

impl GenericType {
    /// Returns the native type name on `dialect`.
    #[must_use]
    pub fn native_name(self, dialect: Dialect) -> &'static str {
        GENERIC_TYPES
            .iter()
            .find(|(g, _, _)| *g == self)
            .map_or("", |(_, sqlite, postgres)| match dialect {
                Dialect::Sqlite => *sqlite,
                Dialect::Postgres => *postgres,
            })
    }

    /// Returns the upper-case token used for this type in shorthand input.
    #[must_use]
    pub const fn token(self) -> &'static str {
        match self {
            Self::Binary => "BINARY",
            Self::Boolean => "BOOLEAN",
            Self::Integer => "INTEGER",
            Self::Float => "FLOAT",
            Self::Text => "TEXT",
            Self::Json => "JSON",
            Self::Timestamp => "TIMESTAMP",
            Self::Decimal => "DECIMAL",
        }
    }

    /// Returns the family of this type.
    #[must_use]
    pub const fn family(self) -> TypeFamily {
        match self {
            Self::Binary => TypeFamily::Binary,
            Self::Boolean => TypeFamily::Boolean,
            Self::Integer => TypeFamily::Integer,
            Self::Float => TypeFamily::Float,
            Self::Text => TypeFamily::Text,
            Self::Json => TypeFamily::Json,
            Self::Timestamp => TypeFamily::Timestamp,
            Self::Decimal => TypeFamily::Decimal,
        }
    }

    const ALL: [Self; 8] = [
        Self::Binary,
        Self::Boolean,
        Self::Integer,
        Self::Float,
        Self::Text,
        Self::Json,
        Self::Timestamp,
        Self::Decimal,
    ];
}

impl ScalarType {
    /// Returns the generic type carrying the same values.
    #[must_use]
    pub const fn generic(self) -> GenericType {
        match self {
            Self::Int => GenericType::Integer,
            Self::Float => GenericType::Float,
            Self::Str => GenericType::Text,
            Self::Bytes => GenericType::Binary,
            Self::Bool => GenericType::Boolean,
            Self::Datetime => GenericType::Timestamp,
            Self::Decimal => GenericType::Decimal,
            Self::Mapping => GenericType::Json,
        }
    }

    fn sqlite_name(self) -> &'static str {
        SCALAR_TO_SQLITE
            .iter()
            .find(|(s, _)| *s == self)
            .map_or("", |(_, name)| *name)
    }

    fn from_token(token: &str) -> Option<Self> {
        match token {
            "int" => Some(Self::Int),
            "float" => Some(Self::Float),
            "str" => Some(Self::Str),
            "bytes" => Some(Self::Bytes),
            "bool" => Some(Self::Bool),
            "datetime" => Some(Self::Datetime),
            "decimal" => Some(Self::Decimal),
            "dict" | "mapping" => Some(Self::Mapping),
            _ => None,
        }
    }
}

impl ColumnType {
    /// Builds a native type, canonicalizing the spelling.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Schema`] if neither dialect knows the name.
    pub fn native(name: &str) -> Result<Self> {
        let (base, params) = split_native(name);
        if Dialect::ALL.iter().any(|d| lookup(*d, &base).is_some()) {
            Ok(Self::Native(format!("{base}{params}")))
        } else {
            Err(Error::schema(format!("unknown column type: {name}")))
        }
    }

    /// Returns the type family.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Schema`] for unknown native names.
    pub fn family(&self) -> Result<TypeFamily> {
        match self {
            Self::Native(name) => {
                native_family(name).ok_or_else(|| Error::schema(format!("unknown column type: {name}")))
            }
            Self::Generic(g) => Ok(g.family()),
            Self::Scalar(s) => Ok(s.generic().family()),
        }
    }

    /// Returns the canonical form used in normalized schemas: scalars become
    /// their generic counterpart, native names are canonicalized.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Schema`] for unknown native names.
    pub fn canonical(&self) -> Result<Self> {
        match self {
            Self::Native(name) => Self::native(name),
            Self::Generic(g) => Ok(Self::Generic(*g)),
            Self::Scalar(s) => Ok(Self::Generic(s.generic())),
        }
    }
}

impl FromStr for ColumnType {
    type Err = Error;

    /// Parses a type token: scalar names (`int`, `str`, `dict`, ...) first,
    /// then native names of either dialect, then generic names (`BINARY`,
    /// `FLOAT`).
    fn from_str(token: &str) -> Result<Self> {
        if let Some(scalar) = ScalarType::from_token(token.trim()) {
            return Ok(Self::Scalar(scalar));
        }
        if let Ok(native) = Self::native(token) {
            return Ok(native);
        }
        let upper = token.trim().to_ascii_uppercase();
        GenericType::ALL
            .iter()
            .find(|g| g.token() == upper)
            .map(|g| Self::Generic(*g))
            .ok_or_else(|| Error::schema(format!("unknown column type: {token}")))
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Native(name) => f.write_str(name),
            Self::Generic(g) => write!(f, "generic {}", g.token()),
            Self::Scalar(s) => write!(f, "scalar {s:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tokens() {
        assert_eq!("int".parse::<ColumnType>().unwrap(), ColumnType::Scalar(ScalarType::Int));
        assert_eq!(
            "dict".parse::<ColumnType>().unwrap(),
            ColumnType::Scalar(ScalarType::Mapping)
        );
        assert_eq!(
            "bigint".parse::<ColumnType>().unwrap(),
            ColumnType::Native(String::from("BIGINT"))
        );
        assert_eq!(
            "varchar(20)".parse::<ColumnType>().unwrap(),
            ColumnType::Native(String::from("VARCHAR(20)"))
        );
        assert_eq!(
            "binary".parse::<ColumnType>().unwrap(),
            ColumnType::Generic(GenericType::Binary)
        );
        assert!(matches!("geometry".parse::<ColumnType>(), Err(Error::Schema(_))));
    }

    #[test]
    fn test_native_aliases() {
        assert_eq!(
            ColumnType::native("character varying").unwrap(),
            ColumnType::Native(String::from("VARCHAR"))
        );
        assert_eq!(
            ColumnType::native("timestamp without time zone").unwrap(),
            ColumnType::Native(String::from("TIMESTAMP"))
        );
        assert!(is_native_type("int8", Dialect::Postgres));
        assert!(!is_native_type("BYTEA", Dialect::Sqlite));
    }

    #[test]
    fn test_integer_widths_collapse_on_sqlite() {
        for name in ["SMALLINT", "INTEGER", "BIGINT"] {
            assert_eq!(
                convert_native_type(name, Dialect::Postgres, Dialect::Sqlite).unwrap(),
                "INTEGER"
            );
        }
        assert_eq!(
            convert_native_type("INTEGER", Dialect::Sqlite, Dialect::Postgres).unwrap(),
            "BIGINT"
        );
    }

    #[test]
    fn test_parameters_kept_within_dialect() {
        let varchar = ColumnType::native("VARCHAR(20)").unwrap();
        assert_eq!(
            convert_columntype_to_dialect(&varchar, Dialect::Postgres).unwrap(),
            "VARCHAR(20)"
        );
        assert_eq!(convert_columntype_to_dialect(&varchar, Dialect::Sqlite).unwrap(), "TEXT");
    }

    #[test]
    fn test_generic_mapping() {
        let json = ColumnType::Generic(GenericType::Json);
        assert_eq!(convert_columntype_to_dialect(&json, Dialect::Sqlite).unwrap(), "JSON");
        assert_eq!(convert_columntype_to_dialect(&json, Dialect::Postgres).unwrap(), "JSONB");
    }

    #[test]
    fn test_scalar_chain_agrees_with_generic() {
        for (scalar, _) in SCALAR_TO_SQLITE {
            for dialect in Dialect::ALL {
                assert_eq!(
                    convert_columntype_to_dialect(&ColumnType::Scalar(*scalar), dialect).unwrap(),
                    convert_columntype_to_dialect(&ColumnType::Generic(scalar.generic()), dialect)
                        .unwrap(),
                    "{scalar:?} on {dialect}"
                );
            }
        }
    }

    #[test]
    fn test_unknown_native_is_an_error() {
        let bogus = ColumnType::Native(String::from("GEOMETRY"));
        assert!(matches!(
            convert_columntype_to_dialect(&bogus, Dialect::Sqlite),
            Err(Error::Schema(_))
        ));
    }

    #[test]
    fn test_serde_forms() {
        let token: ColumnType = serde_json::from_str(r#""str""#).unwrap();
        assert_eq!(token, ColumnType::Scalar(ScalarType::Str));
        let tagged: ColumnType = serde_json::from_str(r#"{"generic": "json"}"#).unwrap();
        assert_eq!(tagged, ColumnType::Generic(GenericType::Json));
        let native = ColumnType::Native(String::from("INTEGER"));
        let json = serde_json::to_string(&native).unwrap();
        assert_eq!(json, r#"{"native":"INTEGER"}"#);
        assert_eq!(serde_json::from_str::<ColumnType>(&json).unwrap(), native);
    }
}
