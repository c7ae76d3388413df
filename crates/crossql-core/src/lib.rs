//! # crossql-core
//!
//! Cross-dialect SQL generation and schema normalization for SQLite and
//! PostgreSQL.
//!
//! This crate provides:
//! - A schema normalizer turning shorthand table descriptions into a
//!   canonical [`TableSchema`]
//! - Table-driven type mapping between SQLite, PostgreSQL, generic and
//!   scalar column types
//! - Statement builders producing `(sql, params)` with dialect placeholders
//!   (`?` for SQLite, `%s` for PostgreSQL)
//! - Catalog queries and assembly for reading a live schema back
//! - Result decoding and shaping, connection configuration and driver error
//!   translation
//!
//! It performs no I/O. Executing statements is the job of a driver crate
//! such as `crossql-sqlx`.
//!
//! ## Normalizing a schema
//!
//! ```rust
//! use crossql_core::{normalize_table, ColumnPartial, ColumnType, TableInput};
//!
//! let table = normalize_table(
//!     TableInput::new("pokemon")
//!         .column("id", ColumnPartial::of("int".parse::<ColumnType>()?).primary(true))
//!         .column("name", "str".parse::<ColumnType>()?),
//! )?;
//! assert!(!table.column("id").unwrap().nullable);
//! assert!(table.column("name").unwrap().nullable);
//! # Ok::<(), crossql_core::Error>(())
//! ```
//!
//! ## Building a query
//!
//! Identifiers are interpolated only after passing the identifier check;
//! values are always parameters:
//!
//! ```rust
//! use crossql_core::{Dialect, Select, SqlValue};
//!
//! let (sql, params) = Select::new("pokemon")
//!     .where_equals("primary_type", "GROUND")
//!     .single_line()
//!     .build(Dialect::Postgres)?;
//! assert_eq!(sql, "SELECT * FROM pokemon WHERE primary_type = %s");
//! assert_eq!(params, vec![SqlValue::from("GROUND")]);
//! # Ok::<(), crossql_core::Error>(())
//! ```

pub mod builder;
pub mod config;
pub mod decode;
pub mod dialect;
pub mod error;
pub mod expr;
pub mod filter;
pub mod ident;
pub mod introspect;
pub mod ordered;
pub mod output;
pub mod schema;
pub mod translate;
pub mod types;
pub mod value;

pub use builder::{
    collapse_whitespace, AlterAction, AlterTable, CreateIndex, CreateIndexes, CreateTable, Delete,
    DropIndex, DropTable, Insert, InsertRows, OnConflict, Select, Update,
};
pub use config::{DbConfig, Resolve, Resolved};
pub use decode::{decode_rows, infer_decode_columns, DecodeColumn, RawRows};
pub use dialect::{Dialect, DriverKind};
pub use error::{Error, Result};
pub use expr::{Aggregate, ColumnExpression, ColumnSpec, Encoding, OrderBy, OrderDirection, OrderSpec};
pub use filter::{CompareOp, WhereGroup};
pub use ident::{is_valid_identifier, validate_identifier};
pub use introspect::Introspect;
pub use ordered::OrderedMap;
pub use output::{format_rows, ColumnTable, Output, OutputFormat, ValueKind};
pub use schema::{
    index_name, normalize_table, ColumnInput, ColumnPartial, ColumnSchema, ConstraintKind,
    ConstraintSchema, DefaultValue, IndexInput, IndexSchema, TableInput, TableSchema,
};
pub use translate::{translate, NativeError};
pub use types::{
    convert_columntype_to_dialect, convert_native_type, ColumnType, GenericType, ScalarType,
    TypeFamily,
};
pub use value::{SqlValue, ToSqlValue};
