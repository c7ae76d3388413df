//! # crossql-sqlx
//!
//! Runs crossql statements through `sqlx` against SQLite and PostgreSQL.
//!
//! - [`Connection`]: an async connection pool tagged with its dialect and
//!   driver
//! - [`BlockingConnection`]: the same operations on a private current-thread
//!   runtime, for synchronous callers
//! - Live introspection feeding the catalog assembly of `crossql-core`
//! - Driver errors captured and translated into [`crossql_core::Error`]
//!
//! ```rust,no_run
//! use crossql_core::{DbConfig, OutputFormat, Select};
//! use crossql_sqlx::Connection;
//!
//! # async fn run() -> crossql_core::Result<()> {
//! let conn = Connection::connect(&DbConfig::from_uri("sqlite://pokedex.db")?).await?;
//! let ground = conn
//!     .select(
//!         &Select::new("pokemon").where_equals("primary_type", "GROUND"),
//!         None,
//!         OutputFormat::Dicts,
//!     )
//!     .await?;
//! # Ok(())
//! # }
//! ```
//!
//! PostgreSQL statements are built with `%s` placeholders and rewritten to
//! `$1, $2, ...` before they reach sqlx.

mod bind;
pub mod blocking;
mod connection;
mod error;
mod introspect;
mod ops;
mod row;

pub use bind::postgres_statement;
pub use blocking::BlockingConnection;
pub use connection::Connection;
pub use crossql_core::{Error, Result};
