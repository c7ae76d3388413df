//! Statement builders.
//!
//! Each builder validates every identifier it interpolates and returns the SQL
//! text with its parameters, in placeholder order:
//!
//! ```ignore
//! use crossql_core::{Dialect, Select};
//!
//! let (sql, params) = Select::new("pokemon")
//!     .columns(["name", "height"])
//!     .where_equals("primary_type", "GROUND")
//!     .build(Dialect::Sqlite)?;
//! ```
//!
//! Statements are rendered one clause per line. `single_line()` collapses
//! the layout without touching string literals or parameters.
//!
//! Destructive statements (UPDATE or DELETE without a WHERE clause, DROP and
//! ALTER) refuse to build until they are explicitly confirmed.

mod alter;
mod create;
mod delete;
mod drop;
mod insert;
mod select;
mod update;

pub use alter::{AlterAction, AlterTable};
pub use create::{column_definition, CreateIndex, CreateIndexes, CreateTable};
pub use delete::Delete;
pub use drop::{DropIndex, DropTable};
pub use insert::{Insert, InsertRows, OnConflict};
pub use select::Select;
pub use update::Update;

/// Collapses whitespace runs outside single-quoted literals into one space,
/// and drops the space right inside parentheses.
///
/// Idempotent: collapsing an already collapsed statement returns it as is.
#[must_use]
pub fn collapse_whitespace(sql: &str) -> String {
    let mut out = String::with_capacity(sql.len());
    let mut in_literal = false;
    let mut pending_space = false;

    for ch in sql.chars() {
        if in_literal {
            out.push(ch);
            if ch == '\'' {
                in_literal = false;
            }
            continue;
        }
        if ch.is_whitespace() {
            pending_space = true;
            continue;
        }
        if pending_space {
            if !out.is_empty() && !out.ends_with('(') && ch != ')' {
                out.push(' ');
            }
            pending_space = false;
        }
        if ch == '\'' {
            in_literal = true;
        }
        out.push(ch);
    }
    out
}

pub(crate) fn finish(sql: String, single_line: bool) -> String {
    if single_line {
        collapse_whitespace(&sql)
    } else {
        sql
    }
}
