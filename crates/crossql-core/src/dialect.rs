//! SQL dialects and driver kinds.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// The SQL dialect a statement is rendered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// SQLite, the embedded file engine.
    Sqlite,
    /// PostgreSQL, the client-server engine.
    #[serde(alias = "postgresql")]
    Postgres,
}

impl Dialect {
    /// Every supported dialect.
    pub const ALL: [Self; 2] = [Self::Sqlite, Self::Postgres];

    /// Returns the dialect name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Sqlite => "sqlite",
            Self::Postgres => "postgres",
        }
    }

    /// Returns the parameter placeholder used in generated SQL.
    #[must_use]
    pub const fn parameter_placeholder(self) -> &'static str {
        match self {
            Self::Sqlite => "?",
            Self::Postgres => "%s",
        }
    }

    /// Returns `count` comma-separated placeholders.
    #[must_use]
    pub fn placeholders(self, count: usize) -> String {
        vec![self.parameter_placeholder(); count].join(", ")
    }

    /// Returns the other dialect.
    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            Self::Sqlite => Self::Postgres,
            Self::Postgres => Self::Sqlite,
        }
    }

    /// Returns true if unique indices accept `NULLS NOT DISTINCT`.
    #[must_use]
    pub const fn supports_nulls_not_distinct(self) -> bool {
        matches!(self, Self::Postgres)
    }

    /// Returns true if the dialect has a case-sensitive `LIKE` operator.
    ///
    /// SQLite's `LIKE` is case-insensitive for ASCII, so a case-sensitive
    /// match cannot be expressed with it.
    #[must_use]
    pub const fn supports_case_sensitive_like(self) -> bool {
        matches!(self, Self::Postgres)
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Dialect {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "sqlite" | "sqlite3" => Ok(Self::Sqlite),
            "postgres" | "postgresql" => Ok(Self::Postgres),
            other => Err(Error::config(format!("unknown dbms: {other}"))),
        }
    }
}

/// The driver a connection wrapper was constructed with.
///
/// Every connection carries this tag, so dialect and driver resolution never
/// depends on the runtime type of a handle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriverKind {
    /// Asynchronous sqlx driver.
    #[default]
    Sqlx,
    /// Synchronous wrapper over the sqlx driver.
    SqlxBlocking,
}

impl DriverKind {
    /// Returns the driver name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Sqlx => "sqlx",
            Self::SqlxBlocking => "sqlx_blocking",
        }
    }

    /// Returns true if statements are executed asynchronously.
    #[must_use]
    pub const fn is_async(self) -> bool {
        matches!(self, Self::Sqlx)
    }

    /// Returns the driver used when a configuration names none.
    #[must_use]
    pub const fn default_for(_dialect: Dialect) -> Self {
        Self::Sqlx
    }
}

impl fmt::Display for DriverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DriverKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "sqlx" => Ok(Self::Sqlx),
            "sqlx_blocking" | "sqlx-blocking" | "blocking" => Ok(Self::SqlxBlocking),
            other => Err(Error::config(format!("unknown driver: {other}"))),
        }
    }
}
