//! DROP TABLE and DROP INDEX.

use super::finish;
use crate::dialect::Dialect;
use crate::error::{Error, Result};
use crate::ident::validate_identifier;

/// Builds `DROP TABLE`. Requires [`DropTable::confirm`].
#[derive(Debug, Clone)]
pub struct DropTable {
    table: String,
    if_exists: bool,
    confirmed: bool,
    single_line: bool,
}

impl DropTable {
    /// Creates a builder dropping `table`.
    #[must_use]
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            if_exists: false,
            confirmed: false,
            single_line: false,
        }
    }

    /// Adds `IF EXISTS`.
    #[must_use]
    pub const fn if_exists(mut self) -> Self {
        self.if_exists = true;
        self
    }

    /// Confirms that the table and all its rows should be dropped.
    #[must_use]
    pub const fn confirm(mut self) -> Self {
        self.confirmed = true;
        self
    }

    /// Renders the statement on a single line.
    #[must_use]
    pub const fn single_line(mut self) -> Self {
        self.single_line = true;
        self
    }

    /// Builds the statement.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfirmationRequired`] unless confirmed and
    /// [`Error::InvalidIdentifier`] for an unsafe name.
    pub fn build(&self, _dialect: Dialect) -> Result<String> {
        validate_identifier(&self.table)?;
        if !self.confirmed {
            return Err(Error::ConfirmationRequired(format!("DROP TABLE {}", self.table)));
        }
        let mut sql = String::from("DROP TABLE ");
        if self.if_exists {
            sql.push_str("IF EXISTS ");
        }
        sql.push_str(&self.table);
        Ok(finish(sql, self.single_line))
    }
}

/// Builds `DROP INDEX`. Requires [`DropIndex::confirm`].
#[derive(Debug, Clone)]
pub struct DropIndex {
    name: String,
    if_exists: bool,
    confirmed: bool,
}

impl DropIndex {
    /// Creates a builder dropping index `name`.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            if_exists: false,
            confirmed: false,
        }
    }

    /// Adds `IF EXISTS`.
    #[must_use]
    pub const fn if_exists(mut self) -> Self {
        self.if_exists = true;
        self
    }

    /// Confirms the drop.
    #[must_use]
    pub const fn confirm(mut self) -> Self {
        self.confirmed = true;
        self
    }

    /// Builds the statement.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfirmationRequired`] unless confirmed and
    /// [`Error::InvalidIdentifier`] for an unsafe name.
    pub fn build(&self, _dialect: Dialect) -> Result<String> {
        validate_identifier(&self.name)?;
        if !self.confirmed {
            return Err(Error::ConfirmationRequired(format!("DROP INDEX {}", self.name)));
        }
        let mut sql = String::from("DROP INDEX ");
        if self.if_exists {
            sql.push_str("IF EXISTS ");
        }
        sql.push_str(&self.name);
        Ok(sql)
    }
}
