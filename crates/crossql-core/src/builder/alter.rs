//! ALTER TABLE.

use super::create::column_definition;
use super::finish;
use crate::dialect::Dialect;
use crate::error::{Error, Result};
use crate::ident::validate_identifier;
use crate::schema::ColumnSchema;

/// A single table alteration.
#[derive(Debug, Clone, PartialEq)]
pub enum AlterAction {
    /// `RENAME TO new_name`
    RenameTable { new_name: String },
    /// `RENAME COLUMN old_name TO new_name`
    RenameColumn { old_name: String, new_name: String },
    /// `ADD COLUMN ...`
    AddColumn(ColumnSchema),
    /// `DROP COLUMN name`
    DropColumn { name: String },
}

/// Builds one `ALTER TABLE` statement. Every alteration requires
/// [`AlterTable::confirm`].
#[derive(Debug, Clone)]
pub struct AlterTable {
    table: String,
    action: AlterAction,
    confirmed: bool,
    single_line: bool,
}

impl AlterTable {
    /// Creates a builder applying `action` to `table`.
    #[must_use]
    pub fn new(table: impl Into<String>, action: AlterAction) -> Self {
        Self {
            table: table.into(),
            action,
            confirmed: false,
            single_line: false,
        }
    }

    /// Renames `table` to `new_name`.
    #[must_use]
    pub fn rename_table(table: impl Into<String>, new_name: impl Into<String>) -> Self {
        Self::new(
            table,
            AlterAction::RenameTable {
                new_name: new_name.into(),
            },
        )
    }

    /// Renames a column of `table`.
    #[must_use]
    pub fn rename_column(
        table: impl Into<String>,
        old_name: impl Into<String>,
        new_name: impl Into<String>,
    ) -> Self {
        Self::new(
            table,
            AlterAction::RenameColumn {
                old_name: old_name.into(),
                new_name: new_name.into(),
            },
        )
    }

    /// Adds a column to `table`.
    #[must_use]
    pub fn add_column(table: impl Into<String>, column: ColumnSchema) -> Self {
        Self::new(table, AlterAction::AddColumn(column))
    }

    /// Drops a column of `table`.
    #[must_use]
    pub fn drop_column(table: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(table, AlterAction::DropColumn { name: name.into() })
    }

    /// Confirms the alteration.
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
    /// Returns [`Error::ConfirmationRequired`] unless confirmed,
    /// [`Error::InvalidIdentifier`] for unsafe names and [`Error::Schema`]
    /// when adding a primary-key column, which neither dialect supports in
    /// place.
    pub fn build(&self, dialect: Dialect) -> Result<String> {
        validate_identifier(&self.table)?;
        let clause = match &self.action {
            AlterAction::RenameTable { new_name } => {
                format!("RENAME TO {}", validate_identifier(new_name)?)
            }
            AlterAction::RenameColumn { old_name, new_name } => format!(
                "RENAME COLUMN {} TO {}",
                validate_identifier(old_name)?,
                validate_identifier(new_name)?
            ),
            AlterAction::AddColumn(column) => {
                if column.primary {
                    return Err(Error::schema(format!(
                        "cannot add primary key column {} to existing table {}",
                        column.name, self.table
                    )));
                }
                format!("ADD COLUMN {}", column_definition(column, dialect, false)?)
            }
            AlterAction::DropColumn { name } => {
                format!("DROP COLUMN {}", validate_identifier(name)?)
            }
        };
        if !self.confirmed {
            return Err(Error::ConfirmationRequired(format!(
                "ALTER TABLE {} {clause}",
                self.table
            )));
        }
        Ok(finish(
            format!("ALTER TABLE {}\n{clause}", self.table),
            self.single_line,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::DefaultValue;
    use crate::types::{ColumnType, GenericType};

    #[test]
    fn test_requires_confirmation() {
        let err = AlterTable::drop_column("pokemon", "height")
            .build(Dialect::Sqlite)
            .unwrap_err();
        assert!(matches!(err, Error::ConfirmationRequired(_)));
    }

    #[test]
    fn test_renames() {
        assert_eq!(
            AlterTable::rename_table("pokemon", "monsters")
                .confirm()
                .single_line()
                .build(Dialect::Sqlite)
                .unwrap(),
            "ALTER TABLE pokemon RENAME TO monsters"
        );
        assert_eq!(
            AlterTable::rename_column("pokemon", "hp", "health")
                .confirm()
                .single_line()
                .build(Dialect::Postgres)
                .unwrap(),
            "ALTER TABLE pokemon RENAME COLUMN hp TO health"
        );
    }

    #[test]
    fn test_add_column() {
        let column = ColumnSchema::new("legendary", ColumnType::Generic(GenericType::Boolean))
            .not_null()
            .default_value(DefaultValue::Bool(false));
        assert_eq!(
            AlterTable::add_column("pokemon", column.clone())
                .confirm()
                .single_line()
                .build(Dialect::Postgres)
                .unwrap(),
            "ALTER TABLE pokemon ADD COLUMN legendary BOOLEAN NOT NULL DEFAULT FALSE"
        );
        assert!(matches!(
            AlterTable::add_column("pokemon", column.primary_key())
                .confirm()
                .build(Dialect::Sqlite),
            Err(Error::Schema(_))
        ));
    }

    #[test]
    fn test_drop_column_validates_name() {
        assert!(matches!(
            AlterTable::drop_column("pokemon", "a b")
                .confirm()
                .build(Dialect::Sqlite),
            Err(Error::InvalidIdentifier(_))
        ));
    }
}
