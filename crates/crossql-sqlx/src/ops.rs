//! Statement-level operations: build with the connection's dialect, execute,
//! decode and shape.

use crossql_core::{
    decode_rows, format_rows, infer_decode_columns, CreateIndexes, CreateTable, Delete, DropTable,
    Insert, Output, OutputFormat, Result, Select, TableSchema, Update,
};
use tracing::info;

use crate::connection::Connection;

impl Connection {
    /// Runs a SELECT and shapes the rows into `format`.
    ///
    /// With `table` given, cells are first decoded for the columns whose
    /// type the dialect does not store natively (JSON and BOOLEAN on
    /// SQLite).
    ///
    /// # Errors
    ///
    /// Returns build errors, the translated driver error, decode errors and
    /// the row/column count errors of [`format_rows`].
    pub async fn select(
        &self,
        query: &Select<'_>,
        table: Option<&TableSchema>,
        format: OutputFormat,
    ) -> Result<Output> {
        let (sql, params) = query.build(self.dialect())?;
        let rows = self.fetch_all(&sql, &params).await?;
        let rows = match table {
            Some(table) => decode_rows(
                rows,
                &infer_decode_columns(self.dialect(), self.driver(), table),
            )?,
            None => rows,
        };
        format_rows(rows, format)
    }

    /// Runs an INSERT and returns the number of rows written.
    ///
    /// # Errors
    ///
    /// Returns build errors and the translated driver error.
    pub async fn insert(&self, insert: &Insert<'_>) -> Result<u64> {
        let (sql, params) = insert.build(self.dialect())?;
        self.execute(&sql, &params).await
    }

    /// Runs an UPDATE and returns the number of rows changed.
    ///
    /// # Errors
    ///
    /// Returns build errors (including a missing confirmation for an
    /// unrestricted update) and the translated driver error.
    pub async fn update(&self, update: &Update<'_>) -> Result<u64> {
        let (sql, params) = update.build(self.dialect())?;
        self.execute(&sql, &params).await
    }

    /// Runs a DELETE and returns the number of rows removed.
    ///
    /// # Errors
    ///
    /// Returns build errors (including a missing confirmation for an
    /// unrestricted delete) and the translated driver error.
    pub async fn delete(&self, delete: &Delete<'_>) -> Result<u64> {
        let (sql, params) = delete.build(self.dialect())?;
        self.execute(&sql, &params).await
    }

    /// Creates `table` and its indices.
    ///
    /// # Errors
    ///
    /// Returns build errors and the translated driver error. Statements
    /// already executed are not rolled back.
    pub async fn create_table(&self, table: &TableSchema, if_not_exists: bool) -> Result<()> {
        let dialect = self.dialect();
        let mut create = CreateTable::new(table);
        let mut indexes = CreateIndexes::new(table);
        if if_not_exists {
            create = create.if_not_exists();
            indexes = indexes.if_not_exists();
        }
        let mut statements = vec![create.build(dialect)?];
        statements.extend(indexes.build(dialect)?);

        for sql in &statements {
            self.execute(sql, &[]).await?;
        }
        info!(table = %table.name, dialect = %dialect, statements = statements.len(), "Created table");
        Ok(())
    }

    /// Drops a table.
    ///
    /// # Errors
    ///
    /// Returns [`crossql_core::Error::ConfirmationRequired`] unless `drop`
    /// is confirmed, and the translated driver error.
    pub async fn drop_table(&self, drop: &DropTable) -> Result<()> {
        let sql = drop.build(self.dialect())?;
        self.execute(&sql, &[]).await?;
        info!(sql = %sql, "Dropped table");
        Ok(())
    }
}
