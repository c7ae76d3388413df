//! Synchronous connections.
//!
//! [`BlockingConnection`] owns a current-thread tokio runtime and blocks on
//! the async [`Connection`] for every call. Do not use it from inside an
//! async context; `block_on` panics there.

use crossql_core::{
    DbConfig, Delete, Dialect, DriverKind, DropTable, Error, Insert, Introspect, Output,
    OutputFormat, RawRows, Resolve, Resolved, Result, Select, SqlValue, TableSchema, Update,
};
use tokio::runtime::{Builder, Runtime};

use crate::connection::Connection;

/// A connection for synchronous callers.
#[derive(Debug)]
pub struct BlockingConnection {
    runtime: Runtime,
    inner: Connection,
}

impl BlockingConnection {
    /// Connects using `config`. The driver is always
    /// [`DriverKind::SqlxBlocking`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for an incomplete configuration or when the
    /// runtime cannot start, and the translated driver error when connecting
    /// fails.
    pub fn connect(config: &DbConfig) -> Result<Self> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| Error::Config(format!("cannot start runtime: {e}")))?;
        let inner = runtime.block_on(Connection::open(config, DriverKind::SqlxBlocking))?;
        Ok(Self { runtime, inner })
    }

    /// Connects to a database URI.
    ///
    /// # Errors
    ///
    /// See [`BlockingConnection::connect`] and [`DbConfig::from_uri`].
    pub fn connect_uri(uri: &str) -> Result<Self> {
        Self::connect(&DbConfig::from_uri(uri)?)
    }

    /// Returns the dialect of the database.
    #[must_use]
    pub const fn dialect(&self) -> Dialect {
        self.inner.dialect()
    }

    /// Returns [`DriverKind::SqlxBlocking`].
    #[must_use]
    pub const fn driver(&self) -> DriverKind {
        self.inner.driver()
    }

    /// See [`Connection::execute`].
    ///
    /// # Errors
    ///
    /// Returns the translated driver error.
    pub fn execute(&self, sql: &str, params: &[SqlValue]) -> Result<u64> {
        self.runtime.block_on(self.inner.execute(sql, params))
    }

    /// See [`Connection::fetch_all`].
    ///
    /// # Errors
    ///
    /// Returns the translated driver error.
    pub fn fetch_all(&self, sql: &str, params: &[SqlValue]) -> Result<RawRows> {
        self.runtime.block_on(self.inner.fetch_all(sql, params))
    }

    /// See [`Connection::select`].
    ///
    /// # Errors
    ///
    /// See [`Connection::select`].
    pub fn select(
        &self,
        query: &Select<'_>,
        table: Option<&TableSchema>,
        format: OutputFormat,
    ) -> Result<Output> {
        self.runtime.block_on(self.inner.select(query, table, format))
    }

    /// See [`Connection::insert`].
    ///
    /// # Errors
    ///
    /// See [`Connection::insert`].
    pub fn insert(&self, insert: &Insert<'_>) -> Result<u64> {
        self.runtime.block_on(self.inner.insert(insert))
    }

    /// See [`Connection::update`].
    ///
    /// # Errors
    ///
    /// See [`Connection::update`].
    pub fn update(&self, update: &Update<'_>) -> Result<u64> {
        self.runtime.block_on(self.inner.update(update))
    }

    /// See [`Connection::delete`].
    ///
    /// # Errors
    ///
    /// See [`Connection::delete`].
    pub fn delete(&self, delete: &Delete<'_>) -> Result<u64> {
        self.runtime.block_on(self.inner.delete(delete))
    }

    /// See [`Connection::create_table`].
    ///
    /// # Errors
    ///
    /// See [`Connection::create_table`].
    pub fn create_table(&self, table: &TableSchema, if_not_exists: bool) -> Result<()> {
        self.runtime
            .block_on(self.inner.create_table(table, if_not_exists))
    }

    /// See [`Connection::drop_table`].
    ///
    /// # Errors
    ///
    /// See [`Connection::drop_table`].
    pub fn drop_table(&self, drop: &DropTable) -> Result<()> {
        self.runtime.block_on(self.inner.drop_table(drop))
    }

    /// Closes the pool.
    pub fn close(&self) {
        self.runtime.block_on(self.inner.close());
    }
}

impl Introspect for BlockingConnection {
    type Error = Error;

    fn table_names(&self) -> Result<Vec<String>> {
        self.runtime.block_on(self.inner.table_names())
    }

    fn introspect_table(&self, table: &str) -> Result<TableSchema> {
        self.runtime.block_on(self.inner.introspect_table(table))
    }
}

impl Resolve for BlockingConnection {
    fn resolve(&self) -> Result<Resolved> {
        self.inner.resolve()
    }
}
