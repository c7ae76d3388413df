//! Error types shared by every crossql component.

/// Boxed driver error carried through untranslated.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised while normalizing schemas, building statements, decoding
/// results or talking to a driver.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed schema input or an unusable statement description.
    #[error("Schema error: {0}")]
    Schema(String),

    /// A table, column, index or alias name failed the identifier check.
    #[error("Invalid identifier: {0:?}")]
    InvalidIdentifier(String),

    /// A where-group, order-by or predicate that cannot be compiled.
    #[error("Invalid predicate: {0}")]
    InvalidPredicate(String),

    /// The statement referenced a table the database does not have.
    #[error("Table does not exist: {table}")]
    TableDoesNotExist {
        /// Table name as reported by the driver.
        table: String,
        /// The driver error that was translated.
        #[source]
        source: Option<BoxError>,
    },

    /// The dialect has no rendering for the requested operation.
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// A destructive statement was built without explicit confirmation.
    #[error("{0} requires explicit confirmation")]
    ConfirmationRequired(String),

    /// The result had the wrong number of rows for the requested shape.
    #[error("Expected {expected} row(s), got {actual}")]
    UnexpectedRowCount {
        /// Human-readable expectation, e.g. `exactly 1`.
        expected: &'static str,
        /// Rows actually returned.
        actual: usize,
    },

    /// The result had the wrong number of columns for the requested shape.
    #[error("Expected {expected} column(s), got {actual}")]
    UnexpectedColumnCount {
        /// Columns required by the output shape.
        expected: usize,
        /// Columns actually returned.
        actual: usize,
    },

    /// A cell could not be decoded.
    #[error("Decode error: {0}")]
    Decode(String),

    /// Connection configuration could not be resolved.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A driver error with no translation rule, passed through unchanged.
    #[error(transparent)]
    Driver(BoxError),
}

impl Error {
    pub(crate) fn schema(message: impl Into<String>) -> Self {
        Self::Schema(message.into())
    }

    pub(crate) fn predicate(message: impl Into<String>) -> Self {
        Self::InvalidPredicate(message.into())
    }

    pub(crate) fn unsupported(message: impl Into<String>) -> Self {
        Self::UnsupportedOperation(message.into())
    }

    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Returns true if this is [`Error::TableDoesNotExist`].
    #[must_use]
    pub const fn is_table_missing(&self) -> bool {
        matches!(self, Self::TableDoesNotExist { .. })
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

/// Result type for crossql operations.
pub type Result<T> = std::result::Result<T, Error>;
