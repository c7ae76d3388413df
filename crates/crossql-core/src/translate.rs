//! Driver error translation.
//!
//! Drivers describe their failures as a [`NativeError`]; [`translate`] maps
//! the ones it recognizes onto the [`Error`] taxonomy using a fixed rule
//! table and passes everything else through as [`Error::Driver`].

use std::sync::LazyLock;

use regex::Regex;
use tracing::warn;

use crate::dialect::{Dialect, DriverKind};
use crate::error::{BoxError, Error};

/// A driver failure, described independently of the driver's error type.
#[derive(Debug, thiserror::Error)]
#[error("{driver} ({dialect}) error{}: {message}", code_suffix(.code.as_deref()))]
pub struct NativeError {
    pub driver: DriverKind,
    pub dialect: Dialect,
    /// SQLSTATE (PostgreSQL) or extended result code (SQLite).
    pub code: Option<String>,
    pub message: String,
    /// The driver's own error.
    #[source]
    pub source: Option<BoxError>,
}

impl NativeError {
    /// Describes an error without a driver source attached.
    #[must_use]
    pub fn new(
        driver: DriverKind,
        dialect: Dialect,
        code: Option<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            driver,
            dialect,
            code,
            message: message.into(),
            source: None,
        }
    }

    /// Attaches the driver's error.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<BoxError>) -> Self {
        self.source = Some(source.into());
        self
    }
}

fn code_suffix(code: Option<&str>) -> String {
    code.map(|c| format!(" {c}")).unwrap_or_default()
}

/// Error kinds a rule can translate to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    TableDoesNotExist,
}

struct Rule {
    dialect: Dialect,
    /// Matches when the error carries this code.
    code: Option<&'static str>,
    /// Matches when the message matches. The `table` group, if any, names
    /// the subject.
    pattern: Regex,
    kind: ErrorKind,
}

static RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    vec![
        Rule {
            dialect: Dialect::Sqlite,
            code: None,
            pattern: Regex::new(r"no such table: (?P<table>[\w.]+)").expect("valid regex"),
            kind: ErrorKind::TableDoesNotExist,
        },
        Rule {
            dialect: Dialect::Postgres,
            code: Some("42P01"),
            pattern: Regex::new(r#"relation "(?P<table>[^"]+)" does not exist"#)
                .expect("valid regex"),
            kind: ErrorKind::TableDoesNotExist,
        },
    ]
});

impl Rule {
    fn matches(&self, error: &NativeError) -> bool {
        self.dialect == error.dialect
            && ((self.code.is_some() && self.code == error.code.as_deref())
                || self.pattern.is_match(&error.message))
    }

    fn subject(&self, message: &str) -> String {
        self.pattern
            .captures(message)
            .and_then(|caps| caps.name("table"))
            .map_or_else(
                || message.to_string(),
                |m| {
                    let name = m.as_str();
                    name.rsplit_once('.').map_or(name, |(_, t)| t).to_string()
                },
            )
    }
}

/// Returns the kind the rule table assigns to `error`, if any.
#[must_use]
pub fn classify(error: &NativeError) -> Option<ErrorKind> {
    RULES.iter().find(|r| r.matches(error)).map(|r| r.kind)
}

/// Translates a driver error. Unrecognized errors pass through as
/// [`Error::Driver`].
#[must_use]
pub fn translate(error: NativeError) -> Error {
    let Some(rule) = RULES.iter().find(|r| r.matches(&error)) else {
        warn!(
            driver = %error.driver,
            dialect = %error.dialect,
            code = ?error.code,
            message = %error.message,
            "Untranslated driver error"
        );
        return Error::Driver(Box::new(error));
    };
    match rule.kind {
        ErrorKind::TableDoesNotExist => Error::TableDoesNotExist {
            table: rule.subject(&error.message),
            source: Some(Box::new(error)),
        },
    }
}
