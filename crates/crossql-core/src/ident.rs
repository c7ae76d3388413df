//! Identifier validation.
//!
//! Table, column, index and alias names are interpolated into SQL text
//! unquoted, so every one of them passes through [`validate_identifier`]
//! before it reaches a statement. Values never do; they are always bound as
//! parameters.

use crate::error::{Error, Result};

/// Returns true if `name` is non-empty and consists only of ASCII letters,
/// digits and underscores.
#[must_use]
pub fn is_valid_identifier(name: &str) -> bool {
    !name.is_empty() && name.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

/// Checks `name` against the identifier pattern.
///
/// # Errors
///
/// Returns [`Error::InvalidIdentifier`] when the name is empty or contains
/// anything besides `[A-Za-z0-9_]`.
pub fn validate_identifier(name: &str) -> Result<&str> {
    if is_valid_identifier(name) {
        Ok(name)
    } else {
        Err(Error::InvalidIdentifier(name.to_string()))
    }
}

/// Validates `names` and joins them with `", "`.
pub(crate) fn join_identifiers<'a, I>(names: I) -> Result<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let names: Vec<&str> = names
        .into_iter()
        .map(validate_identifier)
        .collect::<Result<_>>()?;
    Ok(names.join(", "))
}
