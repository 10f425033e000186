//! Request validation utilities.

use crate::types::{Error, Result, SummaryKey};

/// Longest accepted summary key, in characters.
pub const MAX_KEY_CHARS: usize = 256;

/// Validate that a string is not empty.
pub fn validate_non_empty(s: &str, field: &str) -> Result<()> {
    if s.trim().is_empty() {
        return Err(Error::validation(format!("{} cannot be empty", field)));
    }
    Ok(())
}

/// Validate summary content. Stored verbatim, so only the empty string is
/// rejected; whitespace is content.
pub fn validate_content(s: &str, field: &str) -> Result<()> {
    if s.is_empty() {
        return Err(Error::validation(format!("{} cannot be empty", field)));
    }
    Ok(())
}

/// Parse a caller-supplied key into a [`SummaryKey`].
///
/// Keys must be non-blank, at most [`MAX_KEY_CHARS`] characters and free of
/// control characters.
pub fn parse_summary_key(raw: &str, field: &str) -> Result<SummaryKey> {
    validate_non_empty(raw, field)?;
    let chars = raw.chars().count();
    if chars > MAX_KEY_CHARS {
        return Err(Error::validation(format!(
            "{} must be at most {} characters, got {}",
            field, MAX_KEY_CHARS, chars
        )));
    }
    if raw.chars().any(char::is_control) {
        return Err(Error::validation(format!(
            "{} cannot contain control characters",
            field
        )));
    }
    SummaryKey::from_string(raw.to_string()).map_err(Error::validation)
}
