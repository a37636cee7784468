//! Table name validation.
//!
//! Table names are interpolated into SQL text, so only plain identifiers
//! (optionally schema-qualified) are accepted.

use crate::ConfigError;

/// Validate a table name for use in generated SQL.
///
/// Accepts `name` or `schema.name`, where each part matches
/// `[A-Za-z_][A-Za-z0-9_]*` and is at most 63 bytes.
///
/// # Errors
///
/// Returns [`ConfigError::NoTable`] for an empty name and
/// [`ConfigError::InvalidTable`] for anything else that is not an identifier.
pub fn validate_table_name(table: &str) -> Result<(), ConfigError> {
    if table.is_empty() {
        return Err(ConfigError::NoTable);
    }

    let mut parts = table.split('.');
    let valid = match (parts.next(), parts.next(), parts.next()) {
        (Some(name), None, _) => is_identifier(name),
        (Some(schema), Some(name), None) => is_identifier(schema) && is_identifier(name),
        _ => false,
    };

    if valid {
        Ok(())
    } else {
        Err(ConfigError::InvalidTable(table.to_string()))
    }
}

/// PostgreSQL truncates longer identifiers.
pub const MAX_IDENTIFIER_LEN: usize = 63;

/// Index names are derived from the table name; dots are not allowed there.
pub(crate) fn index_prefix(table: &str) -> String {
    table.replace('.', "_")
}

/// Reject a table whose derived index names would be truncated.
///
/// Truncated names can collide, and `CREATE INDEX IF NOT EXISTS` then
/// silently skips the later indexes.
pub(crate) fn validate_index_names(
    table: &str,
    index_names: &[String],
) -> Result<(), ConfigError> {
    if index_names.iter().any(|name| name.len() > MAX_IDENTIFIER_LEN) {
        return Err(ConfigError::InvalidTable(table.to_string()));
    }
    Ok(())
}

fn is_identifier(part: &str) -> bool {
    let mut chars = part.chars();
    let Some(first) = chars.next() else {
        return false;
    };

    part.len() <= MAX_IDENTIFIER_LEN
        && (first.is_ascii_alphabetic() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
