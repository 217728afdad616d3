//! Field extraction from raw rows and tolerant decoding of stored rows.

use serde::{Deserialize, Deserializer, de};

use crate::entity::columns::{ACTIVE_STATUS, STATUS};
use crate::error::{ErrorKind, SyncResult};
use crate::source::RawRow;
use crate::{bail, sync_error};

/// Returns the trimmed value of a column every row must carry.
///
/// Fails with [`ErrorKind::MissingField`] naming `column` when the row has no value.
pub fn required<'a>(row: &'a RawRow, column: &str) -> SyncResult<&'a str> {
    row.get(column)
        .map(str::trim)
        .ok_or_else(|| sync_error!(ErrorKind::MissingField, "Required field is absent", column))
}

/// Parses the integer natural key stored in `column`.
///
/// A blank value counts as absent. Anything else that is not an integer is a
/// [`ErrorKind::FormatError`].
pub fn key(row: &RawRow, column: &str) -> SyncResult<i64> {
    let value = required(row, column)?;
    if value.is_empty() {
        bail!(ErrorKind::MissingField, "Required field is absent", column);
    }

    match value.parse::<i64>() {
        Ok(key) => Ok(key),
        Err(_) => bail!(
            ErrorKind::FormatError,
            "Key field is not an integer",
            detail = format!("{column} = '{value}'")
        ),
    }
}

/// Returns the trimmed value of an optional column, or an empty string.
pub fn text(row: &RawRow, column: &str) -> String {
    text_or(row, column, "")
}

/// Returns the trimmed value of an optional column, or `default` when absent or blank.
pub fn text_or(row: &RawRow, column: &str, default: &str) -> String {
    match row.get(column).map(str::trim) {
        Some(value) if !value.is_empty() => value.to_string(),
        _ => default.to_string(),
    }
}

/// Returns whether the row's status is active.
///
/// An absent status is treated as inactive.
pub fn is_active(row: &RawRow) -> bool {
    row.get(STATUS)
        .is_some_and(|status| status.trim().to_lowercase() == ACTIVE_STATUS)
}

/// Returns whether the row's status marks the record as deleted.
///
/// An absent status is treated as deleted.
pub fn is_deleted(row: &RawRow) -> bool {
    row.get(STATUS)
        .is_none_or(|status| status.trim().to_lowercase() != ACTIVE_STATUS)
}

/// Deserializes `null` as the type's default value.
pub fn null_to_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Deserializes an integer key stored either as a JSON number or as a numeric string.
pub fn key_from_number_or_string<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Key {
        Number(i64),
        Text(String),
    }

    match Key::deserialize(deserializer)? {
        Key::Number(key) => Ok(key),
        Key::Text(text) => text
            .trim()
            .parse()
            .map_err(|_| de::Error::custom(format!("invalid integer key '{text}'"))),
    }
}
