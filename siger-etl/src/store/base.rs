use std::future::Future;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::bail;
use crate::error::{ErrorKind, SyncResult};

/// A row as exchanged with the store: column name to JSON value.
pub type StoreRow = serde_json::Map<String, Value>;

/// Trait for stores the sync writes reconciled records to.
///
/// Tables are addressed by name and rows are untyped JSON objects, so a single
/// implementation serves every entity. Reads must reflect all writes acknowledged
/// before them; nothing else is assumed about the store's consistency model.
pub trait RemoteStore {
    /// Returns the name of the store implementation.
    fn name() -> &'static str;

    /// Returns the rows of `table` whose `key` column equals `value`.
    fn select(
        &self,
        table: &str,
        key: &str,
        value: &Value,
    ) -> impl Future<Output = SyncResult<Vec<StoreRow>>> + Send;

    /// Returns every row of `table`, ordered by `order_key`.
    ///
    /// Implementations that page through the table must keep reading until the last
    /// page, since the caller treats the result as the complete table.
    fn select_all(
        &self,
        table: &str,
        order_key: &str,
    ) -> impl Future<Output = SyncResult<Vec<StoreRow>>> + Send;

    /// Inserts `rows` into `table` in a single request.
    fn insert(
        &self,
        table: &str,
        rows: Vec<StoreRow>,
    ) -> impl Future<Output = SyncResult<()>> + Send;

    /// Overwrites the columns present in `row` on the rows whose `match_key` column
    /// equals `row[match_key]`.
    fn update(
        &self,
        table: &str,
        row: StoreRow,
        match_key: &str,
    ) -> impl Future<Output = SyncResult<()>> + Send;
}

/// Serializes a record into a store row.
pub fn to_store_row<T: Serialize>(record: &T) -> SyncResult<StoreRow> {
    match serde_json::to_value(record) {
        Ok(Value::Object(row)) => Ok(row),
        Ok(other) => bail!(
            ErrorKind::SerializationError,
            "Record does not serialize to a row",
            detail = other.to_string()
        ),
        Err(err) => bail!(
            ErrorKind::SerializationError,
            "Record serialization failed",
            detail = err.to_string(),
            source: err
        ),
    }
}

/// Decodes a store row into a record.
pub fn from_store_row<T: DeserializeOwned>(row: StoreRow) -> SyncResult<T> {
    Ok(serde_json::from_value(Value::Object(row))?)
}

/// Returns the value of `match_key` in `row`, failing when the row lacks it.
pub(crate) fn match_value<'a>(row: &'a StoreRow, match_key: &str) -> SyncResult<&'a Value> {
    match row.get(match_key) {
        Some(value) if !value.is_null() => Ok(value),
        _ => bail!(
            ErrorKind::InvalidData,
            "Row has no value for the match key",
            match_key
        ),
    }
}
