//! Loading the store's current contents into an index by natural key.

use std::collections::HashMap;

use tracing::{info, warn};

use crate::entity::Entity;
use crate::error::SyncResult;
use crate::store::{RemoteStore, from_store_row};

/// Reads every row of `table` and indexes the decoded records by natural key.
///
/// A failed read propagates, since reconciling without a complete baseline would
/// re-insert records that already exist. Should the table hold the same natural
/// key twice, the row read last wins.
pub async fn fetch_index<E, S>(store: &S, table: &str) -> SyncResult<HashMap<i64, E>>
where
    E: Entity,
    S: RemoteStore,
{
    let rows = store.select_all(table, E::KIND.key_column()).await?;

    let mut index = HashMap::with_capacity(rows.len());
    for row in rows {
        let record: E = from_store_row(row)?;
        if let Some(previous) = index.insert(record.natural_key(), record) {
            warn!(
                entity = %E::KIND,
                table,
                natural_key = previous.natural_key(),
                "remote store holds more than one row for a natural key"
            );
        }
    }

    info!(
        entity = %E::KIND,
        table,
        record_count = index.len(),
        "fetched remote state"
    );

    Ok(index)
}
