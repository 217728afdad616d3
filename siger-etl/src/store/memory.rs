use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::info;

use crate::bail;
use crate::error::{ErrorKind, SyncResult};
use crate::store::base::match_value;
use crate::store::{RemoteStore, StoreRow, from_store_row};

/// Column the store assigns to every inserted row.
pub const ROW_ID_COLUMN: &str = "id";

#[derive(Debug, Default)]
struct Inner {
    tables: HashMap<String, Vec<StoreRow>>,
    next_id: i64,
    failing_reads: HashSet<String>,
    failing_writes: HashSet<String>,
    insert_batches: HashMap<String, Vec<usize>>,
    update_counts: HashMap<String, usize>,
}

impl Inner {
    fn insert_row(&mut self, table: &str, mut row: StoreRow) {
        self.next_id += 1;
        row.insert(ROW_ID_COLUMN.to_string(), Value::from(self.next_id));
        self.tables.entry(table.to_string()).or_default().push(row);
    }

    fn check_read(&self, table: &str) -> SyncResult<()> {
        if self.failing_reads.contains(table) {
            bail!(
                ErrorKind::RemoteUnavailable,
                "Remote store read failed",
                detail = format!("reads from table '{table}' are configured to fail")
            );
        }

        Ok(())
    }

    fn check_write(&self, table: &str) -> SyncResult<()> {
        if self.failing_writes.contains(table) {
            bail!(
                ErrorKind::RemoteUnavailable,
                "Remote store write failed",
                detail = format!("writes to table '{table}' are configured to fail")
            );
        }

        Ok(())
    }
}

/// In-memory store for testing and development purposes.
///
/// Tables are created on first write. Like a real store, every inserted row gets a
/// store-assigned [`ROW_ID_COLUMN`]. Reads and writes can be made to fail per table
/// to exercise failure isolation.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    /// Creates a new empty memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds rows to `table` without recording them as writes.
    pub async fn seed(&self, table: &str, rows: Vec<StoreRow>) {
        let mut inner = self.inner.lock().await;
        for row in rows {
            inner.insert_row(table, row);
        }
    }

    /// Returns a copy of the rows of `table`.
    pub async fn rows(&self, table: &str) -> Vec<StoreRow> {
        let inner = self.inner.lock().await;
        inner.tables.get(table).cloned().unwrap_or_default()
    }

    /// Returns the rows of `table` decoded as records.
    pub async fn records<T: DeserializeOwned>(&self, table: &str) -> SyncResult<Vec<T>> {
        self.rows(table)
            .await
            .into_iter()
            .map(from_store_row)
            .collect()
    }

    /// Makes every subsequent read of `table` fail with [`ErrorKind::RemoteUnavailable`].
    pub async fn fail_reads(&self, table: &str) {
        let mut inner = self.inner.lock().await;
        inner.failing_reads.insert(table.to_string());
    }

    /// Makes every subsequent write to `table` fail with [`ErrorKind::RemoteUnavailable`].
    pub async fn fail_writes(&self, table: &str) {
        let mut inner = self.inner.lock().await;
        inner.failing_writes.insert(table.to_string());
    }

    /// Returns the size of every insert request received for `table`, in order.
    pub async fn insert_batches(&self, table: &str) -> Vec<usize> {
        let inner = self.inner.lock().await;
        inner.insert_batches.get(table).cloned().unwrap_or_default()
    }

    /// Returns the number of update requests received for `table`.
    pub async fn update_count(&self, table: &str) -> usize {
        let inner = self.inner.lock().await;
        inner.update_counts.get(table).copied().unwrap_or_default()
    }
}

impl RemoteStore for MemoryStore {
    fn name() -> &'static str {
        "memory"
    }

    async fn select(&self, table: &str, key: &str, value: &Value) -> SyncResult<Vec<StoreRow>> {
        let inner = self.inner.lock().await;
        inner.check_read(table)?;

        let rows = inner
            .tables
            .get(table)
            .map(|rows| {
                rows.iter()
                    .filter(|row| row.get(key) == Some(value))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        Ok(rows)
    }

    async fn select_all(&self, table: &str, order_key: &str) -> SyncResult<Vec<StoreRow>> {
        let inner = self.inner.lock().await;
        inner.check_read(table)?;

        let mut rows = inner.tables.get(table).cloned().unwrap_or_default();
        rows.sort_by_key(|row| row.get(order_key).and_then(Value::as_i64));

        Ok(rows)
    }

    async fn insert(&self, table: &str, rows: Vec<StoreRow>) -> SyncResult<()> {
        let mut inner = self.inner.lock().await;
        inner.check_write(table)?;

        info!(table, row_count = rows.len(), "inserting rows into memory store");

        inner
            .insert_batches
            .entry(table.to_string())
            .or_default()
            .push(rows.len());
        for row in rows {
            inner.insert_row(table, row);
        }

        Ok(())
    }

    async fn update(&self, table: &str, row: StoreRow, match_key: &str) -> SyncResult<()> {
        let mut inner = self.inner.lock().await;
        inner.check_write(table)?;

        let value = match_value(&row, match_key)?.clone();
        *inner.update_counts.entry(table.to_string()).or_default() += 1;

        if let Some(rows) = inner.tables.get_mut(table) {
            for existing in rows
                .iter_mut()
                .filter(|existing| existing.get(match_key) == Some(&value))
            {
                for (column, cell) in &row {
                    existing.insert(column.clone(), cell.clone());
                }
            }
        }

        Ok(())
    }
}
