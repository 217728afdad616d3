//! Classification of transformed records against the store's current state.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use tracing::info;

use crate::entity::Entity;

/// Outcome of reconciling one entity's records.
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation<E> {
    /// Records whose natural key the store does not know yet.
    pub to_insert: Vec<E>,
    /// Records that exist in the store with different field values.
    pub to_update: Vec<E>,
    /// Number of records identical to their stored counterpart.
    pub unchanged: usize,
    /// Number of records superseded by a later record with the same natural key.
    pub duplicate_keys: usize,
}

impl<E> Reconciliation<E> {
    /// Returns whether nothing has to be written.
    pub fn is_empty(&self) -> bool {
        self.to_insert.is_empty() && self.to_update.is_empty()
    }
}

/// Splits `transformed` into inserts, updates and unchanged records.
///
/// Records are matched against `existing` by natural key only. When the same key
/// occurs more than once, the last occurrence replaces the earlier ones and is
/// classified in place of the first occurrence, so the output keeps source order.
pub fn reconcile<E: Entity>(transformed: Vec<E>, existing: &HashMap<i64, E>) -> Reconciliation<E> {
    let mut positions: HashMap<i64, usize> = HashMap::with_capacity(transformed.len());
    let mut latest: Vec<E> = Vec::with_capacity(transformed.len());
    let mut duplicate_keys = 0;

    for record in transformed {
        match positions.entry(record.natural_key()) {
            Entry::Occupied(entry) => {
                duplicate_keys += 1;
                info!(
                    entity = %E::KIND,
                    natural_key = record.natural_key(),
                    "duplicate natural key in source, keeping the last occurrence"
                );
                latest[*entry.get()] = record;
            }
            Entry::Vacant(entry) => {
                entry.insert(latest.len());
                latest.push(record);
            }
        }
    }

    let mut reconciliation = Reconciliation {
        to_insert: Vec::new(),
        to_update: Vec::new(),
        unchanged: 0,
        duplicate_keys,
    };

    for record in latest {
        match existing.get(&record.natural_key()) {
            None => reconciliation.to_insert.push(record),
            Some(stored) if *stored != record => reconciliation.to_update.push(record),
            Some(_) => reconciliation.unchanged += 1,
        }
    }

    reconciliation
}
