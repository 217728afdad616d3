//! Orchestration of a sync run across the entity pipelines.
//!
//! A run executes one pipeline per entity, strictly in [`EntityKind::SYNC_ORDER`].
//! Each pipeline loads its export file, transforms the rows, fetches the store's
//! current state, reconciles and writes. Failures are contained at two levels: a bad
//! row is rejected without stopping its pipeline, and a failed pipeline is recorded
//! in the report without stopping the pipelines after it.

use std::collections::{HashMap, HashSet};
use std::time::Instant;

use chrono::Utc;
use serde_json::Value;
use siger_config::shared::SyncServiceConfig;
use tracing::{error, info, warn};

use crate::entity::{Contract, Customer, Entity, EntityKind, Product, fields};
use crate::error::{ErrorKind, SyncResult};
use crate::fetch::fetch_index;
use crate::reconcile::{Reconciliation, reconcile};
use crate::report::{EntityReport, RowError, SyncReport};
use crate::source::{CsvLoader, RawRow};
use crate::store::{RemoteStore, to_store_row};
use crate::sync_error;

/// A transformed record together with the index of the row it came from.
type Indexed<E> = (usize, E);

/// Runs sync passes of the export against a [`RemoteStore`].
///
/// The pipeline holds no state between runs; every call to [`SyncPipeline::run`]
/// recomputes all records from the export and the store.
#[derive(Debug)]
pub struct SyncPipeline<S> {
    config: SyncServiceConfig,
    store: S,
}

impl<S> SyncPipeline<S>
where
    S: RemoteStore,
{
    pub fn new(config: SyncServiceConfig, store: S) -> Self {
        Self { config, store }
    }

    /// Executes one sync run and returns its report.
    ///
    /// Never fails as a whole: entity failures are recorded in the report. Exactly one
    /// summary line is logged per run.
    pub async fn run(&self) -> SyncReport {
        let started_at = Utc::now();
        let start = Instant::now();

        info!(store = S::name(), "starting sync run");

        let loader = CsvLoader::from_config(&self.config.source);
        // Customer keys known to exist in the store once the customer pipeline is done.
        let mut customer_keys: Option<HashSet<i64>> = None;
        let mut entities = Vec::with_capacity(EntityKind::SYNC_ORDER.len());

        for kind in EntityKind::SYNC_ORDER {
            let mut report = EntityReport::new(kind);

            let result = match &loader {
                Ok(loader) => match kind {
                    EntityKind::Customer => self
                        .sync_entity::<Customer>(loader, None, &mut report)
                        .await
                        .map(|keys| customer_keys = Some(keys)),
                    EntityKind::Contract => self
                        .sync_entity::<Contract>(loader, customer_keys.as_ref(), &mut report)
                        .await
                        .map(|_| ()),
                    EntityKind::Product => self
                        .sync_entity::<Product>(loader, None, &mut report)
                        .await
                        .map(|_| ()),
                },
                Err(err) => Err(err.clone()),
            };

            if let Err(err) = result {
                error!(
                    entity = %kind,
                    error = %err,
                    location = %err.location(),
                    "entity pipeline aborted"
                );
                report.failure = Some(err);
            }

            entities.push(report);
        }

        let report = SyncReport {
            started_at,
            elapsed: start.elapsed(),
            entities,
        };

        let elapsed_ms = report.elapsed.as_millis() as u64;
        let row_errors = report.errors().count();
        if report.is_success() {
            info!(elapsed_ms, row_errors, summary = %report, "sync run completed");
        } else {
            let failed = report.failures().count();
            warn!(
                elapsed_ms,
                row_errors,
                failed_entities = failed,
                summary = %report,
                "sync run completed with failed entities"
            );
        }

        report
    }

    /// Runs the pipeline of entity `E` and returns the natural keys present in the
    /// store afterwards.
    ///
    /// `parent_keys` are the customer keys known to exist. When they are unknown
    /// (the customer pipeline failed) parents are looked up in the store instead.
    async fn sync_entity<E: Entity>(
        &self,
        loader: &CsvLoader,
        parent_keys: Option<&HashSet<i64>>,
        report: &mut EntityReport,
    ) -> SyncResult<HashSet<i64>> {
        let kind = E::KIND;
        let table = kind.table(&self.config.store.tables);
        let path = kind.source_path(&self.config.source);

        let rows = loader.load(path, kind.required_columns()).await?;

        let mut records = transform::<E>(&rows, report);
        if records.iter().any(|(_, record)| record.parent_key().is_some()) {
            records = self.check_parents(records, parent_keys, report).await?;
        }

        let existing = fetch_index::<E, S>(&self.store, table).await?;
        let reconciliation = reconcile(
            records.into_iter().map(|(_, record)| record).collect(),
            &existing,
        );
        report.skipped = reconciliation.unchanged;
        report.duplicates = reconciliation.duplicate_keys;

        info!(
            entity = %kind,
            table,
            to_insert = reconciliation.to_insert.len(),
            to_update = reconciliation.to_update.len(),
            unchanged = reconciliation.unchanged,
            "reconciled records"
        );

        let mut keys: HashSet<i64> = existing.into_keys().collect();
        self.write(table, reconciliation, &mut keys, report).await?;

        Ok(keys)
    }

    /// Drops records whose parent customer does not exist, reporting each as a row error.
    async fn check_parents<E: Entity>(
        &self,
        records: Vec<Indexed<E>>,
        parent_keys: Option<&HashSet<i64>>,
        report: &mut EntityReport,
    ) -> SyncResult<Vec<Indexed<E>>> {
        let customer_table = EntityKind::Customer.table(&self.config.store.tables);
        let customer_key = EntityKind::Customer.key_column();
        let mut looked_up: HashMap<i64, bool> = HashMap::new();
        let mut accepted = Vec::with_capacity(records.len());

        for (row_index, record) in records {
            let Some(parent) = record.parent_key() else {
                accepted.push((row_index, record));
                continue;
            };

            let exists = match parent_keys {
                Some(keys) => keys.contains(&parent),
                None => match looked_up.get(&parent) {
                    Some(exists) => *exists,
                    None => {
                        let rows = self
                            .store
                            .select(customer_table, customer_key, &Value::from(parent))
                            .await?;
                        looked_up.insert(parent, !rows.is_empty());
                        !rows.is_empty()
                    }
                },
            };

            if exists {
                accepted.push((row_index, record));
            } else {
                reject(
                    report,
                    RowError {
                        entity: E::KIND,
                        row_index,
                        natural_key: Some(record.natural_key()),
                        error: sync_error!(
                            ErrorKind::ForeignKeyViolation,
                            "Referenced customer does not exist",
                            detail = format!("{customer_key} = {parent}")
                        ),
                    },
                );
            }
        }

        Ok(accepted)
    }

    /// Writes inserts in batches, then updates one by one.
    ///
    /// Every written key is added to `keys`. The first failed request aborts the writes.
    async fn write<E: Entity>(
        &self,
        table: &str,
        reconciliation: Reconciliation<E>,
        keys: &mut HashSet<i64>,
        report: &mut EntityReport,
    ) -> SyncResult<()> {
        let batch_size = self.config.batch.max_size.max(1);

        for chunk in reconciliation.to_insert.chunks(batch_size) {
            let rows = chunk
                .iter()
                .map(to_store_row)
                .collect::<SyncResult<Vec<_>>>()?;

            self.store.insert(table, rows).await?;

            report.inserted += chunk.len();
            keys.extend(chunk.iter().map(Entity::natural_key));
        }

        let match_key = E::KIND.key_column();
        for record in &reconciliation.to_update {
            self.store
                .update(table, to_store_row(record)?, match_key)
                .await?;

            report.updated += 1;
        }

        info!(
            entity = %E::KIND,
            table,
            inserted = report.inserted,
            updated = report.updated,
            "wrote records to remote store"
        );

        Ok(())
    }
}

/// Builds records from `rows`, rejecting the rows that fail.
fn transform<E: Entity>(rows: &[RawRow], report: &mut EntityReport) -> Vec<Indexed<E>> {
    let mut records = Vec::with_capacity(rows.len());

    for row in rows {
        match E::from_row(row) {
            Ok(record) => records.push((row.index(), record)),
            Err(err) => reject(
                report,
                RowError {
                    entity: E::KIND,
                    row_index: row.index(),
                    natural_key: fields::key(row, E::KIND.source_key_column()).ok(),
                    error: err,
                },
            ),
        }
    }

    records
}

fn reject(report: &mut EntityReport, row_error: RowError) {
    error!(
        entity = %row_error.entity,
        row_index = row_error.row_index,
        natural_key = ?row_error.natural_key,
        error = %row_error.error,
        "rejected source row"
    );
    report.row_errors.push(row_error);
}
