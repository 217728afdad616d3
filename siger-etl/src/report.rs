//! Outcome of a sync run.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::entity::EntityKind;
use crate::error::{SyncError, SyncResult};

/// A source row that could not be turned into a record.
#[derive(Debug, Clone, PartialEq)]
pub struct RowError {
    pub entity: EntityKind,
    /// 1-based index of the row among the data rows of the export.
    pub row_index: usize,
    /// Natural key of the row, when it could be read.
    pub natural_key: Option<i64>,
    pub error: SyncError,
}

impl fmt::Display for RowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} row {}", self.entity, self.row_index)?;
        if let Some(natural_key) = self.natural_key {
            write!(f, " (key {natural_key})")?;
        }
        write!(f, ": {}", self.error)
    }
}

/// Counts and failures of one entity pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityReport {
    pub kind: EntityKind,
    pub inserted: usize,
    pub updated: usize,
    pub skipped: usize,
    pub duplicates: usize,
    pub row_errors: Vec<RowError>,
    /// Error that aborted the pipeline, if any.
    pub failure: Option<SyncError>,
}

impl EntityReport {
    pub fn new(kind: EntityKind) -> Self {
        Self {
            kind,
            inserted: 0,
            updated: 0,
            skipped: 0,
            duplicates: 0,
            row_errors: Vec::new(),
            failure: None,
        }
    }

    /// Returns whether the pipeline ran to completion.
    ///
    /// Rejected rows do not count as a failure of the pipeline.
    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }
}

impl fmt::Display for EntityReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: inserted={} updated={} skipped={} duplicates={} row_errors={}",
            self.kind,
            self.inserted,
            self.updated,
            self.skipped,
            self.duplicates,
            self.row_errors.len()
        )?;
        if let Some(failure) = &self.failure {
            write!(f, " failed={failure}")?;
        }

        Ok(())
    }
}

/// Summary of one sync run across all entities.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncReport {
    pub started_at: DateTime<Utc>,
    pub elapsed: Duration,
    /// One report per entity, in the order the pipelines ran.
    pub entities: Vec<EntityReport>,
}

impl SyncReport {
    pub fn entity(&self, kind: EntityKind) -> Option<&EntityReport> {
        self.entities.iter().find(|report| report.kind == kind)
    }

    pub fn inserted(&self, kind: EntityKind) -> usize {
        self.entity(kind).map_or(0, |report| report.inserted)
    }

    pub fn updated(&self, kind: EntityKind) -> usize {
        self.entity(kind).map_or(0, |report| report.updated)
    }

    pub fn skipped(&self, kind: EntityKind) -> usize {
        self.entity(kind).map_or(0, |report| report.skipped)
    }

    /// Returns every rejected row of the run.
    pub fn errors(&self) -> impl Iterator<Item = &RowError> {
        self.entities
            .iter()
            .flat_map(|report| report.row_errors.iter())
    }

    /// Returns the errors that aborted entity pipelines.
    pub fn failures(&self) -> impl Iterator<Item = &SyncError> {
        self.entities
            .iter()
            .filter_map(|report| report.failure.as_ref())
    }

    /// Returns whether every entity pipeline ran to completion.
    pub fn is_success(&self) -> bool {
        self.entities.iter().all(EntityReport::is_success)
    }

    /// Converts the report into an error aggregating every pipeline failure.
    pub fn into_result(self) -> SyncResult<Self> {
        let failures: Vec<SyncError> = self.failures().cloned().collect();
        if failures.is_empty() {
            return Ok(self);
        }

        Err(failures.into())
    }
}

impl fmt::Display for SyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sync run took {}ms", self.elapsed.as_millis())?;
        for report in &self.entities {
            write!(f, "; {report}")?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::sync_error;

    fn report(entities: Vec<EntityReport>) -> SyncReport {
        SyncReport {
            started_at: Utc::now(),
            elapsed: Duration::from_millis(12),
            entities,
        }
    }

    #[test]
    fn counts_are_looked_up_per_entity() {
        let mut customers = EntityReport::new(EntityKind::Customer);
        customers.inserted = 2;
        customers.skipped = 1;

        let report = report(vec![customers]);

        assert_eq!(report.inserted(EntityKind::Customer), 2);
        assert_eq!(report.skipped(EntityKind::Customer), 1);
        assert_eq!(report.inserted(EntityKind::Product), 0);
        assert!(report.is_success());
    }

    #[test]
    fn failures_are_aggregated() {
        let mut contracts = EntityReport::new(EntityKind::Contract);
        contracts.failure = Some(sync_error!(ErrorKind::RemoteUnavailable, "Store down"));
        let mut products = EntityReport::new(EntityKind::Product);
        products.failure = Some(sync_error!(ErrorKind::SchemaError, "Missing columns"));

        let report = report(vec![EntityReport::new(EntityKind::Customer), contracts, products]);

        assert!(!report.is_success());
        let err = report.into_result().unwrap_err();
        assert_eq!(
            err.kinds(),
            vec![ErrorKind::RemoteUnavailable, ErrorKind::SchemaError]
        );
    }

    #[test]
    fn row_errors_do_not_fail_the_run() {
        let mut customers = EntityReport::new(EntityKind::Customer);
        customers.row_errors.push(RowError {
            entity: EntityKind::Customer,
            row_index: 4,
            natural_key: None,
            error: sync_error!(ErrorKind::MissingField, "Required field is absent", "Cód"),
        });

        let report = report(vec![customers]);

        assert!(report.is_success());
        assert_eq!(report.errors().count(), 1);
        assert_eq!(
            report.errors().next().unwrap().to_string(),
            "customer row 4: [MissingField] Required field is absent: Cód"
        );
    }

    #[test]
    fn summary_is_a_single_line() {
        let mut products = EntityReport::new(EntityKind::Product);
        products.inserted = 1;

        let rendered = report(vec![products]).to_string();

        assert_eq!(
            rendered,
            "sync run took 12ms; product: inserted=1 updated=0 skipped=0 duplicates=0 row_errors=0"
        );
    }
}
