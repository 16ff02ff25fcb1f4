//! # Migration Driver
//!
//! Orchestrates the one-way transition from reified date values to inline
//! intervals:
//!
//! 1. `prepare_schema`: add the interval columns
//! 2. `normalize_actors`: one transaction per actor
//! 3. `project_events`: one transaction per event, then per involvement
//! 4. `finalize_schema`: drop the temporal-role properties and legacy date columns
//!
//! A subject that fails is rolled back and recorded; the batch goes on.
//! `run` only finalizes when every subject succeeded, so the legacy data of a
//! failed subject stays in place for a later attempt.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::{MigrationConfig, code_refs};
use crate::model::{Endpoint, Entity, EntityId};
use crate::storage::StorageBackend;
use crate::temporal::{normalize_actor, project_subject};
use crate::tx::TxMode;
use crate::{Error, ErrorKind, Result};

// ============================================================================
// Report
// ============================================================================

/// A subject whose unit of work was rolled back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectFailure {
    pub subject: Endpoint,
    pub kind: ErrorKind,
    pub message: String,
}

impl SubjectFailure {
    pub fn new(subject: Endpoint, err: &Error) -> Self {
        Self { subject, kind: err.kind(), message: err.to_string() }
    }
}

/// Outcome of one or more migration phases.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationReport {
    /// Subjects whose unit of work committed.
    pub succeeded: usize,
    /// Derived events created by committed actor units.
    pub derived_events: usize,
    pub failures: Vec<SubjectFailure>,
}

impl MigrationReport {
    pub fn record_failure(&mut self, subject: Endpoint, err: &Error) {
        warn!(%subject, kind = ?err.kind(), error = %err, "subject rolled back");
        self.failures.push(SubjectFailure::new(subject, err));
    }

    pub fn merge(&mut self, other: MigrationReport) {
        self.succeeded += other.succeeded;
        self.derived_events += other.derived_events;
        self.failures.extend(other.failures);
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failed_subjects(&self) -> Vec<Endpoint> {
        self.failures.iter().map(|f| f.subject).collect()
    }
}

// ============================================================================
// Migrator
// ============================================================================

/// Runs the migration phases against one backend.
pub struct Migrator<'b, B: StorageBackend> {
    backend: &'b B,
    config: MigrationConfig,
}

impl<'b, B: StorageBackend> Migrator<'b, B> {
    pub fn new(backend: &'b B, config: MigrationConfig) -> Self {
        Self { backend, config }
    }

    pub fn config(&self) -> &MigrationConfig {
        &self.config
    }

    /// Commit on success, roll back on failure. A failed commit is the result.
    async fn settle<T>(&self, tx: B::Tx, result: Result<T>) -> Result<T> {
        match result {
            Ok(value) => {
                self.backend.commit_tx(tx).await?;
                Ok(value)
            }
            Err(err) => {
                self.backend.rollback_tx(tx).await?;
                Err(err)
            }
        }
    }

    async fn require_interval_columns(&self) -> Result<()> {
        let tx = self.backend.begin_tx(TxMode::ReadOnly).await?;
        let schema = self.backend.schema(&tx).await;
        self.backend.rollback_tx(tx).await?;
        if schema?.interval_columns {
            Ok(())
        } else {
            Err(Error::SchemaError("interval columns do not exist; prepare the schema first".into()))
        }
    }

    // ========================================================================
    // Schema transition
    // ========================================================================

    /// Add the six interval columns to entities and links.
    pub async fn prepare_schema(&self) -> Result<()> {
        let mut tx = self.backend.begin_tx(TxMode::ReadWrite).await?;
        let result = self.backend.add_interval_columns(&mut tx).await;
        self.settle(tx, result).await?;
        info!("interval columns added");
        Ok(())
    }

    /// Drop every temporal-role property and the legacy date columns, all
    /// or nothing.
    pub async fn finalize_schema(&self) -> Result<()> {
        let mut tx = self.backend.begin_tx(TxMode::ReadWrite).await?;
        let result = self.drop_legacy(&mut tx).await;
        self.settle(tx, result).await?;
        info!("legacy temporal schema dropped");
        Ok(())
    }

    async fn drop_legacy(&self, tx: &mut B::Tx) -> Result<()> {
        for code in self.config.temporal_role_properties() {
            self.backend.drop_property(tx, &code).await?;
        }
        self.backend.drop_legacy_date_columns(tx).await
    }

    // ========================================================================
    // Actors
    // ========================================================================

    /// Normalize every actor, one transaction each.
    pub async fn normalize_actors(&self) -> Result<MigrationReport> {
        self.require_interval_columns().await?;

        let tx = self.backend.begin_tx(TxMode::ReadOnly).await?;
        let classes = code_refs(&self.config.actor_classes);
        let actors = self.backend.entities_by_class(&tx, &classes).await;
        self.backend.rollback_tx(tx).await?;
        let actors = actors?;
        info!(count = actors.len(), "normalizing actors");

        let mut report = MigrationReport::default();
        for actor in &actors {
            match self.migrate_actor(actor.id).await {
                Ok(derived) => {
                    report.succeeded += 1;
                    report.derived_events += derived.len();
                }
                Err(err) => report.record_failure(actor.id.into(), &err),
            }
        }

        info!(
            succeeded = report.succeeded,
            failed = report.failures.len(),
            derived_events = report.derived_events,
            "actors normalized",
        );
        Ok(report)
    }

    #[tracing::instrument(skip(self), fields(actor = %id))]
    async fn migrate_actor(&self, id: EntityId) -> Result<Vec<EntityId>> {
        let mut tx = self.backend.begin_tx(TxMode::ReadWrite).await?;
        let result = self.normalize_in(&mut tx, id).await;
        let outcome = self.settle(tx, result).await?;
        Ok(outcome)
    }

    async fn normalize_in(&self, tx: &mut B::Tx, id: EntityId) -> Result<Vec<EntityId>> {
        let actor: Entity = self.backend.get_entity(tx, id).await?
            .ok_or_else(|| Error::NotFound(format!("Entity {id}")))?;
        let outcome = normalize_actor(self.backend, tx, &actor, &self.config).await?;
        Ok(outcome.derived_events)
    }

    // ========================================================================
    // Events and involvements
    // ========================================================================

    /// Project every event interval, then every involvement interval.
    pub async fn project_events(&self) -> Result<MigrationReport> {
        self.require_interval_columns().await?;

        let tx = self.backend.begin_tx(TxMode::ReadOnly).await?;
        let listed = self.list_projection_subjects(&tx).await;
        self.backend.rollback_tx(tx).await?;
        let subjects = listed?;
        info!(count = subjects.len(), "projecting events and involvements");

        let mut report = MigrationReport::default();
        for subject in subjects {
            match self.migrate_subject(subject).await {
                Ok(_) => report.succeeded += 1,
                Err(err) => report.record_failure(subject, &err),
            }
        }

        info!(
            succeeded = report.succeeded,
            failed = report.failures.len(),
            "events and involvements projected",
        );
        Ok(report)
    }

    async fn list_projection_subjects(&self, tx: &B::Tx) -> Result<Vec<Endpoint>> {
        let classes = code_refs(&self.config.event_classes);
        let involvements = code_refs(&self.config.involvement_properties);
        let events = self.backend.entities_by_class(tx, &classes).await?;
        let links = self.backend.links_by_property(tx, &involvements).await?;

        Ok(events
            .into_iter()
            .map(|e| Endpoint::Entity(e.id))
            .chain(links.into_iter().map(|l| Endpoint::Link(l.id)))
            .collect())
    }

    #[tracing::instrument(skip(self), fields(subject = %subject))]
    async fn migrate_subject(&self, subject: Endpoint) -> Result<bool> {
        let mut tx = self.backend.begin_tx(TxMode::ReadWrite).await?;
        let result = project_subject(self.backend, &mut tx, subject, &self.config).await;
        self.settle(tx, result).await
    }

    // ========================================================================
    // Whole run
    // ========================================================================

    /// Prepare, normalize, project, and finalize if nothing failed.
    pub async fn run(&self) -> Result<MigrationReport> {
        self.prepare_schema().await?;

        let mut report = self.normalize_actors().await?;
        report.merge(self.project_events().await?);

        if report.is_clean() {
            self.finalize_schema().await?;
        } else {
            warn!(
                failed = report.failures.len(),
                "skipping schema finalization, legacy date values are still referenced",
            );
        }
        Ok(report)
    }
}
