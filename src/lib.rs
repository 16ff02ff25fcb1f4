//! # cidoc-temporal: Temporal Reification Migration for Heritage Graphs
//!
//! A CIDOC-CRM property graph used to store every date as its own node
//! (an `E61` "exact", "from" or "to" date value) hanging off its subject via
//! dedicated temporal-role properties. This crate rewrites that shape into
//! inline interval attributes on entities and links, synthesizing derived
//! appearance events where a fact cannot be an attribute of its subject, and
//! carries the entity-deletion cascade the new shape relies on.
//!
//! ## Design Principles
//!
//! 1. **Trait-first**: `StorageBackend` is the contract between the engine and the store
//! 2. **Plain DTOs**: `Entity`, `Link`, `Interval` cross all boundaries
//! 3. **One subject, one transaction**: a failed subject never leaves partial writes
//! 4. **Explicit hooks**: the deletion cascade is a registered pre-delete hook, not a trigger
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cidoc_temporal::Graph;
//!
//! # async fn example() -> cidoc_temporal::Result<()> {
//! let graph = Graph::open_memory().await?;
//! // ... load the legacy corpus through graph.backend() ...
//! let report = graph.migrate().await?;
//! println!("{} subjects migrated, {} failed", report.succeeded, report.failures.len());
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod cascade;
pub mod config;
pub mod migration;
pub mod model;
pub mod storage;
pub mod temporal;
pub mod tx;

// ============================================================================
// Re-exports
// ============================================================================

pub use model::{
    Bound, DateKind, Endpoint, Entity, EntityDraft, EntityId, Interval, Link, LinkId,
    TemporalRole, Timestamp, resolve_interval,
};

pub use storage::{
    BackendConfig, GraphSnapshot, GraphView, MemoryBackend, PreDeleteHook, Schema,
    StorageBackend,
};

pub use tx::{Transaction, TxId, TxMode};

pub use cascade::{CascadePolicy, CascadeRule};
pub use config::MigrationConfig;
pub use migration::{MigrationReport, Migrator, SubjectFailure};
pub use temporal::RoleCodes;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

// ============================================================================
// Top-level Graph handle
// ============================================================================

/// The primary entry point. A `Graph` wraps a storage backend with the
/// deletion cascade registered on it.
pub struct Graph<B: StorageBackend> {
    backend: B,
}

impl<B: StorageBackend> Graph<B> {
    /// Wrap a backend and register the default cascade policy.
    pub fn with_backend(backend: B) -> Self {
        Self::with_policy(backend, CascadePolicy::default())
    }

    pub fn with_policy(backend: B, policy: CascadePolicy) -> Self {
        backend.register_pre_delete_hook(Arc::new(policy));
        Self { backend }
    }

    /// Delete an entity and its dependents atomically.
    pub async fn delete_entity(&self, id: EntityId) -> Result<bool> {
        let mut tx = self.backend.begin_tx(TxMode::ReadWrite).await?;
        match self.backend.delete_entity(&mut tx, id).await {
            Ok(existed) => {
                self.backend.commit_tx(tx).await?;
                Ok(existed)
            }
            Err(err) => {
                self.backend.rollback_tx(tx).await?;
                Err(err)
            }
        }
    }

    /// A migrator using the default CIDOC vocabulary.
    pub fn migrator(&self) -> Migrator<'_, B> {
        Migrator::new(&self.backend, MigrationConfig::default())
    }

    pub fn migrator_with(&self, config: MigrationConfig) -> Migrator<'_, B> {
        Migrator::new(&self.backend, config)
    }

    /// Normalize every actor's temporal data. The interval columns must exist.
    pub async fn normalize_actors(&self) -> Result<MigrationReport> {
        self.migrator().normalize_actors().await
    }

    /// Run the whole one-way migration.
    pub async fn migrate(&self) -> Result<MigrationReport> {
        self.migrator().run().await
    }

    /// Access the underlying backend (for advanced use).
    pub fn backend(&self) -> &B {
        &self.backend
    }
}

/// In-memory graph for testing and embedding.
impl Graph<MemoryBackend> {
    pub async fn open_memory() -> Result<Self> {
        Ok(Self::with_backend(MemoryBackend::new()))
    }

    pub fn open(config: &BackendConfig) -> Result<Self> {
        match config {
            BackendConfig::Memory => Ok(Self::with_backend(MemoryBackend::new())),
        }
    }

    /// A fresh graph holding a copy of the snapshot.
    pub fn from_snapshot(snapshot: GraphSnapshot) -> Result<Self> {
        Ok(Self::with_backend(MemoryBackend::from_snapshot(snapshot)?))
    }

    pub fn snapshot(&self) -> GraphSnapshot {
        self.backend.snapshot()
    }
}

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Ambiguous temporal source: {subject} has {count} {role} date values")]
    AmbiguousTemporalSource {
        subject: Endpoint,
        role: TemporalRole,
        count: usize,
    },

    #[error("Orphaned 'to' bound: {subject} has a {role} 'to' value without a 'from' value")]
    OrphanedToBound { subject: Endpoint, role: TemporalRole },

    #[error("Synthesis failure for actor {actor}: {reason}")]
    SynthesisFailure { actor: EntityId, reason: String },

    #[error("Cascade constraint violation: deleting {entity} would remove {dependent}, still referenced by {referrer}")]
    CascadeConstraintViolation {
        entity: EntityId,
        dependent: EntityId,
        referrer: Endpoint,
    },

    #[error("Schema error: {0}")]
    SchemaError(String),

    #[error("Transaction error: {0}")]
    TxError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::AmbiguousTemporalSource { .. } => ErrorKind::AmbiguousTemporalSource,
            Error::OrphanedToBound { .. } => ErrorKind::OrphanedToBound,
            Error::SynthesisFailure { .. } => ErrorKind::SynthesisFailure,
            Error::CascadeConstraintViolation { .. } => ErrorKind::CascadeConstraintViolation,
            Error::SchemaError(_) => ErrorKind::Schema,
            Error::TxError(_) => ErrorKind::Transaction,
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::ConstraintViolation(_) => ErrorKind::Constraint,
            Error::Serialization(_) => ErrorKind::Serialization,
        }
    }
}

/// Error category as reported per failed subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    AmbiguousTemporalSource,
    OrphanedToBound,
    SynthesisFailure,
    CascadeConstraintViolation,
    Schema,
    Transaction,
    NotFound,
    Constraint,
    Serialization,
}

pub type Result<T> = std::result::Result<T, Error>;
