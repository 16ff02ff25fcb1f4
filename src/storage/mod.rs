//! # Storage Backend Trait
//!
//! The contract between the migration engine and the graph store.
//! The engine only needs point lookups by domain and property code, scans by
//! class, transactional writes, and a delete path with pre-delete hooks.
//!
//! ## Implementations
//!
//! | Backend | Module | Description |
//! |---------|--------|-------------|
//! | `MemoryBackend` | `memory` | In-memory, snapshot-isolated, for tests and embedding |

pub mod memory;

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::model::codes::property;
use crate::model::*;
use crate::tx::{Transaction, TxMode};
use crate::Result;

pub use memory::{GraphSnapshot, MemoryBackend};

// ============================================================================
// Backend Configuration
// ============================================================================

/// Configuration for connecting to a storage backend.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum BackendConfig {
    /// In-memory (no persistence)
    #[default]
    Memory,
}

// ============================================================================
// Schema
// ============================================================================

/// The part of the relational schema the migration transitions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    /// The six interval columns exist on both the entity and link relations.
    pub interval_columns: bool,
    /// `system_type` date kinds and `value_timestamp` are still accepted.
    pub legacy_date_columns: bool,
    /// Defined property codes.
    pub properties: BTreeSet<String>,
}

impl Schema {
    /// The pre-migration shape: reified dates, no interval columns.
    pub fn legacy() -> Self {
        Self {
            interval_columns: false,
            legacy_date_columns: true,
            properties: property::ALL.iter().map(|p| p.to_string()).collect(),
        }
    }

    /// The post-migration shape.
    pub fn current() -> Self {
        Self {
            interval_columns: true,
            legacy_date_columns: false,
            properties: property::ALL
                .iter()
                .filter(|p| !property::TEMPORAL_ROLES.contains(p))
                .map(|p| p.to_string())
                .collect(),
        }
    }

    pub fn defines(&self, code: &str) -> bool {
        self.properties.contains(code)
    }
}

impl Default for Schema {
    fn default() -> Self {
        Self::legacy()
    }
}

// ============================================================================
// Pre-delete hooks
// ============================================================================

/// Read-only view of the graph as seen by the deleting transaction.
pub trait GraphView {
    fn entity(&self, id: EntityId) -> Option<&Entity>;

    /// Links whose domain is `domain` and whose property is in `codes`.
    fn links_from(&self, domain: Endpoint, codes: &[&str]) -> Vec<&Link>;

    /// Links whose range is `range` and whose property is in `codes`.
    fn links_to(&self, range: EntityId, codes: &[&str]) -> Vec<&Link>;
}

/// A rule evaluated before every entity deletion commits.
///
/// The hook sees the graph while the entity and its links still exist and
/// returns the dependents that must go with it. The backend deletes those
/// through the same hooked path, inside the same transaction. An error
/// aborts the whole delete.
pub trait PreDeleteHook: Send + Sync {
    fn name(&self) -> &str;

    fn dependents(&self, view: &dyn GraphView, entity: &Entity) -> Result<Vec<EntityId>>;
}

// ============================================================================
// StorageBackend Trait
// ============================================================================

/// The graph store contract.
///
/// Writes require a `ReadWrite` transaction. Reads inside a transaction see
/// that transaction's own writes.
#[async_trait]
pub trait StorageBackend: Send + Sync + 'static {
    /// The transaction type for this backend.
    type Tx: Transaction;

    // ========================================================================
    // Transactions
    // ========================================================================

    async fn begin_tx(&self, mode: TxMode) -> Result<Self::Tx>;

    /// Publish every write of the transaction, or none of them.
    async fn commit_tx(&self, tx: Self::Tx) -> Result<()>;

    /// Discard every write of the transaction.
    async fn rollback_tx(&self, tx: Self::Tx) -> Result<()>;

    // ========================================================================
    // Schema
    // ========================================================================

    async fn schema(&self, tx: &Self::Tx) -> Result<Schema>;

    /// Add the six interval columns to entities and links.
    /// Fails if they already exist.
    async fn add_interval_columns(&self, tx: &mut Self::Tx) -> Result<()>;

    /// Drop `system_type` date kinds and `value_timestamp`.
    /// Fails while any date-value entity remains.
    async fn drop_legacy_date_columns(&self, tx: &mut Self::Tx) -> Result<()>;

    /// Remove a property definition. Fails while any link still uses it.
    async fn drop_property(&self, tx: &mut Self::Tx, code: &str) -> Result<()>;

    // ========================================================================
    // Entity CRUD
    // ========================================================================

    async fn create_entity(&self, tx: &mut Self::Tx, draft: EntityDraft) -> Result<EntityId>;

    async fn get_entity(&self, tx: &Self::Tx, id: EntityId) -> Result<Option<Entity>>;

    /// Rename an entity and replace its description.
    async fn update_entity(
        &self,
        tx: &mut Self::Tx,
        id: EntityId,
        name: &str,
        description: Option<&str>,
    ) -> Result<()>;

    /// Replace the six interval fields of an entity.
    async fn set_entity_interval(
        &self,
        tx: &mut Self::Tx,
        id: EntityId,
        interval: Interval,
    ) -> Result<()>;

    /// All entities whose class is in `classes`, ordered by id.
    async fn entities_by_class(&self, tx: &Self::Tx, classes: &[&str]) -> Result<Vec<Entity>>;

    /// Delete an entity after running every registered pre-delete hook.
    /// Incident links and link-property associations go with it.
    /// Returns true if it existed.
    async fn delete_entity(&self, tx: &mut Self::Tx, id: EntityId) -> Result<bool>;

    /// Register a hook that runs before every entity deletion.
    fn register_pre_delete_hook(&self, hook: Arc<dyn PreDeleteHook>);

    // ========================================================================
    // Link CRUD
    // ========================================================================

    /// Create a link. A `Endpoint::Link` domain creates a link-property association.
    async fn create_link(
        &self,
        tx: &mut Self::Tx,
        domain: Endpoint,
        property_code: &str,
        range: EntityId,
    ) -> Result<LinkId>;

    async fn get_link(&self, tx: &Self::Tx, id: LinkId) -> Result<Option<Link>>;

    /// Replace the six interval fields of a link.
    async fn set_link_interval(
        &self,
        tx: &mut Self::Tx,
        id: LinkId,
        interval: Interval,
    ) -> Result<()>;

    /// Delete a link and the associations that qualify it. Returns true if it existed.
    async fn delete_link(&self, tx: &mut Self::Tx, id: LinkId) -> Result<bool>;

    // ========================================================================
    // Traversal
    // ========================================================================

    /// Links from `domain` restricted to a property-code set, ordered by id.
    async fn links_from(
        &self,
        tx: &Self::Tx,
        domain: Endpoint,
        codes: &[&str],
    ) -> Result<Vec<Link>>;

    /// Links into `range` restricted to a property-code set, ordered by id.
    async fn links_to(&self, tx: &Self::Tx, range: EntityId, codes: &[&str]) -> Result<Vec<Link>>;

    /// All entity-domain links with a property in `codes`, ordered by id.
    async fn links_by_property(&self, tx: &Self::Tx, codes: &[&str]) -> Result<Vec<Link>>;

    /// Links from `domain` paired with their range entity, optionally
    /// restricted to range classes.
    ///
    /// Default: `links_from` followed by one `get_entity` per link.
    async fn linked_entities(
        &self,
        tx: &Self::Tx,
        domain: Endpoint,
        codes: &[&str],
        range_classes: Option<&[&str]>,
    ) -> Result<Vec<(Link, Entity)>> {
        let links = self.links_from(tx, domain, codes).await?;
        let mut result = Vec::with_capacity(links.len());
        for link in links {
            let Some(entity) = self.get_entity(tx, link.range_id).await? else {
                continue;
            };
            if range_classes.is_some_and(|classes| !entity.has_class(classes)) {
                continue;
            }
            result.push((link, entity));
        }
        Ok(result)
    }

    // ========================================================================
    // Introspection
    // ========================================================================

    async fn entity_count(&self, tx: &Self::Tx) -> Result<u64>;

    async fn link_count(&self, tx: &Self::Tx) -> Result<u64>;
}
