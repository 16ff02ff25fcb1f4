//! In-memory storage backend.
//!
//! This is the reference implementation of `StorageBackend`.
//!
//! ## Isolation
//!
//! Every transaction starts from the committed graph and copies it on its
//! first write. Read-only transactions, and read-write ones that end up
//! writing nothing, never copy. Reads see the transaction's own writes. `commit_tx()` publishes the copy in one
//! step; `rollback_tx()` (or dropping the transaction) discards it. A commit
//! fails if another writer committed after the transaction began, so the
//! backend is safe for the single sequential writer the migration uses and
//! rejects rather than merges concurrent writers.
//!
//! ## Limitations
//!
//! - **Copy per writing transaction**: the first write clones the whole graph.
//!   Fine for tests and corpora that fit comfortably in memory.
//! - **No persistence**: use `snapshot()` / `from_snapshot()` to move state in
//!   and out as JSON.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use hashbrown::{HashMap, HashSet};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::{GraphView, PreDeleteHook, Schema, StorageBackend};
use crate::model::*;
use crate::tx::{Transaction, TxId, TxMode};
use crate::{Error, Result};

type LinkIds = SmallVec<[LinkId; 4]>;

// ============================================================================
// GraphState
// ============================================================================

#[derive(Debug, Clone)]
struct GraphState {
    entities: HashMap<EntityId, Entity>,
    links: HashMap<LinkId, Link>,
    /// domain → outgoing link ids
    outgoing: HashMap<Endpoint, LinkIds>,
    /// range entity → incoming link ids
    incoming: HashMap<EntityId, LinkIds>,
    schema: Schema,
    next_entity_id: u64,
    next_link_id: u64,
}

impl GraphState {
    fn new(schema: Schema) -> Self {
        Self {
            entities: HashMap::new(),
            links: HashMap::new(),
            outgoing: HashMap::new(),
            incoming: HashMap::new(),
            schema,
            next_entity_id: 1,
            next_link_id: 1,
        }
    }

    fn endpoint_exists(&self, endpoint: Endpoint) -> bool {
        match endpoint {
            Endpoint::Entity(id) => self.entities.contains_key(&id),
            Endpoint::Link(id) => self.links.contains_key(&id),
        }
    }

    fn insert_link(&mut self, link: Link) {
        self.outgoing.entry(link.domain).or_default().push(link.id);
        self.incoming.entry(link.range_id).or_default().push(link.id);
        self.links.insert(link.id, link);
    }

    /// Remove a link and, recursively, every association qualifying it.
    fn remove_link(&mut self, id: LinkId) -> Option<Link> {
        let link = self.links.remove(&id)?;
        if let Some(ids) = self.outgoing.get_mut(&link.domain) {
            ids.retain(|l| *l != id);
        }
        if let Some(ids) = self.incoming.get_mut(&link.range_id) {
            ids.retain(|l| *l != id);
        }
        let qualifiers = self.outgoing.remove(&Endpoint::Link(id)).unwrap_or_default();
        for qualifier in qualifiers {
            self.remove_link(qualifier);
        }
        Some(link)
    }

    /// Remove an entity with its incident links (foreign keys cascade).
    fn remove_entity(&mut self, id: EntityId) -> Option<Entity> {
        let entity = self.entities.remove(&id)?;
        let outgoing = self.outgoing.remove(&Endpoint::Entity(id)).unwrap_or_default();
        let incoming = self.incoming.remove(&id).unwrap_or_default();
        for link in outgoing.into_iter().chain(incoming) {
            self.remove_link(link);
        }
        Some(entity)
    }

    fn collect_links<'a>(&'a self, ids: Option<&LinkIds>, codes: &[&str]) -> Vec<&'a Link> {
        let mut links: Vec<&Link> = ids
            .into_iter()
            .flatten()
            .filter_map(|id| self.links.get(id))
            .filter(|l| codes.contains(&l.property_code.as_str()))
            .collect();
        links.sort_by_key(|l| l.id);
        links
    }

    /// Run hooks, delete dependents through the same path, then the entity.
    fn delete_cascading(
        &mut self,
        hooks: &[Arc<dyn PreDeleteHook>],
        id: EntityId,
        visited: &mut HashSet<EntityId>,
    ) -> Result<bool> {
        if !visited.insert(id) {
            return Ok(false);
        }
        let Some(entity) = self.entities.get(&id).cloned() else {
            return Ok(false);
        };

        let mut dependents = Vec::new();
        for hook in hooks {
            let found = hook.dependents(&*self, &entity)?;
            if !found.is_empty() {
                tracing::debug!(hook = hook.name(), entity = %id, dependents = found.len(), "cascading delete");
            }
            dependents.extend(found);
        }
        for dependent in dependents {
            self.delete_cascading(hooks, dependent, visited)?;
        }

        Ok(self.remove_entity(id).is_some())
    }
}

impl GraphView for GraphState {
    fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    fn links_from(&self, domain: Endpoint, codes: &[&str]) -> Vec<&Link> {
        self.collect_links(self.outgoing.get(&domain), codes)
    }

    fn links_to(&self, range: EntityId, codes: &[&str]) -> Vec<&Link> {
        self.collect_links(self.incoming.get(&range), codes)
    }
}

// ============================================================================
// Snapshot
// ============================================================================

/// Serializable copy of committed state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub schema: Schema,
    pub entities: Vec<Entity>,
    pub links: Vec<Link>,
}

impl GraphSnapshot {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

// ============================================================================
// MemoryBackend
// ============================================================================

/// In-memory heritage graph storage.
pub struct MemoryBackend {
    inner: Arc<MemoryInner>,
}

struct MemoryInner {
    committed: RwLock<Committed>,
    hooks: RwLock<Vec<Arc<dyn PreDeleteHook>>>,
    next_tx_id: AtomicU64,
}

struct Committed {
    state: Arc<GraphState>,
    version: u64,
}

impl MemoryBackend {
    /// An empty store in the legacy (pre-migration) schema.
    pub fn new() -> Self {
        Self::with_schema(Schema::legacy())
    }

    pub fn with_schema(schema: Schema) -> Self {
        Self::from_state(GraphState::new(schema))
    }

    fn from_state(state: GraphState) -> Self {
        Self {
            inner: Arc::new(MemoryInner {
                committed: RwLock::new(Committed { state: Arc::new(state), version: 0 }),
                hooks: RwLock::new(Vec::new()),
                next_tx_id: AtomicU64::new(1),
            }),
        }
    }

    /// Rebuild a store from a snapshot. Hooks are not part of a snapshot.
    pub fn from_snapshot(snapshot: GraphSnapshot) -> Result<Self> {
        let mut state = GraphState::new(snapshot.schema);
        for entity in snapshot.entities {
            state.next_entity_id = state.next_entity_id.max(entity.id.0 + 1);
            state.entities.insert(entity.id, entity);
        }
        let mut links = snapshot.links;
        links.sort_by_key(|l| l.id);
        for link in links {
            if !state.entities.contains_key(&link.range_id) || !state.endpoint_exists(link.domain) {
                return Err(Error::ConstraintViolation(format!(
                    "snapshot link {} has a dangling endpoint", link.id
                )));
            }
            state.next_link_id = state.next_link_id.max(link.id.0 + 1);
            state.insert_link(link);
        }
        Ok(Self::from_state(state))
    }

    /// Committed state as a snapshot, ordered by id.
    pub fn snapshot(&self) -> GraphSnapshot {
        let committed = self.inner.committed.read();
        let mut entities: Vec<Entity> = committed.state.entities.values().cloned().collect();
        entities.sort_by_key(|e| e.id);
        let mut links: Vec<Link> = committed.state.links.values().cloned().collect();
        links.sort_by_key(|l| l.id);
        GraphSnapshot {
            schema: committed.state.schema.clone(),
            entities,
            links,
        }
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// MemoryTx
// ============================================================================

/// In-memory transaction: a private working copy of the graph.
pub struct MemoryTx {
    id: TxId,
    mode: TxMode,
    base_version: u64,
    state: Arc<GraphState>,
    dirty: bool,
}

impl MemoryTx {
    fn write(&mut self) -> Result<&mut GraphState> {
        if self.mode != TxMode::ReadWrite {
            return Err(Error::TxError(format!("{} is read-only", self.id)));
        }
        self.dirty = true;
        Ok(Arc::make_mut(&mut self.state))
    }
}

impl Transaction for MemoryTx {
    fn mode(&self) -> TxMode { self.mode }
    fn id(&self) -> TxId { self.id }
}

fn require_interval_columns(schema: &Schema) -> Result<()> {
    if schema.interval_columns {
        Ok(())
    } else {
        Err(Error::SchemaError("interval columns do not exist".into()))
    }
}

// ============================================================================
// StorageBackend impl
// ============================================================================

#[async_trait]
impl StorageBackend for MemoryBackend {
    type Tx = MemoryTx;

    async fn begin_tx(&self, mode: TxMode) -> Result<MemoryTx> {
        let id = TxId(self.inner.next_tx_id.fetch_add(1, Ordering::Relaxed));
        let committed = self.inner.committed.read();
        Ok(MemoryTx {
            id,
            mode,
            base_version: committed.version,
            state: Arc::clone(&committed.state),
            dirty: false,
        })
    }

    async fn commit_tx(&self, tx: MemoryTx) -> Result<()> {
        if !tx.dirty {
            return Ok(());
        }
        let mut committed = self.inner.committed.write();
        if committed.version != tx.base_version {
            return Err(Error::TxError(format!(
                "{} conflicts with a concurrent commit", tx.id
            )));
        }
        committed.state = tx.state;
        committed.version += 1;
        Ok(())
    }

    async fn rollback_tx(&self, _tx: MemoryTx) -> Result<()> { Ok(()) }

    // ========================================================================
    // Schema
    // ========================================================================

    async fn schema(&self, tx: &MemoryTx) -> Result<Schema> {
        Ok(tx.state.schema.clone())
    }

    async fn add_interval_columns(&self, tx: &mut MemoryTx) -> Result<()> {
        let state = tx.write()?;
        if state.schema.interval_columns {
            return Err(Error::SchemaError("interval columns already exist".into()));
        }
        state.schema.interval_columns = true;
        Ok(())
    }

    async fn drop_legacy_date_columns(&self, tx: &mut MemoryTx) -> Result<()> {
        let state = tx.write()?;
        if !state.schema.legacy_date_columns {
            return Err(Error::SchemaError("legacy date columns already dropped".into()));
        }
        let remaining = state.entities.values().filter(|e| e.is_date_value()).count();
        if remaining > 0 {
            return Err(Error::SchemaError(format!(
                "{remaining} date-value entities still reference the legacy date columns"
            )));
        }
        for entity in state.entities.values_mut() {
            entity.value_timestamp = None;
        }
        state.schema.legacy_date_columns = false;
        Ok(())
    }

    async fn drop_property(&self, tx: &mut MemoryTx, code: &str) -> Result<()> {
        let state = tx.write()?;
        if !state.schema.defines(code) {
            return Err(Error::SchemaError(format!("property {code} is not defined")));
        }
        let users = state.links.values().filter(|l| l.property_code == code).count();
        if users > 0 {
            return Err(Error::SchemaError(format!(
                "property {code} is still referenced by {users} links"
            )));
        }
        state.schema.properties.remove(code);
        Ok(())
    }

    // ========================================================================
    // Entity CRUD
    // ========================================================================

    async fn create_entity(&self, tx: &mut MemoryTx, draft: EntityDraft) -> Result<EntityId> {
        let state = tx.write()?;
        if !state.schema.legacy_date_columns
            && (draft.value_timestamp.is_some() || draft.is_date_value())
        {
            return Err(Error::SchemaError("legacy date columns were dropped".into()));
        }
        if !draft.interval.is_empty() {
            require_interval_columns(&state.schema)?;
            if draft.is_date_value() {
                return Err(Error::ConstraintViolation(
                    "a date value cannot carry an interval".into(),
                ));
            }
        }

        let id = EntityId(state.next_entity_id);
        state.next_entity_id += 1;
        state.entities.insert(id, draft.into_entity(id));
        Ok(id)
    }

    async fn get_entity(&self, tx: &MemoryTx, id: EntityId) -> Result<Option<Entity>> {
        Ok(tx.state.entities.get(&id).cloned())
    }

    async fn update_entity(
        &self,
        tx: &mut MemoryTx,
        id: EntityId,
        name: &str,
        description: Option<&str>,
    ) -> Result<()> {
        let entity = tx.write()?.entities.get_mut(&id)
            .ok_or_else(|| Error::NotFound(format!("Entity {id}")))?;
        entity.name = name.to_string();
        entity.description = description.map(str::to_string);
        Ok(())
    }

    async fn set_entity_interval(
        &self,
        tx: &mut MemoryTx,
        id: EntityId,
        interval: Interval,
    ) -> Result<()> {
        let state = tx.write()?;
        require_interval_columns(&state.schema)?;
        let entity = state.entities.get_mut(&id)
            .ok_or_else(|| Error::NotFound(format!("Entity {id}")))?;
        if entity.is_date_value() {
            return Err(Error::ConstraintViolation(format!(
                "entity {id} is a date value and cannot carry an interval"
            )));
        }
        entity.interval = interval;
        Ok(())
    }

    async fn entities_by_class(&self, tx: &MemoryTx, classes: &[&str]) -> Result<Vec<Entity>> {
        let mut entities: Vec<Entity> = tx.state.entities.values()
            .filter(|e| e.has_class(classes))
            .cloned()
            .collect();
        entities.sort_by_key(|e| e.id);
        Ok(entities)
    }

    async fn delete_entity(&self, tx: &mut MemoryTx, id: EntityId) -> Result<bool> {
        let hooks = self.inner.hooks.read().clone();
        let state = tx.write()?;
        let mut visited = HashSet::new();
        state.delete_cascading(&hooks, id, &mut visited)
    }

    fn register_pre_delete_hook(&self, hook: Arc<dyn PreDeleteHook>) {
        self.inner.hooks.write().push(hook);
    }

    // ========================================================================
    // Link CRUD
    // ========================================================================

    async fn create_link(
        &self,
        tx: &mut MemoryTx,
        domain: Endpoint,
        property_code: &str,
        range: EntityId,
    ) -> Result<LinkId> {
        let state = tx.write()?;
        if !state.schema.defines(property_code) {
            return Err(Error::SchemaError(format!("property {property_code} is not defined")));
        }
        if !state.endpoint_exists(domain) {
            return Err(Error::NotFound(format!("Domain {domain}")));
        }
        if !state.entities.contains_key(&range) {
            return Err(Error::NotFound(format!("Range entity {range}")));
        }

        let id = LinkId(state.next_link_id);
        state.next_link_id += 1;
        state.insert_link(Link::new(id, domain, range, property_code));
        Ok(id)
    }

    async fn get_link(&self, tx: &MemoryTx, id: LinkId) -> Result<Option<Link>> {
        Ok(tx.state.links.get(&id).cloned())
    }

    async fn set_link_interval(
        &self,
        tx: &mut MemoryTx,
        id: LinkId,
        interval: Interval,
    ) -> Result<()> {
        let state = tx.write()?;
        require_interval_columns(&state.schema)?;
        let link = state.links.get_mut(&id)
            .ok_or_else(|| Error::NotFound(format!("Link {id}")))?;
        link.interval = interval;
        Ok(())
    }

    async fn delete_link(&self, tx: &mut MemoryTx, id: LinkId) -> Result<bool> {
        Ok(tx.write()?.remove_link(id).is_some())
    }

    // ========================================================================
    // Traversal
    // ========================================================================

    async fn links_from(
        &self,
        tx: &MemoryTx,
        domain: Endpoint,
        codes: &[&str],
    ) -> Result<Vec<Link>> {
        Ok(GraphView::links_from(&*tx.state, domain, codes).into_iter().cloned().collect())
    }

    async fn links_to(&self, tx: &MemoryTx, range: EntityId, codes: &[&str]) -> Result<Vec<Link>> {
        Ok(GraphView::links_to(&*tx.state, range, codes).into_iter().cloned().collect())
    }

    async fn links_by_property(&self, tx: &MemoryTx, codes: &[&str]) -> Result<Vec<Link>> {
        let mut links: Vec<Link> = tx.state.links.values()
            .filter(|l| !l.is_link_property() && codes.contains(&l.property_code.as_str()))
            .cloned()
            .collect();
        links.sort_by_key(|l| l.id);
        Ok(links)
    }

    // ========================================================================
    // Introspection
    // ========================================================================

    async fn entity_count(&self, tx: &MemoryTx) -> Result<u64> {
        Ok(tx.state.entities.len() as u64)
    }

    async fn link_count(&self, tx: &MemoryTx) -> Result<u64> {
        Ok(tx.state.links.len() as u64)
    }
}

// ============================================================================
// Tests
// ============================================================================
