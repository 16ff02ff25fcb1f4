//! Derived appearance events.
//!
//! When a place, or an observed first/last appearance, cannot be an attribute
//! of an actor it becomes an event of its own: one new entity, linked to the
//! place (if any) and to the actor it describes. Creation happens inside the
//! caller's transaction, so the event and its links become visible together
//! or not at all.
//!
//! Synthesis is not idempotent. Running it twice for the same actor creates
//! two events; the migration driver processes each actor once.

use crate::config::DerivedEventConfig;
use crate::model::*;
use crate::storage::StorageBackend;
use crate::{Error, Result};

/// What a derived event should capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedEvent {
    pub role: TemporalRole,
    /// Carried on the event's begin half: the event happens at that time.
    pub bound: Option<Bound>,
    pub place: Option<EntityId>,
}

impl DerivedEvent {
    pub fn name(&self, actor: &Entity, config: &DerivedEventConfig) -> String {
        let prefix = match self.role {
            TemporalRole::Begin => &config.begin_prefix,
            TemporalRole::End => &config.end_prefix,
        };
        format!("{prefix} {}", actor.name)
    }
}

/// Create the event entity and its provenance links.
pub async fn synthesize<B: StorageBackend>(
    backend: &B,
    tx: &mut B::Tx,
    actor: &Entity,
    event: &DerivedEvent,
    config: &DerivedEventConfig,
) -> Result<EntityId> {
    if event.bound.is_none() && event.place.is_none() {
        return Err(Error::SynthesisFailure {
            actor: actor.id,
            reason: "nothing to capture".into(),
        });
    }
    create(backend, tx, actor, event, config)
        .await
        .map_err(|err| Error::SynthesisFailure { actor: actor.id, reason: err.to_string() })
}

async fn create<B: StorageBackend>(
    backend: &B,
    tx: &mut B::Tx,
    actor: &Entity,
    event: &DerivedEvent,
    config: &DerivedEventConfig,
) -> Result<EntityId> {
    let mut draft = EntityDraft::new(&config.class_code, event.name(actor, config));
    if let Some(bound) = &event.bound {
        draft = draft.with_interval(Interval::default().with(TemporalRole::Begin, bound.clone()));
    }
    let id = backend.create_entity(tx, draft).await?;

    if let Some(place) = event.place {
        backend.create_link(tx, id.into(), &config.place_property, place).await?;
    }
    backend.create_link(tx, id.into(), &config.actor_property, actor.id).await?;

    tracing::debug!(actor = %actor.id, event = %id, role = %event.role, "derived event created");
    Ok(id)
}
