//! Actor temporal normalization.
//!
//! Persons, legal bodies and groups carry two temporal roles. Which property
//! matched decides what happens to a resolved value:
//!
//! | Resolved | Action |
//! |----------|--------|
//! | birth / death date | inline on the actor; a place becomes a derived event |
//! | first / last appearance date, with place | derived event with date and place |
//! | first / last appearance date only | derived event with the date |
//! | place only | derived event with the place |

use crate::config::{MigrationConfig, code_refs};
use crate::model::*;
use crate::storage::StorageBackend;
use crate::temporal::resolver::{Provenance, RoleResolution, SubjectContext};
use crate::temporal::synthesizer::{DerivedEvent, synthesize};
use crate::Result;

/// What to do with one resolved role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RolePlan {
    Skip,
    /// Write the bound onto the actor, and externalize the place if there is one.
    Intrinsic { bound: Bound, place: Option<EntityId> },
    /// Externalize whatever was found.
    Derived { bound: Option<Bound>, place: Option<EntityId> },
}

pub fn plan_role(resolution: &RoleResolution) -> RolePlan {
    let place = resolution.place.map(|p| p.place);
    match &resolution.bound {
        Some(resolved) if resolved.provenance == Provenance::Intrinsic => RolePlan::Intrinsic {
            bound: resolved.bound.clone(),
            place,
        },
        Some(resolved) => RolePlan::Derived { bound: Some(resolved.bound.clone()), place },
        None if place.is_some() => RolePlan::Derived { bound: None, place },
        None => RolePlan::Skip,
    }
}

/// Result of normalizing one actor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActorOutcome {
    pub inline_written: bool,
    pub derived_events: Vec<EntityId>,
}

/// Normalize one actor inside the caller's transaction.
///
/// On error the caller must roll back: derived events may already exist in
/// the transaction.
pub async fn normalize_actor<B: StorageBackend>(
    backend: &B,
    tx: &mut B::Tx,
    actor: &Entity,
    config: &MigrationConfig,
) -> Result<ActorOutcome> {
    let ctx = SubjectContext::resolve(
        backend, tx, actor.id.into(), &config.actor_begin, &config.actor_end,
    ).await?;
    ctx.ensure_no_orphans()?;

    let mut outcome = ActorOutcome::default();
    if ctx.is_empty() {
        return Ok(outcome);
    }

    let mut interval = actor.interval.clone();
    let mut places = Vec::new();
    for role in [TemporalRole::Begin, TemporalRole::End] {
        let resolution = ctx.role(role);
        let plan = plan_role(resolution);
        tracing::debug!(actor = %actor.id, %role, ?plan, "planned");

        let event = match plan {
            RolePlan::Skip => None,
            RolePlan::Intrinsic { bound, place } => {
                interval.set(role, bound);
                outcome.inline_written = true;
                place.map(|place| DerivedEvent { role, bound: None, place: Some(place) })
            }
            RolePlan::Derived { bound, place } => Some(DerivedEvent { role, bound, place }),
        };

        if let Some(event) = event {
            let id = synthesize(backend, tx, actor, &event, &config.derived_event).await?;
            outcome.derived_events.push(id);
        }
        if let Some(place) = resolution.place {
            places.push(place.link);
        }
    }

    if outcome.inline_written {
        backend.set_entity_interval(tx, actor.id, interval).await?;
    }

    let temporal_codes = config.temporal_role_properties();
    ctx.retire(backend, tx, &code_refs(&temporal_codes), &places).await?;

    Ok(outcome)
}
