//! Event and involvement interval projection.
//!
//! Events and involvements are intrinsically time-bounded, so whatever the
//! begin and end roles resolve to is written inline. Nothing is synthesized.
//! Comments are not carried over for these subjects yet; the comment fields
//! stay empty until a source for them is decided.

use crate::config::{MigrationConfig, code_refs};
use crate::model::*;
use crate::storage::StorageBackend;
use crate::temporal::resolver::SubjectContext;
use crate::{Error, Result};

/// Merge resolved bounds over `current`. Roles without a match stay as they are.
fn projected(ctx: &SubjectContext, current: &Interval) -> Option<Interval> {
    let mut interval = current.clone();
    let mut touched = false;
    for role in [TemporalRole::Begin, TemporalRole::End] {
        if let Some(resolved) = &ctx.role(role).bound {
            interval.set(role, resolved.bound.clone().without_comment());
            touched = true;
        }
    }
    touched.then_some(interval)
}

/// Project the interval of one event entity or involvement link inside the
/// caller's transaction. Returns whether anything was written.
pub async fn project_subject<B: StorageBackend>(
    backend: &B,
    tx: &mut B::Tx,
    subject: Endpoint,
    config: &MigrationConfig,
) -> Result<bool> {
    let current = match subject {
        Endpoint::Entity(id) => backend.get_entity(tx, id).await?.map(|e| e.interval),
        Endpoint::Link(id) => backend.get_link(tx, id).await?.map(|l| l.interval),
    }
    .ok_or_else(|| Error::NotFound(format!("Subject {subject}")))?;

    let ctx = SubjectContext::resolve(
        backend, tx, subject, &config.event_begin, &config.event_end,
    ).await?;
    ctx.ensure_no_orphans()?;

    let Some(interval) = projected(&ctx, &current) else {
        return Ok(false);
    };
    match subject {
        Endpoint::Entity(id) => backend.set_entity_interval(tx, id, interval).await?,
        Endpoint::Link(id) => backend.set_link_interval(tx, id, interval).await?,
    }

    let temporal_codes = config.temporal_role_properties();
    ctx.retire(backend, tx, &code_refs(&temporal_codes), &[]).await?;
    Ok(true)
}
