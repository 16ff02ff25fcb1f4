//! Interval resolution from reified date values.
//!
//! A subject reaches its date values through temporal-role links. For one
//! role the resolver looks for a single opening value ("exact" or "from"),
//! then, only if one exists, a single closing "to" value, and finally an
//! optional place. The property code that matched the opening value is kept
//! as a provenance tag so callers branch on it instead of re-deriving it.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::model::codes::class;
use crate::model::*;
use crate::storage::StorageBackend;
use crate::{Error, Result};

/// Where an opening date value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Provenance {
    /// The date is a property of the subject itself (birth, death, event bounds).
    Intrinsic,
    /// The date records when the subject was observed (first/last appearance).
    Appearance,
}

/// Property codes that can carry one temporal role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleCodes {
    pub intrinsic: String,
    #[serde(default)]
    pub appearance: Option<String>,
    /// Subject → place for this role.
    #[serde(default)]
    pub place: Option<String>,
}

impl RoleCodes {
    pub fn new(intrinsic: impl Into<String>) -> Self {
        Self { intrinsic: intrinsic.into(), appearance: None, place: None }
    }

    pub fn with_appearance(mut self, code: impl Into<String>) -> Self {
        self.appearance = Some(code.into());
        self
    }

    pub fn with_place(mut self, code: impl Into<String>) -> Self {
        self.place = Some(code.into());
        self
    }

    /// Codes that point at date values.
    pub fn date_codes(&self) -> SmallVec<[&str; 2]> {
        let mut codes = SmallVec::new();
        codes.push(self.intrinsic.as_str());
        if let Some(appearance) = &self.appearance {
            codes.push(appearance.as_str());
        }
        codes
    }

    pub fn provenance(&self, code: &str) -> Option<Provenance> {
        if code == self.intrinsic {
            Some(Provenance::Intrinsic)
        } else if self.appearance.as_deref() == Some(code) {
            Some(Provenance::Appearance)
        } else {
            None
        }
    }
}

/// An opening value, its optional closing value, and where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedBound {
    pub bound: Bound,
    pub provenance: Provenance,
    pub property_code: String,
}

/// The place linked to a subject for one role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaceRef {
    pub link: LinkId,
    pub place: EntityId,
}

/// Everything resolved for one role of one subject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleResolution {
    pub role: TemporalRole,
    pub bound: Option<ResolvedBound>,
    pub place: Option<PlaceRef>,
    /// Date-value entities whose payload this resolution consumed.
    pub date_nodes: SmallVec<[EntityId; 2]>,
    /// A "to" value found without any opening value.
    pub orphaned_to: Option<EntityId>,
}

impl RoleResolution {
    fn empty(role: TemporalRole) -> Self {
        Self { role, bound: None, place: None, date_nodes: SmallVec::new(), orphaned_to: None }
    }

    pub fn is_empty(&self) -> bool {
        self.bound.is_none() && self.place.is_none()
    }
}

fn timestamp_of(date: &Entity) -> Result<Timestamp> {
    date.value_timestamp.ok_or_else(|| {
        Error::ConstraintViolation(format!("date value {} has no timestamp", date.id))
    })
}

/// Resolve one temporal role of `subject`.
pub async fn resolve_role<B: StorageBackend>(
    backend: &B,
    tx: &B::Tx,
    subject: Endpoint,
    role: TemporalRole,
    codes: &RoleCodes,
) -> Result<RoleResolution> {
    let mut resolution = RoleResolution::empty(role);
    let date_codes = codes.date_codes();
    let dates = backend
        .linked_entities(tx, subject, &date_codes, Some(&[class::TIME_PRIMITIVE][..]))
        .await?;

    let (opening, closing): (Vec<_>, Vec<_>) = dates
        .into_iter()
        .filter(|(_, date)| date.is_date_value())
        .partition(|(_, date)| date.date_kind().is_some_and(DateKind::opens_range));

    if opening.len() > 1 {
        return Err(Error::AmbiguousTemporalSource { subject, role, count: opening.len() });
    }
    if closing.len() > 1 {
        return Err(Error::AmbiguousTemporalSource { subject, role, count: closing.len() });
    }

    match opening.into_iter().next() {
        Some((link, from)) => {
            let provenance = codes.provenance(&link.property_code).ok_or_else(|| {
                Error::ConstraintViolation(format!(
                    "property {} is not a {role} role", link.property_code
                ))
            })?;
            resolution.date_nodes.push(from.id);

            // Only meaningful once an opening value exists.
            let to = match closing.into_iter().next() {
                Some((_, to)) => {
                    resolution.date_nodes.push(to.id);
                    Some(timestamp_of(&to)?)
                }
                None => None,
            };

            let bound = resolve_interval(
                subject, role, Some(timestamp_of(&from)?), to, from.description.clone(),
            )?;
            resolution.bound = Some(ResolvedBound {
                bound,
                provenance,
                property_code: link.property_code,
            });
        }
        None => {
            resolution.orphaned_to = closing.into_iter().next().map(|(_, to)| to.id);
        }
    }

    if let Some(place_code) = &codes.place {
        let places = backend.links_from(tx, subject, &[place_code.as_str()]).await?;
        if places.len() > 1 {
            return Err(Error::AmbiguousTemporalSource { subject, role, count: places.len() });
        }
        resolution.place = places
            .into_iter()
            .next()
            .map(|link| PlaceRef { link: link.id, place: link.range_id });
    }

    Ok(resolution)
}

/// Per-subject context threaded through resolution and normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectContext {
    pub subject: Endpoint,
    pub begin: RoleResolution,
    pub end: RoleResolution,
}

impl SubjectContext {
    pub async fn resolve<B: StorageBackend>(
        backend: &B,
        tx: &B::Tx,
        subject: Endpoint,
        begin: &RoleCodes,
        end: &RoleCodes,
    ) -> Result<Self> {
        Ok(Self {
            subject,
            begin: resolve_role(backend, tx, subject, TemporalRole::Begin, begin).await?,
            end: resolve_role(backend, tx, subject, TemporalRole::End, end).await?,
        })
    }

    pub fn role(&self, role: TemporalRole) -> &RoleResolution {
        match role {
            TemporalRole::Begin => &self.begin,
            TemporalRole::End => &self.end,
        }
    }

    /// A leftover "to" value would be silently lost; refuse instead.
    pub fn ensure_no_orphans(&self) -> Result<()> {
        for resolution in [&self.begin, &self.end] {
            if resolution.orphaned_to.is_some() {
                return Err(Error::OrphanedToBound { subject: self.subject, role: resolution.role });
            }
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.begin.is_empty() && self.end.is_empty()
    }

    /// Delete consumed date values (and with them their temporal links),
    /// plus the place links given in `places`.
    ///
    /// `temporal_codes` must cover every temporal-role property of every
    /// subject kind, not only this subject's: a date value any other subject
    /// also reaches through one of them is refused.
    pub async fn retire<B: StorageBackend>(
        &self,
        backend: &B,
        tx: &mut B::Tx,
        temporal_codes: &[&str],
        places: &[LinkId],
    ) -> Result<()> {
        for date in self.begin.date_nodes.iter().chain(&self.end.date_nodes) {
            let referrers = backend.links_to(tx, *date, temporal_codes).await?;
            if let Some(other) = referrers.iter().find(|l| l.domain != self.subject) {
                return Err(Error::ConstraintViolation(format!(
                    "date value {date} is shared by {} and {}", self.subject, other.domain
                )));
            }
            backend.delete_entity(tx, *date).await?;
        }
        for link in places {
            backend.delete_link(tx, *link).await?;
        }
        Ok(())
    }
}
