//! Migration configuration.
//!
//! Defaults describe the CIDOC-CRM vocabulary of the legacy schema. A corpus
//! using other codes can load its own record from JSON.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::model::codes::{class, property};
use crate::temporal::RoleCodes;
use crate::Result;

/// Code lists borrowed as `&str` slices for store queries.
pub(crate) type CodeRefs<'a> = SmallVec<[&'a str; 8]>;

pub(crate) fn code_refs(codes: &[String]) -> CodeRefs<'_> {
    codes.iter().map(String::as_str).collect()
}

fn owned(codes: &[&str]) -> Vec<String> {
    codes.iter().map(|c| c.to_string()).collect()
}

/// How derived appearance events are shaped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedEventConfig {
    pub class_code: String,
    /// event → place
    pub place_property: String,
    /// event → actor
    pub actor_property: String,
    /// Name prefix for events derived from the begin role.
    pub begin_prefix: String,
    /// Name prefix for events derived from the end role.
    pub end_prefix: String,
}

impl Default for DerivedEventConfig {
    fn default() -> Self {
        Self {
            class_code: class::EVENT.into(),
            place_property: property::TOOK_PLACE_AT.into(),
            actor_property: property::HAD_PARTICIPANT.into(),
            begin_prefix: "Appearance of".into(),
            end_prefix: "Disappearance of".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MigrationConfig {
    pub actor_classes: Vec<String>,
    pub event_classes: Vec<String>,
    pub involvement_properties: Vec<String>,
    pub actor_begin: RoleCodes,
    pub actor_end: RoleCodes,
    pub event_begin: RoleCodes,
    pub event_end: RoleCodes,
    pub derived_event: DerivedEventConfig,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            actor_classes: owned(class::ACTORS),
            event_classes: owned(class::EVENTS),
            involvement_properties: owned(property::INVOLVEMENTS),
            actor_begin: RoleCodes::new(property::BIRTH)
                .with_appearance(property::FIRST_APPEARANCE)
                .with_place(property::FIRST_APPEARS_AT),
            actor_end: RoleCodes::new(property::DEATH)
                .with_appearance(property::LAST_APPEARANCE)
                .with_place(property::LAST_APPEARS_AT),
            event_begin: RoleCodes::new(property::BEGIN),
            event_end: RoleCodes::new(property::END),
            derived_event: DerivedEventConfig::default(),
        }
    }
}

impl MigrationConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Every property that only points at date values; dropped at finalization.
    pub fn temporal_role_properties(&self) -> Vec<String> {
        let mut codes: Vec<String> = [
            &self.actor_begin, &self.actor_end, &self.event_begin, &self.event_end,
        ]
        .into_iter()
        .flat_map(|role| role.date_codes())
        .map(str::to_string)
        .collect();
        codes.sort();
        codes.dedup();
        codes
    }
}
