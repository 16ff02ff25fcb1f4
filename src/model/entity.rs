//! Entity (typed node) in the heritage graph.

use serde::{Deserialize, Serialize};

use super::codes::{class, system_type};
use super::{Interval, Timestamp};

/// Opaque entity identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u64);

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind of a reified date-value node, parsed from its `system_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DateKind {
    Exact,
    From,
    To,
}

impl DateKind {
    pub fn parse(system_type: &str) -> Option<Self> {
        match system_type {
            system_type::EXACT_DATE_VALUE => Some(DateKind::Exact),
            system_type::FROM_DATE_VALUE => Some(DateKind::From),
            system_type::TO_DATE_VALUE => Some(DateKind::To),
            _ => None,
        }
    }

    pub fn system_type(self) -> &'static str {
        match self {
            DateKind::Exact => system_type::EXACT_DATE_VALUE,
            DateKind::From => system_type::FROM_DATE_VALUE,
            DateKind::To => system_type::TO_DATE_VALUE,
        }
    }

    /// Exact and from values open a range; a to value can only close one.
    pub fn opens_range(self) -> bool {
        matches!(self, DateKind::Exact | DateKind::From)
    }
}

/// A typed node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub class_code: String,
    pub name: String,
    pub description: Option<String>,
    /// Legacy column; for date-value nodes one of the `system_type` constants.
    pub system_type: Option<String>,
    /// Legacy scalar date payload of date-value nodes.
    pub value_timestamp: Option<Timestamp>,
    #[serde(default)]
    pub interval: Interval,
}

impl Entity {
    pub fn has_class(&self, codes: &[&str]) -> bool {
        codes.iter().any(|c| *c == self.class_code)
    }

    pub fn date_kind(&self) -> Option<DateKind> {
        if self.class_code != class::TIME_PRIMITIVE {
            return None;
        }
        self.system_type.as_deref().and_then(DateKind::parse)
    }

    pub fn is_date_value(&self) -> bool {
        self.date_kind().is_some()
    }
}

/// Attributes of an entity that does not exist yet.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityDraft {
    pub class_code: String,
    pub name: String,
    pub description: Option<String>,
    pub system_type: Option<String>,
    pub value_timestamp: Option<Timestamp>,
    pub interval: Interval,
}

impl EntityDraft {
    pub fn new(class_code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            class_code: class_code.into(),
            name: name.into(),
            ..Self::default()
        }
    }

    /// A reified date node as the legacy schema stores it.
    pub fn date_value(kind: DateKind, value: Timestamp) -> Self {
        Self {
            class_code: class::TIME_PRIMITIVE.to_string(),
            name: value.format("%Y-%m-%d").to_string(),
            system_type: Some(kind.system_type().to_string()),
            value_timestamp: Some(value),
            ..Self::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_interval(mut self, interval: Interval) -> Self {
        self.interval = interval;
        self
    }

    pub fn is_date_value(&self) -> bool {
        self.class_code == class::TIME_PRIMITIVE
            && self.system_type.as_deref().and_then(DateKind::parse).is_some()
    }

    pub fn into_entity(self, id: EntityId) -> Entity {
        Entity {
            id,
            class_code: self.class_code,
            name: self.name,
            description: self.description,
            system_type: self.system_type,
            value_timestamp: self.value_timestamp,
            interval: self.interval,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_date_kind_requires_time_primitive() {
        let ts = NaiveDate::from_ymd_opt(1900, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
        let date = EntityDraft::date_value(DateKind::From, ts).into_entity(EntityId(1));
        assert_eq!(date.date_kind(), Some(DateKind::From));
        assert_eq!(date.name, "1900-01-01");

        let mut odd = EntityDraft::new(class::PERSON, "Ada").into_entity(EntityId(2));
        odd.system_type = Some(system_type::FROM_DATE_VALUE.into());
        assert_eq!(odd.date_kind(), None);
    }

    #[test]
    fn test_opens_range() {
        assert!(DateKind::Exact.opens_range());
        assert!(DateKind::From.opens_range());
        assert!(!DateKind::To.opens_range());
    }
}
