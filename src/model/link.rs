//! Link (typed directed edge) in the heritage graph.

use serde::{Deserialize, Serialize};

use super::{EntityId, Interval};

/// Opaque link identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LinkId(pub u64);

impl std::fmt::Display for LinkId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The domain side of a link.
///
/// Ordinary links start at an entity. A link-property association qualifies
/// another link, so its domain is that link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum Endpoint {
    Entity(EntityId),
    Link(LinkId),
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Endpoint::Entity(id) => write!(f, "entity {id}"),
            Endpoint::Link(id) => write!(f, "link {id}"),
        }
    }
}

impl From<EntityId> for Endpoint {
    fn from(id: EntityId) -> Self { Endpoint::Entity(id) }
}

impl From<LinkId> for Endpoint {
    fn from(id: LinkId) -> Self { Endpoint::Link(id) }
}

/// A directed, typed edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub id: LinkId,
    pub domain: Endpoint,
    pub range_id: EntityId,
    pub property_code: String,
    pub description: Option<String>,
    #[serde(default)]
    pub interval: Interval,
}

impl Link {
    pub fn new(id: LinkId, domain: Endpoint, range_id: EntityId, property_code: impl Into<String>) -> Self {
        Self {
            id,
            domain,
            range_id,
            property_code: property_code.into(),
            description: None,
            interval: Interval::default(),
        }
    }

    /// True when this link qualifies another link rather than an entity.
    pub fn is_link_property(&self) -> bool {
        matches!(self.domain, Endpoint::Link(_))
    }
}
