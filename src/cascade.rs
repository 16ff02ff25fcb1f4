//! Deletion cascade policy.
//!
//! Some entities only exist to describe another one: appellations (aliases),
//! the location of a find, translations of a document. Deleting the owner must
//! delete them too, otherwise the graph keeps orphans. The policy runs as a
//! [`PreDeleteHook`] so it sees the owning links before they disappear.
//!
//! | Owner class | Property | Dependents |
//! |-------------|----------|------------|
//! | E21 / E40 / E74 | P131 | every actor appellation |
//! | E18 / E22 | P1 | every appellation |
//! | E18 / E22 | P53 | the location |
//! | E33 | P73 | every translation |

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::model::codes::{class, property};
use crate::model::{Endpoint, Entity, EntityId};
use crate::storage::{GraphView, PreDeleteHook};
use crate::{Error, Result};

/// One owner-class → property rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CascadeRule {
    pub classes: Vec<String>,
    pub property: String,
    /// At most one dependent is expected through this property.
    #[serde(default)]
    pub single: bool,
}

impl CascadeRule {
    pub fn new(classes: &[&str], property: &str) -> Self {
        Self {
            classes: classes.iter().map(|c| c.to_string()).collect(),
            property: property.to_string(),
            single: false,
        }
    }

    pub fn single(mut self) -> Self {
        self.single = true;
        self
    }

    fn applies_to(&self, entity: &Entity) -> bool {
        self.classes.iter().any(|c| *c == entity.class_code)
    }
}

/// The set of cascade rules evaluated on every entity deletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CascadePolicy {
    pub rules: Vec<CascadeRule>,
}

impl Default for CascadePolicy {
    fn default() -> Self {
        Self {
            rules: vec![
                CascadeRule::new(class::ACTORS, property::IS_IDENTIFIED_BY),
                CascadeRule::new(class::FINDS, property::HAS_IDENTIFIER),
                CascadeRule::new(class::FINDS, property::HAS_CURRENT_LOCATION).single(),
                CascadeRule::new(class::DOCUMENTS, property::HAS_TRANSLATION),
            ],
        }
    }
}

impl CascadePolicy {
    /// Properties through which an entity owns its dependents.
    fn owning_properties(&self) -> SmallVec<[&str; 4]> {
        let mut codes: SmallVec<[&str; 4]> = SmallVec::new();
        for rule in &self.rules {
            if !codes.contains(&rule.property.as_str()) {
                codes.push(rule.property.as_str());
            }
        }
        codes
    }
}

impl PreDeleteHook for CascadePolicy {
    fn name(&self) -> &str {
        "cascade"
    }

    fn dependents(&self, view: &dyn GraphView, entity: &Entity) -> Result<Vec<EntityId>> {
        let owner = Endpoint::Entity(entity.id);
        let mut dependents = Vec::new();

        for rule in self.rules.iter().filter(|r| r.applies_to(entity)) {
            let links = view.links_from(owner, &[rule.property.as_str()]);
            if rule.single && links.len() > 1 {
                tracing::warn!(
                    entity = %entity.id,
                    property = %rule.property,
                    count = links.len(),
                    "expected at most one dependent, deleting all",
                );
            }
            dependents.extend(links.iter().map(|l| l.range_id));
        }
        if dependents.is_empty() {
            return Ok(dependents);
        }
        dependents.sort();
        dependents.dedup();

        // A dependent another owner still claims must not disappear under it.
        let owning = self.owning_properties();
        for dependent in &dependents {
            if let Some(other) = view
                .links_to(*dependent, &owning)
                .into_iter()
                .find(|l| l.domain != owner)
            {
                return Err(Error::CascadeConstraintViolation {
                    entity: entity.id,
                    dependent: *dependent,
                    referrer: other.domain,
                });
            }
        }

        Ok(dependents)
    }
}
