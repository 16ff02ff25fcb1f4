//! Inline interval attributes carried by entities and links.

use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::Endpoint;
use crate::{Error, Result};

/// Point in time as stored in interval columns and date-value payloads.
pub type Timestamp = NaiveDateTime;

/// Which side of an interval a temporal role describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemporalRole {
    Begin,
    End,
}

impl fmt::Display for TemporalRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemporalRole::Begin => write!(f, "begin"),
            TemporalRole::End => write!(f, "end"),
        }
    }
}

/// One half of an interval: a from/to range plus its annotation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bound {
    pub from: Option<Timestamp>,
    pub to: Option<Timestamp>,
    pub comment: Option<String>,
}

impl Bound {
    pub fn is_empty(&self) -> bool {
        self.from.is_none() && self.to.is_none() && self.comment.is_none()
    }

    /// The same bound with its comment removed.
    pub fn without_comment(mut self) -> Self {
        self.comment = None;
        self
    }
}

/// Project a resolved `(from, to, comment)` triple into an interval half.
///
/// A `to` without a `from` carries no meaning and is rejected.
pub fn resolve_interval(
    subject: Endpoint,
    role: TemporalRole,
    from: Option<Timestamp>,
    to: Option<Timestamp>,
    comment: Option<String>,
) -> Result<Bound> {
    if from.is_none() && to.is_some() {
        return Err(Error::OrphanedToBound { subject, role });
    }
    let comment = comment
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty());
    Ok(Bound { from, to, comment })
}

/// The six interval columns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interval {
    pub begin_from: Option<Timestamp>,
    pub begin_to: Option<Timestamp>,
    pub begin_comment: Option<String>,
    pub end_from: Option<Timestamp>,
    pub end_to: Option<Timestamp>,
    pub end_comment: Option<String>,
}

impl Interval {
    pub fn is_empty(&self) -> bool {
        self.begin().is_empty() && self.end().is_empty()
    }

    pub fn begin(&self) -> Bound {
        Bound {
            from: self.begin_from,
            to: self.begin_to,
            comment: self.begin_comment.clone(),
        }
    }

    pub fn end(&self) -> Bound {
        Bound {
            from: self.end_from,
            to: self.end_to,
            comment: self.end_comment.clone(),
        }
    }

    pub fn get(&self, role: TemporalRole) -> Bound {
        match role {
            TemporalRole::Begin => self.begin(),
            TemporalRole::End => self.end(),
        }
    }

    pub fn set(&mut self, role: TemporalRole, bound: Bound) {
        match role {
            TemporalRole::Begin => {
                self.begin_from = bound.from;
                self.begin_to = bound.to;
                self.begin_comment = bound.comment;
            }
            TemporalRole::End => {
                self.end_from = bound.from;
                self.end_to = bound.to;
                self.end_comment = bound.comment;
            }
        }
    }

    pub fn with(mut self, role: TemporalRole, bound: Bound) -> Self {
        self.set(role, bound);
        self
    }
}
