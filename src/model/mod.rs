//! # Heritage Graph Model
//!
//! Plain DTOs for the CIDOC-CRM property graph: entities, links, and the
//! inline interval attributes that replace reified date values.
//!
//! This module is pure data. No I/O, no state, no async.

pub mod codes;
pub mod entity;
pub mod interval;
pub mod link;

pub use entity::{DateKind, Entity, EntityDraft, EntityId};
pub use interval::{Bound, Interval, TemporalRole, Timestamp, resolve_interval};
pub use link::{Endpoint, Link, LinkId};
