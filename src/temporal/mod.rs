//! # Temporal Normalization
//!
//! Turns reified date values into inline intervals.
//!
//! - `resolver`: finds the date values and place behind each temporal role
//! - `actor`: writes birth/death inline and externalizes appearances
//! - `synthesizer`: creates derived appearance events
//! - `projector`: writes event and involvement intervals inline

pub mod actor;
pub mod projector;
pub mod resolver;
pub mod synthesizer;

pub use actor::{ActorOutcome, RolePlan, normalize_actor, plan_role};
pub use projector::project_subject;
pub use resolver::{
    PlaceRef, Provenance, ResolvedBound, RoleCodes, RoleResolution, SubjectContext, resolve_role,
};
pub use synthesizer::{DerivedEvent, synthesize};
