//! Core domain types and models
//!
//! This module contains the domain model for the fan-out core:
//! registrations, targets, unit-of-work bindings, outcome records,
//! identifier newtypes, and the crate error type.

pub mod errors;
pub mod ids;
pub mod outcome;
pub mod registration;
pub mod result;
pub mod target;
pub mod work;

pub use errors::{RegsimError, TransportError};
pub use ids::{DocSetId, GlobalId, StudyId, TargetId};
pub use outcome::{OutcomeKind, OutcomeRecord, OutcomeStatus};
pub use registration::Registration;
pub use result::Result;
pub use target::{Capabilities, Target, TargetKind};
pub use work::{DocSet, SexConstraint, Study};
