//! Eventdesk core types
//!
//! Campaign event records, their closed type enumeration, and the
//! create/update payloads accepted at the service boundary.

pub mod event;
pub mod ids;
pub mod validation;

pub use event::{CreateEventInput, Event, EventType, UpdateEventPatch};
pub use ids::{EventId, ParseEventIdError};
pub use validation::{Validate, ValidationError, MAX_PRIORITY, MIN_PRIORITY};
