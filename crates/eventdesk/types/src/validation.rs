//! Input shape validation for write payloads

use crate::event::{CreateEventInput, UpdateEventPatch};
use thiserror::Error;

pub const MIN_PRIORITY: i32 = 0;
pub const MAX_PRIORITY: i32 = 10;

/// Boundary validation failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} must not be empty")]
    EmptyField(&'static str),

    #[error("priority must be between {min} and {max}, got {0}", min = MIN_PRIORITY, max = MAX_PRIORITY)]
    PriorityOutOfRange(i32),
}

/// Shape checks run before a payload reaches the lifecycle manager
pub trait Validate {
    fn validate(&self) -> Result<(), ValidationError>;
}

fn require_text(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::EmptyField(field));
    }
    Ok(())
}

fn require_priority(priority: i32) -> Result<(), ValidationError> {
    if !(MIN_PRIORITY..=MAX_PRIORITY).contains(&priority) {
        return Err(ValidationError::PriorityOutOfRange(priority));
    }
    Ok(())
}

impl Validate for CreateEventInput {
    fn validate(&self) -> Result<(), ValidationError> {
        require_text("name", &self.name)?;
        require_text("description", &self.description)?;
        require_priority(self.priority)
    }
}

impl Validate for UpdateEventPatch {
    fn validate(&self) -> Result<(), ValidationError> {
        if let Some(name) = &self.name {
            require_text("name", name)?;
        }
        if let Some(description) = &self.description {
            require_text("description", description)?;
        }
        if let Some(priority) = self.priority {
            require_priority(priority)?;
        }
        Ok(())
    }
}
