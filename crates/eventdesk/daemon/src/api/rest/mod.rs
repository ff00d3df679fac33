//! REST API for event records

pub mod handlers;
pub mod router;
pub mod state;
