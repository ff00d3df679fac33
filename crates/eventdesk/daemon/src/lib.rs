//! Eventdesk daemon library
//!
//! This module provides the components of the eventdesk service:
//! - REST API handlers
//! - Storage backends
//! - Event lifecycle with location-gated authorization
//! - Server lifecycle management

pub mod api;
pub mod config;
pub mod error;
pub mod server;
pub mod service;
pub mod storage;

pub use config::DaemonConfig;
pub use error::{ApiError, DaemonError, ServiceError, StorageError};
pub use server::Server;
pub use service::EventService;
pub use storage::{EventStorage, InMemoryStorage, PostgresStorage};
