//! Storage trait definitions

use crate::error::StorageError;
use async_trait::async_trait;
use eventdesk_types::{CreateEventInput, Event, EventId, UpdateEventPatch};

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Storage for event records.
///
/// Implementations assign ids and own both timestamps.
#[async_trait]
pub trait EventStorage: Send + Sync {
    /// Short backend name for status reporting
    fn backend(&self) -> &'static str;

    /// Insert a new record, assigning id and timestamps
    async fn insert(&self, input: CreateEventInput) -> StorageResult<Event>;

    /// Get an event by ID
    async fn get(&self, id: EventId) -> StorageResult<Option<Event>>;

    /// List all events ordered by id
    async fn list(&self) -> StorageResult<Vec<Event>>;

    /// Apply the present fields of `patch` to the current record in one step
    /// and refresh `updated_at`.
    ///
    /// Returns `None` if the record no longer exists.
    async fn update(&self, id: EventId, patch: &UpdateEventPatch) -> StorageResult<Option<Event>>;

    /// Delete an event by ID
    async fn delete(&self, id: EventId) -> StorageResult<bool>;
}
