//! In-memory storage implementation

use super::traits::*;
use async_trait::async_trait;
use chrono::Utc;
use eventdesk_types::{CreateEventInput, Event, EventId, UpdateEventPatch};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::sync::RwLock;

/// In-memory storage for development and testing
#[derive(Debug)]
pub struct InMemoryStorage {
    events: RwLock<BTreeMap<EventId, Event>>,
    sequence: AtomicI64,
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStorage {
    /// Create a new in-memory storage
    pub fn new() -> Self {
        Self {
            events: RwLock::new(BTreeMap::new()),
            sequence: AtomicI64::new(0),
        }
    }
}

#[async_trait]
impl EventStorage for InMemoryStorage {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn insert(&self, input: CreateEventInput) -> StorageResult<Event> {
        let id = EventId::new(self.sequence.fetch_add(1, Ordering::SeqCst) + 1);
        let now = Utc::now();
        let event = Event {
            id,
            name: input.name,
            description: input.description,
            event_type: input.event_type,
            priority: input.priority,
            created_at: now,
            updated_at: now,
        };

        let mut events = self.events.write().await;
        events.insert(id, event.clone());
        Ok(event)
    }

    async fn get(&self, id: EventId) -> StorageResult<Option<Event>> {
        let events = self.events.read().await;
        Ok(events.get(&id).cloned())
    }

    async fn list(&self) -> StorageResult<Vec<Event>> {
        let events = self.events.read().await;
        Ok(events.values().cloned().collect())
    }

    async fn update(&self, id: EventId, patch: &UpdateEventPatch) -> StorageResult<Option<Event>> {
        let mut events = self.events.write().await;
        let Some(stored) = events.get_mut(&id) else {
            return Ok(None);
        };

        patch.apply_to(stored);
        stored.updated_at = Utc::now();
        Ok(Some(stored.clone()))
    }

    async fn delete(&self, id: EventId) -> StorageResult<bool> {
        let mut events = self.events.write().await;
        Ok(events.remove(&id).is_some())
    }
}
