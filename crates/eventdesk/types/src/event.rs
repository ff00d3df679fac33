//! Event records and write payloads

use crate::ids::EventId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed set of event types.
///
/// Only [`EventType::Ads`] is location gated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    /// General application event
    App,
    /// Live operations event
    #[serde(rename = "liveops")]
    LiveOps,
    /// Cross promotion event
    #[serde(rename = "crosspromo")]
    CrossPromo,
    /// Advertising event
    Ads,
}

impl EventType {
    pub const ALL: [EventType; 4] = [
        EventType::App,
        EventType::LiveOps,
        EventType::CrossPromo,
        EventType::Ads,
    ];

    /// Wire name of the type
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::App => "app",
            EventType::LiveOps => "liveops",
            EventType::CrossPromo => "crosspromo",
            EventType::Ads => "ads",
        }
    }

    /// Whether writes that set this type need location-based authorization
    pub fn is_gated(&self) -> bool {
        matches!(self, EventType::Ads)
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == value)
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Persisted event record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: EventId,
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub priority: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payload for creating an event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateEventInput {
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub priority: i32,
}

/// Partial update; absent fields keep their stored value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateEventPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub event_type: Option<EventType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i32>,
}

impl UpdateEventPatch {
    /// Copy every present field over `event`. Timestamps are left to storage.
    pub fn apply_to(&self, event: &mut Event) {
        if let Some(name) = &self.name {
            event.name = name.clone();
        }
        if let Some(description) = &self.description {
            event.description = description.clone();
        }
        if let Some(event_type) = self.event_type {
            event.event_type = event_type;
        }
        if let Some(priority) = self.priority {
            event.priority = priority;
        }
    }

    /// Type this patch writes, if it sets one
    pub fn target_type(&self) -> Option<EventType> {
        self.event_type
    }
}
