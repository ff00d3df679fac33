//! PostgreSQL storage implementation

use super::traits::*;
use crate::error::StorageError;
use async_trait::async_trait;
use eventdesk_types::{CreateEventInput, Event, EventId, EventType, UpdateEventPatch};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use std::time::Duration;

const EVENT_COLUMNS: &str = "id, name, description, type, priority, created_at, updated_at";

/// PostgreSQL-backed storage
#[derive(Debug, Clone)]
pub struct PostgresStorage {
    pool: PgPool,
}

impl PostgresStorage {
    /// Connect to PostgreSQL and initialize schema
    pub async fn new(
        url: &str,
        max_connections: u32,
        connect_timeout_secs: u64,
    ) -> Result<Self, StorageError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections.max(1))
            .acquire_timeout(Duration::from_secs(connect_timeout_secs))
            .connect(url)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        let storage = Self { pool };
        storage.initialize_schema().await?;
        Ok(storage)
    }

    async fn initialize_schema(&self) -> Result<(), StorageError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS events (
                id BIGSERIAL PRIMARY KEY,
                name TEXT NOT NULL,
                description TEXT NOT NULL,
                type TEXT NOT NULL,
                priority SMALLINT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            );
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

fn event_from_row(row: &PgRow) -> Result<Event, StorageError> {
    let raw_type: String = row.try_get("type")?;
    let event_type = EventType::parse(&raw_type)
        .ok_or_else(|| StorageError::InvalidData(format!("unknown event type '{}'", raw_type)))?;
    let priority: i16 = row.try_get("priority")?;

    Ok(Event {
        id: EventId::new(row.try_get("id")?),
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        event_type,
        priority: i32::from(priority),
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn priority_column(priority: i32) -> Result<i16, StorageError> {
    i16::try_from(priority)
        .map_err(|_| StorageError::InvalidData(format!("priority {} out of range", priority)))
}

#[async_trait]
impl EventStorage for PostgresStorage {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn insert(&self, input: CreateEventInput) -> StorageResult<Event> {
        let row = sqlx::query(&format!(
            "INSERT INTO events (name, description, type, priority) VALUES ($1, $2, $3, $4) RETURNING {}",
            EVENT_COLUMNS
        ))
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.event_type.as_str())
        .bind(priority_column(input.priority)?)
        .fetch_one(&self.pool)
        .await?;

        event_from_row(&row)
    }

    async fn get(&self, id: EventId) -> StorageResult<Option<Event>> {
        let row = sqlx::query(&format!("SELECT {} FROM events WHERE id = $1", EVENT_COLUMNS))
            .bind(id.value())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(event_from_row).transpose()
    }

    async fn list(&self) -> StorageResult<Vec<Event>> {
        let rows = sqlx::query(&format!("SELECT {} FROM events ORDER BY id ASC", EVENT_COLUMNS))
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(event_from_row).collect()
    }

    async fn update(&self, id: EventId, patch: &UpdateEventPatch) -> StorageResult<Option<Event>> {
        let priority = patch.priority.map(priority_column).transpose()?;

        // Absent fields keep the column value current at write time.
        let row = sqlx::query(&format!(
            "UPDATE events SET name = COALESCE($2, name), description = COALESCE($3, description), \
             type = COALESCE($4, type), priority = COALESCE($5, priority), updated_at = NOW() \
             WHERE id = $1 RETURNING {}",
            EVENT_COLUMNS
        ))
        .bind(id.value())
        .bind(patch.name.as_deref())
        .bind(patch.description.as_deref())
        .bind(patch.event_type.map(|t| t.as_str()))
        .bind(priority)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(event_from_row).transpose()
    }

    async fn delete(&self, id: EventId) -> StorageResult<bool> {
        let result = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id.value())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
