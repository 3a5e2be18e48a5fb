use async_trait::async_trait;
use chrono::{DateTime, Utc};
use eventbook_core::reservation::EVENT_NOT_FOUND;
use eventbook_core::{CoreError, CoreResult, Event, EventRepository, NewEvent};
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::storage_error;

pub(crate) const EVENT_COLUMNS: &str = "id, title, description, date, location, price, available_seats, image, created_by, created_at, updated_at";

/// Conditional decrement; returns no row when the event is missing or sold out.
pub(crate) const DECREMENT_SEATS: &str = r#"
    UPDATE events
    SET available_seats = available_seats - 1, updated_at = NOW()
    WHERE id = $1 AND available_seats > 0
    RETURNING available_seats
"#;

#[derive(sqlx::FromRow)]
pub(crate) struct EventRow {
    id: Uuid,
    title: String,
    description: String,
    date: String,
    location: String,
    price: f64,
    available_seats: i32,
    image: Option<String>,
    created_by: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<EventRow> for Event {
    fn from(row: EventRow) -> Self {
        Event {
            id: row.id,
            title: row.title,
            description: row.description,
            date: row.date,
            location: row.location,
            price: row.price,
            available_seats: row.available_seats,
            image: row.image,
            created_by: row.created_by,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

pub struct PgEventRepository {
    pool: PgPool,
}

impl PgEventRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EventRepository for PgEventRepository {
    async fn create_event(&self, input: NewEvent, created_by: Uuid) -> CoreResult<Event> {
        input.validate()?;
        let event = input.into_event(created_by);

        sqlx::query(
            r#"
            INSERT INTO events (id, title, description, date, location, price, available_seats, image, created_by, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(event.id)
        .bind(&event.title)
        .bind(&event.description)
        .bind(&event.date)
        .bind(&event.location)
        .bind(event.price)
        .bind(event.available_seats)
        .bind(&event.image)
        .bind(event.created_by)
        .bind(event.created_at)
        .bind(event.updated_at)
        .execute(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(event)
    }

    async fn get_event(&self, id: Uuid) -> CoreResult<Option<Event>> {
        let row = sqlx::query_as::<_, EventRow>(&format!(
            "SELECT {} FROM events WHERE id = $1",
            EVENT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(row.map(Event::from))
    }

    async fn list_events(&self) -> CoreResult<Vec<Event>> {
        let rows = sqlx::query_as::<_, EventRow>(&format!(
            "SELECT {} FROM events ORDER BY created_at DESC",
            EVENT_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(rows.into_iter().map(Event::from).collect())
    }

    async fn decrement_seats(&self, id: Uuid) -> CoreResult<i32> {
        let remaining: Option<i32> = sqlx::query_scalar(DECREMENT_SEATS)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_error)?;

        if let Some(remaining) = remaining {
            return Ok(remaining);
        }

        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM events WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(storage_error)?;

        if exists {
            Err(CoreError::CapacityExceeded)
        } else {
            Err(CoreError::NotFound(EVENT_NOT_FOUND.to_string()))
        }
    }
}
