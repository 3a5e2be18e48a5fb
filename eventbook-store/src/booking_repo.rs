use async_trait::async_trait;
use chrono::{DateTime, Utc};
use eventbook_core::reservation::{check_reservation, ALREADY_REGISTERED};
use eventbook_core::{Booking, BookingLedger, CoreError, CoreResult, Event};
use sqlx::PgPool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::database::{is_unique_violation, storage_error};
use crate::event_repo::{EventRow, DECREMENT_SEATS, EVENT_COLUMNS};

#[derive(sqlx::FromRow)]
struct BookingRow {
    id: Uuid,
    user_id: Uuid,
    event_id: Uuid,
    payment_status: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<BookingRow> for Booking {
    type Error = CoreError;

    fn try_from(row: BookingRow) -> Result<Self, Self::Error> {
        Ok(Booking {
            id: row.id,
            user: row.user_id,
            event: row.event_id,
            payment_status: row.payment_status.parse()?,
            created_at: row.created_at,
        })
    }
}

pub struct PgBookingLedger {
    pool: PgPool,
}

impl PgBookingLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookingLedger for PgBookingLedger {
    async fn reserve(&self, user_id: Uuid, event_id: Uuid) -> CoreResult<Booking> {
        // Dropping `tx` on any early return rolls everything back.
        let mut tx = self.pool.begin().await.map_err(storage_error)?;

        // Row lock serializes concurrent reservations for this event.
        let event = sqlx::query_as::<_, EventRow>(&format!(
            "SELECT {} FROM events WHERE id = $1 FOR UPDATE",
            EVENT_COLUMNS
        ))
        .bind(event_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(storage_error)?
        .map(Event::from);

        let already_booked: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM bookings WHERE user_id = $1 AND event_id = $2)",
        )
        .bind(user_id)
        .bind(event_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(storage_error)?;

        check_reservation(event.as_ref(), already_booked)?;

        let remaining: Option<i32> = sqlx::query_scalar(DECREMENT_SEATS)
            .bind(event_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(storage_error)?;

        let remaining = remaining.ok_or(CoreError::CapacityExceeded)?;

        let booking = Booking::paid(user_id, event_id);

        sqlx::query(
            r#"
            INSERT INTO bookings (id, user_id, event_id, payment_status, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(booking.id)
        .bind(booking.user)
        .bind(booking.event)
        .bind(booking.payment_status.as_str())
        .bind(booking.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                CoreError::Conflict(ALREADY_REGISTERED.to_string())
            } else {
                storage_error(e)
            }
        })?;

        tx.commit().await.map_err(storage_error)?;

        debug!(%event_id, remaining, "Seat decremented");
        info!(booking_id = %booking.id, %user_id, %event_id, "Booking committed");

        Ok(booking)
    }

    async fn bookings_for_user(&self, user_id: Uuid) -> CoreResult<Vec<Booking>> {
        let rows = sqlx::query_as::<_, BookingRow>(
            r#"
            SELECT id, user_id, event_id, payment_status, created_at
            FROM bookings
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error)?;

        rows.into_iter().map(Booking::try_from).collect()
    }
}
