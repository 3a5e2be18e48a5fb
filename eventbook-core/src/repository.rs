use async_trait::async_trait;
use uuid::Uuid;

use crate::booking::Booking;
use crate::event::{Event, NewEvent};
use crate::user::{NewUser, User};
use crate::CoreResult;

/// Repository trait for the event catalog
#[async_trait]
pub trait EventRepository: Send + Sync {
    async fn create_event(&self, event: NewEvent, created_by: Uuid) -> CoreResult<Event>;

    async fn get_event(&self, id: Uuid) -> CoreResult<Option<Event>>;

    /// Newest first.
    async fn list_events(&self) -> CoreResult<Vec<Event>>;

    /// Decrements `available_seats` only while it is positive, as a single
    /// atomic step. Returns the remaining seat count.
    async fn decrement_seats(&self, id: Uuid) -> CoreResult<i32>;
}

/// The reservation write path.
///
/// `reserve` checks, in order: the event exists (`NotFound`), the user holds
/// no booking for it (`Conflict`), a seat is left (`CapacityExceeded`). On
/// success the seat decrement and the booking insert are applied together;
/// implementations must never persist one without the other.
#[async_trait]
pub trait BookingLedger: Send + Sync {
    async fn reserve(&self, user_id: Uuid, event_id: Uuid) -> CoreResult<Booking>;

    /// Newest first.
    async fn bookings_for_user(&self, user_id: Uuid) -> CoreResult<Vec<Booking>>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fails with `Conflict` when the email is taken.
    async fn create_user(&self, user: NewUser) -> CoreResult<User>;

    async fn find_by_email(&self, email: &str) -> CoreResult<Option<User>>;
}
