use crate::event::Event;
use crate::{CoreError, CoreResult};

pub const ALREADY_REGISTERED: &str = "Already registered";
pub const EVENT_NOT_FOUND: &str = "Event not found";

/// Precondition policy for a reservation, shared by every ledger
/// implementation so they reject in the same order.
///
/// Must be evaluated while the caller holds whatever serializes reservations
/// for this event (row lock, mutex guard).
pub fn check_reservation(event: Option<&Event>, already_booked: bool) -> CoreResult<()> {
    let event = event.ok_or_else(|| CoreError::NotFound(EVENT_NOT_FOUND.to_string()))?;

    if already_booked {
        return Err(CoreError::Conflict(ALREADY_REGISTERED.to_string()));
    }

    if event.available_seats <= 0 {
        return Err(CoreError::CapacityExceeded);
    }

    Ok(())
}
