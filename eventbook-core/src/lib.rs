pub mod booking;
pub mod event;
pub mod identity;
pub mod repository;
pub mod reservation;
pub mod user;

pub use booking::{Booking, PaymentStatus};
pub use event::{Event, NewEvent};
pub use identity::{Identity, Role};
pub use repository::{BookingLedger, EventRepository, UserRepository};
pub use user::{NewUser, User};

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("No seats available")]
    CapacityExceeded,
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Storage failure: {0}")]
    Storage(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
