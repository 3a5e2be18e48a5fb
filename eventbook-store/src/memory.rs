use async_trait::async_trait;
use chrono::Utc;
use eventbook_core::reservation::{check_reservation, EVENT_NOT_FOUND};
use eventbook_core::user::normalize_email;
use eventbook_core::{
    Booking, BookingLedger, CoreError, CoreResult, Event, EventRepository, NewEvent, NewUser,
    User, UserRepository,
};
use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::info;
use uuid::Uuid;

use crate::user_repo::USER_EXISTS;

#[derive(Default)]
struct Inner {
    events: HashMap<Uuid, Event>,
    bookings: Vec<Booking>,
    users: HashMap<String, User>,
}

/// In-process store for development and tests.
///
/// One mutex guards all collections, so a reservation's check, decrement and
/// insert happen as a single step.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EventRepository for MemoryStore {
    async fn create_event(&self, input: NewEvent, created_by: Uuid) -> CoreResult<Event> {
        input.validate()?;
        let event = input.into_event(created_by);

        let mut inner = self.inner.lock().await;
        inner.events.insert(event.id, event.clone());
        Ok(event)
    }

    async fn get_event(&self, id: Uuid) -> CoreResult<Option<Event>> {
        let inner = self.inner.lock().await;
        Ok(inner.events.get(&id).cloned())
    }

    async fn list_events(&self) -> CoreResult<Vec<Event>> {
        let inner = self.inner.lock().await;
        let mut events: Vec<Event> = inner.events.values().cloned().collect();
        events.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(events)
    }

    async fn decrement_seats(&self, id: Uuid) -> CoreResult<i32> {
        let mut inner = self.inner.lock().await;
        let event = inner
            .events
            .get_mut(&id)
            .ok_or_else(|| CoreError::NotFound(EVENT_NOT_FOUND.to_string()))?;

        if event.available_seats <= 0 {
            return Err(CoreError::CapacityExceeded);
        }

        event.available_seats -= 1;
        event.updated_at = Utc::now();
        Ok(event.available_seats)
    }
}

#[async_trait]
impl BookingLedger for MemoryStore {
    async fn reserve(&self, user_id: Uuid, event_id: Uuid) -> CoreResult<Booking> {
        let mut inner = self.inner.lock().await;

        let already_booked = inner
            .bookings
            .iter()
            .any(|b| b.user == user_id && b.event == event_id);
        check_reservation(inner.events.get(&event_id), already_booked)?;

        let event = inner
            .events
            .get_mut(&event_id)
            .ok_or_else(|| CoreError::NotFound(EVENT_NOT_FOUND.to_string()))?;
        event.available_seats -= 1;
        event.updated_at = Utc::now();

        let booking = Booking::paid(user_id, event_id);
        inner.bookings.push(booking.clone());

        info!(booking_id = %booking.id, %user_id, %event_id, "Booking committed");
        Ok(booking)
    }

    async fn bookings_for_user(&self, user_id: Uuid) -> CoreResult<Vec<Booking>> {
        let inner = self.inner.lock().await;
        // Insertion order is creation order.
        Ok(inner
            .bookings
            .iter()
            .rev()
            .filter(|b| b.user == user_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create_user(&self, input: NewUser) -> CoreResult<User> {
        let user = input.into_user();

        let mut inner = self.inner.lock().await;
        if inner.users.contains_key(&user.email) {
            return Err(CoreError::Conflict(USER_EXISTS.to_string()));
        }
        inner.users.insert(user.email.clone(), user.clone());
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> CoreResult<Option<User>> {
        let inner = self.inner.lock().await;
        Ok(inner.users.get(&normalize_email(email)).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eventbook_core::Role;
    use eventbook_shared::Masked;
    use std::sync::Arc;

    async fn seeded(seats: i32) -> (MemoryStore, Uuid) {
        let store = MemoryStore::new();
        let event = store
            .create_event(
                NewEvent {
                    title: "Tech Talk".to_string(),
                    description: "Rust in production".to_string(),
                    date: "2026-11-02".to_string(),
                    location: "Auditorium".to_string(),
                    price: 15.0,
                    available_seats: seats,
                    image: None,
                },
                Uuid::new_v4(),
            )
            .await
            .unwrap();
        (store, event.id)
    }

    async fn seats_of(store: &MemoryStore, event_id: Uuid) -> i32 {
        store.get_event(event_id).await.unwrap().unwrap().available_seats
    }

    #[tokio::test]
    async fn reserve_decrements_exactly_once_and_records_booking() {
        let (store, event_id) = seeded(3).await;
        let user = Uuid::new_v4();

        let booking = store.reserve(user, event_id).await.unwrap();

        assert_eq!(booking.user, user);
        assert_eq!(booking.event, event_id);
        assert_eq!(seats_of(&store, event_id).await, 2);
        assert_eq!(store.bookings_for_user(user).await.unwrap(), vec![booking]);
    }

    #[tokio::test]
    async fn sold_out_event_never_goes_negative() {
        let (store, event_id) = seeded(0).await;

        for _ in 0..3 {
            let err = store.reserve(Uuid::new_v4(), event_id).await.unwrap_err();
            assert!(matches!(err, CoreError::CapacityExceeded));
        }

        assert_eq!(seats_of(&store, event_id).await, 0);
        assert!(store.inner.lock().await.bookings.is_empty());
    }

    #[tokio::test]
    async fn repeat_booking_conflicts_without_decrement() {
        let (store, event_id) = seeded(5).await;
        let user = Uuid::new_v4();

        store.reserve(user, event_id).await.unwrap();
        let err = store.reserve(user, event_id).await.unwrap_err();

        assert!(matches!(err, CoreError::Conflict(_)));
        assert_eq!(seats_of(&store, event_id).await, 4);
        assert_eq!(store.bookings_for_user(user).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unknown_event_is_not_found() {
        let store = MemoryStore::new();
        let err = store.reserve(Uuid::new_v4(), Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn two_users_one_seat() {
        let (store, event_id) = seeded(2).await;
        let (u1, u2, u3) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());

        store.reserve(u1, event_id).await.unwrap();
        assert_eq!(seats_of(&store, event_id).await, 1);

        assert!(matches!(
            store.reserve(u1, event_id).await,
            Err(CoreError::Conflict(_))
        ));

        store.reserve(u2, event_id).await.unwrap();
        assert_eq!(seats_of(&store, event_id).await, 0);

        assert!(matches!(
            store.reserve(u3, event_id).await,
            Err(CoreError::CapacityExceeded)
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_reservations_for_last_seat() {
        let (store, event_id) = seeded(1).await;
        let store = Arc::new(store);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.reserve(Uuid::new_v4(), event_id).await })
            })
            .collect();

        let mut won = 0;
        let mut sold_out = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => won += 1,
                Err(CoreError::CapacityExceeded) => sold_out += 1,
                Err(other) => panic!("unexpected error: {:?}", other),
            }
        }

        assert_eq!(won, 1);
        assert_eq!(sold_out, 7);
        assert_eq!(seats_of(&store, event_id).await, 0);
    }

    #[tokio::test]
    async fn decrement_seats_stops_at_zero() {
        let (store, event_id) = seeded(2).await;

        assert_eq!(store.decrement_seats(event_id).await.unwrap(), 1);
        assert_eq!(store.decrement_seats(event_id).await.unwrap(), 0);
        assert!(matches!(
            store.decrement_seats(event_id).await,
            Err(CoreError::CapacityExceeded)
        ));
        assert!(matches!(
            store.decrement_seats(Uuid::new_v4()).await,
            Err(CoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn bookings_listed_newest_first_per_user() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        let mut ids = Vec::new();
        for _ in 0..3 {
            let event = store
                .create_event(
                    NewEvent {
                        title: "Session".to_string(),
                        description: String::new(),
                        date: String::new(),
                        location: String::new(),
                        price: 0.0,
                        available_seats: 1,
                        image: None,
                    },
                    Uuid::new_v4(),
                )
                .await
                .unwrap();
            ids.push(store.reserve(user, event.id).await.unwrap().id);
        }
        store.reserve(Uuid::new_v4(), Uuid::new_v4()).await.unwrap_err();

        let listed: Vec<Uuid> = store
            .bookings_for_user(user)
            .await
            .unwrap()
            .into_iter()
            .map(|b| b.id)
            .collect();
        ids.reverse();
        assert_eq!(listed, ids);
    }

    #[tokio::test]
    async fn invalid_event_is_rejected() {
        let store = MemoryStore::new();
        let err = store
            .create_event(
                NewEvent {
                    title: String::new(),
                    description: String::new(),
                    date: String::new(),
                    location: String::new(),
                    price: 1.0,
                    available_seats: 1,
                    image: None,
                },
                Uuid::new_v4(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
        assert!(store.list_events().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn duplicate_email_conflicts_case_insensitively() {
        let store = MemoryStore::new();
        let new_user = |email: &str| NewUser {
            name: "Sam".to_string(),
            email: email.to_string(),
            password_hash: Masked::new("hash".to_string()),
            role: Role::User,
        };

        store.create_user(new_user("sam@example.com")).await.unwrap();
        let err = store.create_user(new_user("SAM@example.com")).await.unwrap_err();
        assert!(matches!(err, CoreError::Conflict(_)));

        let found = store.find_by_email(" Sam@Example.com").await.unwrap().unwrap();
        assert_eq!(found.email, "sam@example.com");
    }
}
