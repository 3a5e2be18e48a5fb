use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{CoreError, CoreResult};

/// A bookable occurrence with a fixed price and a finite seat counter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    /// Display string only; never parsed as a calendar date.
    pub date: String,
    pub location: String,
    pub price: f64,
    pub available_seats: i32,
    pub image: Option<String>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Admin input for a new event. Missing optional fields fall back to empty
/// strings and zero seats.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEvent {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub location: String,
    pub price: f64,
    #[serde(default)]
    pub available_seats: i32,
    #[serde(default)]
    pub image: Option<String>,
}

impl NewEvent {
    pub fn validate(&self) -> CoreResult<()> {
        if self.title.trim().is_empty() {
            return Err(CoreError::Validation("title is required".to_string()));
        }
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(CoreError::Validation(
                "price must be a non-negative number".to_string(),
            ));
        }
        if self.available_seats < 0 {
            return Err(CoreError::Validation(
                "availableSeats must not be negative".to_string(),
            ));
        }
        Ok(())
    }

    /// Builds the stored record. Callers validate first.
    pub fn into_event(self, created_by: Uuid) -> Event {
        let now = Utc::now();
        Event {
            id: Uuid::new_v4(),
            title: self.title.trim().to_string(),
            description: self.description,
            date: self.date,
            location: self.location,
            price: self.price,
            available_seats: self.available_seats,
            image: self.image.filter(|i| !i.trim().is_empty()),
            created_by,
            created_at: now,
            updated_at: now,
        }
    }
}
