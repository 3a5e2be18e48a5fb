use axum::{
    extract::State,
    http::StatusCode,
    middleware,
    routing::{get, post},
    Extension, Json, Router,
};
use eventbook_core::{Booking, CoreError, Identity};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{error::AppError, extract::AppJson, middleware::require_auth, state::AppState};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    pub event_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct BookingCreatedResponse {
    pub message: &'static str,
    pub booking: Booking,
}

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", post(create_booking))
        .route("/my", get(my_bookings))
        .route_layer(middleware::from_fn_with_state(state, require_auth))
}

/// POST /api/bookings
/// Reserve one seat for the caller (checkout is mocked as paid)
async fn create_booking(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    AppJson(req): AppJson<CreateBookingRequest>,
) -> Result<(StatusCode, Json<BookingCreatedResponse>), AppError> {
    let booking = state
        .ledger
        .reserve(identity.user_id, req.event_id)
        .await
        .map_err(|e| {
            if !matches!(e, CoreError::Storage(_)) {
                warn!(user_id = %identity.user_id, event_id = %req.event_id, reason = %e, "Reservation rejected");
            }
            AppError::from(e)
        })?;

    info!(booking_id = %booking.id, user_id = %booking.user, event_id = %booking.event, "Booking confirmed");

    Ok((
        StatusCode::CREATED,
        Json(BookingCreatedResponse {
            message: "Booking successful",
            booking,
        }),
    ))
}

/// GET /api/bookings/my
async fn my_bookings(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<Vec<Booking>>, AppError> {
    Ok(Json(state.ledger.bookings_for_user(identity.user_id).await?))
}
