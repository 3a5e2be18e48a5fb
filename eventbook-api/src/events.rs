use axum::{
    extract::State,
    http::StatusCode,
    middleware,
    routing::{get, post},
    Extension, Json, Router,
};
use eventbook_core::reservation::EVENT_NOT_FOUND;
use eventbook_core::{Event, Identity, NewEvent};
use tracing::info;
use uuid::Uuid;

use crate::{
    error::AppError,
    extract::{AppJson, AppPath},
    middleware::{require_admin, require_auth},
    state::AppState,
};

pub fn routes(state: AppState) -> Router<AppState> {
    // Layers run bottom-up: authenticate first, then check the role.
    let admin = Router::new()
        .route("/", post(create_event))
        .route_layer(middleware::from_fn(require_admin))
        .route_layer(middleware::from_fn_with_state(state, require_auth));

    Router::new()
        .route("/", get(list_events))
        .route("/{id}", get(get_event))
        .merge(admin)
}

/// GET /api/events
async fn list_events(State(state): State<AppState>) -> Result<Json<Vec<Event>>, AppError> {
    Ok(Json(state.events.list_events().await?))
}

/// GET /api/events/{id}
async fn get_event(
    State(state): State<AppState>,
    AppPath(event_id): AppPath<Uuid>,
) -> Result<Json<Event>, AppError> {
    state
        .events
        .get_event(event_id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFoundError(EVENT_NOT_FOUND.to_string()))
}

/// POST /api/events (admin only)
async fn create_event(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    AppJson(req): AppJson<NewEvent>,
) -> Result<(StatusCode, Json<Event>), AppError> {
    let event = state.events.create_event(req, identity.user_id).await?;
    info!(event_id = %event.id, seats = event.available_seats, admin = %identity.user_id, "Event created");

    Ok((StatusCode::CREATED, Json(event)))
}
