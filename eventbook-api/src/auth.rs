use axum::{
    extract::State,
    http::StatusCode,
    routing::post,
    Json, Router,
};
use eventbook_core::{NewUser, Role, User};
use eventbook_shared::{redact_email, Masked};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::{
    error::AppError, extract::AppJson, middleware::auth::issue_token, state::AppState,
};

const INVALID_CREDENTIALS: &str = "Invalid credentials";

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub token: String,
}

impl AuthResponse {
    fn new(user: User, token: String) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            token,
        }
    }
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

async fn register(
    State(state): State<AppState>,
    AppJson(req): AppJson<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    if req.name.trim().is_empty() || req.email.trim().is_empty() || req.password.is_empty() {
        return Err(AppError::ValidationError("All fields are required".to_string()));
    }

    let role = if state.auth.is_admin_email(&req.email) {
        Role::Admin
    } else {
        Role::User
    };

    let cost = state.auth.bcrypt_cost;
    let password = req.password;
    let password_hash = tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| AppError::InternalServerError(format!("Hashing task failed: {}", e)))?
        .map_err(|e| AppError::InternalServerError(format!("Password hashing failed: {}", e)))?;

    let user = state
        .users
        .create_user(NewUser {
            name: req.name.trim().to_string(),
            email: req.email,
            password_hash: Masked::new(password_hash),
            role,
        })
        .await?;

    let token = issue_token(&state.auth, user.identity())?;
    info!(user_id = %user.id, email = %redact_email(&user.email), role = %user.role, "User registered");

    Ok((StatusCode::CREATED, Json(AuthResponse::new(user, token))))
}

async fn login(
    State(state): State<AppState>,
    AppJson(req): AppJson<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    if req.email.trim().is_empty() || req.password.is_empty() {
        return Err(AppError::ValidationError("All fields are required".to_string()));
    }

    let user = state.users.find_by_email(&req.email).await?;
    let stored_hash = user.as_ref().map(|u| u.password_hash.expose().clone());
    let matches = check_password(req.password, stored_hash, state.auth.bcrypt_cost).await?;

    let user = match user {
        Some(user) if matches => user,
        _ => return Err(AppError::AuthenticationError(INVALID_CREDENTIALS.to_string())),
    };

    let token = issue_token(&state.auth, user.identity())?;
    info!(user_id = %user.id, "User logged in");

    Ok(Json(AuthResponse::new(user, token)))
}

/// Verifies `password` against `stored_hash` on the blocking pool. Unknown
/// accounts still pay for one bcrypt round at the configured cost, so a miss
/// takes as long as a wrong password.
async fn check_password(
    password: String,
    stored_hash: Option<String>,
    cost: u32,
) -> Result<bool, AppError> {
    tokio::task::spawn_blocking(move || match stored_hash {
        Some(hash) => bcrypt::verify(password, &hash),
        None => bcrypt::hash(password, cost).map(|_| false),
    })
    .await
    .map_err(|e| AppError::InternalServerError(format!("Hashing task failed: {}", e)))?
    .map_err(|e| AppError::InternalServerError(format!("Password check failed: {}", e)))
}
