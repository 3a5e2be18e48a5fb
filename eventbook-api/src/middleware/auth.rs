use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{authorization::Bearer, Authorization, HeaderMapExt};
use chrono::{Duration, Utc};
use eventbook_core::{Identity, Role};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{error::AppError, state::{AppState, AuthConfig}};

// ============================================================================
// JWT Claims
// ============================================================================

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: Uuid,
    pub role: Role,
    pub exp: usize,
}

pub fn issue_token(auth: &AuthConfig, identity: Identity) -> Result<String, AppError> {
    let exp = i64::try_from(auth.expiration)
        .ok()
        .and_then(Duration::try_seconds)
        .and_then(|ttl| Utc::now().checked_add_signed(ttl))
        .ok_or_else(|| {
            AppError::InternalServerError(format!(
                "Token expiration of {}s is out of range",
                auth.expiration
            ))
        })?;

    let claims = Claims {
        sub: identity.user_id,
        role: identity.role,
        exp: exp.timestamp() as usize,
    };

    encode(&Header::default(), &claims, &EncodingKey::from_secret(auth.secret.as_bytes()))
        .map_err(|e| AppError::InternalServerError(format!("Token encoding failed: {}", e)))
}

/// Checks signature and expiry, then turns the claims into an `Identity`.
pub fn verify_token(auth: &AuthConfig, token: &str) -> Result<Identity, AppError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(auth.secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| {
        tracing::debug!("Rejected bearer token: {}", e);
        AppError::AuthenticationError("Not authorized, token failed".to_string())
    })?;

    Ok(Identity::new(token_data.claims.sub, token_data.claims.role))
}

// ============================================================================
// Authentication Middleware
// ============================================================================

pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let bearer = req
        .headers()
        .typed_get::<Authorization<Bearer>>()
        .ok_or_else(|| AppError::AuthenticationError("Not authorized, no token".to_string()))?;

    let identity = verify_token(&state.auth, bearer.token())?;

    req.extensions_mut().insert(identity);

    Ok(next.run(req).await)
}

// ============================================================================
// Admin Middleware (layer inside `require_auth`)
// ============================================================================

pub async fn require_admin(req: Request, next: Next) -> Result<Response, AppError> {
    let identity = req
        .extensions()
        .get::<Identity>()
        .copied()
        .ok_or_else(|| AppError::AuthenticationError("Not authorized, no token".to_string()))?;

    if !identity.is_admin() {
        return Err(AppError::AuthorizationError("Admin access only".to_string()));
    }

    Ok(next.run(req).await)
}
