use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::Deserialize;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{normalize_email, Identity, User};
use crate::services::auth::{self, AuthError};
use crate::state::AppState;

#[derive(Deserialize, Default)]
pub struct TokenBody {
    pub token: Option<String>,
}

/// Auth endpoints take the credential from the bearer header, falling back
/// to a `{token}` body for older clients.
async fn verify_request(
    state: &AppState,
    headers: &HeaderMap,
    body: &TokenBody,
) -> Result<Identity, AppError> {
    let token = auth::bearer_token(headers)
        .or(body.token.as_deref())
        .ok_or(AuthError::MissingCredentials)?;

    let mut identity = state.verifier.verify(token).await?;
    identity.email = normalize_email(&identity.email);
    Ok(identity)
}

fn materialize(identity: Identity) -> User {
    let display_name = identity
        .display_name
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| {
            identity
                .email
                .split('@')
                .next()
                .unwrap_or_default()
                .to_string()
        });

    User {
        uid: identity.uid,
        email: identity.email,
        display_name,
        photo_url: identity.photo_url.unwrap_or_default(),
        role: "user".to_string(),
    }
}

// POST /api/auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Option<Json<TokenBody>>,
) -> Result<Json<serde_json::Value>, AppError> {
    let body = body.map(|Json(b)| b).unwrap_or_default();
    let identity = verify_request(&state, &headers, &body).await?;

    let user = {
        let db = state.db.lock().unwrap();
        match queries::get_user_by_uid(&db, &identity.uid)? {
            Some(existing) => existing,
            None => {
                let user = materialize(identity);
                queries::upsert_user(&db, &user)?;
                user
            }
        }
    };

    tracing::info!("user logged in: {}", user.email);

    Ok(Json(serde_json::json!({
        "message": "Login successful",
        "user": user,
    })))
}

// POST /api/auth/register
pub async fn register(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Option<Json<TokenBody>>,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    let body = body.map(|Json(b)| b).unwrap_or_default();
    let identity = verify_request(&state, &headers, &body).await?;

    let user = {
        let db = state.db.lock().unwrap();

        let existing = queries::get_user_by_uid(&db, &identity.uid)?
            .or(queries::get_user_by_email(&db, &identity.email)?);
        if existing.is_some() {
            return Err(AppError::Conflict("User already exists".to_string()));
        }

        let user = materialize(identity);
        queries::upsert_user(&db, &user)?;
        user
    };

    tracing::info!("user registered: {}", user.email);

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "message": "User registered successfully",
            "user": user,
        })),
    ))
}

// POST /api/auth/verify
pub async fn verify(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Option<Json<TokenBody>>,
) -> Result<Json<serde_json::Value>, AppError> {
    let body = body.map(|Json(b)| b).unwrap_or_default();
    let identity = verify_request(&state, &headers, &body).await?;

    let user = {
        let db = state.db.lock().unwrap();
        queries::get_user_by_uid(&db, &identity.uid)?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?
    };

    Ok(Json(serde_json::json!({
        "message": "Token verified",
        "user": user,
    })))
}
