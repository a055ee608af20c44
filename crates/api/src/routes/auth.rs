//! Authentication route handlers.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::User;
use crate::services::auth::{AuthService, Registration};
use crate::state::AppState;

/// Registration form data.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub username: String,
}

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Successful login response.
#[derive(Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub user: User,
}

fn auth_service(state: &AppState) -> AuthService<'_> {
    AuthService::new(state.pool(), state.jwt(), state.config().token_ttl_hours)
}

/// Register a new account.
#[instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    Json(form): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<User>)> {
    let registration = Registration {
        email: form.email,
        password: form.password,
        first_name: form.first_name,
        last_name: form.last_name,
        username: form.username,
    };

    let user = auth_service(&state).register(&registration).await?;

    tracing::info!(user_id = %user.id, "user registered");

    Ok((StatusCode::CREATED, Json(user)))
}

/// Exchange credentials for a bearer token.
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    Json(form): Json<LoginRequest>,
) -> Result<Json<TokenResponse>> {
    let (user, access_token) = auth_service(&state).login(&form.email, &form.password).await?;

    tracing::info!(user_id = %user.id, "user logged in");

    Ok(Json(TokenResponse { access_token, user }))
}

/// Current user from the bearer token.
#[instrument(skip(state))]
pub async fn me(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
) -> Result<Json<User>> {
    let user = auth_service(&state).current_user(auth.id).await?;

    Ok(Json(user))
}
