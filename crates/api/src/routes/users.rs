//! User route handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use tracing::instrument;

use copper_fox_core::UserId;

use crate::db::users::{UpdateProfile, UserRepository};
use crate::db::RepositoryError;
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::User;
use crate::state::AppState;

/// Profile update form data.
#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub username: Option<String>,
}

/// List all users.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<User>>> {
    let users = UserRepository::new(state.pool()).list().await?;

    Ok(Json(users))
}

/// Get a user by ID.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<User>> {
    let user = UserRepository::new(state.pool())
        .get_by_id(UserId::new(id))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("user {id}")))?;

    Ok(Json(user))
}

/// Update the caller's own profile.
#[instrument(skip(state, form))]
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
    Path(id): Path<i32>,
    Json(form): Json<UpdateUserRequest>,
) -> Result<Json<User>> {
    let id = UserId::new(id);
    if id != auth.id {
        return Err(AppError::Forbidden(
            "profiles can only be edited by their owner".to_owned(),
        ));
    }

    let changes = UpdateProfile {
        first_name: form.first_name,
        last_name: form.last_name,
        username: form.username,
    };

    let user = UserRepository::new(state.pool())
        .update_profile(id, &changes)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => AppError::NotFound(format!("user {id}")),
            other => AppError::Database(other),
        })?;

    Ok(Json(user))
}
