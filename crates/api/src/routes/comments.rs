//! Product comment (review) route handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use tracing::instrument;

use copper_fox_core::{CommentId, ProductId};

use crate::db::comments::{CommentRepository, NewComment, UpdateComment};
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::Comment;
use crate::state::AppState;

/// Comment listing filters.
#[derive(Debug, Deserialize)]
pub struct CommentFilter {
    pub product_id: Option<i32>,
    pub rating: Option<i32>,
}

/// Comment creation form data. The author comes from the bearer token.
#[derive(Debug, Deserialize)]
pub struct CreateCommentRequest {
    pub product_id: i32,
    pub title: String,
    pub content: String,
    pub rating: i32,
}

/// Comment update form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCommentRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub rating: Option<i32>,
}

/// List comments, optionally filtered by product and/or rating.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(filter): Query<CommentFilter>,
) -> Result<Json<Vec<Comment>>> {
    let comments = CommentRepository::new(state.pool())
        .list(filter.product_id.map(ProductId::new), filter.rating)
        .await?;

    Ok(Json(comments))
}

/// Get a comment by ID.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Comment>> {
    let comment = CommentRepository::new(state.pool())
        .get(CommentId::new(id))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("comment {id}")))?;

    Ok(Json(comment))
}

/// Create a comment and refresh the product's review aggregates.
#[instrument(skip(state))]
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
    Json(form): Json<CreateCommentRequest>,
) -> Result<(StatusCode, Json<Comment>)> {
    let new = NewComment {
        user_id: auth.id,
        product_id: ProductId::new(form.product_id),
        title: form.title,
        content: form.content,
        rating: form.rating,
    };

    let comment = CommentRepository::new(state.pool()).create(&new).await?;

    Ok((StatusCode::CREATED, Json(comment)))
}

/// Update a comment and refresh the product's review aggregates.
#[instrument(skip(state))]
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(form): Json<UpdateCommentRequest>,
) -> Result<Json<Comment>> {
    let changes = UpdateComment {
        title: form.title,
        content: form.content,
        rating: form.rating,
    };

    let comment = CommentRepository::new(state.pool())
        .update(CommentId::new(id), &changes)
        .await?;

    Ok(Json(comment))
}

/// Delete a comment and refresh the product's review aggregates.
#[instrument(skip(state))]
pub async fn remove(State(state): State<AppState>, Path(id): Path<i32>) -> Result<StatusCode> {
    CommentRepository::new(state.pool())
        .remove(CommentId::new(id))
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
