//! Category route handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use tracing::instrument;

use copper_fox_core::CategoryId;

use crate::db::RepositoryError;
use crate::db::categories::{CategoryRepository, NewCategory, UpdateCategory};
use crate::error::{AppError, Result};
use crate::models::Category;
use crate::state::AppState;

/// Category creation form data.
#[derive(Debug, Deserialize)]
pub struct CreateCategoryRequest {
    pub name: String,
    pub slug: String,
    pub sort_order: i32,
}

/// Category update form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCategoryRequest {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub sort_order: Option<i32>,
}

/// List all categories by sort order.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<Category>>> {
    let categories = CategoryRepository::new(state.pool()).list().await?;

    Ok(Json(categories))
}

/// Get a category by ID.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Category>> {
    let category = CategoryRepository::new(state.pool())
        .get(CategoryId::new(id))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("category {id}")))?;

    Ok(Json(category))
}

/// Create a category.
#[instrument(skip(state))]
pub async fn create(
    State(state): State<AppState>,
    Json(form): Json<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<Category>)> {
    let new = NewCategory {
        name: form.name,
        slug: form.slug,
        sort_order: form.sort_order,
    };

    let category = CategoryRepository::new(state.pool()).create(&new).await?;

    Ok((StatusCode::CREATED, Json(category)))
}

/// Update a category.
#[instrument(skip(state))]
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(form): Json<UpdateCategoryRequest>,
) -> Result<Json<Category>> {
    let changes = UpdateCategory {
        name: form.name,
        slug: form.slug,
        sort_order: form.sort_order,
    };

    let category = CategoryRepository::new(state.pool())
        .update(CategoryId::new(id), &changes)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => AppError::NotFound(format!("category {id}")),
            other => AppError::Database(other),
        })?;

    Ok(Json(category))
}

/// Delete a category.
#[instrument(skip(state))]
pub async fn remove(State(state): State<AppState>, Path(id): Path<i32>) -> Result<StatusCode> {
    let deleted = CategoryRepository::new(state.pool())
        .delete(CategoryId::new(id))
        .await?;

    if !deleted {
        return Err(AppError::NotFound(format!("category {id}")));
    }

    Ok(StatusCode::NO_CONTENT)
}
