//! Product photo route handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use copper_fox_core::{PhotoId, ProductId};

use crate::db::photos::{NewPhoto, PhotoRepository, UpdatePhoto};
use crate::error::Result;
use crate::models::ProductPhoto;
use crate::state::AppState;

/// Photo creation form data.
#[derive(Debug, Deserialize)]
pub struct CreatePhotoRequest {
    pub product_id: i32,
    pub url: String,
    /// Image size in bytes.
    pub size: i64,
    pub is_primary: Option<bool>,
}

/// Photo update form data.
#[derive(Debug, Deserialize)]
pub struct UpdatePhotoRequest {
    pub sort_order: Option<i32>,
    pub is_primary: Option<bool>,
}

/// Deletion acknowledgment.
#[derive(Serialize)]
pub struct DeletedResponse {
    pub message: String,
}

/// List a product's photos in display order.
#[instrument(skip(state))]
pub async fn index_for_product(
    State(state): State<AppState>,
    Path(product_id): Path<i32>,
) -> Result<Json<Vec<ProductPhoto>>> {
    let photos = PhotoRepository::new(state.pool())
        .list_for_product(ProductId::new(product_id))
        .await?;

    Ok(Json(photos))
}

/// Append a photo to a product.
#[instrument(skip(state))]
pub async fn create(
    State(state): State<AppState>,
    Json(form): Json<CreatePhotoRequest>,
) -> Result<(StatusCode, Json<ProductPhoto>)> {
    let new = NewPhoto {
        product_id: ProductId::new(form.product_id),
        url: form.url,
        size_bytes: form.size,
        is_primary: form.is_primary.unwrap_or(false),
    };

    let photo = PhotoRepository::new(state.pool()).create(&new).await?;

    Ok((StatusCode::CREATED, Json(photo)))
}

/// Reorder a photo and/or change its primary flag.
#[instrument(skip(state))]
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(form): Json<UpdatePhotoRequest>,
) -> Result<Json<ProductPhoto>> {
    let changes = UpdatePhoto {
        sort_order: form.sort_order,
        is_primary: form.is_primary,
    };

    let photo = PhotoRepository::new(state.pool())
        .update(PhotoId::new(id), &changes)
        .await?;

    Ok(Json(photo))
}

/// Delete a photo, compacting its siblings.
#[instrument(skip(state))]
pub async fn remove(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<DeletedResponse>> {
    PhotoRepository::new(state.pool())
        .remove(PhotoId::new(id))
        .await?;

    Ok(Json(DeletedResponse {
        message: "Photo deleted successfully".to_owned(),
    }))
}
