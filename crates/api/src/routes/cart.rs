//! Cart route handlers.
//!
//! All cart endpoints act on the authenticated user's own cart, which is
//! created lazily on first access.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use tracing::instrument;

use copper_fox_core::{CartItemId, ProductId};

use crate::db::carts::CartRepository;
use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::Cart;
use crate::state::AppState;

/// Add-to-cart form data.
#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub product_id: i32,
    pub quantity: i32,
}

/// Quantity update form data.
#[derive(Debug, Deserialize)]
pub struct UpdateItemRequest {
    pub quantity: i32,
}

/// Current cart with items and totals.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
) -> Result<Json<Cart>> {
    let cart = CartRepository::new(state.pool()).get_or_create(auth.id).await?;

    Ok(Json(cart))
}

/// Add a product to the cart, merging with an existing line.
#[instrument(skip(state))]
pub async fn add_item(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
    Json(form): Json<AddItemRequest>,
) -> Result<Json<Cart>> {
    let cart = CartRepository::new(state.pool())
        .add_item(auth.id, ProductId::new(form.product_id), form.quantity)
        .await?;

    Ok(Json(cart))
}

/// Set a line's quantity; zero or less removes it.
#[instrument(skip(state))]
pub async fn update_item(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
    Path(id): Path<i32>,
    Json(form): Json<UpdateItemRequest>,
) -> Result<Json<Cart>> {
    let cart = CartRepository::new(state.pool())
        .update_item(auth.id, CartItemId::new(id), form.quantity)
        .await?;

    Ok(Json(cart))
}

/// Remove a line from the cart.
#[instrument(skip(state))]
pub async fn remove_item(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
    Path(id): Path<i32>,
) -> Result<Json<Cart>> {
    let cart = CartRepository::new(state.pool())
        .remove_item(auth.id, CartItemId::new(id))
        .await?;

    Ok(Json(cart))
}

/// Remove every line from the cart.
#[instrument(skip(state))]
pub async fn clear(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
) -> Result<Json<Cart>> {
    let cart = CartRepository::new(state.pool()).clear(auth.id).await?;

    Ok(Json(cart))
}
