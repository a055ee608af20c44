//! Order route handlers.
//!
//! Checkout and order history require authentication and act on the caller's
//! own data. The status endpoint is administrative: it performs no ownership
//! check and is expected to sit behind an operator-only deployment boundary.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use tracing::instrument;

use copper_fox_core::{OrderId, OrderStatus, PaymentMethod};

use crate::db::orders::OrderRepository;
use crate::error::Result;
use crate::middleware::{OptionalAuth, RequireAuth};
use crate::models::{Order, ShippingDetails};
use crate::state::AppState;

/// Checkout form data: shipping fields plus the payment method.
#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    #[serde(flatten)]
    pub shipping: ShippingDetails,
    pub payment_method: PaymentMethod,
}

/// Status transition form data.
#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: OrderStatus,
}

/// Place an order from the caller's cart.
#[instrument(skip(state, form))]
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
    Json(form): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<Order>)> {
    let order = OrderRepository::new(state.pool())
        .create_order(auth.id, &form.shipping, form.payment_method)
        .await?;

    tracing::info!(order_id = %order.id, user_id = %auth.id, total = %order.total_price, "order placed");

    Ok((StatusCode::CREATED, Json(order)))
}

/// The caller's orders, newest first.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
) -> Result<Json<Vec<Order>>> {
    let orders = OrderRepository::new(state.pool()).list_for_user(auth.id).await?;

    Ok(Json(orders))
}

/// Order detail.
///
/// Authenticated shoppers see only their own orders; administrative callers
/// (behind the operator-only boundary, no bearer token) skip the ownership
/// check.
#[instrument(skip(state, auth))]
pub async fn show(
    State(state): State<AppState>,
    OptionalAuth(auth): OptionalAuth,
    Path(id): Path<i32>,
) -> Result<Json<Order>> {
    let order = OrderRepository::new(state.pool())
        .get(OrderId::new(id), auth.map(|a| a.id))
        .await?;

    Ok(Json(order))
}

/// Status transition along the allowed-transition table.
///
/// Same ownership semantics as [`show`].
#[instrument(skip(state, auth))]
pub async fn update_status(
    State(state): State<AppState>,
    OptionalAuth(auth): OptionalAuth,
    Path(id): Path<i32>,
    Json(form): Json<UpdateStatusRequest>,
) -> Result<Json<Order>> {
    let order = OrderRepository::new(state.pool())
        .update_status(OrderId::new(id), form.status, auth.map(|a| a.id))
        .await?;

    tracing::info!(order_id = %order.id, status = %order.status, "order status changed");

    Ok(Json(order))
}
