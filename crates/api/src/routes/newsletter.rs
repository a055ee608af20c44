//! Newsletter route handlers.
//!
//! Subscriptions are acknowledged and logged; delivery is handled by an
//! external marketing system that consumes the logs.

use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::{AppError, Result};

/// Subscription form data.
#[derive(Debug, Deserialize)]
pub struct SubscribeRequest {
    pub email: String,
}

/// Subscription acknowledgment.
#[derive(Serialize)]
pub struct SubscribeResponse {
    pub success: bool,
    pub email: String,
}

/// Acknowledge a newsletter subscription.
#[instrument]
pub async fn subscribe(Json(form): Json<SubscribeRequest>) -> Result<Json<SubscribeResponse>> {
    let email = copper_fox_core::Email::parse(&form.email)
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    tracing::info!(email = %email, "newsletter subscription");

    Ok(Json(SubscribeResponse {
        success: true,
        email: email.into_inner(),
    }))
}
