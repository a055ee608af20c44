//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server-class errors to
//! Sentry before responding to the client. All route handlers return
//! `Result<T, AppError>`; responses carry a JSON `{"message": ...}` body.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::db::carts::CartError;
use crate::db::comments::CommentError;
use crate::db::orders::OrderError;
use crate::db::photos::PhotoError;
use crate::services::auth::AuthError;

/// Application-level error type for the API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Photo operation failed.
    #[error("Photo error: {0}")]
    Photo(#[from] PhotoError),

    /// Order operation failed.
    #[error("Order error: {0}")]
    Order(#[from] OrderError),

    /// Cart operation failed.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// Comment operation failed.
    #[error("Comment error: {0}")]
    Comment(#[from] CommentError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Caller is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Caller is authenticated but not allowed.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// JSON body for every error response.
#[derive(Serialize)]
struct ErrorBody {
    message: String,
}

impl AppError {
    /// Whether this error is a server fault worth capturing to Sentry.
    fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }

    /// HTTP status for this error.
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials
                | AuthError::TokenInvalid
                | AuthError::TokenExpired
                | AuthError::UserNotFound => StatusCode::UNAUTHORIZED,
                AuthError::UserAlreadyExists => StatusCode::CONFLICT,
                AuthError::WeakPassword(_) | AuthError::InvalidEmail(_) => StatusCode::BAD_REQUEST,
                AuthError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
                AuthError::Repository(_) | AuthError::PasswordHash => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Photo(err) => match err {
                PhotoError::ProductNotFound(_) | PhotoError::NotFound(_) => StatusCode::NOT_FOUND,
                PhotoError::LastPrimary | PhotoError::OrderOutOfRange { .. } => {
                    StatusCode::BAD_REQUEST
                }
                PhotoError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Order(err) => match err {
                OrderError::CartNotFound | OrderError::CartEmpty | OrderError::NotFound(_) => {
                    StatusCode::NOT_FOUND
                }
                OrderError::Forbidden(_) => StatusCode::FORBIDDEN,
                OrderError::InsufficientStock { .. } | OrderError::InvalidTransition { .. } => {
                    StatusCode::BAD_REQUEST
                }
                OrderError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Cart(err) => match err {
                CartError::ProductNotFound | CartError::ItemNotFound => StatusCode::NOT_FOUND,
                CartError::OutOfStock { .. }
                | CartError::InsufficientStock { .. }
                | CartError::InvalidQuantity => StatusCode::BAD_REQUEST,
                CartError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Comment(err) => match err {
                CommentError::ProductNotFound(_) | CommentError::NotFound(_) => {
                    StatusCode::NOT_FOUND
                }
                CommentError::InvalidRating(_) => StatusCode::BAD_REQUEST,
                CommentError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Message exposed to the client. Internals stay out of 5xx bodies.
    fn client_message(&self) -> String {
        if self.is_server_error() {
            return "Internal server error".to_owned();
        }

        match self {
            Self::Auth(AuthError::InvalidCredentials | AuthError::UserNotFound) => {
                "Invalid credentials".to_owned()
            }
            Self::Auth(AuthError::UserAlreadyExists) => {
                "An account with this email or username already exists".to_owned()
            }
            Self::Auth(err) => err.to_string(),
            Self::Photo(err) => err.to_string(),
            Self::Order(err) => err.to_string(),
            Self::Cart(err) => err.to_string(),
            Self::Comment(err) => err.to_string(),
            Self::NotFound(msg) => format!("Not found: {msg}"),
            Self::Unauthorized(msg) => format!("Unauthorized: {msg}"),
            Self::Forbidden(msg) => format!("Forbidden: {msg}"),
            Self::BadRequest(msg) => format!("Bad request: {msg}"),
            Self::Database(_) | Self::Internal(_) => "Internal server error".to_owned(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = self.status_code();
        let body = ErrorBody {
            message: self.client_message(),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use copper_fox_core::{OrderId, OrderStatus, PhotoId};

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("product 123".to_owned());
        assert_eq!(err.to_string(), "Not found: product 123");

        let err = AppError::BadRequest("invalid input".to_owned());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AppError::NotFound("x".to_owned()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Unauthorized("x".to_owned()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::Forbidden("x".to_owned()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::Internal("x".to_owned()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_photo_error_status_codes() {
        assert_eq!(
            AppError::Photo(PhotoError::LastPrimary).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Photo(PhotoError::NotFound(PhotoId::new(1))).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Photo(PhotoError::OrderOutOfRange {
                requested: 9,
                count: 2
            })
            .status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_order_error_status_codes() {
        assert_eq!(
            AppError::Order(OrderError::CartNotFound).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Order(OrderError::Forbidden(OrderId::new(1))).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::Order(OrderError::InsufficientStock {
                name: "shirt".to_owned(),
                requested: 5,
                available: 3
            })
            .status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Order(OrderError::InvalidTransition {
                from: OrderStatus::Delivered,
                to: OrderStatus::Pending
            })
            .status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_error_body_shape() {
        let body = ErrorBody {
            message: "cart is empty".to_owned(),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json, serde_json::json!({"message": "cart is empty"}));
    }

    #[test]
    fn test_server_errors_hide_internals() {
        let err = AppError::Database(RepositoryError::DataCorruption(
            "user 7 has a broken email".to_owned(),
        ));
        assert_eq!(err.client_message(), "Internal server error");
    }

    #[test]
    fn test_client_errors_keep_detail() {
        let err = AppError::Order(OrderError::InsufficientStock {
            name: "shirt".to_owned(),
            requested: 5,
            available: 3,
        });
        assert!(err.client_message().contains("shirt"));
        assert!(err.client_message().contains('5'));
        assert!(err.client_message().contains('3'));
    }
}
