//! Authentication extractors.
//!
//! Route handlers take [`RequireAuth`] (or [`OptionalAuth`]) to receive the
//! bearer token's user. Tokens are verified against the HS256 keys in the
//! application state; no session storage is involved.

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};

use copper_fox_core::UserId;

use crate::error::AppError;
use crate::state::AppState;

/// The authenticated caller, as carried by a verified bearer token.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    /// ID of the authenticated user.
    pub id: UserId,
}

/// Extractor that requires a valid bearer token.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(RequireAuth(user): RequireAuth) -> impl IntoResponse {
///     format!("Hello, user {}!", user.id)
/// }
/// ```
pub struct RequireAuth(pub AuthUser);

impl<S> FromRequestParts<S> for RequireAuth
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);

        let header_value = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok());

        let token = parse_bearer(header_value)
            .ok_or_else(|| AppError::Unauthorized("missing bearer token".to_owned()))?;

        let claims = state.jwt().verify(token)?;

        Ok(Self(AuthUser {
            id: claims.user_id(),
        }))
    }
}

/// Extractor that optionally reads the bearer token.
///
/// Unlike [`RequireAuth`], an absent or invalid token yields `None` instead
/// of rejecting the request.
pub struct OptionalAuth(pub Option<AuthUser>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);

        let user = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(parse_bearer_opt)
            .and_then(|token| state.jwt().verify(token).ok())
            .map(|claims| AuthUser {
                id: claims.user_id(),
            });

        Ok(Self(user))
    }
}

/// Pull the token out of an `Authorization: Bearer <token>` header value.
fn parse_bearer(header_value: Option<&str>) -> Option<&str> {
    header_value.and_then(parse_bearer_opt)
}

fn parse_bearer_opt(header_value: &str) -> Option<&str> {
    header_value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bearer_extracts_token() {
        assert_eq!(parse_bearer(Some("Bearer abc.def.ghi")), Some("abc.def.ghi"));
    }

    #[test]
    fn test_parse_bearer_rejects_missing_scheme() {
        assert_eq!(parse_bearer(Some("abc.def.ghi")), None);
        assert_eq!(parse_bearer(Some("Basic dXNlcjpwYXNz")), None);
    }

    #[test]
    fn test_parse_bearer_rejects_empty() {
        assert_eq!(parse_bearer(Some("Bearer ")), None);
        assert_eq!(parse_bearer(Some("Bearer    ")), None);
        assert_eq!(parse_bearer(None), None);
    }
}
