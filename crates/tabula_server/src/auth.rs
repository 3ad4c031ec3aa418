//! Authenticated user extraction.

use crate::ErrorResponse;
use axum::{
    Json, async_trait,
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use tabula_core::UserId;

/// Header carrying the user id set by the upstream auth layer.
pub const USER_ID_HEADER: &str = "x-user-id";

/// The authenticated user of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentUser(pub UserId);

/// Why a request has no usable user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    /// Header absent
    MissingHeader,
    /// Header present but not an integer id
    InvalidHeader,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let message = match self {
            AuthError::MissingHeader => "Missing X-User-Id header",
            AuthError::InvalidHeader => "Invalid X-User-Id header",
        };
        (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse::new(message)),
        )
            .into_response()
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(USER_ID_HEADER)
            .ok_or(AuthError::MissingHeader)?;

        let id = header
            .to_str()
            .map_err(|_| AuthError::InvalidHeader)?
            .trim()
            .parse::<i64>()
            .map_err(|_| AuthError::InvalidHeader)?;

        Ok(CurrentUser(UserId::new(id)))
    }
}
