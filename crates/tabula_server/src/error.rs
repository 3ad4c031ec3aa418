//! Error responses.

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use tabula_error::{GenerationErrorKind, TabulaError, TabulaErrorKind, ValidationErrorKind};

/// JSON error body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// User-facing message
    pub error: String,
}

impl ErrorResponse {
    /// Create an error body.
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

impl From<&TabulaError> for ErrorResponse {
    fn from(err: &TabulaError) -> Self {
        Self::new(err.user_message())
    }
}

/// HTTP status for an error.
pub fn status_for(err: &TabulaError) -> StatusCode {
    match err.kind() {
        TabulaErrorKind::Validation(e) => match e.kind {
            ValidationErrorKind::FileTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ValidationErrorKind::UnsupportedContentType { .. } => {
                StatusCode::UNSUPPORTED_MEDIA_TYPE
            }
            ValidationErrorKind::BlankSchemaName
            | ValidationErrorKind::DuplicateSchemaField { .. } => StatusCode::BAD_REQUEST,
        },
        TabulaErrorKind::Generation(e) => match e.kind {
            GenerationErrorKind::EmptyPrompt => StatusCode::BAD_REQUEST,
            GenerationErrorKind::Connection(_) => StatusCode::SERVICE_UNAVAILABLE,
            GenerationErrorKind::Rejected(_) => StatusCode::BAD_GATEWAY,
        },
        TabulaErrorKind::Storage(_) => StatusCode::BAD_GATEWAY,
        TabulaErrorKind::Config(_) | TabulaErrorKind::Database(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}
