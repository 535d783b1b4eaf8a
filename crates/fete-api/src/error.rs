use std::collections::BTreeMap;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Request-terminal error taxonomy. Nothing here is retried; every variant
/// maps to exactly one status code.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed or conflicting input, with field-level messages.
    #[error("validation failed")]
    Validation(BTreeMap<String, String>),

    /// Missing, invalid or expired credentials.
    #[error("authentication failed")]
    Authentication,

    /// Authenticated, but not authorized for this resource or action.
    #[error("permission denied")]
    AccessDenied,

    /// Absent, or outside the caller's visible set — the two are
    /// deliberately indistinguishable.
    #[error("not found")]
    NotFound,

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn validation(field: &str, message: &str) -> Self {
        let mut errors = BTreeMap::new();
        errors.insert(field.to_string(), message.to_string());
        Self::Validation(errors)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "errors": errors })),
            )
                .into_response(),
            ApiError::Authentication => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "detail": "invalid credentials" })),
            )
                .into_response(),
            // Minimal bodies: no identifiers, and nothing that would let a
            // caller tell "forbidden" apart from "does not exist".
            ApiError::AccessDenied => (
                StatusCode::FORBIDDEN,
                Json(json!({ "detail": "permission denied" })),
            )
                .into_response(),
            ApiError::NotFound => (
                StatusCode::NOT_FOUND,
                Json(json!({ "detail": "not found" })),
            )
                .into_response(),
            ApiError::Internal(err) => {
                error!("internal error: {:#}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "detail": "internal server error" })),
                )
                    .into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_match_taxonomy() {
        assert_eq!(
            ApiError::validation("email", "taken").into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Authentication.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::AccessDenied.into_response().status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ApiError::NotFound.into_response().status(),
            StatusCode::NOT_FOUND
        );
    }
}
