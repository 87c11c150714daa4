use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::models::ErrorResponse;

/// ApiError
///
/// The user-visible failure taxonomy. Every variant renders as the uniform
/// `{success:false, error}` envelope with the status code the variant implies,
/// so handlers can simply return `Result<Json<T>, ApiError>`.
///
/// Persistence failures deliberately have **no** variant here: store errors are
/// logged server-side and never surfaced to the public form (see `store.rs`).
#[derive(Debug, Error)]
pub enum ApiError {
    /// Bad captcha, malformed credentials, missing prompt. 400.
    #[error("{0}")]
    Validation(String),
    /// No active session, or credentials that do not match. 401.
    #[error("{0}")]
    Unauthorized(String),
    /// A required upstream dependency is not configured. 503.
    #[error("{0}")]
    ServiceUnavailable(String),
    /// The upstream AI provider failed; status and message are proxied through.
    #[error("{1}")]
    Upstream(StatusCode, String),
    /// Anything else. 500.
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Upstream(status, _) => *status,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// unauthorized
    ///
    /// The canonical gate rejection used by the session extractor and middleware.
    pub fn unauthorized() -> Self {
        ApiError::Unauthorized("Unauthorized".to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            success: false,
            error: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}
