//! Error types for fleet-api
//!
//! Every failure leaves the service as `{"error": "<message>"}` with a
//! status derived from the error category.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use fleet_common::api::ErrorResponse;
use thiserror::Error;
use tracing::error;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Body or query string could not be decoded (400)
    #[error("{0}")]
    BadRequest(String),

    /// Domain error from fleet-common
    #[error(transparent)]
    Common(#[from] fleet_common::Error),

    /// Generic error
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        use fleet_common::Error as E;

        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Common(E::InvalidInput(_)) => StatusCode::BAD_REQUEST,
            ApiError::Common(E::Unauthenticated(_)) => StatusCode::UNAUTHORIZED,
            ApiError::Common(E::Forbidden(_)) => StatusCode::FORBIDDEN,
            ApiError::Common(E::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Common(_) | ApiError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Store failures are logged in full and reported generically
        let message = if status.is_server_error() {
            error!("Request failed: {}", self);
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        (status, Json(ErrorResponse::new(message))).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
