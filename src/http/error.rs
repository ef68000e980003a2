//! Error responses for the HTTP API.
//!
//! Every failure is rendered as `{"error": ..., "status": ...}`.

use axum::extract::rejection::QueryRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::probe::CertError;

#[derive(Debug, Error)]
pub enum ApiError {
    /// `host` query parameter missing or empty.
    #[error("Host parameter is required")]
    MissingHost,

    /// Query string could not be decoded (e.g. `host` given twice).
    #[error("Invalid query string: {0}")]
    InvalidQuery(#[from] QueryRejection),

    /// Probe reported the host unreachable (certificate endpoint only).
    #[error("Host is not reachable")]
    Unreachable,

    #[error("Failed to fetch cert info: {0}")]
    CertFetch(#[from] CertError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingHost | ApiError::InvalidQuery(_) => StatusCode::BAD_REQUEST,
            ApiError::Unreachable => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::CertFetch(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::warn!(status = status.as_u16(), error = %self, "Request failed");
        }

        let body = serde_json::json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        });

        (status, axum::Json(body)).into_response()
    }
}
