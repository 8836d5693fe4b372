//! Error responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use ossup_shared::AppError;
use serde_json::json;
use tracing::{debug, warn};

/// Message returned for provider failures when details are hidden.
const GENERIC_UPSTREAM_MESSAGE: &str = "storage provider request failed";

/// An [`AppError`] rendered as `{"error": <message>}`.
#[derive(Debug)]
pub struct ApiError {
    error: AppError,
    expose_details: bool,
}

impl ApiError {
    /// Wrap an error. Client errors always carry their message; server errors
    /// only when `expose_details` is set.
    pub fn new(error: impl Into<AppError>, expose_details: bool) -> Self {
        Self {
            error: error.into(),
            expose_details,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.error.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let error_code = self.error.error_code();
        let message = if self.error.is_client_error() {
            debug!(error_code, status = status.as_u16(), "Rejecting request");
            self.error.message()
        } else {
            warn!(
                error_code,
                status = status.as_u16(),
                redacted = !self.expose_details,
                "Responding with server error"
            );
            if self.expose_details {
                self.error.message()
            } else {
                GENERIC_UPSTREAM_MESSAGE
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
