//! HTTP API layer with Axum routes.
//!
//! This crate provides:
//! - Upload routes (init, part URL, complete) and the upload page
//! - Health check
//! - Error to response mapping

pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use ossup_core::upload::UploadService;
use ossup_shared::AppError;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use error::ApiError;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Upload workflow backed by the storage provider.
    pub uploads: Arc<UploadService>,
    /// Return provider error text to callers instead of a generic message.
    pub expose_upstream_errors: bool,
}

impl AppState {
    /// Create state that exposes provider errors verbatim.
    #[must_use]
    pub fn new(uploads: Arc<UploadService>) -> Self {
        Self {
            uploads,
            expose_upstream_errors: true,
        }
    }

    /// Set whether provider error text reaches callers.
    #[must_use]
    pub fn with_upstream_errors_exposed(mut self, expose: bool) -> Self {
        self.expose_upstream_errors = expose;
        self
    }

    /// Turn an error into a response honoring the exposure setting.
    pub fn api_error(&self, err: impl Into<AppError>) -> ApiError {
        ApiError::new(err, self.expose_upstream_errors)
    }
}

/// Creates the main application router.
///
/// Upload routes are mounted under `route_prefix`; the health check is at
/// the root.
pub fn create_router(state: AppState, route_prefix: &str) -> Router {
    let prefix = normalize_prefix(route_prefix);
    let uploads = routes::upload::routes();

    let router = if prefix.is_empty() {
        Router::new().merge(uploads)
    } else {
        Router::new().nest(&prefix, uploads)
    };

    router
        .merge(routes::health::routes())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// `"aliyun/"` -> `"/aliyun"`, `"/"` -> `""`.
fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{trimmed}")
    }
}
