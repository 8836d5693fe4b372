//! Multipart upload routes.
//!
//! The browser drives the upload: it asks for an upload id, fetches one
//! presigned URL per part, PUTs each part straight to storage, then reports
//! the part ETags back to finalize. File bytes never pass through here.

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Query, State, rejection::QueryRejection},
    response::Html,
    routing::{get, post},
};
use ossup_core::upload::{CompletionRequest, PartDescriptor, UploadError};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::{AppState, error::ApiError};

/// Upload page served to browsers.
const UPLOAD_PAGE: &str = include_str!("../../assets/upload.html");

/// Creates the upload routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/upload", get(upload_page))
        .route("/upload/init", get(init_upload))
        .route("/upload/part-url", get(part_url))
        .route("/upload/complete", post(complete_upload))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query for starting an upload.
#[derive(Debug, Deserialize)]
pub struct InitUploadQuery {
    /// Original filename.
    #[serde(default)]
    pub filename: Option<String>,
}

/// Response for a started upload.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitUploadResponse {
    /// Provider upload id.
    pub upload_id: String,
    /// Bucket name.
    pub bucket_name: String,
    /// Object key to echo back on later calls.
    pub object_key: String,
}

/// Query for a part upload URL.
///
/// `partNumber` is kept as a raw string so a bad value is reported as
/// `invalid partNumber`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartUrlQuery {
    /// Provider upload id.
    #[serde(default)]
    pub upload_id: Option<String>,
    /// Object key from init.
    #[serde(default)]
    pub object_key: Option<String>,
    /// Part number, parsed as a non-negative integer.
    #[serde(default)]
    pub part_number: Option<String>,
}

/// Response carrying a part upload URL.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PartUrlResponse {
    /// Provider upload id.
    pub upload_id: String,
    /// Bucket name.
    pub bucket_name: String,
    /// Object key.
    pub object_key: String,
    /// Part number.
    pub part_number: u32,
    /// Presigned PUT URL.
    pub upload_url: String,
    /// Unix timestamp (seconds) the URL expires at.
    pub expiration_time: i64,
}

/// Request body for finalizing an upload.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteUploadRequest {
    /// Provider upload id.
    pub upload_id: String,
    /// Object key from init.
    pub object_key: String,
    /// Uploaded parts, any order.
    pub parts: Vec<UploadedPart>,
}

/// One uploaded part.
#[derive(Debug, Deserialize)]
pub struct UploadedPart {
    /// Part number.
    #[serde(rename = "partNumber")]
    pub part_number: u32,
    /// ETag header the provider returned for the part.
    #[serde(rename = "eTag")]
    pub etag: String,
}

/// Response for a finalized upload.
#[derive(Debug, Serialize)]
pub struct CompleteUploadResponse {
    /// Location reported by the provider.
    pub location: String,
    /// Bucket name.
    pub bucket: String,
    /// Object key.
    pub key: String,
    /// Object ETag without quotes.
    #[serde(rename = "eTag")]
    pub etag: String,
    /// Direct object URL.
    #[serde(rename = "privateURL")]
    pub private_url: String,
    /// Short-lived presigned download URL.
    #[serde(rename = "publicURL")]
    pub public_url: String,
    /// Unix timestamp (seconds) `publicURL` expires at.
    pub expiration: i64,
}

impl From<CompleteUploadRequest> for CompletionRequest {
    fn from(req: CompleteUploadRequest) -> Self {
        Self {
            upload_id: req.upload_id,
            object_key: req.object_key,
            parts: req
                .parts
                .into_iter()
                .map(|p| PartDescriptor::new(p.part_number, p.etag))
                .collect(),
        }
    }
}

// ============================================================================
// Route Handlers
// ============================================================================

/// Unwrap a query, reporting a rejected query string as a validation error.
fn accept_query<T>(
    state: &AppState,
    query: Result<Query<T>, QueryRejection>,
) -> Result<T, ApiError> {
    match query {
        Ok(Query(query)) => Ok(query),
        Err(rejection) => {
            let message = rejection.body_text();
            warn!(error = %message, "Rejected malformed query string");
            Err(state.api_error(UploadError::validation(message)))
        }
    }
}

/// GET `/upload`
async fn upload_page() -> Html<&'static str> {
    Html(UPLOAD_PAGE)
}

/// GET `/upload/init?filename=`
/// Start a multipart upload.
async fn init_upload(
    State(state): State<AppState>,
    query: Result<Query<InitUploadQuery>, QueryRejection>,
) -> Result<Json<InitUploadResponse>, ApiError> {
    let query = accept_query(&state, query)?;
    let Some(filename) = query.filename.filter(|f| !f.is_empty()) else {
        warn!("Upload init without filename");
        return Err(state.api_error(UploadError::validation("filename is required")));
    };

    match state.uploads.initiate_upload(&filename).await {
        Ok(started) => {
            info!(
                object_key = %started.object_key,
                upload_id = %started.upload_id,
                "Multipart upload initiated"
            );
            Ok(Json(InitUploadResponse {
                upload_id: started.upload_id,
                bucket_name: started.bucket_name,
                object_key: started.object_key,
            }))
        }
        Err(e) => {
            error!(error = %e, filename = %filename, "Failed to initiate upload");
            Err(state.api_error(e))
        }
    }
}

/// GET `/upload/part-url?uploadId=&objectKey=&partNumber=`
/// Sign a PUT URL for one part.
async fn part_url(
    State(state): State<AppState>,
    query: Result<Query<PartUrlQuery>, QueryRejection>,
) -> Result<Json<PartUrlResponse>, ApiError> {
    let query = accept_query(&state, query)?;
    let Some(part_number) = query
        .part_number
        .as_deref()
        .and_then(|n| n.parse::<u32>().ok())
    else {
        warn!(part_number = ?query.part_number, "Rejected part URL request");
        return Err(state.api_error(UploadError::validation("invalid partNumber")));
    };
    let upload_id = query.upload_id.unwrap_or_default();
    let object_key = query.object_key.unwrap_or_default();

    match state
        .uploads
        .sign_part(&upload_id, &object_key, part_number)
        .await
    {
        Ok(signed) => {
            debug!(
                object_key = %signed.object_key,
                upload_id = %signed.upload_id,
                part_number,
                "Part upload URL signed"
            );
            Ok(Json(PartUrlResponse {
                upload_id: signed.upload_id,
                bucket_name: signed.bucket_name,
                object_key: signed.object_key,
                part_number: signed.part_number,
                upload_url: signed.upload_url,
                expiration_time: signed.expiration_time,
            }))
        }
        Err(e) => {
            error!(error = %e, part_number, "Failed to sign part upload URL");
            Err(state.api_error(e))
        }
    }
}

/// POST `/upload/complete`
/// Finalize an upload from its parts.
///
/// The body is parsed by hand so a missing `Content-Type` is not an error and
/// every malformed body maps to 400.
async fn complete_upload(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<CompleteUploadResponse>, ApiError> {
    let payload: CompleteUploadRequest = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(e) => {
            warn!(error = %e, "Rejected malformed completion body");
            return Err(state.api_error(UploadError::validation(e.to_string())));
        }
    };

    let upload_id = payload.upload_id.clone();
    match state.uploads.complete_upload(payload.into()).await {
        Ok(completed) => {
            info!(
                object_key = %completed.key,
                upload_id = %upload_id,
                "Multipart upload completed"
            );
            Ok(Json(CompleteUploadResponse {
                location: completed.location,
                bucket: completed.bucket,
                key: completed.key,
                etag: completed.etag,
                private_url: completed.private_url,
                public_url: completed.public_url,
                expiration: completed.expiration,
            }))
        }
        Err(e) => {
            error!(error = %e, upload_id = %upload_id, "Failed to complete upload");
            Err(state.api_error(e))
        }
    }
}
