//! Multipart upload brokering.
//!
//! This module provides the operations a browser needs to upload a large
//! file straight to object storage:
//! - Upload initiation with collision-resistant object keys
//! - Per-part presigned PUT URLs
//! - Upload completion with part normalization
//! - Short-lived download URLs for the finished object

mod error;
mod key;
mod parts;
mod service;
mod types;

pub use error::UploadError;
pub use key::generate_object_key;
pub use parts::{normalize_parts, strip_etag_quotes};
pub use service::{DEFAULT_PART_URL_TTL, DEFAULT_PUBLIC_URL_TTL, UploadOptions, UploadService};
pub use types::{CompletedUpload, CompletionRequest, InitiatedUpload, PartDescriptor, PartUploadUrl};
