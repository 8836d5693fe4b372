//! Multipart object storage on S3-compatible providers.
//!
//! This module binds the upload workflow to a provider through the
//! [`MultipartStore`] trait. The shipped implementation, [`S3MultipartStore`],
//! speaks the S3 multipart API via `rust-s3` and works against Aliyun OSS,
//! AWS S3, MinIO and other compatible services.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      MultipartStore                              │
//! ├─────────────────────────────────────────────────────────────────┤
//! │ initiate(key)                │ presign_part(key, id, n, ttl)     │
//! │ complete(key, id, parts)     │ presign_download(key, ttl, disp)  │
//! └─────────────────────────────────────────────────────────────────┘
//!        network round trip              local signing only
//! ```

mod config;
mod error;
mod service;

pub use config::StorageConfig;
pub use error::StorageError;
pub use service::{
    CommittedObject, InitiatedMultipart, MultipartStore, S3MultipartStore, StoredPart,
    parse_complete_response,
};
